use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How significant a news item is, as judged by the classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    /// Major releases, breaking changes, security vulnerabilities
    Critical,
    /// New features, important updates
    High,
    /// Bug fixes, minor updates
    #[default]
    Medium,
    /// Documentation updates, trivial changes
    Low,
}

impl Importance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Importance::Critical => "critical",
            Importance::High => "high",
            Importance::Medium => "medium",
            Importance::Low => "low",
        }
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Importance {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical" => Ok(Importance::Critical),
            "high" => Ok(Importance::High),
            "medium" => Ok(Importance::Medium),
            "low" => Ok(Importance::Low),
            unknown => anyhow::bail!("Unknown importance value: '{}'", unknown),
        }
    }
}

/// What kind of news an item is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Release,
    Feature,
    Update,
    Bugfix,
    Security,
    Documentation,
    Announcement,
    #[default]
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Release => "release",
            Category::Feature => "feature",
            Category::Update => "update",
            Category::Bugfix => "bugfix",
            Category::Security => "security",
            Category::Documentation => "documentation",
            Category::Announcement => "announcement",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "release" => Ok(Category::Release),
            "feature" => Ok(Category::Feature),
            "update" => Ok(Category::Update),
            "bugfix" => Ok(Category::Bugfix),
            "security" => Ok(Category::Security),
            "documentation" => Ok(Category::Documentation),
            "announcement" => Ok(Category::Announcement),
            "other" => Ok(Category::Other),
            unknown => anyhow::bail!("Unknown category value: '{}'", unknown),
        }
    }
}

/// One collected news entry. Created by the collector, enriched in place by
/// the summarizer, read-only for the renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub url: String,
    pub tool_name: String,
    /// Provenance tag for where the item came from (e.g. "gemini_search")
    pub source: String,
    #[serde(default)]
    pub published_at: Option<NaiveDate>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub summary_ja: String,
    #[serde(default)]
    pub summary_en: String,
    #[serde(default)]
    pub importance: Importance,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Raw response entry this item was parsed from; not part of the
    /// serialized form.
    #[serde(skip)]
    pub raw_data: serde_json::Value,
}

impl NewsItem {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        tool_name: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            tool_name: tool_name.into(),
            source: source.into(),
            published_at: None,
            content: String::new(),
            summary_ja: String::new(),
            summary_en: String::new(),
            importance: Importance::default(),
            category: Category::default(),
            tags: Vec::new(),
            raw_data: serde_json::Value::Null,
        }
    }
}

/// One monitored tool from the YAML config. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    pub name: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub search_queries: Vec<String>,
    #[serde(default)]
    pub official_links: Vec<String>,
}

/// Aggregate for one report run. Lives only for the duration of report
/// generation; nothing is persisted beyond the rendered HTML.
#[derive(Debug, Clone)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub news_items: Vec<NewsItem>,
    pub generated_at: DateTime<Local>,
}

impl DailyReport {
    pub fn new(date: NaiveDate, news_items: Vec<NewsItem>) -> Self {
        Self {
            date,
            news_items,
            generated_at: Local::now(),
        }
    }

    pub fn by_tool(&self, tool_name: &str) -> Vec<&NewsItem> {
        self.news_items
            .iter()
            .filter(|item| item.tool_name == tool_name)
            .collect()
    }

    pub fn by_importance(&self, importance: Importance) -> Vec<&NewsItem> {
        self.news_items
            .iter()
            .filter(|item| item.importance == importance)
            .collect()
    }

    pub fn critical_and_high(&self) -> Vec<&NewsItem> {
        self.news_items
            .iter()
            .filter(|item| {
                matches!(item.importance, Importance::Critical | Importance::High)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn importance_round_trips_through_serde() {
        for imp in [
            Importance::Critical,
            Importance::High,
            Importance::Medium,
            Importance::Low,
        ] {
            let json = serde_json::to_string(&imp).unwrap();
            let back: Importance = serde_json::from_str(&json).unwrap();
            assert_eq!(imp, back);
        }
    }

    #[test]
    fn news_item_round_trips_enums() {
        let mut item = NewsItem::new("Title", "https://example.com", "Claude Code", "gemini_search");
        item.importance = Importance::Critical;
        item.category = Category::Security;
        item.tags = vec!["cli".to_string()];

        let json = serde_json::to_string(&item).unwrap();
        let back: NewsItem = serde_json::from_str(&json).unwrap();

        assert_eq!(back.importance, Importance::Critical);
        assert_eq!(back.category, Category::Security);
        assert_eq!(back.tags, item.tags);
    }

    #[test]
    fn unknown_enum_strings_are_rejected() {
        assert!("urgent".parse::<Importance>().is_err());
        assert!("misc".parse::<Category>().is_err());
        assert!("".parse::<Category>().is_err());
    }

    #[test]
    fn every_enum_value_round_trips_through_from_str() {
        for imp in [
            Importance::Critical,
            Importance::High,
            Importance::Medium,
            Importance::Low,
        ] {
            assert_eq!(imp.as_str().parse::<Importance>().unwrap(), imp);
        }

        for cat in [
            Category::Release,
            Category::Feature,
            Category::Update,
            Category::Bugfix,
            Category::Security,
            Category::Documentation,
            Category::Announcement,
            Category::Other,
        ] {
            assert_eq!(cat.as_str().parse::<Category>().unwrap(), cat);
        }
    }

    #[test]
    fn report_filters_by_importance() {
        let mut a = NewsItem::new("a", "https://a", "tool-a", "gemini_search");
        a.importance = Importance::Critical;
        let mut b = NewsItem::new("b", "https://b", "tool-b", "gemini_search");
        b.importance = Importance::Low;
        let c = NewsItem::new("c", "https://c", "tool-a", "gemini_search");

        let report = DailyReport::new(
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            vec![a, b, c],
        );

        assert_eq!(report.by_tool("tool-a").len(), 2);
        assert_eq!(report.by_importance(Importance::Low).len(), 1);
        assert_eq!(report.critical_and_high().len(), 1);
    }
}
