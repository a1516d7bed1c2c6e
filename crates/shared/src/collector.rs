use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDate};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::llm_json;
use crate::models::{NewsItem, ToolConfig};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<RequestContent>,
    tools: Vec<RequestTool>,
}

#[derive(Serialize)]
struct RequestContent {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct RequestTool {
    google_search: GoogleSearch,
}

// Serializes as `{}`, which is all the grounding directive needs
#[derive(Serialize)]
struct GoogleSearch {}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

/// Collects news by asking Gemini to run a Google-Search-grounded query and
/// return the hits as a JSON array.
pub struct GeminiCollector {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiCollector {
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            model: "gemini-2.0-flash".to_string(),
        })
    }

    /// Search for news about one tool. Each configured query is issued
    /// separately; a failed query logs and contributes nothing. Results are
    /// deduplicated by URL and capped at `max_results`.
    pub async fn search_tool_news(
        &self,
        tool_config: &ToolConfig,
        days_back: i64,
        max_results: usize,
    ) -> Vec<NewsItem> {
        let date_filter = (Local::now().date_naive() - Duration::days(days_back))
            .format("%Y-%m-%d")
            .to_string();

        let mut news_items: Vec<NewsItem> = Vec::new();
        for query in &tool_config.search_queries {
            match self
                .search_and_parse(query, &tool_config.name, &date_filter, max_results)
                .await
            {
                Ok(items) => news_items.extend(items),
                Err(e) => eprintln!("Error searching for '{}': {:#}", query, e),
            }
        }

        let mut unique = dedup_by_url(news_items);
        unique.truncate(max_results);
        unique
    }

    async fn search_and_parse(
        &self,
        query: &str,
        tool_name: &str,
        date_filter: &str,
        max_results: usize,
    ) -> Result<Vec<NewsItem>> {
        let prompt = build_search_prompt(query, date_filter, max_results);

        let request = GeminiRequest {
            contents: vec![RequestContent {
                parts: vec![Part { text: prompt }],
            }],
            tools: vec![RequestTool {
                google_search: GoogleSearch {},
            }],
        };

        let url = format!("{}/{}:generateContent", GEMINI_API_BASE, self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Gemini API")?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("Gemini API error: {}", error_text);
        }

        let gemini_response = response
            .json::<GeminiResponse>()
            .await
            .context("Failed to parse Gemini API response")?;

        let text = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Ok(Vec::new());
        }

        let entries: Vec<serde_json::Value> = llm_json::parse_items(&text)
            .with_context(|| format!("Unparseable search response for '{}'", query))?;

        Ok(parse_entries(entries, tool_name))
    }
}

/// Turn raw response entries into NewsItems. Entries without a non-empty
/// title and url are dropped.
fn parse_entries(entries: Vec<serde_json::Value>, tool_name: &str) -> Vec<NewsItem> {
    let mut items = Vec::new();

    for entry in entries {
        let title = entry.get("title").and_then(|v| v.as_str()).unwrap_or("");
        let url = entry.get("url").and_then(|v| v.as_str()).unwrap_or("");
        if title.is_empty() || url.is_empty() {
            continue;
        }

        let mut item = NewsItem::new(title, url, tool_name, "gemini_search");
        item.published_at = entry
            .get("published_date")
            .and_then(|v| v.as_str())
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
        item.content = entry
            .get("snippet")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        item.raw_data = entry;

        items.push(item);
    }

    items
}

/// Deduplicate by exact URL match, first occurrence wins, order preserved.
pub fn dedup_by_url(items: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut seen: HashSet<String> = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.url.clone()))
        .collect()
}

fn build_search_prompt(query: &str, date_filter: &str, max_results: usize) -> String {
    format!(
        r#"You are a tech news researcher. Search for the latest news and updates about:
"{}"

Focus on:
- Official announcements and releases
- Blog posts from the official website
- News articles from tech media
- GitHub releases and updates

Filter for news from {} onwards.

For each news item found, provide in JSON format:
```json
[
  {{
    "title": "News title",
    "url": "https://...",
    "published_date": "YYYY-MM-DD",
    "snippet": "Brief description of the news (2-3 sentences)"
  }}
]
```

Return up to {} most relevant and recent items.
If no recent news is found, return an empty array: []"#,
        query, date_filter, max_results
    )
}

/// Collect news for every configured tool, sequentially. Per-tool results are
/// concatenated; there is no cross-tool cap.
pub async fn collect_all_news(
    api_key: String,
    tool_configs: &[ToolConfig],
    days_back: i64,
    max_results_per_tool: usize,
) -> Result<Vec<NewsItem>> {
    let collector = GeminiCollector::new(api_key)?;
    let mut all_news: Vec<NewsItem> = Vec::new();

    for config in tool_configs {
        println!("Collecting news for: {}", config.name);
        let news = collector
            .search_tool_news(config, days_back, max_results_per_tool)
            .await;
        println!("  Found {} items", news.len());
        all_news.extend(news);
    }

    Ok(all_news)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(url: &str, title: &str) -> NewsItem {
        NewsItem::new(title, url, "Claude Code", "gemini_search")
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let items = vec![
            item("https://example.com/a", "First title"),
            item("https://example.com/b", "Other"),
            item("https://example.com/a", "Different title, same url"),
        ];

        let unique = dedup_by_url(items);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].title, "First title");
        assert_eq!(unique[1].url, "https://example.com/b");
    }

    #[test]
    fn dedup_preserves_order() {
        let items = vec![
            item("https://c", "c"),
            item("https://a", "a"),
            item("https://b", "b"),
            item("https://a", "dup"),
        ];
        let urls: Vec<String> = dedup_by_url(items).into_iter().map(|i| i.url).collect();
        assert_eq!(urls, vec!["https://c", "https://a", "https://b"]);
    }

    #[test]
    fn entries_missing_title_or_url_are_dropped() {
        let entries = vec![
            json!({"title": "Good", "url": "https://x", "snippet": "s"}),
            json!({"title": "", "url": "https://y"}),
            json!({"url": "https://z"}),
            json!({"title": "No url"}),
        ];

        let items = parse_entries(entries, "Aider");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Good");
        assert_eq!(items[0].tool_name, "Aider");
        assert_eq!(items[0].source, "gemini_search");
    }

    #[test]
    fn published_date_parses_or_is_ignored() {
        let entries = vec![
            json!({"title": "a", "url": "https://a", "published_date": "2025-06-02"}),
            json!({"title": "b", "url": "https://b", "published_date": "June 2nd"}),
        ];

        let items = parse_entries(entries, "Aider");
        assert_eq!(
            items[0].published_at,
            NaiveDate::from_ymd_opt(2025, 6, 2)
        );
        assert_eq!(items[1].published_at, None);
    }

    #[test]
    fn raw_entry_is_kept_as_provenance() {
        let entries = vec![json!({"title": "a", "url": "https://a", "extra": 42})];
        let items = parse_entries(entries, "Aider");
        assert_eq!(items[0].raw_data["extra"], 42);
    }

    #[test]
    fn search_prompt_mentions_query_and_window() {
        let prompt = build_search_prompt("Claude Code release", "2025-06-01", 10);
        assert!(prompt.contains("\"Claude Code release\""));
        assert!(prompt.contains("from 2025-06-01 onwards"));
        assert!(prompt.contains("up to 10 most relevant"));
    }
}
