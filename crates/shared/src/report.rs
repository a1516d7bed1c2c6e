use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{DailyReport, Importance, NewsItem};

/// How many past reports the index page lists.
const INDEX_LIMIT: usize = 30;

/// Summary banner numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportStats {
    pub total_count: usize,
    pub important_count: usize,
    pub tools_count: usize,
}

/// One row on the index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub date: String,
    pub ja_url: String,
    pub en_url: String,
}

/// Renders the per-language report pages and maintains the index page.
/// All HTML building is done in pure functions; file I/O stays in
/// `generate` and `update_index`.
pub struct HtmlReportGenerator {
    output_dir: PathBuf,
    github_repo: String,
}

impl HtmlReportGenerator {
    pub fn new(output_dir: impl Into<PathBuf>, github_repo: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            github_repo: github_repo.into(),
        }
    }

    /// Render one HTML file per language plus the index page. Re-running for
    /// the same date overwrites the previous files.
    pub fn generate(
        &self,
        report: &DailyReport,
        languages: &[&str],
    ) -> Result<Vec<(String, PathBuf)>> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create output directory: {}", self.output_dir.display())
        })?;

        let groups = group_by_tool(&report.news_items);
        let stats = compute_stats(&report.news_items, &groups);
        let generated_at = report.generated_at.format("%Y-%m-%d %H:%M:%S").to_string();

        let mut generated_files = Vec::new();
        for lang in languages {
            let html = render_report(
                report.date,
                lang,
                &groups,
                stats,
                &generated_at,
                &self.github_repo,
            );

            let filename = format!("{}_{}.html", report.date.format("%Y-%m-%d"), lang);
            let output_path = self.output_dir.join(&filename);
            fs::write(&output_path, html)
                .with_context(|| format!("Failed to write report: {}", output_path.display()))?;
            println!("Generated: {}", output_path.display());

            generated_files.push((lang.to_string(), output_path));
        }

        self.update_index()?;

        Ok(generated_files)
    }

    /// Rewrite the index page from whatever dated reports exist on disk.
    pub fn update_index(&self) -> Result<()> {
        let index_path = match self.output_dir.parent() {
            Some(parent) => parent.join("index.html"),
            None => self.output_dir.join("index.html"),
        };

        let reports_dir_name = self
            .output_dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("reports")
            .to_string();

        let dates = list_report_dates(&self.output_dir)?;
        let entries: Vec<IndexEntry> = dates
            .into_iter()
            .take(INDEX_LIMIT)
            .map(|date| IndexEntry {
                ja_url: format!("{}/{}_ja.html", reports_dir_name, date),
                en_url: format!("{}/{}_en.html", reports_dir_name, date),
                date,
            })
            .collect();

        let html = render_index(&entries);
        fs::write(&index_path, html)
            .with_context(|| format!("Failed to write index: {}", index_path.display()))?;
        println!("Updated: {}", index_path.display());

        Ok(())
    }
}

/// Dates of previously generated reports, newest first, derived from the
/// `{date}_ja.html` filenames in the output directory.
pub fn list_report_dates(output_dir: &Path) -> Result<Vec<String>> {
    let mut dates = Vec::new();

    if output_dir.exists() {
        for entry in fs::read_dir(output_dir).context("Failed to read output directory")? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                if let Some(date) = name.strip_suffix("_ja.html") {
                    dates.push(date.to_string());
                }
            }
        }
    }

    // ISO dates sort lexicographically; newest first
    dates.sort_by(|a, b| b.cmp(a));
    Ok(dates)
}

/// Group items by tool name, groups ordered by first appearance, items kept
/// in their original relative order.
pub fn group_by_tool(items: &[NewsItem]) -> Vec<(String, Vec<&NewsItem>)> {
    let mut groups: Vec<(String, Vec<&NewsItem>)> = Vec::new();

    for item in items {
        match groups.iter_mut().find(|(name, _)| *name == item.tool_name) {
            Some((_, members)) => members.push(item),
            None => groups.push((item.tool_name.clone(), vec![item])),
        }
    }

    groups
}

pub fn compute_stats(items: &[NewsItem], groups: &[(String, Vec<&NewsItem>)]) -> ReportStats {
    let important_count = items
        .iter()
        .filter(|item| matches!(item.importance, Importance::Critical | Importance::High))
        .count();

    ReportStats {
        total_count: items.len(),
        important_count,
        tools_count: groups.len(),
    }
}

struct Labels {
    title: &'static str,
    stat_total: &'static str,
    stat_important: &'static str,
    stat_tools: &'static str,
    no_news: &'static str,
    generated: &'static str,
}

fn labels_for(lang: &str) -> Labels {
    if lang == "ja" {
        Labels {
            title: "AI CLIツール ニュースレポート",
            stat_total: "ニュース件数",
            stat_important: "重要ニュース",
            stat_tools: "対象ツール",
            no_news: "本日のニュースはありません。",
            generated: "生成日時",
        }
    } else {
        Labels {
            title: "AI CLI Tools News Report",
            stat_total: "News items",
            stat_important: "Critical & high",
            stat_tools: "Tools covered",
            no_news: "No news for this day.",
            generated: "Generated at",
        }
    }
}

fn format_report_date(date: NaiveDate, lang: &str) -> String {
    if lang == "ja" {
        date.format("%Y年%m月%d日").to_string()
    } else {
        date.format("%B %d, %Y").to_string()
    }
}

/// Render one language's report page as a self-contained HTML string.
pub fn render_report(
    date: NaiveDate,
    lang: &str,
    groups: &[(String, Vec<&NewsItem>)],
    stats: ReportStats,
    generated_at: &str,
    github_repo: &str,
) -> String {
    let labels = labels_for(lang);
    let date_str = date.format("%Y-%m-%d").to_string();
    let report_date = format_report_date(date, lang);

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n");
    html.push_str(&format!("<html lang=\"{}\">\n<head>\n", lang));
    html.push_str("  <meta charset=\"UTF-8\">\n");
    html.push_str("  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    html.push_str(&format!("  <title>{} - {}</title>\n", labels.title, report_date));
    html.push_str("  <style>\n");
    html.push_str(REPORT_CSS);
    html.push_str("  </style>\n</head>\n<body>\n<div class=\"container\">\n");

    // Header with language switcher
    html.push_str("<header>\n");
    html.push_str(&format!("  <h1>{}</h1>\n", labels.title));
    html.push_str(&format!("  <p class=\"report-date\">{}</p>\n", report_date));
    html.push_str("  <nav class=\"lang-switch\">\n");
    html.push_str(&format!(
        "    <a href=\"{}_ja.html\"{}>日本語</a>\n",
        date_str,
        if lang == "ja" { " class=\"active\"" } else { "" }
    ));
    html.push_str(&format!(
        "    <a href=\"{}_en.html\"{}>English</a>\n",
        date_str,
        if lang == "en" { " class=\"active\"" } else { "" }
    ));
    html.push_str("  </nav>\n</header>\n");

    // Summary banner
    html.push_str("<section class=\"stats\">\n");
    for (value, label) in [
        (stats.total_count, labels.stat_total),
        (stats.important_count, labels.stat_important),
        (stats.tools_count, labels.stat_tools),
    ] {
        html.push_str(&format!(
            "  <div class=\"stat\"><span class=\"stat-value\">{}</span><span class=\"stat-label\">{}</span></div>\n",
            value, label
        ));
    }
    html.push_str("</section>\n");

    if groups.is_empty() {
        html.push_str(&format!("<p class=\"empty\">{}</p>\n", labels.no_news));
    }

    // Per-tool sections
    for (tool_name, items) in groups {
        html.push_str("<section class=\"tool\">\n");
        html.push_str(&format!("  <h2>{}</h2>\n", escape_html(tool_name)));

        for item in items {
            html.push_str("  <article class=\"news-item\">\n");
            html.push_str(&format!(
                "    <span class=\"badge badge-{}\">{}</span>\n",
                item.importance, item.importance
            ));
            html.push_str(&format!(
                "    <span class=\"category\">{}</span>\n",
                item.category
            ));
            html.push_str(&format!(
                "    <h3><a href=\"{}\" target=\"_blank\">{}</a></h3>\n",
                escape_html(&item.url),
                escape_html(&item.title)
            ));

            let summary = if lang == "ja" {
                &item.summary_ja
            } else {
                &item.summary_en
            };
            // Fall back to the raw snippet for unenriched items
            let body = if summary.is_empty() { &item.content } else { summary };
            if !body.is_empty() {
                html.push_str(&format!("    <p>{}</p>\n", escape_html(body)));
            }

            if let Some(published) = item.published_at {
                html.push_str(&format!(
                    "    <p class=\"published\">{}</p>\n",
                    published.format("%Y-%m-%d")
                ));
            }

            if !item.tags.is_empty() {
                html.push_str("    <p class=\"tags\">");
                for tag in &item.tags {
                    html.push_str(&format!("<span class=\"tag\">{}</span>", escape_html(tag)));
                }
                html.push_str("</p>\n");
            }

            html.push_str("  </article>\n");
        }

        html.push_str("</section>\n");
    }

    // Footer
    html.push_str("<footer>\n");
    html.push_str(&format!(
        "  <p>{}: {}</p>\n",
        labels.generated, generated_at
    ));
    if !github_repo.is_empty() {
        html.push_str(&format!(
            "  <p><a href=\"https://github.com/{repo}\">{repo}</a></p>\n",
            repo = escape_html(github_repo)
        ));
    }
    html.push_str("</footer>\n");

    html.push_str("</div>\n</body>\n</html>");
    html
}

/// Render the index page listing past reports, newest first.
pub fn render_index(reports: &[IndexEntry]) -> String {
    let mut rows = String::new();
    for report in reports {
        rows.push_str(&format!(
            r#"
            <li class="report-item">
                <span class="report-date">{}</span>
                <span class="report-links">
                    <a href="{}">日本語</a>
                    <a href="{}">English</a>
                </span>
            </li>"#,
            escape_html(&report.date),
            escape_html(&report.ja_url),
            escape_html(&report.en_url)
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="ja">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>AI CLI Tools News</title>
    <style>
{}
    </style>
</head>
<body>
    <div class="container">
        <header>
            <h1>AI CLI Tools News</h1>
            <p class="subtitle">Daily news reports for AI-powered CLI development tools</p>
        </header>
        <ul class="report-list">{}
        </ul>
        <footer>
            <p>Updated daily at 9:00 AM JST</p>
        </footer>
    </div>
</body>
</html>"#,
        INDEX_CSS, rows
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const REPORT_CSS: &str = "\
    :root {
      --bg-primary: #0d1117; --bg-secondary: #161b22;
      --text-primary: #e6edf3; --text-secondary: #8b949e;
      --border-color: #30363d; --accent-blue: #58a6ff; --accent-purple: #a371f7;
      --critical: #f85149; --high: #d29922; --medium: #58a6ff; --low: #8b949e;
    }
    * { margin: 0; padding: 0; box-sizing: border-box; }
    body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
           background-color: var(--bg-primary); color: var(--text-primary); line-height: 1.6; }
    .container { max-width: 800px; margin: 0 auto; padding: 2rem; }
    header { text-align: center; margin-bottom: 2rem; }
    h1 { font-size: 2rem; margin-bottom: 0.5rem;
         background: linear-gradient(135deg, var(--accent-blue), var(--accent-purple));
         -webkit-background-clip: text; -webkit-text-fill-color: transparent; }
    .report-date { color: var(--text-secondary); }
    .lang-switch { margin-top: 1rem; }
    .lang-switch a { color: var(--accent-blue); text-decoration: none; margin: 0 0.5rem; }
    .lang-switch a.active { font-weight: 700; text-decoration: underline; }
    .stats { display: flex; gap: 1rem; justify-content: center; margin-bottom: 2rem; }
    .stat { background-color: var(--bg-secondary); border: 1px solid var(--border-color);
            border-radius: 8px; padding: 1rem 1.5rem; text-align: center; }
    .stat-value { display: block; font-size: 1.5rem; font-weight: 700; }
    .stat-label { color: var(--text-secondary); font-size: 0.85rem; }
    .empty { text-align: center; color: var(--text-secondary); margin: 3rem 0; }
    .tool { margin-bottom: 2rem; }
    .tool h2 { border-bottom: 1px solid var(--border-color); padding-bottom: 0.5rem;
               margin-bottom: 1rem; }
    .news-item { background-color: var(--bg-secondary); border: 1px solid var(--border-color);
                 border-radius: 8px; padding: 1rem 1.5rem; margin-bottom: 0.75rem; }
    .news-item h3 { margin: 0.5rem 0; }
    .news-item h3 a { color: var(--text-primary); text-decoration: none; }
    .news-item h3 a:hover { color: var(--accent-blue); }
    .badge { display: inline-block; padding: 0.1rem 0.6rem; border-radius: 999px;
             font-size: 0.75rem; font-weight: 600; text-transform: uppercase; color: #0d1117; }
    .badge-critical { background-color: var(--critical); }
    .badge-high { background-color: var(--high); }
    .badge-medium { background-color: var(--medium); }
    .badge-low { background-color: var(--low); }
    .category { color: var(--text-secondary); font-size: 0.8rem; margin-left: 0.5rem; }
    .published { color: var(--text-secondary); font-size: 0.85rem; }
    .tags { margin-top: 0.5rem; }
    .tag { display: inline-block; background-color: var(--bg-primary);
           border: 1px solid var(--border-color); border-radius: 999px;
           padding: 0.1rem 0.6rem; font-size: 0.75rem; margin-right: 0.4rem;
           color: var(--text-secondary); }
    footer { text-align: center; margin-top: 3rem; padding-top: 2rem;
             border-top: 1px solid var(--border-color); color: var(--text-secondary); }
    footer a { color: var(--accent-blue); text-decoration: none; }
";

const INDEX_CSS: &str = "\
        :root {
            --bg-primary: #0d1117; --bg-secondary: #161b22;
            --text-primary: #e6edf3; --text-secondary: #8b949e;
            --border-color: #30363d; --accent-blue: #58a6ff; --accent-purple: #a371f7;
        }
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
               background-color: var(--bg-primary); color: var(--text-primary); line-height: 1.6; }
        .container { max-width: 800px; margin: 0 auto; padding: 2rem; }
        header { text-align: center; margin-bottom: 3rem; }
        h1 { font-size: 2.5rem; margin-bottom: 0.5rem;
             background: linear-gradient(135deg, var(--accent-blue), var(--accent-purple));
             -webkit-background-clip: text; -webkit-text-fill-color: transparent; }
        .subtitle { color: var(--text-secondary); }
        .report-list { list-style: none; }
        .report-item { background-color: var(--bg-secondary); border: 1px solid var(--border-color);
                       border-radius: 8px; padding: 1rem 1.5rem; margin-bottom: 0.75rem;
                       display: flex; justify-content: space-between; align-items: center; }
        .report-item:hover { border-color: var(--accent-blue); }
        .report-date { font-weight: 600; }
        .report-links a { color: var(--accent-blue); text-decoration: none; margin-left: 1rem; }
        .report-links a:hover { text-decoration: underline; }
        footer { text-align: center; margin-top: 3rem; padding-top: 2rem;
                 border-top: 1px solid var(--border-color); color: var(--text-secondary); }
";
