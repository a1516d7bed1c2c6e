use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::llm_json;
use crate::models::{Category, Importance, NewsItem};

/// Items per summarization request, to bound prompt size.
const BATCH_SIZE: usize = 10;

/// Snippet bytes sent per item.
const CONTENT_LIMIT: usize = 500;

#[derive(Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<Content>,
}

#[derive(Deserialize)]
struct Content {
    text: String,
}

/// One enrichment row from the model, keyed by position within the batch.
#[derive(Debug, Deserialize)]
struct BatchResult {
    id: usize,
    #[serde(default)]
    summary_ja: String,
    #[serde(default)]
    summary_en: String,
    #[serde(default = "default_importance")]
    importance: String,
    #[serde(default = "default_category")]
    category: String,
    #[serde(default)]
    tags: Vec<String>,
}

fn default_importance() -> String {
    "medium".to_string()
}

fn default_category() -> String {
    "other".to_string()
}

/// Summarizes and classifies collected news with the Claude messages API.
pub struct ClaudeSummarizer {
    client: Client,
    api_key: String,
    model: String,
}

impl ClaudeSummarizer {
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            model: "claude-sonnet-4-20250514".to_string(),
        })
    }

    /// Enrich every item with summaries, importance, category and tags.
    /// Works in batches; a failed batch is logged and passed through
    /// unenriched so the rest of the run survives.
    pub async fn summarize_and_categorize(&self, mut news_items: Vec<NewsItem>) -> Vec<NewsItem> {
        for (batch_no, batch) in news_items.chunks_mut(BATCH_SIZE).enumerate() {
            if let Err(e) = self.process_batch(batch).await {
                eprintln!("Claude API error on batch {}: {:#}", batch_no, e);
            }
        }
        news_items
    }

    async fn process_batch(&self, batch: &mut [NewsItem]) -> Result<()> {
        let items_data: Vec<serde_json::Value> = batch
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                serde_json::json!({
                    "id": idx,
                    "title": item.title,
                    "url": item.url,
                    "tool_name": item.tool_name,
                    "content": truncate_on_char_boundary(&item.content, CONTENT_LIMIT),
                })
            })
            .collect();

        let prompt = build_summary_prompt(&items_data)?;

        let request = ClaudeRequest {
            model: self.model.clone(),
            max_tokens: 4096,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt,
            }],
        };

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Claude API")?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("Claude API error: {}", error_text);
        }

        let claude_response = response
            .json::<ClaudeResponse>()
            .await
            .context("Failed to parse Claude API response")?;

        let response_text = claude_response
            .content
            .first()
            .map(|c| c.text.as_str())
            .unwrap_or("");

        let results: Vec<BatchResult> = llm_json::parse_items(response_text)
            .context("Unparseable summarization response")?;

        merge_results(batch, results)
    }
}

/// Apply enrichment rows to the batch by positional id. Items with no
/// matching id keep their defaults. Unrecognized importance/category strings
/// fail the whole merge before any item is touched, so a batch is either
/// enriched consistently or not at all.
fn merge_results(batch: &mut [NewsItem], results: Vec<BatchResult>) -> Result<()> {
    let mut parsed: HashMap<usize, (String, String, Importance, Category, Vec<String>)> =
        HashMap::new();

    for r in results {
        let importance: Importance = r
            .importance
            .parse()
            .with_context(|| format!("Bad importance for id {}", r.id))?;
        let category: Category = r
            .category
            .parse()
            .with_context(|| format!("Bad category for id {}", r.id))?;
        parsed.insert(r.id, (r.summary_ja, r.summary_en, importance, category, r.tags));
    }

    for (idx, item) in batch.iter_mut().enumerate() {
        if let Some((summary_ja, summary_en, importance, category, tags)) = parsed.remove(&idx) {
            item.summary_ja = summary_ja;
            item.summary_en = summary_en;
            item.importance = importance;
            item.category = category;
            item.tags = tags;
        }
    }

    Ok(())
}

/// Truncate to at most `limit` bytes without splitting a UTF-8 character.
fn truncate_on_char_boundary(content: &str, limit: usize) -> &str {
    if content.len() <= limit {
        return content;
    }
    let mut end = limit;
    while end > 0 && !content.is_char_boundary(end) {
        end -= 1;
    }
    &content[..end]
}

fn build_summary_prompt(items_data: &[serde_json::Value]) -> Result<String> {
    let items_json = serde_json::to_string_pretty(items_data)
        .context("Failed to serialize batch payload")?;

    Ok(format!(
        r#"以下のAI開発ツールに関するニュース項目を分析して、日本語と英語の要約を作成し、重要度とカテゴリを判定してください。

ニュース項目:
```json
{}
```

各ニュースについて以下のJSON形式で返してください:
```json
[
  {{
    "id": 0,
    "summary_ja": "日本語の要約（2-3文）",
    "summary_en": "English summary (2-3 sentences)",
    "importance": "critical|high|medium|low",
    "category": "release|feature|update|bugfix|security|documentation|announcement|other",
    "tags": ["タグ1", "タグ2"]
  }}
]
```

重要度の基準:
- critical: メジャーバージョンリリース、重大な機能変更、セキュリティ脆弱性
- high: 新機能追加、重要なアップデート、パフォーマンス改善
- medium: バグ修正、マイナーアップデート
- low: ドキュメント更新、軽微な変更

カテゴリの基準:
- release: 新バージョンリリース
- feature: 新機能追加
- update: アップデート・改善
- bugfix: バグ修正
- security: セキュリティ関連
- documentation: ドキュメント更新
- announcement: 発表・お知らせ
- other: その他"#,
        items_json
    ))
}

/// Helper mirroring `collect_all_news`: build a summarizer and run every
/// batch.
pub async fn summarize_news(news_items: Vec<NewsItem>, api_key: String) -> Result<Vec<NewsItem>> {
    if news_items.is_empty() {
        return Ok(news_items);
    }
    let summarizer = ClaudeSummarizer::new(api_key)?;
    Ok(summarizer.summarize_and_categorize(news_items).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch_of(n: usize) -> Vec<NewsItem> {
        (0..n)
            .map(|i| {
                NewsItem::new(
                    format!("Title {}", i),
                    format!("https://example.com/{}", i),
                    "Claude Code",
                    "gemini_search",
                )
            })
            .collect()
    }

    fn result(id: usize, importance: &str, category: &str) -> BatchResult {
        BatchResult {
            id,
            summary_ja: format!("要約{}", id),
            summary_en: format!("Summary {}", id),
            importance: importance.to_string(),
            category: category.to_string(),
            tags: vec!["cli".to_string()],
        }
    }

    #[test]
    fn merge_overwrites_matching_ids() {
        let mut batch = batch_of(2);
        merge_results(
            &mut batch,
            vec![result(0, "high", "release"), result(1, "low", "bugfix")],
        )
        .unwrap();

        assert_eq!(batch[0].importance, Importance::High);
        assert_eq!(batch[0].category, Category::Release);
        assert_eq!(batch[0].summary_en, "Summary 0");
        assert_eq!(batch[1].importance, Importance::Low);
    }

    #[test]
    fn missing_id_leaves_item_untouched() {
        let mut batch = batch_of(5);
        // Response omits id=3
        let results = vec![
            result(0, "high", "feature"),
            result(1, "medium", "update"),
            result(2, "low", "documentation"),
            result(4, "critical", "security"),
        ];
        merge_results(&mut batch, results).unwrap();

        assert_eq!(batch[3].importance, Importance::Medium);
        assert_eq!(batch[3].category, Category::Other);
        assert!(batch[3].summary_ja.is_empty());
        assert_eq!(batch[4].importance, Importance::Critical);
    }

    #[test]
    fn unknown_enum_fails_merge_without_partial_enrichment() {
        let mut batch = batch_of(2);
        let results = vec![result(0, "high", "release"), result(1, "urgent", "release")];

        assert!(merge_results(&mut batch, results).is_err());
        // Nothing was applied, not even the valid row
        assert!(batch[0].summary_en.is_empty());
        assert_eq!(batch[0].importance, Importance::Medium);
    }

    #[test]
    fn default_enum_strings_merge_cleanly() {
        // "medium"/"other" are what the model sends for unremarkable items;
        // they must enrich, not discard the batch
        let mut batch = batch_of(1);
        merge_results(&mut batch, vec![result(0, "medium", "other")]).unwrap();

        assert_eq!(batch[0].importance, Importance::Medium);
        assert_eq!(batch[0].category, Category::Other);
        assert_eq!(batch[0].summary_en, "Summary 0");
    }

    #[test]
    fn out_of_range_ids_are_ignored() {
        let mut batch = batch_of(1);
        merge_results(&mut batch, vec![result(7, "high", "release")]).unwrap();
        assert_eq!(batch[0].importance, Importance::Medium);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let ascii = "a".repeat(600);
        assert_eq!(truncate_on_char_boundary(&ascii, 500).len(), 500);

        // Multibyte text must not be split mid-character
        let ja = "日".repeat(200); // 600 bytes
        let cut = truncate_on_char_boundary(&ja, 500);
        assert!(cut.len() <= 500);
        assert!(cut.chars().all(|c| c == '日'));

        let short = "short";
        assert_eq!(truncate_on_char_boundary(short, 500), "short");
    }
}
