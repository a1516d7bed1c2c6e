// Public modules
pub mod collector;
pub mod config;
pub mod llm_json;
pub mod models;
pub mod report;
pub mod summarizer;

// Re-export commonly used types
pub use collector::{collect_all_news, GeminiCollector};
pub use config::{load_tools_file, Config, SearchSettings, ToolsFile};
pub use models::{Category, DailyReport, Importance, NewsItem, ToolConfig};
pub use report::HtmlReportGenerator;
pub use summarizer::{summarize_news, ClaudeSummarizer};
