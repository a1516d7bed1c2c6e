use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

use crate::models::ToolConfig;

/// API credentials, resolved once at startup and passed explicitly into each
/// client.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub anthropic_api_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Try to load .env from multiple locations
        Self::try_load_dotenv();

        let gemini_api_key = env::var("GEMINI_API_KEY").context(
            "GEMINI_API_KEY not found.\n\n\
            To fix this, create ~/.config/ai-cli-news/.env with:\n  \
            GEMINI_API_KEY=your_key_here\n  \
            ANTHROPIC_API_KEY=your_key_here\n\n\
            Get your Gemini API key from: https://aistudio.google.com/apikey",
        )?;

        let anthropic_api_key = env::var("ANTHROPIC_API_KEY").context(
            "ANTHROPIC_API_KEY not found.\n\n\
            To fix this, create ~/.config/ai-cli-news/.env with:\n  \
            GEMINI_API_KEY=your_key_here\n  \
            ANTHROPIC_API_KEY=your_key_here\n\n\
            Get your Anthropic API key from: https://console.anthropic.com/settings/keys",
        )?;

        Ok(Self {
            gemini_api_key,
            anthropic_api_key,
        })
    }

    fn try_load_dotenv() {
        // Try locations in order of preference:

        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/ai-cli-news/.env (standard config location)
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("ai-cli-news").join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env (home directory)
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() && dotenvy::from_path(&home_path).is_ok() {
                return;
            }
        }

        // If none found, that's okay - environment variables might be set system-wide
    }
}

/// Search section of the tools file.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_max_results")]
    pub max_results_per_tool: usize,
}

fn default_max_results() -> usize {
    10
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_results_per_tool: default_max_results(),
        }
    }
}

/// Parsed YAML config: the list of monitored tools plus search settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsFile {
    #[serde(default)]
    pub tools: Vec<ToolConfig>,
    #[serde(default)]
    pub search: SearchSettings,
}

/// Load and parse the tools YAML file. A missing file or malformed YAML is a
/// fatal configuration error.
pub fn load_tools_file(path: impl AsRef<Path>) -> Result<ToolsFile> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Config file not found: {}", path.display()))?;

    let parsed: ToolsFile = serde_yaml::from_str(&content)
        .with_context(|| format!("Invalid YAML in config file: {}", path.display()))?;

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_tools_yaml_with_defaults() {
        let yaml = r#"
tools:
  - name: Claude Code
    vendor: Anthropic
    keywords: ["claude code", "anthropic cli"]
    search_queries:
      - "Claude Code release notes"
      - "Claude Code new features"
    official_links:
      - https://docs.anthropic.com/claude-code
  - name: Gemini CLI
search:
  max_results_per_tool: 5
"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let parsed = load_tools_file(file.path()).unwrap();
        assert_eq!(parsed.tools.len(), 2);
        assert_eq!(parsed.tools[0].search_queries.len(), 2);
        assert_eq!(parsed.tools[1].vendor, "");
        assert!(parsed.tools[1].search_queries.is_empty());
        assert_eq!(parsed.search.max_results_per_tool, 5);
    }

    #[test]
    fn missing_search_section_uses_default_cap() {
        let yaml = "tools:\n  - name: Aider\n";
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let parsed = load_tools_file(file.path()).unwrap();
        assert_eq!(parsed.search.max_results_per_tool, 10);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_tools_file("/nonexistent/tools.yaml").is_err());
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"tools: [unclosed").unwrap();
        assert!(load_tools_file(file.path()).is_err());
    }
}
