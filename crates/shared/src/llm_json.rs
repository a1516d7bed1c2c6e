//! Parsing JSON arrays out of free-form model output.
//!
//! Both LLM calls in the pipeline ask for a JSON array but get back prose:
//! sometimes bare JSON, sometimes JSON inside a ```json fence, sometimes
//! neither. This module is the one place that deals with that. A response
//! that yields no JSON is an explicit error; callers decide what skipping
//! that response means.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

/// Parse a model response expected to contain a JSON array of `T`.
///
/// Tries a strict parse of the whole text first. On failure, extracts one
/// ```json-fenced region and retries once. A single top-level object is
/// accepted and wrapped into a one-element array.
pub fn parse_items<T: DeserializeOwned>(text: &str) -> Result<Vec<T>> {
    if let Ok(items) = parse_array(text) {
        return Ok(items);
    }

    let fenced = extract_fenced_json(text)
        .context("Response did not contain parseable JSON")?;

    parse_array(fenced).context("Fenced block did not contain a valid JSON array")
}

fn parse_array<T: DeserializeOwned>(text: &str) -> Result<Vec<T>> {
    let value: serde_json::Value = serde_json::from_str(text.trim())?;
    let items = match value {
        serde_json::Value::Array(_) => serde_json::from_value(value)?,
        // Single object: treat as a one-element array
        other => vec![serde_json::from_value(other)?],
    };
    Ok(items)
}

/// Pull the contents of the first ```json fence out of the text, if any.
fn extract_fenced_json(text: &str) -> Option<&str> {
    let start = text.find("```json")? + "```json".len();
    let rest = &text[start..];
    let end = rest.find("```")?;
    Some(rest[..end].trim())
}
