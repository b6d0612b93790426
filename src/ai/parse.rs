//! Salvage structured data out of generator output. The model may wrap the
//! JSON in markdown fences, prepend prose, or trail an explanation; each
//! strategy below either yields a typed array or passes to the next, and
//! only total failure is an error.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SalvageError {
    #[error("no JSON array found in response")]
    NoJsonArray,
}

lazy_static! {
    static ref FENCED_JSON_RE: Regex = Regex::new(r"(?s)```json\s*(.*?)\s*```").unwrap();
    static ref FENCED_ANY_RE: Regex = Regex::new(r"(?s)```\s*(.*?)\s*```").unwrap();
    static ref ARRAY_RE: Regex = Regex::new(r"(?s)\[\s*\{.*\}\s*\]").unwrap();
}

/// Ordered parse chain: fenced ```json block, any fenced block, the whole
/// text, then a bracket-delimited salvage. First array wins.
pub fn extract_json_array(text: &str) -> Result<Vec<Value>, SalvageError> {
    let candidates = [
        FENCED_JSON_RE
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string()),
        FENCED_ANY_RE
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string()),
        Some(text.to_string()),
        ARRAY_RE.find(text).map(|m| m.as_str().to_string()),
    ];

    for candidate in candidates.into_iter().flatten() {
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(&candidate) {
            return Ok(items);
        }
    }

    Err(SalvageError::NoJsonArray)
}

#[cfg(test)]
mod salvage_tests {
    use super::*;

    #[test]
    fn parses_fenced_json_block() {
        let text = "Here are the skills:\n```json\n[{\"name\": \"Rust\"}]\n```\nEnjoy!";
        let items = extract_json_array(text).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["name"], "Rust");
    }

    #[test]
    fn parses_plain_fenced_block() {
        let text = "```\n[{\"name\": \"Go\"}, {\"name\": \"SQL\"}]\n```";
        let items = extract_json_array(text).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn parses_bare_json() {
        let items = extract_json_array("[{\"name\": \"Python\"}]").unwrap();
        assert_eq!(items[0]["name"], "Python");
    }

    #[test]
    fn salvages_array_from_surrounding_prose() {
        let text = "Sure! Based on your profile: [{\"name\": \"Docker\"}] Hope that helps.";
        let items = extract_json_array(text).unwrap();
        assert_eq!(items[0]["name"], "Docker");
    }

    #[test]
    fn fenced_block_with_broken_json_falls_through_to_salvage() {
        // The fence contains junk but a valid array still appears in the text
        let text = "```json\n{not valid\n```\ntext [{\"name\": \"K8s\"}] more";
        let items = extract_json_array(text).unwrap();
        assert_eq!(items[0]["name"], "K8s");
    }

    #[test]
    fn rejects_text_without_any_array() {
        assert_eq!(
            extract_json_array("I could not produce a list, sorry."),
            Err(SalvageError::NoJsonArray)
        );
        assert_eq!(
            extract_json_array("{\"name\": \"an object, not an array\"}"),
            Err(SalvageError::NoJsonArray)
        );
    }
}
