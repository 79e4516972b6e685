//! JSON output formatting

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Wrapper for JSON output with metadata
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T> {
    pub data: T,

    pub meta: Metadata,
}

/// Metadata included in JSON output
#[derive(Debug, Serialize, Deserialize)]
pub struct Metadata {
    /// RFC 3339 time the output was produced
    pub timestamp: String,

    /// CLI version
    pub version: String,

    /// Cache tier that answered, for cached reads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl<T> JsonOutput<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            meta: Metadata {
                timestamp: Utc::now().to_rfc3339(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                source: None,
            },
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.meta.source = Some(source.into());
        self
    }
}

/// Format data as pretty-printed JSON
pub fn format_json<T: Serialize + ?Sized>(data: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonOutput::new(data))
}

/// Format data as pretty-printed JSON, recording which cache tier answered
pub fn format_json_with_source<T: Serialize + ?Sized>(
    data: &T,
    source: &str,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonOutput::new(data).with_source(source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize)]
    struct Item {
        id: String,
    }

    #[test]
    fn test_envelope_fields() {
        let result = format_json(&vec![Item { id: "1".to_string() }]).unwrap();

        assert!(result.contains("\"data\""));
        assert!(result.contains("\"id\": \"1\""));
        assert!(result.contains("\"timestamp\""));
        assert!(result.contains(env!("CARGO_PKG_VERSION")));
        assert!(!result.contains("\"source\""));
    }

    #[test]
    fn test_empty_vec() {
        let items: Vec<Item> = vec![];
        assert!(format_json(&items).unwrap().contains("\"data\": []"));
    }

    #[test]
    fn test_source_recorded() {
        let result = format_json_with_source(&Vec::<Item>::new(), "stale").unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["meta"]["source"], "stale");
    }
}
