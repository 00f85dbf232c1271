//! Loki push API payload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// `{"streams":[{"stream":{...},"values":[["<ns>","<line>"]]}]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LokiPush {
    pub streams: Vec<LokiStream>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LokiStream {
    pub stream: BTreeMap<String, String>,
    pub values: Vec<[String; 2]>,
}

impl LokiPush {
    /// One stream carrying one line.
    pub fn single(labels: BTreeMap<String, String>, timestamp_ns: i64, line: impl Into<String>) -> Self {
        Self {
            streams: vec![LokiStream {
                stream: labels,
                values: vec![[timestamp_ns.to_string(), line.into()]],
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_entry_shape() {
        let mut labels = BTreeMap::new();
        labels.insert("host".to_string(), "sign".to_string());
        let push = LokiPush::single(labels, 1_760_000_000_000_000_000, "booted");
        let json = serde_json::to_string(&push).unwrap();
        assert_eq!(
            json,
            r#"{"streams":[{"stream":{"host":"sign"},"values":[["1760000000000000000","booted"]]}]}"#
        );
    }

    #[test]
    fn test_control_characters_are_escaped() {
        let push = LokiPush::single(BTreeMap::new(), 1, "line one\nline\ttwo\u{1b}");
        let json = serde_json::to_string(&push).unwrap();
        assert!(json.contains(r#"line one\nline\ttwo\u001b"#));
        assert!(!json.contains('\n'));
    }
}
