//! A small structured document: a tag plus string attributes, shaped like a single XML element.
//! This is what gets handed to the host as an opaque state blob.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Document {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag == tag
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl ToString) {
        self.attributes.insert(key.into(), value.to_string());
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Missing or unparsable attributes read as 0.
    pub fn float_attribute(&self, key: &str) -> f32 {
        self.attribute(key)
            .and_then(|value| value.trim().parse::<f32>().ok())
            .filter(|value| value.is_finite())
            .unwrap_or(0.)
    }

    /// Missing or unparsable attributes read as 0. Fractional values are truncated.
    pub fn int_attribute(&self, key: &str) -> i32 {
        self.attribute(key)
            .map(str::trim)
            .and_then(|value| {
                value
                    .parse::<i32>()
                    .ok()
                    .or_else(|| value.parse::<f32>().ok().map(|v| v as i32))
            })
            .unwrap_or(0)
    }

    /// Missing attributes read as false.
    pub fn bool_attribute(&self, key: &str) -> bool {
        match self.attribute(key) {
            Some(value) => {
                let value = value.trim();
                value == "1"
                    || value.eq_ignore_ascii_case("true")
                    || value.eq_ignore_ascii_case("yes")
            }
            None => false,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        // Serializing a struct of strings into memory cannot fail.
        serde_json::to_vec(self).unwrap_or_default()
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, StateError> {
        if data.is_empty() {
            return Err(StateError::Empty);
        }
        serde_json::from_slice(data).map_err(|e| StateError::Malformed(e.to_string()))
    }
}

/// Reasons a persisted state blob can be rejected.
#[derive(Debug, PartialEq)]
pub enum StateError {
    Empty,
    Malformed(String),
    WrongTag { expected: String, found: String },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "state blob is empty"),
            Self::Malformed(msg) => write!(f, "malformed state blob: {}", msg),
            Self::WrongTag { expected, found } => {
                write!(f, "expected root tag {:?}, found {:?}", expected, found)
            }
        }
    }
}

impl std::error::Error for StateError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_round_trip() {
        let mut doc = Document::new("SimpleSynth");
        doc.set_attribute("level", 7.5);
        doc.set_attribute("waveform", "Square");

        let decoded = Document::from_bytes(&doc.to_bytes()).unwrap();
        assert_eq!(decoded, doc);
        assert!(decoded.has_tag("SimpleSynth"));
        assert_eq!(decoded.float_attribute("level"), 7.5);
        assert_eq!(decoded.attribute("waveform"), Some("Square"));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(Document::from_bytes(&[]), Err(StateError::Empty));
        assert!(matches!(
            Document::from_bytes(b"\x00\x01not a document"),
            Err(StateError::Malformed(_))
        ));
    }

    #[test]
    fn missing_attributes_read_as_zero_values() {
        let mut doc = Document::new("params");
        doc.set_attribute("number", "12.9");
        doc.set_attribute("flag", "yes");
        doc.set_attribute("junk", "abc");

        assert_eq!(doc.int_attribute("number"), 12);
        assert_eq!(doc.int_attribute("absent"), 0);
        assert_eq!(doc.float_attribute("junk"), 0.);
        assert!(doc.bool_attribute("flag"));
        assert!(!doc.bool_attribute("absent"));
    }
}
