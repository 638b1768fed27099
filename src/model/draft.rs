// File: src/model/draft.rs
//! The schedule entry as reconstructed from model output.
//!
//! Every text field is kept as a raw string so that in-progress previews can
//! carry whatever the model has written so far. Decoding is lenient: `null`,
//! missing keys and non-string scalars never fail the parse.
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Sentinel written into a field that failed validation on a complete record.
pub const INVALID: &str = "INVALID";

fn default_complete() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntryDraft {
    #[serde(default, deserialize_with = "lenient_string")]
    pub host: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub day: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub start_time: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub end_time: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub link: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mode: String,
    #[serde(default, deserialize_with = "lenient_id")]
    pub course_id: i64,
    /// Only an explicit `false` marks the record as still streaming.
    #[serde(default = "default_complete", deserialize_with = "unless_false")]
    pub complete: bool,
    /// Only an explicit `true` marks the first preview of a fresh record.
    #[serde(default, deserialize_with = "only_true")]
    pub new: bool,
}

impl Default for ScheduleEntryDraft {
    fn default() -> Self {
        Self {
            host: String::new(),
            day: String::new(),
            start_time: String::new(),
            end_time: String::new(),
            location: String::new(),
            link: String::new(),
            mode: String::new(),
            course_id: 0,
            complete: true,
            new: false,
        }
    }
}

impl ScheduleEntryDraft {
    /// True when any field carries the `INVALID` sentinel.
    pub fn has_invalid_fields(&self) -> bool {
        [
            &self.host,
            &self.day,
            &self.start_time,
            &self.end_time,
            &self.location,
            &self.link,
            &self.mode,
        ]
        .iter()
        .any(|v| v.as_str() == INVALID)
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

fn lenient_id<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n.as_i64().unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    })
}

fn unless_false<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(!matches!(Value::deserialize(d)?, Value::Bool(false)))
}

fn only_true<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(matches!(Value::deserialize(d)?, Value::Bool(true)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_flags_default_to_complete_and_not_new() {
        let d: ScheduleEntryDraft = serde_json::from_str(r#"{"host": "Prof Lee"}"#).unwrap();
        assert!(d.complete);
        assert!(!d.new);
        assert_eq!(d.day, "");
    }

    #[test]
    fn test_only_literal_booleans_flip_flags() {
        let d: ScheduleEntryDraft =
            serde_json::from_str(r#"{"complete": "false", "new": "true"}"#).unwrap();
        assert!(d.complete);
        assert!(!d.new);

        let d: ScheduleEntryDraft =
            serde_json::from_str(r#"{"complete": false, "new": true}"#).unwrap();
        assert!(!d.complete);
        assert!(d.new);
    }

    #[test]
    fn test_lenient_scalars() {
        let d: ScheduleEntryDraft = serde_json::from_str(
            r#"{"host": null, "location": 5200, "course_id": "42", "extra": [1, 2]}"#,
        )
        .unwrap();
        assert_eq!(d.host, "");
        assert_eq!(d.location, "5200");
        assert_eq!(d.course_id, 42);
    }

    #[test]
    fn test_has_invalid_fields() {
        let mut d = ScheduleEntryDraft::default();
        assert!(!d.has_invalid_fields());
        d.link = INVALID.to_string();
        assert!(d.has_invalid_fields());
    }
}
