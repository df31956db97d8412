// Data model for stories, parts, users and rendered part text, plus the
// JSON field helpers the hand-written parsers share.

pub mod page;
pub mod part;
pub mod search;
pub mod story;
pub mod user;

pub use page::{HtmlContent, HtmlStyle, HtmlWord, RenderedPage};
pub use part::{Part, PublishedPart};
pub use search::{AuthorName, StorySearchResults, StorySummary, Topic, UserSearchResults, UserSummary};
pub use story::Story;
pub use user::User;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{Result, WattpadError};

// ---------------------------------------------------------------------------
// JSON helpers
// ---------------------------------------------------------------------------

/// String value of `key`, treating a missing key and JSON null alike.
pub(crate) fn opt_str(obj: &Value, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Numeric id that the API sends either as a number or as a digit string.
pub(crate) fn id_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn opt_id(obj: &Value, key: &str) -> Option<u64> {
    obj.get(key).and_then(id_value)
}

pub(crate) fn req_id(obj: &Value, key: &str, what: &'static str) -> Result<u64> {
    opt_id(obj, key)
        .ok_or_else(|| WattpadError::parse(what, format!("missing or invalid '{key}' in {obj}")))
}

/// Serde adapter for ids that may arrive as strings.
pub(crate) fn de_id<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(0),
        other => id_value(&other)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid id: {other}"))),
    }
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Parse an API timestamp into a local date-time.
///
/// Offsets (`Z`, `+02:00`) are accepted and dropped, keeping the wall-clock
/// time as written. Seconds may be omitted. Offset-less ISO date-times are
/// accepted as-is.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M%#z") {
        return Ok(dt.naive_local());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .map_err(|_| WattpadError::parse("timestamp", format!("Could not parse date string: '{s}'")))
}

/// Timestamp at `key`; null or missing yields `None`.
pub(crate) fn opt_timestamp(obj: &Value, key: &str) -> Result<Option<NaiveDateTime>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => parse_timestamp(s).map(Some),
        Some(other) => Err(WattpadError::parse(
            "timestamp",
            format!("expected a string for '{key}', got {other}"),
        )),
    }
}
