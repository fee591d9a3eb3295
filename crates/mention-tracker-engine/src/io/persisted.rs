use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::io::CodecError;
use crate::models::{MentionState, Span, UserId};

/// Flat record stored per mention.
///
/// Deserialization never fails for an individual record: missing or
/// mistyped fields become zero (or empty), numeric strings are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct PersistedSpan {
    pub flag: i32,
    pub rule: String,
    pub user_id: UserId,
    pub user_name: String,
    pub start_pos: i64,
    pub end_pos: i64,
}

impl From<Value> for PersistedSpan {
    fn from(value: Value) -> Self {
        let Value::Object(object) = value else {
            return Self::default();
        };
        Self {
            flag: i32::try_from(opt_i64(&object, "flag")).unwrap_or(0),
            rule: opt_string(&object, "rule"),
            user_id: opt_i64(&object, "user_id"),
            user_name: opt_string(&object, "user_name"),
            start_pos: opt_i64(&object, "start_pos"),
            end_pos: opt_i64(&object, "end_pos"),
        }
    }
}

fn opt_i64(object: &Map<String, Value>, key: &str) -> i64 {
    match object.get(key) {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64))
            .unwrap_or(0),
        Some(Value::String(text)) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().map(|float| float as i64))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

fn opt_string(object: &Map<String, Value>, key: &str) -> String {
    match object.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Record for `span`
pub fn to_persisted(span: &Span) -> PersistedSpan {
    PersistedSpan {
        flag: span.state.flag(),
        rule: span.trigger.clone(),
        user_id: span.user_id,
        user_name: span.display_text.clone(),
        start_pos: span.start as i64,
        end_pos: span.end as i64,
    }
}

/// Span for `record`. Negative offsets clamp to zero; an end before the
/// start is malformed and zero-fills both offsets.
pub fn from_persisted(record: &PersistedSpan) -> Span {
    let start = usize::try_from(record.start_pos).unwrap_or(0);
    let end = usize::try_from(record.end_pos).unwrap_or(0);
    let (start, end) = if end < start { (0, 0) } else { (start, end) };
    Span {
        user_id: record.user_id,
        display_text: record.user_name.clone(),
        trigger: record.rule.clone(),
        start,
        end,
        state: MentionState::from_flag(record.flag),
    }
}

impl From<&Span> for PersistedSpan {
    fn from(span: &Span) -> Self {
        to_persisted(span)
    }
}

impl From<&PersistedSpan> for Span {
    fn from(record: &PersistedSpan) -> Self {
        from_persisted(record)
    }
}

/// Encode spans as a JSON array of records
pub fn records_to_json<'a>(spans: impl IntoIterator<Item = &'a Span>) -> Result<String, CodecError> {
    let records: Vec<PersistedSpan> = spans.into_iter().map(to_persisted).collect();
    Ok(serde_json::to_string(&records)?)
}

/// Decode a JSON array of records. Only a document that is not an array fails.
pub fn records_from_json(json: &str) -> Result<Vec<PersistedSpan>, CodecError> {
    Ok(serde_json::from_str(json)?)
}
