use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Fixed channel all state patches travel on.
pub const PATCH_CHANNEL: &str = "tabcast:state-patch";

/// Envelope type tag; messages on the channel without it are ignored.
pub const PATCH_MESSAGE_TYPE: &str = "state-patch";

/// Identifier of the subject a patch applies to, always carried as a string
/// on the wire regardless of what the caller passed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for SubjectId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SubjectId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

macro_rules! subject_id_from_int {
    ($($ty:ty),*) => {
        $(impl From<$ty> for SubjectId {
            fn from(value: $ty) -> Self {
                Self(value.to_string())
            }
        })*
    };
}

subject_id_from_int!(u32, u64, usize, i32, i64);

/// The cross-context wire format.
///
/// No sequence number is transmitted; `sentAtMs` is only a staleness hint
/// for consumers that want one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "subjectId")]
    pub subject_id: SubjectId,
    pub patch: Map<String, Value>,
    #[serde(rename = "sentAtMs", default, skip_serializing_if = "Option::is_none")]
    pub sent_at_ms: Option<i64>,
}

impl PatchEnvelope {
    /// Builds a well-formed envelope, coercing a non-object patch to an
    /// empty object. A malformed envelope is never forwarded.
    pub fn new(subject_id: impl Into<SubjectId>, patch: Value) -> Self {
        let patch = match patch {
            Value::Object(map) => map,
            other => {
                tracing::debug!(
                    got = %value_kind(&other),
                    "non-object patch coerced to empty object"
                );
                Map::new()
            }
        };

        Self {
            kind: PATCH_MESSAGE_TYPE.to_string(),
            subject_id: subject_id.into(),
            patch,
            sent_at_ms: Some(Utc::now().timestamp_millis()),
        }
    }

    pub fn is_state_patch(&self) -> bool {
        self.kind == PATCH_MESSAGE_TYPE
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_subject_id_is_string_coerced() {
        let envelope = PatchEnvelope::new(42u64, json!({"a": 1}));
        assert_eq!(envelope.subject_id.as_str(), "42");
    }

    #[test]
    fn test_non_object_patch_becomes_empty_object() {
        let envelope = PatchEnvelope::new("user-1", json!("not-an-object"));
        assert!(envelope.patch.is_empty());

        let envelope = PatchEnvelope::new("user-1", Value::Null);
        assert!(envelope.patch.is_empty());
    }

    #[test]
    fn test_wire_names_are_camel_case() {
        let envelope = PatchEnvelope::new("user-1", json!({"plan": "pro"}));
        let wire = serde_json::to_value(&envelope).unwrap();

        assert_eq!(wire["type"], "state-patch");
        assert_eq!(wire["subjectId"], "user-1");
        assert_eq!(wire["patch"]["plan"], "pro");
        assert!(wire["sentAtMs"].is_i64());
    }

    #[test]
    fn test_envelope_without_send_hint_still_parses() {
        let wire = json!({
            "type": "state-patch",
            "subjectId": "7",
            "patch": {"credits": 3}
        });
        let envelope: PatchEnvelope = serde_json::from_value(wire).unwrap();
        assert!(envelope.is_state_patch());
        assert_eq!(envelope.sent_at_ms, None);
    }
}
