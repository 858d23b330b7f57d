// Wire models for the CarLo WebAPI.
//
// Delivery records are kept schema-less: the upstream object is stored
// verbatim and fields are looked up by name at query time.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One tracked parcel as returned by `SsccCurrent`.
///
/// Wraps the raw JSON object so unknown fields survive a round trip to
/// HTTP consumers untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryRecord(Map<String, Value>);

impl DeliveryRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// String form of a field. Missing keys and `null` read as `""`,
    /// strings are returned as is, everything else as compact JSON.
    pub fn field(&self, name: &str) -> Cow<'_, str> {
        match self.0.get(name) {
            None | Some(Value::Null) => Cow::Borrowed(""),
            Some(Value::String(s)) => Cow::Borrowed(s.as_str()),
            Some(other) => Cow::Owned(other.to_string()),
        }
    }
}

/// Body of a successful `POST /login`.
#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Body of a successful `GET /api/Scannerapp/v1/SsccCurrent/0`.
///
/// Entries are kept as raw values so one malformed element does not
/// discard the whole cycle.
#[derive(Debug, Deserialize)]
pub(crate) struct SsccCurrentResponse {
    #[serde(default, rename = "ssccCurrent")]
    pub sscc_current: Option<Vec<Value>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(value: Value) -> DeliveryRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn field_reads_strings_verbatim() {
        let r = record(json!({ "code": "A1", "statusText": "Zugestellt" }));
        assert_eq!(r.field("statusText"), "Zugestellt");
    }

    #[test]
    fn missing_and_null_fields_are_empty() {
        let r = record(json!({ "code": "A1", "location1": null }));
        assert_eq!(r.field("location1"), "");
        assert_eq!(r.field("nope"), "");
    }

    #[test]
    fn non_string_fields_use_json_text() {
        let r = record(json!({ "weight": 12, "fragile": true, "dims": [1, 2] }));
        assert_eq!(r.field("weight"), "12");
        assert_eq!(r.field("fragile"), "true");
        assert_eq!(r.field("dims"), "[1,2]");
    }

    #[test]
    fn sscc_response_tolerates_missing_array() {
        let body: SsccCurrentResponse = serde_json::from_str("{}").unwrap();
        assert!(body.sscc_current.is_none());

        let body: SsccCurrentResponse =
            serde_json::from_str(r#"{"ssccCurrent": null}"#).unwrap();
        assert!(body.sscc_current.is_none());
    }
}
