//! The payload document: an open-schema typed view over a `serde_json::Value`
//! tree. Unrecognised keys at any level are accepted and ignored rather than
//! rejected, per SPEC_FULL §9.

use serde_json::{Map, Value};

use crate::checksum::Checksum;

/// A field descriptor: `{"name": ..., "sensor": ..., "format": ...}`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub sensor: Option<String>,
    pub format: Option<String>,
}

impl FieldDescriptor {
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let name = obj.get("name")?.as_str()?.to_string();
        let sensor = obj.get("sensor").and_then(Value::as_str).map(str::to_string);
        let format = obj.get("format").and_then(Value::as_str).map(str::to_string);
        Some(FieldDescriptor {
            name,
            sensor,
            format,
        })
    }
}

/// A filter descriptor: `{"filter": ..., "type": ..., ...params}`. `filter`
/// is absent on descriptors the pipeline isn't meant to act on at all (e.g.
/// `{"type": "hotfix", ...}`), so it is optional here and only consulted
/// once `kind == "normal"`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterDescriptor {
    pub filter: String,
    pub kind: String,
    pub params: Map<String, Value>,
}

impl FilterDescriptor {
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let filter = obj
            .get("filter")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        let kind = obj.get("type").and_then(Value::as_str).unwrap_or("").to_string();
        Some(FilterDescriptor {
            filter,
            kind,
            params: obj.clone(),
        })
    }
}

/// One entry of the `sentences` array.
#[derive(Debug, Clone, PartialEq)]
pub struct SentenceConfig {
    pub callsign: String,
    pub checksum: Checksum,
    pub fields: Vec<FieldDescriptor>,
    pub post_filters: Vec<FilterDescriptor>,
}

impl SentenceConfig {
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let callsign = obj.get("callsign")?.as_str()?.to_string();
        let checksum = Checksum::from_config_str(obj.get("checksum")?.as_str()?)?;
        let fields = obj
            .get("fields")?
            .as_array()?
            .iter()
            .filter_map(FieldDescriptor::from_value)
            .collect();
        let post_filters = obj
            .get("filters")
            .and_then(Value::as_object)
            .and_then(|f| f.get("post"))
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(FilterDescriptor::from_value).collect())
            .unwrap_or_default();
        Some(SentenceConfig {
            callsign,
            checksum,
            fields,
            post_filters,
        })
    }
}

/// A parsed payload document: only the `sentences` key is recognised, any
/// other top-level key is simply not looked at.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PayloadDocument {
    pub sentences: Vec<SentenceConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The document has no `sentences` array at its top level.
    MissingSentences,
}

impl PayloadDocument {
    pub fn from_value(value: &Value) -> Result<Self, Error> {
        let sentences = value
            .as_object()
            .and_then(|obj| obj.get("sentences"))
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(SentenceConfig::from_value)
                    .collect()
            })
            .ok_or(Error::MissingSentences)?;
        Ok(PayloadDocument { sentences })
    }

    /// All sentence configurations with a matching callsign, in document
    /// order.
    pub fn matching_callsign<'a>(&'a self, callsign: &str) -> Vec<&'a SentenceConfig> {
        self.sentences
            .iter()
            .filter(|s| s.callsign == callsign)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_crude_parse_flight_doc() {
        let doc = json!({
            "sentences": [ {
                "callsign": "TESTING",
                "checksum": "crc16-ccitt",
                "fields": [
                    {"name": "field_a"},
                    {"name": "field_b"},
                    {"name": "field_c"},
                    {"name": "int_d", "sensor": "base.ascii_int"},
                    {"name": "float_e", "sensor": "base.ascii_float"},
                ],
            }]
        });
        let parsed = PayloadDocument::from_value(&doc).unwrap();
        assert_eq!(parsed.sentences.len(), 1);
        assert_eq!(parsed.sentences[0].callsign, "TESTING");
        assert_eq!(parsed.sentences[0].checksum, Checksum::Crc16Ccitt);
        assert_eq!(parsed.sentences[0].fields.len(), 5);
        assert_eq!(
            parsed.sentences[0].fields[3].sensor.as_deref(),
            Some("base.ascii_int")
        );
    }

    #[test]
    fn test_unknown_top_level_key_is_ignored() {
        let doc = json!({"sentences": [], "something_else": true});
        let parsed = PayloadDocument::from_value(&doc).unwrap();
        assert!(parsed.sentences.is_empty());
    }

    #[test]
    fn test_missing_sentences_key_is_an_error() {
        let doc = json!({"not_sentences": []});
        assert!(PayloadDocument::from_value(&doc).is_err());
    }

    #[test]
    fn test_filter_descriptor_without_filter_key() {
        let descriptors = json!([
            {"filter": "un.related", "type": "normal", "some config": true},
            {"type": "hotfix", "ignore me": true},
        ]);
        let parsed: Vec<FilterDescriptor> = descriptors
            .as_array()
            .unwrap()
            .iter()
            .filter_map(FilterDescriptor::from_value)
            .collect();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].filter, "");
        assert_eq!(parsed[1].kind, "hotfix");
    }

    #[test]
    fn test_matching_callsign_preserves_order() {
        let doc = json!({
            "sentences": [
                {"callsign": "AWKWARD", "checksum": "crc16-ccitt",
                 "fields": [{"name": "fa"}, {"name": "fo"}, {"name": "fc"}]},
                {"callsign": "AWKWARD", "checksum": "crc16-ccitt",
                 "fields": [{"name": "fa"}, {"name": "fb"}]},
            ]
        });
        let parsed = PayloadDocument::from_value(&doc).unwrap();
        let candidates = parsed.matching_callsign("AWKWARD");
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].fields.len(), 3);
        assert_eq!(candidates[1].fields.len(), 2);
    }
}
