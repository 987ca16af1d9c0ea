//! The UKHAS sentence parser: structural extraction, checksum verification,
//! schema-driven field conversion and candidate selection.

use serde_json::{Map, Value};

use crate::checksum::{hex_eq, Checksum};
use crate::filters;
use crate::payload::{PayloadDocument, SentenceConfig};
use crate::sensors::Sensor;

/// The statuses and the best-available record produced by parsing one
/// captured sentence. `statuses` holds only the events that follow
/// `"extracted"`; the caller is responsible for that one and for the
/// `data` event carrying `record`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    pub statuses: Vec<String>,
    pub record: Map<String, Value>,
}

/// Parse one captured sentence, including its leading `$$` and trailing
/// `\n`. `payload` is the currently installed payload document, if any.
pub fn parse(captured: &[u8], payload: Option<&PayloadDocument>) -> ParseOutcome {
    let sentence = String::from_utf8_lossy(captured).into_owned();
    let without_marker = sentence.strip_prefix("$$").unwrap_or(&sentence);
    let inner = without_marker.strip_suffix('\n').unwrap_or(without_marker);

    let mut parts = inner.splitn(2, '*');
    let body = parts.next().unwrap_or("");
    let checksum_hex = parts.next().unwrap_or("");

    let body_fields: Vec<&str> = body.split(',').collect();
    let callsign = body_fields.first().copied().unwrap_or("");

    let algo = match Checksum::infer_from_suffix_len(checksum_hex.len()) {
        None => {
            return crude_failure(&sentence, "invalid checksum len".to_string());
        }
        Some(algo) => algo,
    };
    let computed = algo.compute_hex(body.as_bytes());
    if !hex_eq(&computed, checksum_hex) {
        return crude_failure(&sentence, format!("invalid checksum: expected {}", computed));
    }

    let mut crude_record = Map::new();
    crude_record.insert("_sentence".to_string(), Value::String(sentence.clone()));
    crude_record.insert("_parsed".to_string(), Value::Bool(true));
    crude_record.insert("_basic".to_string(), Value::Bool(true));
    crude_record.insert("_protocol".to_string(), Value::String("UKHAS".to_string()));
    crude_record.insert("payload".to_string(), Value::String(callsign.to_string()));

    let Some(doc) = payload else {
        return ParseOutcome {
            statuses: Vec::new(),
            record: crude_record,
        };
    };

    let candidates = doc.matching_callsign(callsign);
    if candidates.is_empty() {
        return schema_failure(crude_record, "incorrect callsign".to_string());
    }

    let remaining_fields = &body_fields[1..];
    let mut had_checksum_mismatch = false;
    let mut chosen: Option<&SentenceConfig> = None;
    for candidate in &candidates {
        if candidate.checksum != algo {
            had_checksum_mismatch = true;
            continue;
        }
        if candidate.fields.len() == remaining_fields.len() {
            chosen = Some(candidate);
            break;
        }
    }

    let Some(config) = chosen else {
        let reason = if had_checksum_mismatch {
            "wrong checksum type".to_string()
        } else {
            "incorrect number of fields".to_string()
        };
        return schema_failure(crude_record, reason);
    };

    let mut record = Map::new();
    record.insert("_sentence".to_string(), Value::String(sentence.clone()));
    record.insert("_parsed".to_string(), Value::Bool(true));
    record.insert("_protocol".to_string(), Value::String("UKHAS".to_string()));
    record.insert("payload".to_string(), Value::String(callsign.to_string()));

    for (descriptor, raw) in config.fields.iter().zip(remaining_fields.iter()) {
        let Some(sensor) = Sensor::resolve(descriptor.sensor.as_deref(), descriptor.format.as_deref())
        else {
            return schema_failure(crude_record, format!("bad value for field {}", descriptor.name));
        };
        match sensor.convert(&descriptor.name, raw) {
            Ok(value) => {
                record.insert(descriptor.name.clone(), value);
            }
            Err(_) => {
                return schema_failure(crude_record, format!("bad value for field {}", descriptor.name));
            }
        }
    }

    filters::apply_pipeline(&config.post_filters, &mut record);

    ParseOutcome {
        statuses: Vec::new(),
        record,
    }
}

fn crude_failure(sentence: &str, reason: String) -> ParseOutcome {
    let mut record = Map::new();
    record.insert("_sentence".to_string(), Value::String(sentence.to_string()));
    ParseOutcome {
        statuses: vec![format!("parse failed: {}", reason)],
        record,
    }
}

fn schema_failure(crude_record: Map<String, Value>, reason: String) -> ParseOutcome {
    ParseOutcome {
        statuses: vec![format!("full parse failed: {}", reason), reason],
        record: crude_record,
    }
}
