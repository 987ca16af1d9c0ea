//! The post-extraction filter pipeline: `filters.post` descriptors applied,
//! in order, to a successfully schema-parsed record.

use serde_json::{Map, Value};

use crate::payload::FilterDescriptor;

/// Run every `type == "normal"` filter whose `filter` key is recognised
/// against `record`, in document order. Unknown filters and non-`normal`
/// descriptors are skipped silently, per SPEC_FULL §4.3.
pub fn apply_pipeline(filters: &[FilterDescriptor], record: &mut Map<String, Value>) {
    for descriptor in filters {
        if descriptor.kind != "normal" {
            continue;
        }
        match descriptor.filter.as_str() {
            "common.numeric_scale" => numeric_scale(descriptor, record),
            _ => {}
        }
    }
}

fn numeric_scale(descriptor: &FilterDescriptor, record: &mut Map<String, Value>) {
    let Some(source) = descriptor.params.get("source").and_then(Value::as_str) else {
        return;
    };
    let Some(source_value) = record.get(source) else {
        return;
    };
    let Some(value) = as_f64(source_value) else {
        return;
    };

    let offset = descriptor
        .params
        .get("offset")
        .and_then(Value::as_f64)
        .unwrap_or(0.0);
    let factor = descriptor
        .params
        .get("factor")
        .and_then(Value::as_f64)
        .unwrap_or(1.0);
    let round = descriptor.params.get("round").and_then(Value::as_u64);

    let mut scaled = value * factor + offset;
    if let Some(sig_figs) = round {
        scaled = round_to_sig_figs(scaled, sig_figs as i32);
    }

    let destination = descriptor
        .params
        .get("destination")
        .and_then(Value::as_str)
        .unwrap_or(source)
        .to_string();

    if let Some(number) = serde_json::Number::from_f64(scaled) {
        record.insert(destination, Value::Number(number));
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Round `value` to `sig_figs` significant figures, half-away-from-zero.
fn round_to_sig_figs(value: f64, sig_figs: i32) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let magnitude = value.abs().log10().ceil() as i32;
    let scale = 10f64.powi(sig_figs - magnitude);
    (value * scale).round() / scale
}
