//! The sensor registry: named conversions from a raw UKHAS field string to
//! a typed `serde_json::Value`.

use nom::character::is_digit;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateFormat {
    DdDddd,
    DdMmMm,
}

impl CoordinateFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "dd.dddd" => Some(CoordinateFormat::DdDddd),
            "ddmm.mm" => Some(CoordinateFormat::DdMmMm),
            _ => None,
        }
    }
}

/// A resolved sensor, ready to convert one field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensor {
    /// The default: pass the raw string through unchanged.
    Raw,
    AsciiInt,
    AsciiFloat,
    Coordinate(CoordinateFormat),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionError {
    pub field: String,
}

impl Sensor {
    /// Resolve a sensor registry key plus its options (currently only
    /// `stdtelem.coordinate`'s `format`) into a `Sensor`. An unknown key or
    /// missing/unknown `format` falls back to `None`, which the caller
    /// should treat as a field conversion error - sensors are not silently
    /// skipped the way filters are, since a field with no way to convert it
    /// can't produce a value at all.
    pub fn resolve(key: Option<&str>, format: Option<&str>) -> Option<Self> {
        match key {
            None => Some(Sensor::Raw),
            Some("base.ascii_int") => Some(Sensor::AsciiInt),
            Some("base.ascii_float") => Some(Sensor::AsciiFloat),
            Some("stdtelem.coordinate") => {
                CoordinateFormat::from_str(format?).map(Sensor::Coordinate)
            }
            Some(_) => None,
        }
    }

    pub fn convert(&self, field: &str, value: &str) -> Result<Value, ConversionError> {
        match self {
            Sensor::Raw => Ok(Value::String(value.to_string())),
            Sensor::AsciiInt => value
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| ConversionError {
                    field: field.to_string(),
                }),
            Sensor::AsciiFloat => value
                .parse::<f64>()
                .ok()
                .and_then(|f| serde_json::Number::from_f64(f).map(Value::Number))
                .ok_or_else(|| ConversionError {
                    field: field.to_string(),
                }),
            Sensor::Coordinate(CoordinateFormat::DdDddd) => Ok(Value::String(value.to_string())),
            Sensor::Coordinate(CoordinateFormat::DdMmMm) => ddmm_to_decimal(value)
                .map(Value::String)
                .ok_or_else(|| ConversionError {
                    field: field.to_string(),
                }),
        }
    }
}

/// Convert a `[-]DDDMM.mmmmm` string into decimal degrees, formatted to at
/// most five decimal places with trailing zeros (and a bare trailing point)
/// stripped.
fn ddmm_to_decimal(value: &str) -> Option<String> {
    let (negative, rest) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    let (int_part, frac_part) = match rest.split_once('.') {
        Some((i, f)) => (i, f),
        None => (rest, ""),
    };
    if int_part.len() < 2 || !int_part.bytes().all(|b| is_digit(b)) {
        return None;
    }
    if !frac_part.bytes().all(|b| is_digit(b)) {
        return None;
    }
    let split = int_part.len() - 2;
    let degrees: f64 = int_part[..split].parse().unwrap_or(0.0);
    let minutes_str = format!("{}.{}", &int_part[split..], frac_part);
    let minutes: f64 = minutes_str.parse().ok()?;
    let decimal = degrees + minutes / 60.0;
    let signed = if negative { -decimal } else { decimal };
    Some(format_trimmed(signed, 5))
}

/// Format `value` to `decimals` places, then strip trailing zeros and a
/// dangling decimal point, preserving the sign of a negative zero result.
fn format_trimmed(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value);
    let trimmed = formatted.trim_end_matches('0');
    let trimmed = trimmed.trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_int() {
        let sensor = Sensor::resolve(Some("base.ascii_int"), None).unwrap();
        assert_eq!(sensor.convert("int_d", "123").unwrap(), Value::from(123));
        assert!(sensor.convert("int_d", "not a number").is_err());
    }

    #[test]
    fn test_ascii_float() {
        let sensor = Sensor::resolve(Some("base.ascii_float"), None).unwrap();
        assert_eq!(
            sensor.convert("float_e", "453.24").unwrap(),
            Value::from(453.24)
        );
    }

    #[test]
    fn test_raw_passthrough() {
        let sensor = Sensor::resolve(None, None).unwrap();
        assert_eq!(
            sensor.convert("field_a", "value_a").unwrap(),
            Value::String("value_a".to_string())
        );
    }

    #[test]
    fn test_unknown_sensor_is_none() {
        assert!(Sensor::resolve(Some("nonsense"), None).is_none());
    }

    #[test]
    fn test_coordinate_dd_dddd_passthrough() {
        let sensor =
            Sensor::resolve(Some("stdtelem.coordinate"), Some("dd.dddd")).unwrap();
        assert_eq!(
            sensor.convert("lat_a", "0024.124583").unwrap(),
            Value::String("0024.124583".to_string())
        );
    }

    #[test]
    fn test_coordinate_ddmm_mm_positive() {
        let sensor =
            Sensor::resolve(Some("stdtelem.coordinate"), Some("ddmm.mm")).unwrap();
        assert_eq!(
            sensor.convert("lat_b", "5116.5271").unwrap(),
            Value::String("51.27545".to_string())
        );
    }

    #[test]
    fn test_coordinate_ddmm_mm_small_negative() {
        let sensor =
            Sensor::resolve(Some("stdtelem.coordinate"), Some("ddmm.mm")).unwrap();
        assert_eq!(
            sensor.convert("lat_a_neg", "-0016.5271").unwrap(),
            Value::String("-0.27545".to_string())
        );
    }

    #[test]
    fn test_coordinate_ddmm_mm_large_negative() {
        let sensor =
            Sensor::resolve(Some("stdtelem.coordinate"), Some("ddmm.mm")).unwrap();
        assert_eq!(
            sensor.convert("lat_b_neg", "-5116.5271").unwrap(),
            Value::String("-51.27545".to_string())
        );
    }
}
