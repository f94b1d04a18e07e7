//! Conversion of raw record values to native attribute values.

use crate::error::{CoercionError, CoercionResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use graft_model::{AttributeMetadata, DateFormat};
use graft_types::{AttributeType, AttributeValue};
use serde_json::{Number, Value};

/// Coerces `raw` to the native type of `attribute`.
///
/// Returns `Ok(None)` for `null`, meaning the attribute must be left as it
/// is. Date attributes without a format of their own use `default_format`.
pub fn coerce(
    raw: &Value,
    attribute: &AttributeMetadata,
    default_format: &DateFormat,
) -> CoercionResult<Option<AttributeValue>> {
    if raw.is_null() {
        return Ok(None);
    }
    let fail = |reason: &str| CoercionError::CoercionFailure {
        attribute: attribute.name.clone(),
        reason: reason.to_string(),
    };

    let value = match attribute.attribute_type {
        AttributeType::String => match raw {
            Value::String(s) => AttributeValue::String(s.clone()),
            Value::Number(n) => AttributeValue::String(n.to_string()),
            Value::Bool(b) => AttributeValue::String(b.to_string()),
            _ => return Err(fail("expected a scalar")),
        },
        AttributeType::Integer => match raw {
            Value::Number(n) => integer_from_number(n).ok_or_else(|| fail("not an integer"))?,
            Value::String(s) => integer_from_str(s.trim()).ok_or_else(|| fail("not an integer"))?,
            Value::Bool(b) => AttributeValue::Integer(i64::from(*b)),
            _ => return Err(fail("expected a number")),
        },
        AttributeType::Double => match raw {
            Value::Number(n) => AttributeValue::Double(n.as_f64().ok_or_else(|| fail("not a number"))?),
            Value::String(s) => AttributeValue::Double(
                parse_finite(s.trim()).ok_or_else(|| fail("not a finite number"))?,
            ),
            Value::Bool(b) => AttributeValue::Double(if *b { 1.0 } else { 0.0 }),
            _ => return Err(fail("expected a number")),
        },
        AttributeType::Boolean => match raw {
            Value::Bool(b) => AttributeValue::Boolean(*b),
            Value::Number(n) => AttributeValue::Boolean(n.as_f64().is_some_and(|f| f != 0.0)),
            Value::String(s) => {
                AttributeValue::Boolean(bool_from_str(s).ok_or_else(|| fail("not a boolean"))?)
            }
            _ => return Err(fail("expected a boolean")),
        },
        AttributeType::Date => {
            let Value::String(s) = raw else {
                return Err(fail("dates must be strings"));
            };
            let format = attribute.date_format.as_deref().unwrap_or(default_format);
            let date = format
                .parse(s)
                .ok_or_else(|| CoercionError::DateFormatMismatch {
                    attribute: attribute.name.clone(),
                    value: s.clone(),
                    format: format.pattern().to_string(),
                })?;
            AttributeValue::Date(date)
        }
        AttributeType::Binary => match raw {
            Value::String(s) => AttributeValue::Binary(
                STANDARD
                    .decode(s)
                    .map_err(|e| fail(&format!("invalid base64: {e}")))?,
            ),
            Value::Array(items) => AttributeValue::Binary(
                items
                    .iter()
                    .map(|v| v.as_u64().and_then(|b| u8::try_from(b).ok()))
                    .collect::<Option<Vec<u8>>>()
                    .ok_or_else(|| fail("byte arrays must hold integers 0-255"))?,
            ),
            _ => return Err(fail("expected base64 text or a byte array")),
        },
    };
    Ok(Some(value))
}

fn integer_from_number(n: &Number) -> Option<AttributeValue> {
    if let Some(i) = n.as_i64() {
        return Some(AttributeValue::Integer(i));
    }
    if n.is_u64() {
        return None;
    }
    n.as_f64().and_then(integer_from_f64)
}

fn integer_from_str(s: &str) -> Option<AttributeValue> {
    match s.parse::<i64>() {
        Ok(i) => Some(AttributeValue::Integer(i)),
        Err(_) => parse_finite(s).and_then(integer_from_f64),
    }
}

// `str::parse` also accepts "NaN" and "inf", which never compare equal or
// render to JSON.
fn parse_finite(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|f| f.is_finite())
}

fn integer_from_f64(f: f64) -> Option<AttributeValue> {
    // i64::MAX is not representable as f64; the bound is exclusive
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(AttributeValue::Integer(f as i64))
    } else {
        None
    }
}

fn bool_from_str(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}
