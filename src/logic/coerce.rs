use serde_json::Value;

use crate::error::CoercionError;
use crate::model::{value_to_text, PropertyType};

/// Loose truthiness shared by boolean decoding and override presence.
///
/// `null`, `false`, numeric zero, `""`, `"0"`, `[]` and `{}` are falsy;
/// every other value is truthy, including strings such as `"false"` or `"off"`.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number
            .as_i64()
            .map(|n| n != 0)
            .or_else(|| number.as_u64().map(|n| n != 0))
            .or_else(|| number.as_f64().map(|n| n != 0.0))
            .unwrap_or(true),
        Value::String(text) => !(text.is_empty() || text == "0"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Inverse of [`is_truthy`]: the value counts as "not there"
pub fn is_absent(value: &Value) -> bool {
    !is_truthy(value)
}

/// Loose integer coercion. Never fails: unparseable input becomes `0`.
pub fn to_integer(value: &Value) -> i64 {
    match value {
        Value::Null => 0,
        Value::Bool(flag) => i64::from(*flag),
        Value::Number(number) => {
            if let Some(n) = number.as_i64() {
                n
            } else if number.as_u64().is_some() {
                i64::MAX
            } else {
                // `as` saturates and maps NaN to zero
                number.as_f64().map(|n| n as i64).unwrap_or(0)
            }
        }
        Value::String(text) => parse_leading_integer(text),
        Value::Array(items) => i64::from(!items.is_empty()),
        Value::Object(map) => i64::from(!map.is_empty()),
    }
}

/// Parse the numeric prefix of `text` ("42abc" -> 42, "3.9" -> 3, "abc" -> 0).
/// Out-of-range integers saturate.
fn parse_leading_integer(text: &str) -> i64 {
    let trimmed = text.trim_start_matches([' ', '\t', '\n', '\r', '\x0b', '\x0c']);
    let bytes = trimmed.as_bytes();

    let count_digits = |from: usize| {
        bytes[from.min(bytes.len())..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let negative = bytes.first() == Some(&b'-');

    let int_digits = count_digits(end);
    end += int_digits;

    let mut is_float = false;
    if bytes.get(end) == Some(&b'.') {
        let frac_digits = count_digits(end + 1);
        if frac_digits > 0 {
            end += 1 + frac_digits;
            is_float = true;
        } else if int_digits == 0 {
            return 0;
        }
    } else if int_digits == 0 {
        return 0;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(exp_end);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
            is_float = true;
        }
    }

    let numeric = &trimmed[..end];
    if is_float {
        numeric.parse::<f64>().map(|n| n as i64).unwrap_or(0)
    } else {
        numeric
            .parse::<i64>()
            .unwrap_or(if negative { i64::MIN } else { i64::MAX })
    }
}

/// Converts between the stored representation of a value and its typed form,
/// dispatching on the declared property type.
pub struct TypeCoercer;

impl TypeCoercer {
    /// Decode a stored value. Malformed JSON for JSON/SCHEMA types is logged
    /// and returned as `Value::Null` so read paths never fail.
    pub fn decode(property_type: PropertyType, raw: &Value) -> Value {
        match Self::try_decode(property_type, raw) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Treating stored default as absent: {}", e);
                Value::Null
            }
        }
    }

    /// Decode a stored value, reporting malformed JSON instead of hiding it
    pub fn try_decode(property_type: PropertyType, raw: &Value) -> Result<Value, CoercionError> {
        if property_type.is_structured() {
            return match raw {
                Value::String(text) => {
                    serde_json::from_str(text).map_err(|source| CoercionError::MalformedJson {
                        type_name: property_type.to_string(),
                        source,
                    })
                }
                // Already structured (or a bare JSON scalar)
                other => Ok(other.clone()),
            };
        }

        let decoded = match property_type {
            PropertyType::Integer => Value::from(to_integer(raw)),
            PropertyType::Boolean => Value::Bool(is_truthy(raw)),
            _ => raw.clone(),
        };
        Ok(decoded)
    }

    /// Encode a typed value into its stored representation.
    ///
    /// Every non-null result is text, so what a store persists and reads back
    /// is exactly what was encoded.
    pub fn encode(property_type: PropertyType, value: &Value) -> Value {
        match property_type {
            PropertyType::Json | PropertyType::Schema => Value::String(value.to_string()),
            PropertyType::Integer => Value::String(to_integer(value).to_string()),
            PropertyType::Boolean => {
                let canonical = if is_truthy(value) { "1" } else { "0" };
                Value::String(canonical.to_string())
            }
            PropertyType::String => match value {
                Value::Null | Value::String(_) => value.clone(),
                other => Value::String(value_to_text(other)),
            },
        }
    }
}
