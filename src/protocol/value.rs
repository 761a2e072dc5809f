use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::error::SqlEmulatorError;
use crate::types::RowValues;

/// Blob input from clients arrives both with and without padding.
const BLOB_DECODER: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A single parameter or result cell as it travels over the wire.
///
/// Integers travel as decimal strings so 64-bit values survive JSON number handling in
/// clients; blobs travel as base64 text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireValue {
    Null,
    Integer {
        #[serde(deserialize_with = "integer_text")]
        value: String,
    },
    Float {
        value: f64,
    },
    Text {
        value: String,
    },
    Blob {
        #[serde(alias = "value")]
        base64: String,
    },
}

impl WireValue {
    #[must_use]
    pub fn integer(value: i64) -> Self {
        WireValue::Integer {
            value: value.to_string(),
        }
    }

    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        WireValue::Text {
            value: value.into(),
        }
    }

    #[must_use]
    pub fn blob(bytes: &[u8]) -> Self {
        WireValue::Blob {
            base64: STANDARD.encode(bytes),
        }
    }
}

// Some clients send integers as JSON numbers; keep their textual form for `decode`.
fn integer_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "integer value must be a string or number, got {other}"
        ))),
    }
}

/// Convert a wire value into the native value bound to a statement.
///
/// # Errors
///
/// Returns `SqlEmulatorError::DecodeError` if integer text is not a valid `i64` or blob text is
/// not valid base64.
pub fn decode(value: &WireValue) -> Result<RowValues, SqlEmulatorError> {
    match value {
        WireValue::Null => Ok(RowValues::Null),
        WireValue::Integer { value } => value.trim().parse::<i64>().map(RowValues::Int).map_err(
            |e| SqlEmulatorError::DecodeError(format!("invalid integer value {value:?}: {e}")),
        ),
        WireValue::Float { value } => Ok(RowValues::Float(*value)),
        WireValue::Text { value } => Ok(RowValues::Text(value.clone())),
        WireValue::Blob { base64 } => BLOB_DECODER
            .decode(base64)
            .map(RowValues::Blob)
            .map_err(|e| SqlEmulatorError::DecodeError(format!("invalid base64 blob: {e}"))),
    }
}

/// Convert a native result value into its wire form.
///
/// Whole-valued floats are reported as integers, the way the engine's untyped numeric columns
/// surface them; non-finite floats have no JSON form and degrade to text.
#[must_use]
pub fn encode(value: RowValues) -> WireValue {
    match value {
        RowValues::Null => WireValue::Null,
        RowValues::Int(i) => WireValue::integer(i),
        RowValues::Float(f) => match whole_float_as_int(f) {
            Some(i) => WireValue::integer(i),
            None if f.is_finite() => WireValue::Float { value: f },
            None => WireValue::text(f.to_string()),
        },
        RowValues::Text(s) => WireValue::Text { value: s },
        RowValues::Blob(b) => WireValue::blob(&b),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn whole_float_as_int(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is out of range.
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}
