//! Body serializers.
//!
//! A body travels as a positional array of values. The serializer id in the
//! frame header selects how that array is written; only JSON (id 1) exists
//! today.

use crate::error::ProtocolError;
use serde_json::Value;

/// Converts a positional body to and from its wire bytes.
pub trait BodySerializer {
    /// Writes the positional fields as body bytes.
    fn serialize(&self, fields: &[Value]) -> Result<Vec<u8>, ProtocolError>;

    /// Reads body bytes back into positional fields.
    ///
    /// Only the outer shape is checked here; each variant validates its own
    /// slots when hydrating.
    fn deserialize(&self, bytes: &[u8]) -> Result<Vec<Value>, ProtocolError>;
}

/// Serializer type ids accepted in the frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SerializerType {
    #[default]
    Json,
}

impl SerializerType {
    /// Resolves a header serializer id.
    pub fn from_id(id: u8) -> Result<Self, ProtocolError> {
        match id {
            1 => Ok(SerializerType::Json),
            other => Err(ProtocolError::UnsupportedSerializer(other)),
        }
    }

    pub fn id(&self) -> u8 {
        match self {
            SerializerType::Json => 1,
        }
    }

    /// Returns the serializer implementation for this id.
    pub fn serializer(&self) -> &'static dyn BodySerializer {
        match self {
            SerializerType::Json => &JsonSerializer,
        }
    }
}

/// JSON array serializer.
///
/// Non-ASCII text is written as raw UTF-8, never as `\u` escapes.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl BodySerializer for JsonSerializer {
    fn serialize(&self, fields: &[Value]) -> Result<Vec<u8>, ProtocolError> {
        Ok(serde_json::to_vec(fields)?)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Vec<Value>, ProtocolError> {
        match serde_json::from_slice(bytes)? {
            Value::Array(fields) => Ok(fields),
            other => Err(ProtocolError::malformed(
                "body",
                format!("expected a JSON array, got {}", json_kind(&other)),
            )),
        }
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
