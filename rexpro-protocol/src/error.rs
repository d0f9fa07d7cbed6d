//! Protocol error types.

use thiserror::Error;

/// Errors raised while building, packing or unpacking RexPro messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("{variant} doesn't accept the meta data {}", keys.join(", "))]
    InvalidMeta {
        variant: &'static str,
        keys: Vec<String>,
    },

    #[error("unknown message type id: {0}")]
    UnknownMessageType(u8),

    #[error("message type not registered for variant {0}")]
    UnregisteredVariant(&'static str),

    #[error("malformed {variant} body: {reason}")]
    MalformedBody {
        variant: &'static str,
        reason: String,
    },

    #[error("unsupported serializer type: {0}")]
    UnsupportedSerializer(u8),

    #[error("message has no body to pack")]
    NoBody,

    #[error("message has no serialized body to unpack")]
    NoSerializedBody,

    #[error("truncated header: got {len} bytes, need {}", crate::frame::HEADER_SIZE)]
    TruncatedHeader { len: usize },

    #[error("body length {0} does not fit in 32 bits")]
    InvalidLength(u64),

    #[error("body too large: {len} bytes (max {max})")]
    BodyTooLarge { len: u32, max: u32 },

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProtocolError {
    pub(crate) fn malformed(variant: &'static str, reason: impl Into<String>) -> Self {
        ProtocolError::MalformedBody {
            variant,
            reason: reason.into(),
        }
    }
}
