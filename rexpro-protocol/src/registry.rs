//! Message type registry.
//!
//! Maps the single-byte message type id carried in the frame header to the
//! body variant it selects. Id 4 is reserved and has no variant.

use crate::error::ProtocolError;
use std::fmt;

/// The body variants known to the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    ErrorResponse,
    SessionRequest,
    SessionResponse,
    ScriptRequest,
    ScriptResponse,
}

/// The registry table. Both lookup directions read from here.
const REGISTRY: [(u8, MessageType); 5] = [
    (0, MessageType::ErrorResponse),
    (1, MessageType::SessionRequest),
    (2, MessageType::SessionResponse),
    (3, MessageType::ScriptRequest),
    (5, MessageType::ScriptResponse),
];

impl MessageType {
    /// Returns the variant's name as used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            MessageType::ErrorResponse => "ErrorResponse",
            MessageType::SessionRequest => "SessionRequest",
            MessageType::SessionResponse => "SessionResponse",
            MessageType::ScriptRequest => "ScriptRequest",
            MessageType::ScriptResponse => "ScriptResponse",
        }
    }

    /// Returns whether this variant is sent by clients.
    pub fn is_request(&self) -> bool {
        matches!(
            self,
            MessageType::SessionRequest | MessageType::ScriptRequest
        )
    }

    /// Returns whether this variant is sent by servers.
    pub fn is_response(&self) -> bool {
        !self.is_request()
    }

    /// Returns the registered wire id.
    pub fn id(&self) -> Result<u8, ProtocolError> {
        id_for_variant(*self)
    }
}

impl TryFrom<u8> for MessageType {
    type Error = ProtocolError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        variant_for_id(id)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Looks up the variant registered under `id`.
pub fn variant_for_id(id: u8) -> Result<MessageType, ProtocolError> {
    REGISTRY
        .iter()
        .find(|(registered, _)| *registered == id)
        .map(|(_, variant)| *variant)
        .ok_or(ProtocolError::UnknownMessageType(id))
}

/// Looks up the id registered for `variant`.
pub fn id_for_variant(variant: MessageType) -> Result<u8, ProtocolError> {
    REGISTRY
        .iter()
        .find(|(_, registered)| *registered == variant)
        .map(|(id, _)| *id)
        .ok_or(ProtocolError::UnregisteredVariant(variant.name()))
}
