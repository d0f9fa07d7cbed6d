//! # rexpro-protocol
//!
//! Wire protocol implementation for RexPro, the binary protocol spoken by
//! Rexster graph servers.
//!
//! This crate provides:
//! - The fixed 11-byte frame header (version, serializer, message type, length)
//! - The registry mapping message-type ids to body variants
//! - Request/response body variants and their positional JSON layouts
//! - The `Message` façade that packs bodies to wire bytes and back
//!
//! Everything here is synchronous and does no I/O; reading and writing frames
//! is left to the transport (see `rexpro-client`).

pub mod body;
pub mod error;
pub mod frame;
pub mod ident;
pub mod message;
pub mod registry;
pub mod serializer;

pub use body::request::{ScriptRequest, SessionRequest};
pub use body::response::{ErrorResponse, ScriptResponse, SessionResponse};
pub use body::{Body, BodyFields, BodyVariant, Meta};
pub use error::ProtocolError;
pub use frame::{encode_length, Header, HEADER_SIZE};
pub use ident::{new_identifier, NIL_IDENTIFIER};
pub use message::{decode_body, encode_frame, DecodedBody, EncodedFrame, Message};
pub use registry::{id_for_variant, variant_for_id, MessageType};
pub use serializer::{BodySerializer, JsonSerializer, SerializerType};

/// Protocol version written into every frame header.
pub const PROTOCOL_VERSION: u8 = 1;

/// Largest body accepted from the wire (64 MiB).
pub const MAX_BODY_SIZE: u32 = 64 * 1024 * 1024;

/// Default port for Rexster's RexPro listener.
pub const DEFAULT_PORT: u16 = 8184;

/// Scripting language used by script requests unless overridden.
pub const DEFAULT_LANGUAGE: &str = "groovy";
