//! Response bodies sent by the server.
//!
//! Responses are either built empty (and filled through setters) or hydrated
//! straight from a decoded positional array. Metadata arriving from the wire
//! is stored as-is; the allow-list only applies to `set_meta`.

use super::{positional_with, BodyFields, BodyVariant, Meta, Slots, SHARED_SLOTS};
use crate::error::ProtocolError;
use crate::registry::MessageType;
use serde_json::Value;

/// Session response. Carries only the shared fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionResponse {
    fields: BodyFields,
}

impl SessionResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_request(session: impl Into<String>, request: impl Into<String>) -> Self {
        Self {
            fields: BodyFields::new(session, request),
        }
    }
}

impl BodyVariant for SessionResponse {
    fn message_type(&self) -> MessageType {
        MessageType::SessionResponse
    }

    fn fields(&self) -> &BodyFields {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut BodyFields {
        &mut self.fields
    }

    fn allowed_meta_keys(&self) -> &'static [&'static str] {
        &[]
    }

    fn to_positional(&self) -> Vec<Value> {
        self.fields.positional()
    }

    fn hydrate(&mut self, raw: Vec<Value>) -> Result<(), ProtocolError> {
        let mut slots = Slots::new(MessageType::SessionResponse, raw, SHARED_SLOTS)?;
        self.fields = slots.shared()?;
        Ok(())
    }
}

/// Script response.
///
/// Wire slots: `[session, request, meta, results, bindings]`. A `results`
/// slot that is not an array decodes as an empty result list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptResponse {
    fields: BodyFields,
    results: Vec<Value>,
    bindings: Meta,
}

impl ScriptResponse {
    const SLOTS: usize = SHARED_SLOTS + 2;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_request(session: impl Into<String>, request: impl Into<String>) -> Self {
        Self {
            fields: BodyFields::new(session, request),
            ..Self::default()
        }
    }

    pub fn with_results(mut self, results: Vec<Value>) -> Self {
        self.results = results;
        self
    }

    pub fn with_bindings(mut self, bindings: Meta) -> Self {
        self.bindings = bindings;
        self
    }

    pub fn results(&self) -> &[Value] {
        &self.results
    }

    pub fn into_results(self) -> Vec<Value> {
        self.results
    }

    pub fn bindings(&self) -> &Meta {
        &self.bindings
    }

    pub fn set_results(&mut self, results: Vec<Value>) {
        self.results = results;
    }

    pub fn set_bindings(&mut self, bindings: Meta) {
        self.bindings = bindings;
    }
}

impl BodyVariant for ScriptResponse {
    fn message_type(&self) -> MessageType {
        MessageType::ScriptResponse
    }

    fn fields(&self) -> &BodyFields {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut BodyFields {
        &mut self.fields
    }

    fn allowed_meta_keys(&self) -> &'static [&'static str] {
        &[]
    }

    fn to_positional(&self) -> Vec<Value> {
        positional_with(
            &self.fields,
            [
                Value::Array(self.results.clone()),
                Value::Object(self.bindings.clone()),
            ],
        )
    }

    fn hydrate(&mut self, raw: Vec<Value>) -> Result<(), ProtocolError> {
        let mut slots = Slots::new(MessageType::ScriptResponse, raw, Self::SLOTS)?;
        let fields = slots.shared()?;
        let results = slots.sequence();
        let bindings = slots.map("bindings")?;

        *self = Self {
            fields,
            results,
            bindings,
        };
        Ok(())
    }
}

/// Error response, registered under message type 0.
///
/// Wire slots: `[session, request, meta, error_message]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorResponse {
    fields: BodyFields,
    error_message: String,
}

impl ErrorResponse {
    /// Meta keys accepted by error responses.
    pub const META_KEYS: &'static [&'static str] = &["flag"];

    const SLOTS: usize = SHARED_SLOTS + 1;

    pub fn new(error_message: impl Into<String>) -> Self {
        Self {
            error_message: error_message.into(),
            ..Self::default()
        }
    }

    pub fn for_request(
        session: impl Into<String>,
        request: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            fields: BodyFields::new(session, request),
            error_message: error_message.into(),
        }
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn set_error_message(&mut self, message: impl Into<String>) {
        self.error_message = message.into();
    }

    /// Returns the server's error flag, if one was sent.
    pub fn flag(&self) -> Option<i64> {
        self.fields.meta().get("flag").and_then(Value::as_i64)
    }
}

impl BodyVariant for ErrorResponse {
    fn message_type(&self) -> MessageType {
        MessageType::ErrorResponse
    }

    fn fields(&self) -> &BodyFields {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut BodyFields {
        &mut self.fields
    }

    fn allowed_meta_keys(&self) -> &'static [&'static str] {
        Self::META_KEYS
    }

    fn to_positional(&self) -> Vec<Value> {
        positional_with(&self.fields, [Value::String(self.error_message.clone())])
    }

    fn hydrate(&mut self, raw: Vec<Value>) -> Result<(), ProtocolError> {
        let mut slots = Slots::new(MessageType::ErrorResponse, raw, Self::SLOTS)?;
        let fields = slots.shared()?;
        let error_message = slots.string("error_message")?;

        *self = Self {
            fields,
            error_message,
        };
        Ok(())
    }
}
