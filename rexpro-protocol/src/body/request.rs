//! Request bodies sent by the client.
//!
//! A new request starts outside any session (the nil session id) and gets a
//! fresh random request id.

use super::{positional_with, BodyFields, BodyVariant, Meta, Slots, SHARED_SLOTS};
use crate::error::ProtocolError;
use crate::ident::{new_identifier, NIL_IDENTIFIER};
use crate::registry::MessageType;
use crate::DEFAULT_LANGUAGE;
use serde_json::Value;

fn fresh_fields() -> BodyFields {
    BodyFields::new(NIL_IDENTIFIER, new_identifier())
}

/// Session request. Carries only the shared fields.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRequest {
    fields: BodyFields,
}

impl SessionRequest {
    pub fn new() -> Self {
        Self {
            fields: fresh_fields(),
        }
    }
}

impl Default for SessionRequest {
    fn default() -> Self {
        Self::new()
    }
}

impl BodyVariant for SessionRequest {
    fn message_type(&self) -> MessageType {
        MessageType::SessionRequest
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
        let mut slots = Slots::new(MessageType::SessionRequest, raw, SHARED_SLOTS)?;
        self.fields = slots.shared()?;
        Ok(())
    }
}

/// Script request.
///
/// Wire slots: `[session, request, meta, language, script, bindings]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptRequest {
    fields: BodyFields,
    language: String,
    script: String,
    bindings: Meta,
}

impl ScriptRequest {
    /// Meta keys accepted by script requests.
    pub const META_KEYS: &'static [&'static str] = &[
        "inSession",
        "isolate",
        "transaction",
        "graphName",
        "graphObjName",
        "console",
    ];

    const SLOTS: usize = SHARED_SLOTS + 3;

    pub fn new(script: impl Into<String>) -> Self {
        Self {
            fields: fresh_fields(),
            language: DEFAULT_LANGUAGE.to_string(),
            script: script.into(),
            bindings: Meta::new(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_bindings(mut self, bindings: Meta) -> Self {
        self.bindings = bindings;
        self
    }

    pub fn with_binding(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.bindings.insert(name.into(), value.into());
        self
    }

    /// Sets the metadata, rejecting keys outside [`ScriptRequest::META_KEYS`].
    pub fn with_meta(mut self, meta: Meta) -> Result<Self, ProtocolError> {
        self.set_meta(meta)?;
        Ok(self)
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn bindings(&self) -> &Meta {
        &self.bindings
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        self.language = language.into();
    }

    pub fn set_script(&mut self, script: impl Into<String>) {
        self.script = script.into();
    }

    pub fn set_bindings(&mut self, bindings: Meta) {
        self.bindings = bindings;
    }
}

impl Default for ScriptRequest {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl BodyVariant for ScriptRequest {
    fn message_type(&self) -> MessageType {
        MessageType::ScriptRequest
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
        positional_with(
            &self.fields,
            [
                Value::String(self.language.clone()),
                Value::String(self.script.clone()),
                Value::Object(self.bindings.clone()),
            ],
        )
    }

    fn hydrate(&mut self, raw: Vec<Value>) -> Result<(), ProtocolError> {
        let mut slots = Slots::new(MessageType::ScriptRequest, raw, Self::SLOTS)?;
        let fields = slots.shared()?;
        let language = slots.string("language")?;
        let script = slots.string("script")?;
        let bindings = slots.map("bindings")?;

        *self = Self {
            fields,
            language,
            script,
            bindings,
        };
        Ok(())
    }
}
