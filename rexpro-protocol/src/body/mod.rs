//! Message bodies.
//!
//! Every body carries a session id, a request id and a metadata map. On the
//! wire a body is a positional array: slots 0-2 hold those shared fields and
//! each variant appends its own slots after them.

pub mod request;
pub mod response;

use crate::error::ProtocolError;
use crate::registry::MessageType;
use crate::serializer::json_kind;
use request::{ScriptRequest, SessionRequest};
use response::{ErrorResponse, ScriptResponse, SessionResponse};
use serde_json::Value;

/// Metadata attached to a body. Serializes as a JSON object even when empty.
pub type Meta = serde_json::Map<String, Value>;

/// Number of positional slots shared by every variant.
pub const SHARED_SLOTS: usize = 3;

/// Fields shared by every body variant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodyFields {
    session: String,
    request: String,
    meta: Meta,
}

impl BodyFields {
    pub(crate) fn new(session: impl Into<String>, request: impl Into<String>) -> Self {
        Self {
            session: session.into(),
            request: request.into(),
            meta: Meta::new(),
        }
    }

    pub fn session(&self) -> &str {
        &self.session
    }

    pub fn request(&self) -> &str {
        &self.request
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub(crate) fn positional(&self) -> Vec<Value> {
        vec![
            Value::String(self.session.clone()),
            Value::String(self.request.clone()),
            Value::Object(self.meta.clone()),
        ]
    }
}

/// Behavior common to all body variants.
pub trait BodyVariant {
    /// The registry entry for this variant.
    fn message_type(&self) -> MessageType;

    fn fields(&self) -> &BodyFields;

    fn fields_mut(&mut self) -> &mut BodyFields;

    /// Meta keys this variant accepts through [`BodyVariant::set_meta`].
    fn allowed_meta_keys(&self) -> &'static [&'static str];

    /// Returns the body's fields in wire slot order.
    fn to_positional(&self) -> Vec<Value>;

    /// Replaces every field from a decoded positional array.
    ///
    /// On error the body is left untouched.
    fn hydrate(&mut self, raw: Vec<Value>) -> Result<(), ProtocolError>;

    /// Builds a body from a decoded positional array.
    fn from_positional(raw: Vec<Value>) -> Result<Self, ProtocolError>
    where
        Self: Default + Sized,
    {
        let mut body = Self::default();
        body.hydrate(raw)?;
        Ok(body)
    }

    fn session(&self) -> &str {
        self.fields().session()
    }

    fn request(&self) -> &str {
        self.fields().request()
    }

    fn meta(&self) -> &Meta {
        self.fields().meta()
    }

    fn set_session(&mut self, session: String) {
        self.fields_mut().session = session;
    }

    fn set_request(&mut self, request: String) {
        self.fields_mut().request = request;
    }

    /// Replaces the metadata map.
    ///
    /// Every key must be in [`BodyVariant::allowed_meta_keys`]. If any is not,
    /// all offending keys are reported and nothing is changed.
    fn set_meta(&mut self, meta: Meta) -> Result<(), ProtocolError> {
        let allowed = self.allowed_meta_keys();
        let invalid: Vec<String> = meta
            .keys()
            .filter(|key| !allowed.contains(&key.as_str()))
            .cloned()
            .collect();

        if !invalid.is_empty() {
            return Err(ProtocolError::InvalidMeta {
                variant: self.message_type().name(),
                keys: invalid,
            });
        }

        self.fields_mut().meta = meta;
        Ok(())
    }
}

/// Any registered body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    SessionRequest(SessionRequest),
    ScriptRequest(ScriptRequest),
    SessionResponse(SessionResponse),
    ScriptResponse(ScriptResponse),
    ErrorResponse(ErrorResponse),
}

impl Body {
    /// Constructs the variant registered for `message_type` from a decoded
    /// positional array.
    pub fn from_positional(
        message_type: MessageType,
        raw: Vec<Value>,
    ) -> Result<Self, ProtocolError> {
        Ok(match message_type {
            MessageType::SessionRequest => {
                Body::SessionRequest(SessionRequest::from_positional(raw)?)
            }
            MessageType::ScriptRequest => Body::ScriptRequest(ScriptRequest::from_positional(raw)?),
            MessageType::SessionResponse => {
                Body::SessionResponse(SessionResponse::from_positional(raw)?)
            }
            MessageType::ScriptResponse => {
                Body::ScriptResponse(ScriptResponse::from_positional(raw)?)
            }
            MessageType::ErrorResponse => Body::ErrorResponse(ErrorResponse::from_positional(raw)?),
        })
    }

    pub fn variant(&self) -> &dyn BodyVariant {
        match self {
            Body::SessionRequest(body) => body,
            Body::ScriptRequest(body) => body,
            Body::SessionResponse(body) => body,
            Body::ScriptResponse(body) => body,
            Body::ErrorResponse(body) => body,
        }
    }

    pub fn variant_mut(&mut self) -> &mut dyn BodyVariant {
        match self {
            Body::SessionRequest(body) => body,
            Body::ScriptRequest(body) => body,
            Body::SessionResponse(body) => body,
            Body::ScriptResponse(body) => body,
            Body::ErrorResponse(body) => body,
        }
    }

    pub fn message_type(&self) -> MessageType {
        self.variant().message_type()
    }

    pub fn to_positional(&self) -> Vec<Value> {
        self.variant().to_positional()
    }

    pub fn session(&self) -> &str {
        self.variant().session()
    }

    pub fn request(&self) -> &str {
        self.variant().request()
    }

    pub fn meta(&self) -> &Meta {
        self.variant().meta()
    }

    pub fn set_meta(&mut self, meta: Meta) -> Result<(), ProtocolError> {
        self.variant_mut().set_meta(meta)
    }

    pub fn is_request(&self) -> bool {
        self.message_type().is_request()
    }

    pub fn is_response(&self) -> bool {
        self.message_type().is_response()
    }
}

impl From<SessionRequest> for Body {
    fn from(body: SessionRequest) -> Self {
        Body::SessionRequest(body)
    }
}

impl From<ScriptRequest> for Body {
    fn from(body: ScriptRequest) -> Self {
        Body::ScriptRequest(body)
    }
}

impl From<SessionResponse> for Body {
    fn from(body: SessionResponse) -> Self {
        Body::SessionResponse(body)
    }
}

impl From<ScriptResponse> for Body {
    fn from(body: ScriptResponse) -> Self {
        Body::ScriptResponse(body)
    }
}

impl From<ErrorResponse> for Body {
    fn from(body: ErrorResponse) -> Self {
        Body::ErrorResponse(body)
    }
}

/// Cursor over a decoded positional array.
///
/// The length check happens once up front, so slot accessors only fail on
/// shape mismatches.
pub(crate) struct Slots {
    variant: &'static str,
    index: usize,
    values: std::vec::IntoIter<Value>,
}

impl Slots {
    pub(crate) fn new(
        variant: MessageType,
        raw: Vec<Value>,
        required: usize,
    ) -> Result<Self, ProtocolError> {
        if raw.len() < required {
            return Err(ProtocolError::malformed(
                variant.name(),
                format!("expected at least {} fields, got {}", required, raw.len()),
            ));
        }
        Ok(Self {
            variant: variant.name(),
            index: 0,
            values: raw.into_iter(),
        })
    }

    fn next(&mut self) -> Value {
        self.index += 1;
        self.values.next().unwrap_or(Value::Null)
    }

    fn mismatch(&self, field: &str, expected: &str, got: &Value) -> ProtocolError {
        ProtocolError::malformed(
            self.variant,
            format!(
                "field {} ({}) must be {}, got {}",
                self.index - 1,
                field,
                expected,
                json_kind(got)
            ),
        )
    }

    /// Reads the three shared slots.
    pub(crate) fn shared(&mut self) -> Result<BodyFields, ProtocolError> {
        Ok(BodyFields {
            session: self.string("session")?,
            request: self.string("request")?,
            meta: self.map("meta")?,
        })
    }

    pub(crate) fn string(&mut self, field: &str) -> Result<String, ProtocolError> {
        match self.next() {
            Value::String(s) => Ok(s),
            other => Err(self.mismatch(field, "a string", &other)),
        }
    }

    /// Reads a keyed slot. An empty array is accepted as an empty map since
    /// some encoders cannot tell the two apart.
    pub(crate) fn map(&mut self, field: &str) -> Result<Meta, ProtocolError> {
        match self.next() {
            Value::Object(map) => Ok(map),
            Value::Array(items) if items.is_empty() => Ok(Meta::new()),
            other => Err(self.mismatch(field, "an object", &other)),
        }
    }

    /// Reads a sequence slot, coercing anything that is not an array to an
    /// empty sequence.
    pub(crate) fn sequence(&mut self) -> Vec<Value> {
        match self.next() {
            Value::Array(items) => items,
            _ => Vec::new(),
        }
    }
}

pub(crate) fn positional_with(
    fields: &BodyFields,
    extra: impl IntoIterator<Item = Value>,
) -> Vec<Value> {
    let mut slots = fields.positional();
    slots.extend(extra);
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_meta_reports_all_invalid_keys() {
        let mut body = ScriptRequest::new("g.V()");
        let meta: Meta = json!({"graphName": "g", "bogus": 1, "other": true})
            .as_object()
            .cloned()
            .unwrap();

        let err = body.set_meta(meta).unwrap_err();
        match err {
            ProtocolError::InvalidMeta { variant, mut keys } => {
                keys.sort();
                assert_eq!(variant, "ScriptRequest");
                assert_eq!(keys, vec!["bogus".to_string(), "other".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(body.meta().is_empty());
    }

    #[test]
    fn test_set_meta_leaves_previous_meta_on_failure() {
        let mut body = ScriptRequest::new("g.V()");
        let good: Meta = json!({"graphName": "g"}).as_object().cloned().unwrap();
        body.set_meta(good.clone()).unwrap();

        let bad: Meta = json!({"isolate": true, "nope": 1})
            .as_object()
            .cloned()
            .unwrap();
        assert!(body.set_meta(bad).is_err());
        assert_eq!(body.meta(), &good);
    }

    #[test]
    fn test_every_variant_rejects_unknown_meta() {
        let bodies: Vec<Body> = vec![
            SessionRequest::new().into(),
            ScriptRequest::new("1+1").into(),
            SessionResponse::new().into(),
            ScriptResponse::new().into(),
            ErrorResponse::new("oops").into(),
        ];

        for mut body in bodies {
            let meta: Meta = json!({"notAMetaKey": 1}).as_object().cloned().unwrap();
            let result = body.set_meta(meta);
            assert!(
                matches!(result, Err(ProtocolError::InvalidMeta { .. })),
                "{} accepted an unknown key",
                body.message_type()
            );
            assert!(body.meta().is_empty());
        }
    }

    #[test]
    fn test_body_from_positional_dispatches_on_type() {
        let body = Body::from_positional(
            MessageType::ErrorResponse,
            vec![json!("s1"), json!("r1"), json!({}), json!("boom")],
        )
        .unwrap();
        assert!(matches!(body, Body::ErrorResponse(_)));
        assert_eq!(body.session(), "s1");
        assert_eq!(body.request(), "r1");
    }

    #[test]
    fn test_short_positional_is_malformed() {
        let result = Body::from_positional(MessageType::ScriptResponse, vec![json!("s1")]);
        assert!(matches!(result, Err(ProtocolError::MalformedBody { .. })));
    }

    #[test]
    fn test_wrong_shape_is_malformed() {
        let result = Body::from_positional(
            MessageType::ErrorResponse,
            vec![json!(1), json!("r1"), json!({}), json!("boom")],
        );
        let err = result.unwrap_err();
        assert!(err.to_string().contains("session"));
    }

    #[test]
    fn test_empty_array_meta_accepted_as_map() {
        let body = Body::from_positional(
            MessageType::SessionResponse,
            vec![json!("s1"), json!("r1"), json!([])],
        )
        .unwrap();
        assert!(body.meta().is_empty());
    }

    #[test]
    fn test_non_empty_array_meta_rejected() {
        let result = Body::from_positional(
            MessageType::SessionResponse,
            vec![json!("s1"), json!("r1"), json!([1])],
        );
        assert!(matches!(result, Err(ProtocolError::MalformedBody { .. })));
    }
}
