//! Packing bodies into frames and unpacking them again.
//!
//! [`encode_frame`] and [`decode_body`] are the pure transformations. The
//! [`Message`] type wraps them for callers that fill in a frame piece by piece,
//! e.g. header fields first and body bytes once the transport has read them.
//! A `Message` models exactly one request or one response.

use crate::body::Body;
use crate::error::ProtocolError;
use crate::frame::{self, Header, HEADER_SIZE};
use crate::registry::{id_for_variant, variant_for_id};
use crate::serializer::SerializerType;
use crate::{MAX_BODY_SIZE, PROTOCOL_VERSION};
use bytes::{BufMut, Bytes, BytesMut};

/// A body serialized and paired with its header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    pub header: Header,
    pub body: Bytes,
}

impl EncodedFrame {
    /// Total frame size on the wire.
    pub fn wire_len(&self) -> usize {
        HEADER_SIZE + self.body.len()
    }

    /// Returns header followed by body.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.wire_len());
        self.header.encode_into(&mut buf);
        buf.put_slice(&self.body);
        buf.freeze()
    }
}

/// A body decoded from the wire, with the header it arrived under.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBody {
    pub header: Header,
    pub body: Body,
}

/// Serializes `body` and builds the matching header.
pub fn encode_frame(
    body: &Body,
    serializer: SerializerType,
) -> Result<EncodedFrame, ProtocolError> {
    let message_type = id_for_variant(body.message_type())?;
    let bytes = serializer.serializer().serialize(&body.to_positional())?;
    let body_len = frame::body_len(bytes.len())?;

    Ok(EncodedFrame {
        header: Header::new(PROTOCOL_VERSION, serializer.id(), message_type, body_len),
        body: Bytes::from(bytes),
    })
}

/// Decodes body bytes into the variant selected by the header.
pub fn decode_body(header: &Header, bytes: &[u8]) -> Result<DecodedBody, ProtocolError> {
    let serializer = SerializerType::from_id(header.serializer)?;
    let raw = serializer.serializer().deserialize(bytes)?;
    let message_type = variant_for_id(header.message_type)?;
    let body = Body::from_positional(message_type, raw)?;

    Ok(DecodedBody {
        header: *header,
        body,
    })
}

/// One RexPro message, either being packed or being unpacked.
///
/// Either the typed body or the serialized bytes is authoritative. Whatever is
/// missing (type id, body length, serialized bytes) is derived from it on
/// first access and cached. [`Message::pack`] drops every cached value before
/// encoding and [`Message::unpack`] drops the serialized bytes once the body
/// is decoded.
#[derive(Debug, Clone)]
pub struct Message {
    version: u8,
    serializer: SerializerType,
    message_type: Option<u8>,
    body_len: Option<u32>,
    body: Option<Body>,
    serialized: Option<Bytes>,
}

impl Message {
    pub fn new() -> Self {
        Self {
            version: PROTOCOL_VERSION,
            serializer: SerializerType::default(),
            message_type: None,
            body_len: None,
            body: None,
            serialized: None,
        }
    }

    /// Creates a message ready to pack `body`.
    pub fn with_body(body: impl Into<Body>) -> Self {
        let mut message = Self::new();
        message.set_body(body);
        message
    }

    /// Creates a message from a header read off the wire.
    ///
    /// The serializer and message type ids and the body length are validated
    /// here; attach the body bytes with [`Message::set_serialized`] before
    /// unpacking.
    pub fn from_header(header: &Header) -> Result<Self, ProtocolError> {
        if header.body_len > MAX_BODY_SIZE {
            return Err(ProtocolError::BodyTooLarge {
                len: header.body_len,
                max: MAX_BODY_SIZE,
            });
        }

        let mut message = Self::new();
        message.set_version(header.version);
        message.set_serializer(header.serializer)?;
        message.set_message_type(header.message_type)?;
        message.set_body_len(header.body_len);
        Ok(message)
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn set_version(&mut self, version: u8) {
        self.version = version;
    }

    pub fn serializer(&self) -> SerializerType {
        self.serializer
    }

    pub fn set_serializer(&mut self, id: u8) -> Result<(), ProtocolError> {
        self.serializer = SerializerType::from_id(id)?;
        Ok(())
    }

    /// Sets the message type id. Ids outside the registry are rejected.
    pub fn set_message_type(&mut self, id: u8) -> Result<(), ProtocolError> {
        variant_for_id(id)?;
        self.message_type = Some(id);
        Ok(())
    }

    pub fn set_body_len(&mut self, len: u32) {
        self.body_len = Some(len);
    }

    /// Replaces the typed body. Values derived from the previous body are
    /// dropped.
    pub fn set_body(&mut self, body: impl Into<Body>) {
        self.body = Some(body.into());
        self.message_type = None;
        self.body_len = None;
        self.serialized = None;
    }

    /// Sets the serialized body, as read from the transport.
    pub fn set_serialized(&mut self, bytes: impl Into<Bytes>) {
        self.serialized = Some(bytes.into());
    }

    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    pub fn into_body(self) -> Option<Body> {
        self.body
    }

    /// Returns the message type id, deriving it from the body if unset.
    pub fn message_type(&mut self) -> Result<Option<u8>, ProtocolError> {
        if self.message_type.is_none() {
            if let Some(body) = &self.body {
                self.message_type = Some(id_for_variant(body.message_type())?);
            }
        }
        Ok(self.message_type)
    }

    /// Returns the serialized body, serializing the typed body if needed.
    pub fn serialized(&mut self) -> Result<Option<&Bytes>, ProtocolError> {
        if self.serialized.is_none() {
            if let Some(body) = &self.body {
                let bytes = self.serializer.serializer().serialize(&body.to_positional())?;
                self.serialized = Some(Bytes::from(bytes));
            }
        }
        Ok(self.serialized.as_ref())
    }

    /// Returns the body length in bytes, deriving it from the serialized body
    /// (serializing first if needed) when unset.
    pub fn body_len(&mut self) -> Result<Option<u32>, ProtocolError> {
        if self.body_len.is_none() {
            if let Some(len) = self.serialized()?.map(|bytes| bytes.len()) {
                self.body_len = Some(frame::body_len(len)?);
            }
        }
        Ok(self.body_len)
    }

    /// Encodes the body into a complete frame, header followed by body.
    pub fn pack(&mut self) -> Result<Bytes, ProtocolError> {
        let body = self.body.as_ref().ok_or(ProtocolError::NoBody)?;

        self.message_type = None;
        self.body_len = None;
        self.serialized = None;

        let mut frame = encode_frame(body, self.serializer)?;
        frame.header.version = self.version;

        self.message_type = Some(frame.header.message_type);
        self.body_len = Some(frame.header.body_len);
        self.serialized = Some(frame.body.clone());

        Ok(frame.to_bytes())
    }

    /// Decodes the serialized body into a typed body.
    ///
    /// The message type must already be set from the received header.
    pub fn unpack(&mut self) -> Result<&Body, ProtocolError> {
        let serialized = self
            .serialized
            .as_ref()
            .ok_or(ProtocolError::NoSerializedBody)?;
        let message_type = self
            .message_type
            .ok_or(ProtocolError::MissingField("message_type"))?;

        let header = Header::new(
            self.version,
            self.serializer.id(),
            message_type,
            frame::body_len(serialized.len())?,
        );
        let decoded = decode_body(&header, serialized)?;

        self.serialized = None;
        self.body_len = None;
        Ok(&*self.body.insert(decoded.body))
    }
}

impl Default for Message {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::request::{ScriptRequest, SessionRequest};
    use crate::body::response::{ErrorResponse, ScriptResponse, SessionResponse};
    use crate::body::BodyVariant;
    use crate::ident::NIL_IDENTIFIER;
    use crate::serializer::{BodySerializer, JsonSerializer};
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn split(packed: &[u8]) -> (Header, &[u8]) {
        let header = Header::decode(packed).unwrap();
        (header, &packed[HEADER_SIZE..])
    }

    fn receive(packed: &[u8]) -> Message {
        let (header, body) = split(packed);
        let mut message = Message::from_header(&header).unwrap();
        message.set_serialized(Bytes::copy_from_slice(body));
        message
    }

    #[test]
    fn test_pack_script_request() {
        let request = ScriptRequest::new("g.V()")
            .with_language("default")
            .with_meta(json!({"graphName": "g"}).as_object().cloned().unwrap())
            .unwrap();
        let request_id = request.request().to_string();

        let packed = Message::with_body(request).pack().unwrap();
        let (header, body) = split(&packed);

        assert_eq!(header.version, 1);
        assert_eq!(header.serializer, 1);
        assert_eq!(header.message_type, 3);
        assert_eq!(&packed[2..6], &[0u8; 4]);
        assert_eq!(header.body_len as usize, body.len());

        let decoded: Value = serde_json::from_slice(body).unwrap();
        assert_eq!(
            decoded,
            json!([NIL_IDENTIFIER, request_id, {"graphName": "g"}, "default", "g.V()", {}])
        );
    }

    #[test]
    fn test_empty_collections_encode_as_objects() {
        let packed = Message::with_body(ScriptRequest::new("1")).pack().unwrap();
        let body = std::str::from_utf8(&packed[HEADER_SIZE..]).unwrap();

        assert!(body.ends_with(r#","groovy","1",{}]"#));
        assert!(body.contains(r#"",{},"groovy""#));
        assert!(!body.contains("[]"));
    }

    #[test]
    fn test_unpack_script_response() {
        let mut message = Message::new();
        message.set_message_type(5).unwrap();
        message.set_serialized(&br#"["s1","r1",{}, [{"name":"a"}], {}]"#[..]);

        let body = message.unpack().unwrap();
        match body {
            Body::ScriptResponse(resp) => {
                assert_eq!(resp.session(), "s1");
                assert_eq!(resp.request(), "r1");
                assert!(resp.meta().is_empty());
                assert_eq!(resp.results(), &[json!({"name": "a"})]);
                assert!(resp.bindings().is_empty());
            }
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[test]
    fn test_unpack_error_response() {
        let mut message = Message::new();
        message.set_message_type(0).unwrap();
        message.set_serialized(&br#"["s1","r1",{"flag":1},"bad script"]"#[..]);

        match message.unpack().unwrap() {
            Body::ErrorResponse(resp) => {
                assert_eq!(resp.error_message(), "bad script");
                assert_eq!(resp.flag(), Some(1));
            }
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_message_type() {
        let mut message = Message::new();
        assert!(matches!(
            message.set_message_type(4),
            Err(ProtocolError::UnknownMessageType(4))
        ));

        let header = Header::new(1, 1, 4, 2);
        assert!(matches!(
            decode_body(&header, b"[]"),
            Err(ProtocolError::UnknownMessageType(4))
        ));
    }

    #[test]
    fn test_pack_without_body() {
        let mut message = Message::new();
        assert!(matches!(message.pack(), Err(ProtocolError::NoBody)));
        assert_eq!(message.message_type().unwrap(), None);
        assert_eq!(message.body_len().unwrap(), None);
    }

    #[test]
    fn test_unpack_without_serialized_body() {
        let mut message = Message::new();
        message.set_message_type(5).unwrap();
        assert!(matches!(
            message.unpack(),
            Err(ProtocolError::NoSerializedBody)
        ));
    }

    #[test]
    fn test_unpack_without_message_type() {
        let mut message = Message::new();
        message.set_serialized(&b"[]"[..]);
        assert!(matches!(
            message.unpack(),
            Err(ProtocolError::MissingField("message_type"))
        ));
    }

    #[test]
    fn test_unpack_malformed_body() {
        let mut message = Message::new();
        message.set_message_type(0).unwrap();
        message.set_serialized(&br#"["s1","r1"]"#[..]);
        assert!(matches!(
            message.unpack(),
            Err(ProtocolError::MalformedBody { .. })
        ));
        assert!(message.body().is_none());
    }

    #[test]
    fn test_unsupported_serializer() {
        let mut message = Message::new();
        assert!(matches!(
            message.set_serializer(7),
            Err(ProtocolError::UnsupportedSerializer(7))
        ));

        let header = Header::new(1, 7, 5, 2);
        assert!(matches!(
            decode_body(&header, b"[]"),
            Err(ProtocolError::UnsupportedSerializer(7))
        ));
        assert!(matches!(
            Message::from_header(&header),
            Err(ProtocolError::UnsupportedSerializer(7))
        ));
    }

    #[test]
    fn test_round_trip_every_variant() {
        let bodies: Vec<Body> = vec![
            SessionRequest::new().into(),
            ScriptRequest::new("g.v(id).out")
                .with_binding("id", 1)
                .with_meta(json!({"inSession": true}).as_object().cloned().unwrap())
                .unwrap()
                .into(),
            SessionResponse::for_request("sess", "req").into(),
            ScriptResponse::for_request("sess", "req")
                .with_results(vec![json!({"name": "marko"}), json!(29)])
                .with_bindings(json!({"id": 1}).as_object().cloned().unwrap())
                .into(),
            ErrorResponse::for_request("sess", "req", "no such vertex").into(),
        ];

        for body in bodies {
            let packed = Message::with_body(body.clone()).pack().unwrap();
            let mut received = receive(&packed);
            let decoded = received.unpack().unwrap();
            assert_eq!(decoded, &body);
        }
    }

    #[test]
    fn test_unpack_clears_serialized_body() {
        let packed = Message::with_body(ErrorResponse::new("x")).pack().unwrap();
        let mut received = receive(&packed);
        received.unpack().unwrap();

        assert!(received.serialized.is_none());
        // Derived again from the now-authoritative body.
        let reserialized = received.serialized().unwrap().cloned().unwrap();
        assert_eq!(&reserialized[..], &packed[HEADER_SIZE..]);
    }

    #[test]
    fn test_lazy_derivation() {
        let mut message = Message::with_body(ScriptRequest::new("g.V()"));
        assert_eq!(message.message_type().unwrap(), Some(3));

        let len = message.body_len().unwrap().unwrap();
        let serialized = message.serialized().unwrap().cloned().unwrap();
        assert_eq!(len as usize, serialized.len());

        // Cached values are stable.
        assert_eq!(message.body_len().unwrap(), Some(len));
        assert_eq!(message.serialized().unwrap(), Some(&serialized));
    }

    #[test]
    fn test_pack_discards_stale_decode_state() {
        let mut message = Message::new();
        message.set_message_type(0).unwrap();
        message.set_body_len(999);
        message.set_serialized(&b"[\"stale\"]"[..]);
        message.set_body(SessionRequest::new());

        let packed = message.pack().unwrap();
        let (header, body) = split(&packed);

        assert_eq!(header.message_type, 1);
        assert_eq!(header.body_len as usize, body.len());
        assert_ne!(body, b"[\"stale\"]");
        assert_eq!(message.body_len().unwrap(), Some(header.body_len));
    }

    #[test]
    fn test_set_body_drops_derived_values() {
        let mut message = Message::with_body(ScriptRequest::new("g.V()"));
        message.pack().unwrap();
        assert_eq!(message.message_type().unwrap(), Some(3));

        message.set_body(SessionRequest::new());
        assert_eq!(message.message_type().unwrap(), Some(1));

        let expected = JsonSerializer
            .serialize(&message.body().unwrap().to_positional())
            .unwrap();
        assert_eq!(message.body_len().unwrap(), Some(expected.len() as u32));
        assert_eq!(
            message.serialized().unwrap().map(|b| &b[..]),
            Some(&expected[..])
        );
    }

    #[test]
    fn test_unpack_drops_received_length() {
        let mut message = Message::new();
        message.set_message_type(0).unwrap();
        let spaced = &br#"[ "s1" , "r1" , {} , "bad" ]"#[..];
        message.set_body_len(spaced.len() as u32);
        message.set_serialized(spaced);
        message.unpack().unwrap();

        let len = message.body_len().unwrap().unwrap();
        let reserialized = message.serialized().unwrap().cloned().unwrap();
        assert_eq!(len as usize, reserialized.len());
        assert!(reserialized.len() < spaced.len());
    }

    #[test]
    fn test_from_header_rejects_oversized_body() {
        let header = Header::new(1, 1, 5, u32::MAX);
        assert!(matches!(
            Message::from_header(&header),
            Err(ProtocolError::BodyTooLarge { len: u32::MAX, .. })
        ));

        let header = Header::new(1, 1, 5, MAX_BODY_SIZE);
        assert!(Message::from_header(&header).is_ok());
    }

    #[test]
    fn test_pack_uses_message_version() {
        let mut message = Message::with_body(SessionRequest::new());
        message.set_version(2);
        let packed = message.pack().unwrap();
        assert_eq!(packed[0], 2);
    }

    #[test]
    fn test_multibyte_length_is_bytes() {
        let script = "g.V().has('name', 'Zoë').has('city', '東京')";
        let packed = Message::with_body(ScriptRequest::new(script)).pack().unwrap();
        let (header, body) = split(&packed);

        assert_eq!(header.body_len as usize, body.len());
        let text = std::str::from_utf8(body).unwrap();
        assert!(text.contains(script));
        assert!(text.chars().count() < body.len());
    }

    #[test]
    fn test_encoded_frame_bytes() {
        let body = Body::from(ErrorResponse::new("e"));
        let frame = encode_frame(&body, SerializerType::Json).unwrap();
        let bytes = frame.to_bytes();
        assert_eq!(bytes.len(), frame.wire_len());
        assert_eq!(&bytes[..HEADER_SIZE], &frame.header.encode()[..]);
        assert_eq!(&bytes[HEADER_SIZE..], &frame.body[..]);
    }

    proptest! {
        #[test]
        fn prop_body_len_matches_body_bytes(script in "\\PC*", binding in "\\PC*") {
            let request = ScriptRequest::new(script.clone()).with_binding("x", binding);
            let packed = Message::with_body(request.clone()).pack().unwrap();
            let (header, body) = split(&packed);

            prop_assert_eq!(header.body_len as usize, body.len());
            prop_assert_eq!(packed.len(), HEADER_SIZE + body.len());

            let decoded = decode_body(&header, body).unwrap();
            prop_assert_eq!(decoded.body, Body::from(request));
        }
    }
}
