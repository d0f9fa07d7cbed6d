//! Client error types.

use rexpro_protocol::{MessageType, ProtocolError};
use thiserror::Error;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connect failed: {0}")]
    Connect(#[source] std::io::Error),

    #[error("write failed: {0}")]
    Write(#[source] std::io::Error),

    #[error("read failed: {0}")]
    Read(#[source] std::io::Error),

    #[error("not connected")]
    NotConnected,

    #[error("request timeout")]
    Timeout,

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("server error: {message}")]
    ServerError { message: String, flag: Option<i64> },

    #[error("unexpected response: {0}")]
    UnexpectedResponse(MessageType),
}

impl ClientError {
    /// Returns whether a fresh attempt could succeed.
    ///
    /// The client itself never retries; this only classifies the failure.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::Connect(_) | ClientError::Read(_) | ClientError::Timeout
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_retryable_classification() {
        assert!(ClientError::Connect(io::ErrorKind::ConnectionRefused.into()).is_retryable());
        assert!(ClientError::Read(io::ErrorKind::UnexpectedEof.into()).is_retryable());
        assert!(ClientError::Timeout.is_retryable());

        assert!(!ClientError::Write(io::ErrorKind::BrokenPipe.into()).is_retryable());
        assert!(!ClientError::NotConnected.is_retryable());
        assert!(!ClientError::Protocol(ProtocolError::NoBody).is_retryable());
        assert!(!ClientError::ServerError {
            message: "bad script".to_string(),
            flag: None,
        }
        .is_retryable());
        assert!(!ClientError::UnexpectedResponse(MessageType::SessionResponse).is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = ClientError::ServerError {
            message: "no such property".to_string(),
            flag: Some(0),
        };
        assert_eq!(err.to_string(), "server error: no such property");

        let err = ClientError::UnexpectedResponse(MessageType::SessionResponse);
        assert!(err.to_string().contains("SessionResponse"));

        let err = ClientError::from(ProtocolError::UnknownMessageType(4));
        assert!(err.to_string().starts_with("protocol error"));
    }
}
