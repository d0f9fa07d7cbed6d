//! Connection management.
//!
//! A [`Connection`] carries one request/response exchange: the packed request
//! frame is written, then exactly [`HEADER_SIZE`] bytes of response header are
//! read, then exactly as many body bytes as that header declares.

use crate::error::ClientError;
use rexpro_protocol::{Body, Header, Message, HEADER_SIZE};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server address.
    pub addr: SocketAddr,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Time allowed for reading a complete response.
    pub request_timeout: Duration,
}

impl ConnectionConfig {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// A connection to a Rexster server.
pub struct Connection {
    config: ConnectionConfig,
    stream: Option<TcpStream>,
}

impl Connection {
    /// Creates a new connection (not yet connected).
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            stream: None,
        }
    }

    /// Connects to the server.
    pub async fn connect(&mut self) -> Result<(), ClientError> {
        tracing::debug!("Connecting to {}...", self.config.addr);

        let stream = tokio::time::timeout(
            self.config.connect_timeout,
            TcpStream::connect(self.config.addr),
        )
        .await
        .map_err(|_| {
            tracing::debug!("Connection timeout");
            ClientError::Timeout
        })?
        .map_err(|e| {
            tracing::debug!("Connection failed: {}", e);
            ClientError::Connect(e)
        })?;

        stream.set_nodelay(true).ok();
        self.stream = Some(stream);

        tracing::debug!("Connected to {}", self.config.addr);
        Ok(())
    }

    /// Returns whether the connection is established.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Writes a packed frame.
    pub async fn send(&mut self, frame: &[u8]) -> Result<(), ClientError> {
        let stream = self.stream.as_mut().ok_or(ClientError::NotConnected)?;
        write_frame(stream, frame).await
    }

    /// Reads one response frame, bounded by the request timeout.
    ///
    /// The returned message holds the header fields and serialized body but
    /// has not been unpacked yet.
    pub async fn receive(&mut self) -> Result<Message, ClientError> {
        let timeout = self.config.request_timeout;
        let stream = self.stream.as_mut().ok_or(ClientError::NotConnected)?;

        tokio::time::timeout(timeout, read_message(stream))
            .await
            .map_err(|_| {
                tracing::debug!("Read timeout");
                ClientError::Timeout
            })?
    }

    /// Sends `message` and returns the decoded response body.
    pub async fn exchange(&mut self, message: &mut Message) -> Result<Body, ClientError> {
        let packed = message.pack()?;
        self.send(&packed).await?;

        let mut response = self.receive().await?;
        Ok(response.unpack()?.clone())
    }

    /// Closes the connection.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            tracing::debug!("Shutting down connection to {}", self.config.addr);
            let _ = stream.shutdown().await;
        }
    }
}

/// Writes one packed frame to `writer`.
pub async fn write_frame<W>(writer: &mut W, frame: &[u8]) -> Result<(), ClientError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(frame).await.map_err(ClientError::Write)?;
    writer.flush().await.map_err(ClientError::Write)?;
    tracing::debug!("Sent frame ({} bytes)", frame.len());
    Ok(())
}

/// Reads one frame from `reader`: the fixed header, then exactly the number
/// of body bytes the header declares.
///
/// Headers declaring a body over [`rexpro_protocol::MAX_BODY_SIZE`] are
/// rejected before any body bytes are read. A stream that ends early fails
/// with [`ClientError::Read`].
pub async fn read_message<R>(reader: &mut R) -> Result<Message, ClientError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_SIZE];
    reader
        .read_exact(&mut header)
        .await
        .map_err(ClientError::Read)?;
    let header = Header::decode(&header)?;
    tracing::debug!(
        "Received header: type={} body_len={}",
        header.message_type,
        header.body_len
    );

    let mut message = Message::from_header(&header)?;

    let mut body = vec![0u8; header.body_len as usize];
    reader.read_exact(&mut body).await.map_err(ClientError::Read)?;
    message.set_serialized(body);

    Ok(message)
}
