//! High-level client API.

use crate::connection::{Connection, ConnectionConfig};
use crate::error::ClientError;
use rexpro_protocol::{
    Body, BodyVariant, Message, Meta, ScriptRequest, ScriptResponse, SessionRequest,
    DEFAULT_LANGUAGE,
};
use serde_json::Value;

/// High-level client for a Rexster server.
///
/// Every call opens its own connection, performs one request/response
/// exchange and shuts the connection down again. Nothing is pooled and
/// nothing is retried.
#[derive(Debug, Clone)]
pub struct Client {
    config: ConnectionConfig,
    language: String,
}

impl Client {
    /// Creates a new client with the given configuration.
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Sets the script language used by [`Client::execute_script`].
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Sends one body and returns the server's response body.
    ///
    /// The connection is closed whether or not the exchange succeeded.
    pub async fn send(&self, body: impl Into<Body>) -> Result<Body, ClientError> {
        let mut message = Message::with_body(body);
        let request_id = message
            .body()
            .map(|b| b.request().to_string())
            .unwrap_or_default();

        let mut conn = Connection::new(self.config.clone());
        conn.connect().await?;
        let result = conn.exchange(&mut message).await;
        conn.close().await;

        let response = result?;
        if response.request() != request_id {
            tracing::warn!(
                "Response request id {} does not match request {}",
                response.request(),
                request_id
            );
        }
        Ok(response)
    }

    /// Runs `script` against `graph_name` with the given variable bindings.
    pub async fn execute_script(
        &self,
        script: &str,
        graph_name: &str,
        bindings: Meta,
    ) -> Result<Body, ClientError> {
        let request = self.script_request(script, graph_name, bindings)?;
        self.execute(request).await
    }

    /// Sends a prepared script request.
    pub async fn execute(&self, request: ScriptRequest) -> Result<Body, ClientError> {
        tracing::debug!(
            "Executing {} script ({} bytes)",
            request.language(),
            request.script().len()
        );
        self.send(request).await
    }

    /// Like [`Client::execute_script`], but an Error-Response becomes
    /// [`ClientError::ServerError`] and any other non-script response is
    /// [`ClientError::UnexpectedResponse`].
    pub async fn run_script(
        &self,
        script: &str,
        graph_name: &str,
        bindings: Meta,
    ) -> Result<ScriptResponse, ClientError> {
        let body = self.execute_script(script, graph_name, bindings).await?;
        into_script_response(body)
    }

    /// Sends a Session-Request and returns the response body.
    pub async fn open_session(&self) -> Result<Body, ClientError> {
        self.send(SessionRequest::new()).await
    }

    fn script_request(
        &self,
        script: &str,
        graph_name: &str,
        bindings: Meta,
    ) -> Result<ScriptRequest, ClientError> {
        let mut meta = Meta::new();
        meta.insert(
            "graphName".to_string(),
            Value::String(graph_name.to_string()),
        );

        let request = ScriptRequest::new(script)
            .with_language(self.language.clone())
            .with_bindings(bindings)
            .with_meta(meta)?;
        Ok(request)
    }
}

/// Unwraps a script response, turning an error response into an error.
pub fn into_script_response(body: Body) -> Result<ScriptResponse, ClientError> {
    match body {
        Body::ScriptResponse(resp) => Ok(resp),
        Body::ErrorResponse(err) => Err(ClientError::ServerError {
            message: err.error_message().to_string(),
            flag: err.flag(),
        }),
        other => Err(ClientError::UnexpectedResponse(other.message_type())),
    }
}
