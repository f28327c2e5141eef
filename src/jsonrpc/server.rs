//! JSON-RPC dispatch loop
//!
//! Reads one framed message at a time, decodes the envelope, hands it to a
//! [`MessageHandler`] and writes the reply (if any) before reading the next
//! message. Nothing is pipelined: a message's reply is fully flushed before
//! the following message is read.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{Level, debug, error, info, warn};

use crate::jsonrpc::framing::{FramingError, MessageStream};
use crate::jsonrpc::jsonrpc_utils::{error_response, parse_error_response, success_response};
use crate::jsonrpc::protocol::{JsonRpcRequest, JsonRpcResponse, ResponseError};
use crate::jsonrpc::shutdown::ShutdownSignal;
use crate::{log_lsp_message, log_timing};

// ============================================================================
// Handler Trait
// ============================================================================

/// Method-level request handler driven by the [`Server`]
///
/// `Ok(None)` means "no reply expected". A reply is only ever written for
/// messages that carry an id, whatever the handler returns.
#[async_trait]
pub trait MessageHandler: Send {
    async fn handle(
        &mut self,
        method: &str,
        params: Value,
    ) -> Result<Option<Value>, ResponseError>;
}

// ============================================================================
// Server Errors
// ============================================================================

/// Errors raised while serving a connection
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Framing(#[from] FramingError),

    #[error("could not decode message: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("could not handle message {method}: {source}")]
    Handler {
        method: String,
        #[source]
        source: ResponseError,
    },

    #[error("could not encode response: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ServerError {
    /// Framing errors break the message boundaries of the stream, so the
    /// connection cannot continue. Everything else is scoped to one message.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ServerError::Framing(_))
    }
}

// ============================================================================
// Server
// ============================================================================

/// Sequential JSON-RPC server over a framed byte stream
pub struct Server<H, R, W> {
    handler: H,
    stream: MessageStream<R, W>,
    shutdown: ShutdownSignal,
}

impl<H, R, W> Server<H, R, W>
where
    H: MessageHandler,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(handler: H, reader: R, writer: W, shutdown: ShutdownSignal) -> Self {
        Self {
            handler,
            stream: MessageStream::new(reader, writer),
            shutdown,
        }
    }

    /// Get a reference to the handler
    #[allow(dead_code)]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Get a reference to the outbound half of the stream
    #[allow(dead_code)]
    pub fn writer(&self) -> &W {
        self.stream.writer()
    }

    /// Serve until the input ends, the peer asks to exit, or framing breaks
    pub async fn run(&mut self) -> Result<(), ServerError> {
        info!("Server loop started");

        loop {
            let Some(body) = self.stream.read_message().await? else {
                info!("Input stream closed, stopping server loop");
                return Ok(());
            };

            match self.handle_message(&body).await {
                Ok(()) => {}
                Err(e) if e.is_fatal() => {
                    error!("Fatal error while serving connection: {}", e);
                    return Err(e);
                }
                Err(e) => warn!("Failed to process message: {}", e),
            }

            if self.shutdown.is_triggered() {
                info!("Exit requested, stopping server loop");
                return Ok(());
            }
        }
    }

    /// Decode, dispatch and answer a single message body
    ///
    /// Per-message failures are returned after the peer has been told about
    /// them; only write failures surface as fatal errors.
    pub async fn handle_message(&mut self, body: &[u8]) -> Result<(), ServerError> {
        let request: JsonRpcRequest = match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(e) => {
                let id = JsonRpcRequest::salvage_id(body);
                self.send(&parse_error_response(id, &e.to_string())).await?;
                return Err(ServerError::Decode(e));
            }
        };

        let direction = if request.is_notification() {
            "incoming notification"
        } else {
            "incoming request"
        };
        let JsonRpcRequest {
            method, params, id, ..
        } = request;

        log_lsp_message!(Level::DEBUG, direction, method.as_str(), &params);
        let start = Instant::now();
        let outcome = self.handler.handle(&method, params).await;
        log_timing!(Level::DEBUG, method.as_str(), start.elapsed());

        match (outcome, id) {
            (Err(source), Some(id)) => {
                self.send(&error_response(Some(id), source.clone())).await?;
                Err(ServerError::Handler { method, source })
            }
            (Err(source), None) => Err(ServerError::Handler { method, source }),
            (Ok(Some(result)), Some(id)) => {
                self.send(&success_response(Some(id), result)).await
            }
            (Ok(_), _) => {
                debug!("No reply for {}", method);
                Ok(())
            }
        }
    }

    async fn send(&mut self, response: &JsonRpcResponse) -> Result<(), ServerError> {
        let body = serde_json::to_vec(response).map_err(ServerError::Encode)?;
        log_lsp_message!(Level::DEBUG, "outgoing", "response", response);
        self.stream.write_message(&body).await?;
        Ok(())
    }
}
