//! Test utilities and global setup
//!
//! Provides centralized test logging configuration, wire-frame helpers and an
//! in-memory connection to a running language server.

use serde_json::Value;
use std::time::Duration;
use tokio::io::{DuplexStream, ReadHalf, WriteHalf};
use tokio::task::JoinHandle;

use crate::jsonrpc::framing::MessageStream;
use crate::jsonrpc::{Server, ServerError, ShutdownSignal};
use crate::lsp::LanguageHandler;

/// Test logging utilities
#[cfg(all(test, feature = "test-logging"))]
pub mod logging {
    use std::sync::Once;
    use tracing_subscriber::{EnvFilter, fmt};

    static INIT: Once = Once::new();

    /// Initialize test logging globally - safe to call multiple times
    ///
    /// Respects `RUST_LOG`, defaulting to debug output for this crate, and
    /// writes through the test writer so output is captured per test.
    ///
    /// ```bash
    /// RUST_LOG=dlite_lsp=trace cargo test --features test-logging
    /// ```
    pub fn init() {
        INIT.call_once(|| {
            let env_filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("debug,tokio=info"));

            fmt()
                .with_env_filter(env_filter)
                .with_test_writer()
                .with_target(true)
                .compact()
                .try_init()
                .ok();
        });
    }
}

/// Install test logging when the test binary loads
#[cfg(all(test, feature = "test-logging"))]
#[macro_export]
macro_rules! setup_test_logging {
    () => {
        #[ctor::ctor]
        fn init_test_logging() {
            $crate::test_utils::logging::init();
        }
    };
}

#[cfg(all(test, feature = "test-logging"))]
setup_test_logging!();

// ============================================================================
// Wire Helpers
// ============================================================================

/// Wrap a message body in a Content-Length frame
pub fn frame(body: &str) -> String {
    format!("Content-Length: {}\r\n\r\n{}", body.len(), body)
}

/// Decode every frame in `bytes` as JSON
pub async fn read_frames(bytes: &[u8]) -> Vec<Value> {
    let mut stream = MessageStream::new(bytes, tokio::io::sink());
    let mut messages = Vec::new();

    while let Some(body) = stream.read_message().await.unwrap() {
        messages.push(serde_json::from_slice(&body).unwrap());
    }

    messages
}

// ============================================================================
// In-Memory Connection
// ============================================================================

/// Client end of a language server running on in-memory pipes
pub struct TestConnection {
    client: MessageStream<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>,
    server: JoinHandle<Result<(), ServerError>>,
    pub shutdown: ShutdownSignal,
}

impl TestConnection {
    /// Start a [`LanguageHandler`] server on a background task
    pub fn spawn() -> Self {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server);
        let (client_read, client_write) = tokio::io::split(client);

        let shutdown = ShutdownSignal::new();
        let handler = LanguageHandler::new(shutdown.clone());
        let mut server = Server::new(handler, server_read, server_write, shutdown.clone());

        Self {
            client: MessageStream::new(client_read, client_write),
            server: tokio::spawn(async move { server.run().await }),
            shutdown,
        }
    }

    /// Write raw bytes, bypassing the framer
    pub async fn send_raw(&mut self, bytes: &[u8]) {
        use tokio::io::AsyncWriteExt;

        self.client.writer_mut().write_all(bytes).await.unwrap();
    }

    pub async fn send(&mut self, message: Value) {
        let body = serde_json::to_vec(&message).unwrap();
        self.client.write_message(&body).await.unwrap();
    }

    pub async fn notify(&mut self, method: &str, params: Value) {
        self.send(serde_json::json!({"jsonrpc": "2.0", "method": method, "params": params}))
            .await;
    }

    /// Send a request and wait for the next message from the server
    pub async fn request(&mut self, id: i64, method: &str, params: Value) -> Value {
        self.send(serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        }))
        .await;

        self.next_message()
            .await
            .unwrap_or_else(|| panic!("no reply to {method}"))
    }

    /// Next message from the server, or `None` once the server stops writing
    pub async fn next_message(&mut self) -> Option<Value> {
        let body = tokio::time::timeout(Duration::from_secs(5), self.client.read_message())
            .await
            .expect("timed out waiting for the server")
            .unwrap()?;

        Some(serde_json::from_slice(&body).unwrap())
    }

    /// Close the client side and wait for the server loop to return
    pub async fn finish(self) -> Result<(), ServerError> {
        drop(self.client);
        tokio::time::timeout(Duration::from_secs(5), self.server)
            .await
            .expect("server loop did not stop")
            .unwrap()
    }

    /// Wait for the server loop to return without closing the client side
    pub async fn join(self) -> Result<(), ServerError> {
        tokio::time::timeout(Duration::from_secs(5), self.server)
            .await
            .expect("server loop did not stop")
            .unwrap()
    }
}
