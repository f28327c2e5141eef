//! JSON-RPC 2.0 over Content-Length framed byte streams
//!
//! - **Framing**: Content-Length headers around raw message bodies
//! - **Protocol**: request/response envelopes and error objects
//! - **Server**: the sequential read-dispatch-reply loop
//! - **Shutdown**: the one-shot exit signal shared with the terminator task

pub mod framing;
pub mod jsonrpc_utils;
pub mod protocol;
pub mod server;
pub mod shutdown;

pub use protocol::ResponseError;
pub use server::{MessageHandler, Server, ServerError};
pub use shutdown::ShutdownSignal;
