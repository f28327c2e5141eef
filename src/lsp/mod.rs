//! DLiteScript language features
//!
//! - **Handler**: method router implementing the JSON-RPC message handler
//! - **Documents**: open document state and the URI-keyed store
//! - **Hover**: node resolution results rendered as markdown

pub mod capabilities;
pub mod document;
pub mod handler;
pub mod hover;
pub mod registry;
pub mod store;

pub use handler::LanguageHandler;
