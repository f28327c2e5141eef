//! Open documents keyed by URI

use lsp_types::TextDocumentContentChangeEvent;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::lsp::document::{Document, DocumentError};

/// Documents the client has opened during this session
///
/// Closing a document keeps its entry with empty text, so later requests for
/// the URI still find it.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: HashMap<String, Document>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document
    pub fn open(&mut self, uri: &str, text: &str, version: i32) {
        let document = Document::new(uri, text, version);
        info!(
            "Opened {} (version {}, {} lines)",
            uri,
            version,
            document.line_count()
        );

        self.documents.insert(uri.to_string(), document);
    }

    /// Apply changes in order
    ///
    /// Each change sees the result of the previous one. On failure the
    /// changes before the failing one stay applied.
    pub fn apply_changes(
        &mut self,
        uri: &str,
        version: i32,
        changes: &[TextDocumentContentChangeEvent],
    ) -> Result<(), DocumentError> {
        let document = self
            .documents
            .get_mut(uri)
            .ok_or(DocumentError::NotFound)?;

        for change in changes {
            document.apply_change(change, version)?;
        }

        debug!("Applied {} change(s) to {}", changes.len(), uri);
        Ok(())
    }

    /// Empty the document's text; closing unknown or closed documents is a no-op
    pub fn close(&mut self, uri: &str) {
        match self.documents.get_mut(uri) {
            Some(document) => {
                document.clear();
                info!("Closed {}", uri);
            }
            None => debug!("Ignoring close for unknown document {}", uri),
        }
    }

    pub fn get(&self, uri: &str) -> Result<&Document, DocumentError> {
        self.documents.get(uri).ok_or(DocumentError::NotFound)
    }

    #[allow(dead_code)]
    pub fn contains(&self, uri: &str) -> bool {
        self.documents.contains_key(uri)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
