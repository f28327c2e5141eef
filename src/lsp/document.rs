//! Open document state with a line index
//!
//! All offsets are character offsets (Unicode scalar values). Byte offsets
//! only appear when splicing the underlying `String`.

use lsp_types::{Position, TextDocumentContentChangeEvent};
use tracing::trace;

use crate::jsonrpc::ResponseError;

// ============================================================================
// Document Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("Document not found")]
    NotFound,

    #[error("line {0} is out of range")]
    LineOutOfRange(u32),

    #[error("Start index is greater than end index")]
    StartAfterEnd { start: usize, end: usize },

    #[error("End index is out of bounds")]
    EndOutOfBounds { end: usize, len: usize },
}

impl From<DocumentError> for ResponseError {
    fn from(error: DocumentError) -> Self {
        ResponseError::invalid_params(error.to_string())
    }
}

// ============================================================================
// Document
// ============================================================================

/// A text document as last reported by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    uri: String,
    text: String,
    version: i32,

    /// Character length of each line, excluding the `'\n'`
    line_lengths: Vec<usize>,
}

impl Document {
    pub fn new(uri: impl Into<String>, text: impl Into<String>, version: i32) -> Self {
        let text = text.into();
        let line_lengths = Self::build_line_index(&text);

        Self {
            uri: uri.into(),
            text,
            version,
            line_lengths,
        }
    }

    #[allow(dead_code)]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn line_count(&self) -> usize {
        self.line_lengths.len()
    }

    pub fn line_lengths(&self) -> &[usize] {
        &self.line_lengths
    }

    /// Text length in characters
    pub fn char_len(&self) -> usize {
        self.line_lengths.iter().sum::<usize>() + self.line_lengths.len() - 1
    }

    /// Convert a position to a character offset
    ///
    /// The character is not checked against the line length.
    pub fn position_to_index(&self, position: Position) -> Result<usize, DocumentError> {
        let line = self.checked_line(position.line)?;
        let preceding: usize = self.line_lengths[..line].iter().sum();

        Ok(preceding + line + position.character as usize)
    }

    /// Convert a character offset back to a position
    ///
    /// Offsets past the end of the text map to the end of the last line.
    pub fn index_to_position(&self, index: usize) -> Position {
        let mut remaining = index;

        for (line, &length) in self.line_lengths.iter().enumerate() {
            if remaining <= length {
                return Position::new(line as u32, remaining as u32);
            }
            remaining -= length + 1;
        }

        let last = self.line_lengths.len() - 1;
        Position::new(last as u32, self.line_lengths[last] as u32)
    }

    /// Text of line `n`, without its line break
    #[allow(dead_code)]
    pub fn line(&self, n: u32) -> Result<&str, DocumentError> {
        let line = self.checked_line(n)?;
        let start: usize = self.line_lengths[..line].iter().sum::<usize>() + line;
        let end = start + self.line_lengths[line];

        Ok(&self.text[self.byte_offset(start)..self.byte_offset(end)])
    }

    #[allow(dead_code)]
    pub fn line_length(&self, n: u32) -> Result<usize, DocumentError> {
        let line = self.checked_line(n)?;
        Ok(self.line_lengths[line])
    }

    /// Apply one content change and bump the version
    ///
    /// A change without a range replaces the whole text.
    pub fn apply_change(
        &mut self,
        change: &TextDocumentContentChangeEvent,
        version: i32,
    ) -> Result<(), DocumentError> {
        match change.range {
            None => self.text = change.text.clone(),
            Some(range) => {
                let start = self.position_to_index(range.start)?;
                let end = self.position_to_index(range.end)?;

                if start > end {
                    return Err(DocumentError::StartAfterEnd { start, end });
                }

                let len = self.char_len();
                if end > len {
                    return Err(DocumentError::EndOutOfBounds { end, len });
                }

                let byte_range = self.byte_offset(start)..self.byte_offset(end);
                self.text.replace_range(byte_range, &change.text);
            }
        }

        self.line_lengths = Self::build_line_index(&self.text);
        self.version = version;

        trace!(
            "Document {}: applied change, now {} lines at version {}",
            self.uri,
            self.line_lengths.len(),
            version
        );
        Ok(())
    }

    /// Drop the text but keep the document around
    pub fn clear(&mut self) {
        self.text.clear();
        self.line_lengths = vec![0];
    }

    fn checked_line(&self, n: u32) -> Result<usize, DocumentError> {
        let line = n as usize;
        if line >= self.line_lengths.len() {
            return Err(DocumentError::LineOutOfRange(n));
        }
        Ok(line)
    }

    /// Byte offset of a character offset, clamped to the text length
    fn byte_offset(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map_or(self.text.len(), |(byte, _)| byte)
    }

    /// Per-line character lengths; always at least one entry
    fn build_line_index(text: &str) -> Vec<usize> {
        text.split('\n').map(|line| line.chars().count()).collect()
    }
}
