//! Syntax tree abstraction
//!
//! The language server never inspects concrete node kinds directly. Anything
//! implementing [`SyntaxNode`] can be resolved against a cursor offset and
//! rendered for hover; [`SourceParser`] is the seam through which document
//! text becomes a tree.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod resolve;

use std::fmt;

pub use parser::ExprParser;
pub use resolve::find_node_at;

// ============================================================================
// Syntax Node Trait
// ============================================================================

/// Callee of a function call node, as needed for registry lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Callee<'a> {
    /// Package namespace, empty for global functions
    pub namespace: &'a str,
    pub name: &'a str,
}

/// A node of a syntax tree
///
/// Offsets are character offsets into the document text and spans are
/// half-open: a node covers `start() <= i < end()`.
pub trait SyntaxNode: fmt::Debug {
    fn start(&self) -> usize;

    fn end(&self) -> usize;

    /// Visit this node and every descendant in pre-order
    ///
    /// The visitor returns `false` to stop the traversal; `walk` then returns
    /// `false` as well.
    fn walk<'a>(&'a self, visitor: &mut dyn FnMut(&'a dyn SyntaxNode) -> bool) -> bool;

    /// Human-readable node kind, e.g. `"Identifier"`
    fn kind(&self) -> &'static str;

    /// Source-like rendering of the node
    fn expr(&self) -> String;

    /// Function being called, for call nodes
    fn callee(&self) -> Option<Callee<'_>> {
        None
    }

    /// Width of the span in characters
    fn span_len(&self) -> usize {
        self.end().saturating_sub(self.start())
    }

    fn contains(&self, index: usize) -> bool {
        self.start() <= index && index < self.end()
    }
}

// ============================================================================
// Parser Seam
// ============================================================================

/// Error produced when document text cannot be turned into a tree
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at character {offset}")]
pub struct ParseError {
    pub message: String,

    /// Character offset where parsing failed
    pub offset: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// Turns document text into a syntax tree
pub trait SourceParser: Send {
    fn parse(&self, text: &str) -> Result<Box<dyn SyntaxNode>, ParseError>;
}
