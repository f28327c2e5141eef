//! Hover text for a resolved syntax node

use lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind, Range};

use crate::lsp::document::Document;
use crate::lsp::registry::FunctionRegistry;
use crate::syntax::SyntaxNode;

/// Markdown shown for `node`
///
/// Calls to documented functions show the function's documentation; every
/// other node shows its kind and rendered expression.
pub fn hover_contents(node: &dyn SyntaxNode, registry: &dyn FunctionRegistry) -> String {
    if let Some(info) = node
        .callee()
        .and_then(|callee| registry.lookup(callee.namespace, callee.name))
    {
        return info.documentation();
    }

    format!(
        "**{}**\n\n```dlitescript\n{}\n```",
        node.kind(),
        node.expr()
    )
}

/// Node span as a document range
pub fn node_range(document: &Document, node: &dyn SyntaxNode) -> Range {
    Range::new(
        document.index_to_position(node.start()),
        document.index_to_position(node.end()),
    )
}

pub fn build_hover(
    document: &Document,
    node: &dyn SyntaxNode,
    registry: &dyn FunctionRegistry,
) -> Hover {
    Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: hover_contents(node, registry),
        }),
        range: Some(node_range(document, node)),
    }
}
