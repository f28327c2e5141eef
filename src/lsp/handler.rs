//! LSP method router
//!
//! Maps method names to handlers, decodes their params and encodes their
//! results. Document state lives in the [`DocumentStore`]; the dispatch loop
//! is the only caller, so no locking is involved.

use async_trait::async_trait;
use lsp_types::{
    CompletionList, CompletionParams, CompletionResponse, DidChangeTextDocumentParams,
    DidCloseTextDocumentParams, DidOpenTextDocumentParams, Documentation, HoverParams,
    MarkupContent, MarkupKind, SignatureHelp, SignatureHelpParams, SignatureInformation,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::jsonrpc::{MessageHandler, ResponseError, ShutdownSignal};
use crate::lsp::capabilities;
use crate::lsp::hover::build_hover;
use crate::lsp::registry::{BuiltinRegistry, FunctionRegistry};
use crate::lsp::store::DocumentStore;
use crate::syntax::{ExprParser, ParseError, SourceParser, find_node_at};

/// Label of the single signature reported until signature lookup exists
const SIGNATURE_HELP_PLACEHOLDER: &str = "TODO: Implement signature help";

impl From<ParseError> for ResponseError {
    fn from(error: ParseError) -> Self {
        ResponseError::invalid_params(error.to_string())
    }
}

/// Language server state for one connection
pub struct LanguageHandler {
    documents: DocumentStore,
    parser: Box<dyn SourceParser>,
    registry: Box<dyn FunctionRegistry>,
    shutdown: ShutdownSignal,

    /// Whether `shutdown` arrived before `exit`
    shutdown_requested: bool,
}

impl LanguageHandler {
    /// Create a handler with the built-in parser and function registry
    pub fn new(shutdown: ShutdownSignal) -> Self {
        Self::with_collaborators(
            shutdown,
            Box::new(ExprParser::new()),
            Box::new(BuiltinRegistry),
        )
    }

    pub fn with_collaborators(
        shutdown: ShutdownSignal,
        parser: Box<dyn SourceParser>,
        registry: Box<dyn FunctionRegistry>,
    ) -> Self {
        Self {
            documents: DocumentStore::new(),
            parser,
            registry,
            shutdown,
            shutdown_requested: false,
        }
    }

    /// Get a reference to the document store
    #[allow(dead_code)]
    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    fn initialize(&self, params: &Value) -> Result<Option<Value>, ResponseError> {
        let client = params
            .pointer("/clientInfo/name")
            .and_then(Value::as_str)
            .unwrap_or("unknown client");
        info!("Initializing for {}", client);

        encode(&capabilities::initialize_result())
    }

    fn did_open(&mut self, params: Value) -> Result<Option<Value>, ResponseError> {
        let params: DidOpenTextDocumentParams = decode(params)?;
        let document = params.text_document;

        self.documents
            .open(document.uri.as_str(), &document.text, document.version);
        debug!("{} document(s) tracked", self.documents.len());
        Ok(Some(Value::Null))
    }

    fn did_change(&mut self, params: Value) -> Result<Option<Value>, ResponseError> {
        let params: DidChangeTextDocumentParams = decode(params)?;
        let document = params.text_document;

        self.documents.apply_changes(
            document.uri.as_str(),
            document.version,
            &params.content_changes,
        )?;
        Ok(None)
    }

    fn did_close(&mut self, params: Value) -> Result<Option<Value>, ResponseError> {
        let params: DidCloseTextDocumentParams = decode(params)?;

        self.documents.close(params.text_document.uri.as_str());
        Ok(None)
    }

    fn hover(&self, params: Value) -> Result<Option<Value>, ResponseError> {
        let params: HoverParams = decode(params)?;
        let position_params = params.text_document_position_params;

        let document = self
            .documents
            .get(position_params.text_document.uri.as_str())?;
        let tree = self.parser.parse(document.text())?;
        let index = document.position_to_index(position_params.position)?;

        let node = find_node_at(tree.as_ref(), index).ok_or_else(|| {
            ResponseError::invalid_params("Could not find AST node at position")
        })?;
        debug!("Hover at {} resolved to {}", index, node.kind());

        encode(&build_hover(document, node, self.registry.as_ref()))
    }

    // TODO: resolve the enclosing call and report its registry signature
    fn signature_help(&self, params: Value) -> Result<Option<Value>, ResponseError> {
        let _params: SignatureHelpParams = decode(params)?;

        encode(&SignatureHelp {
            signatures: vec![SignatureInformation {
                label: SIGNATURE_HELP_PLACEHOLDER.to_string(),
                documentation: Some(Documentation::MarkupContent(MarkupContent {
                    kind: MarkupKind::PlainText,
                    value: String::new(),
                })),
                parameters: Some(Vec::new()),
                active_parameter: None,
            }],
            active_signature: Some(0),
            active_parameter: Some(0),
        })
    }

    fn completion(&self, params: Value) -> Result<Option<Value>, ResponseError> {
        let _params: CompletionParams = decode(params)?;

        encode(&CompletionResponse::List(CompletionList {
            is_incomplete: false,
            items: Vec::new(),
        }))
    }

    fn shutdown(&mut self) -> Result<Option<Value>, ResponseError> {
        info!("Shutdown requested");
        self.shutdown_requested = true;
        Ok(Some(Value::Null))
    }

    fn exit(&mut self) -> Result<Option<Value>, ResponseError> {
        if !self.shutdown_requested {
            warn!("Exit received before shutdown");
        }

        if self.shutdown.trigger(self.shutdown_requested) {
            info!("Exit requested, shutdown signal armed");
        }
        Ok(None)
    }
}

#[async_trait]
impl MessageHandler for LanguageHandler {
    async fn handle(
        &mut self,
        method: &str,
        params: Value,
    ) -> Result<Option<Value>, ResponseError> {
        debug!("Received request: {}", method);

        match method {
            "initialize" => self.initialize(&params),
            "initialized" | "$/setTrace" => Ok(None),
            "textDocument/didOpen" => self.did_open(params),
            "textDocument/didChange" => self.did_change(params),
            "textDocument/didClose" => self.did_close(params),
            "textDocument/hover" => self.hover(params),
            "textDocument/signatureHelp" => self.signature_help(params),
            "textDocument/completion" => self.completion(params),
            "shutdown" => self.shutdown(),
            "exit" => self.exit(),
            _ => Err(ResponseError::method_not_found(method)),
        }
    }
}

fn decode<T: DeserializeOwned>(params: Value) -> Result<T, ResponseError> {
    serde_json::from_value(params).map_err(|e| ResponseError::invalid_params(e.to_string()))
}

fn encode<T: Serialize>(result: &T) -> Result<Option<Value>, ResponseError> {
    serde_json::to_value(result)
        .map(Some)
        .map_err(|e| ResponseError::internal_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsonrpc::jsonrpc_utils::error_codes;
    use crate::syntax::SyntaxNode;
    use serde_json::json;

    const URI: &str = "file:///test.dl";

    fn handler() -> LanguageHandler {
        LanguageHandler::new(ShutdownSignal::new())
    }

    fn did_open(text: &str) -> Value {
        json!({
            "textDocument": {"uri": URI, "languageId": "dlitescript", "version": 1, "text": text}
        })
    }

    fn hover_at(line: i64, character: i64) -> Value {
        json!({
            "textDocument": {"uri": URI},
            "position": {"line": line, "character": character}
        })
    }

    async fn opened(text: &str) -> LanguageHandler {
        let mut handler = handler();
        handler
            .handle("textDocument/didOpen", did_open(text))
            .await
            .unwrap();
        handler
    }

    #[tokio::test]
    async fn test_initialize_returns_capabilities() {
        let result = handler()
            .handle("initialize", json!({"capabilities": {}, "clientInfo": {"name": "test"}}))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(result["serverInfo"]["name"], "DLiteScript");
        assert_eq!(result["capabilities"]["hoverProvider"], true);
    }

    #[tokio::test]
    async fn test_notifications_without_reply() {
        let mut handler = handler();

        for method in ["initialized", "$/setTrace"] {
            assert_eq!(handler.handle(method, json!({})).await, Ok(None));
        }
    }

    #[tokio::test]
    async fn test_did_open_stores_document() {
        let mut handler = handler();

        let result = handler
            .handle("textDocument/didOpen", did_open("test\ntest\n"))
            .await;

        assert_eq!(result, Ok(Some(Value::Null)));
        let document = handler.documents().get(URI).unwrap();
        assert_eq!(document.line_count(), 3);
        assert_eq!(document.line_lengths(), &[4, 4, 0]);
    }

    #[tokio::test]
    async fn test_did_change_applies_edits() {
        let mut handler = opened("test").await;

        let result = handler
            .handle(
                "textDocument/didChange",
                json!({
                    "textDocument": {"uri": URI, "version": 2},
                    "contentChanges": [{
                        "range": {
                            "start": {"line": 0, "character": 4},
                            "end": {"line": 0, "character": 4}
                        },
                        "text": "\ntest"
                    }]
                }),
            )
            .await;

        assert_eq!(result, Ok(None));
        let document = handler.documents().get(URI).unwrap();
        assert_eq!(document.text(), "test\ntest");
        assert_eq!(document.version(), 2);
    }

    #[tokio::test]
    async fn test_did_change_errors() {
        let mut handler = opened("test").await;

        let change = |start: u32, end: u32| {
            json!({
                "textDocument": {"uri": URI, "version": 2},
                "contentChanges": [{
                    "range": {
                        "start": {"line": 0, "character": start},
                        "end": {"line": 0, "character": end}
                    },
                    "text": ""
                }]
            })
        };

        let error = handler
            .handle("textDocument/didChange", change(3, 1))
            .await
            .unwrap_err();
        assert_eq!(error.code, error_codes::INVALID_PARAMS);
        assert_eq!(error.message, "Start index is greater than end index");

        let error = handler
            .handle("textDocument/didChange", change(0, 9))
            .await
            .unwrap_err();
        assert_eq!(error.message, "End index is out of bounds");
    }

    #[tokio::test]
    async fn test_did_close_keeps_tombstone() {
        let mut handler = opened("x + 5").await;
        let params = json!({"textDocument": {"uri": URI}});

        assert_eq!(handler.handle("textDocument/didClose", params.clone()).await, Ok(None));
        assert_eq!(handler.handle("textDocument/didClose", params).await, Ok(None));

        assert_eq!(handler.documents().get(URI).unwrap().text(), "");
    }

    #[tokio::test]
    async fn test_hover_on_identifier() {
        let mut handler = opened("x + 5").await;

        let result = handler
            .handle("textDocument/hover", hover_at(0, 0))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            result,
            json!({
                "contents": {
                    "kind": "markdown",
                    "value": "**Identifier**\n\n```dlitescript\nx\n```"
                },
                "range": {
                    "start": {"line": 0, "character": 0},
                    "end": {"line": 0, "character": 1}
                }
            })
        );
    }

    #[tokio::test]
    async fn test_hover_on_second_line() {
        let mut handler = opened("a\nprintf(b)").await;

        let result = handler
            .handle("textDocument/hover", hover_at(1, 7))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(result["contents"]["value"], "**Identifier**\n\n```dlitescript\nb\n```");
        assert_eq!(result["range"]["start"], json!({"line": 1, "character": 7}));
    }

    #[tokio::test]
    async fn test_hover_errors() {
        let mut handler = handler();
        let cases = [
            (None, hover_at(0, 0), "Document not found"),
            (Some("1 +"), hover_at(0, 0), "unexpected end of input at character 3"),
            (Some("x + 5"), hover_at(3, 0), "line 3 is out of range"),
            (Some("x + 5"), hover_at(0, 5), "Could not find AST node at position"),
        ];

        for (text, params, expected) in cases {
            if let Some(text) = text {
                handler
                    .handle("textDocument/didOpen", did_open(text))
                    .await
                    .unwrap();
            }

            let error = handler
                .handle("textDocument/hover", params)
                .await
                .unwrap_err();
            assert_eq!(error.code, error_codes::INVALID_PARAMS);
            assert_eq!(error.message, expected);
        }
    }

    #[tokio::test]
    async fn test_negative_position_is_invalid_params() {
        let mut handler = opened("x").await;

        let error = handler
            .handle("textDocument/hover", hover_at(-1, 0))
            .await
            .unwrap_err();

        assert_eq!(error.code, error_codes::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_placeholder_methods() {
        let mut handler = opened("x").await;
        let params = hover_at(0, 0);

        let help = handler
            .handle("textDocument/signatureHelp", params.clone())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            help,
            json!({
                "signatures": [{
                    "label": SIGNATURE_HELP_PLACEHOLDER,
                    "documentation": {"kind": "plaintext", "value": ""},
                    "parameters": []
                }],
                "activeSignature": 0,
                "activeParameter": 0
            })
        );

        let completion = handler
            .handle("textDocument/completion", params)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(completion["isIncomplete"], false);
        assert_eq!(completion["items"], json!([]));
    }

    #[tokio::test]
    async fn test_bad_params_are_invalid_params() {
        let mut handler = handler();

        for method in ["textDocument/didOpen", "textDocument/didChange", "textDocument/hover"] {
            let error = handler.handle(method, json!({"bogus": true})).await.unwrap_err();
            assert_eq!(error.code, error_codes::INVALID_PARAMS, "method: {method}");
        }
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let error = handler().handle("foo/bar", Value::Null).await.unwrap_err();

        assert_eq!(error.code, error_codes::METHOD_NOT_FOUND);
        assert_eq!(error.message, "method foo/bar not found");
    }

    #[tokio::test]
    async fn test_shutdown_then_exit_is_clean() {
        let signal = ShutdownSignal::new();
        let mut handler = LanguageHandler::new(signal.clone());

        assert_eq!(handler.handle("shutdown", Value::Null).await, Ok(Some(Value::Null)));
        assert!(!signal.is_triggered());

        assert_eq!(handler.handle("exit", Value::Null).await, Ok(None));
        assert!(signal.is_triggered());
        assert_eq!(signal.exit_code(), 0);
    }

    #[tokio::test]
    async fn test_exit_without_shutdown_and_twice() {
        let signal = ShutdownSignal::new();
        let mut handler = LanguageHandler::new(signal.clone());

        assert_eq!(handler.handle("exit", Value::Null).await, Ok(None));
        assert_eq!(handler.handle("exit", Value::Null).await, Ok(None));

        assert!(signal.is_triggered());
        assert_eq!(signal.exit_code(), 1);
    }

    /// Parser whose tree is a single node covering the whole text
    struct WholeTextParser;

    #[derive(Debug)]
    struct WholeText(usize);

    impl SyntaxNode for WholeText {
        fn start(&self) -> usize {
            0
        }

        fn end(&self) -> usize {
            self.0
        }

        fn walk<'a>(&'a self, visitor: &mut dyn FnMut(&'a dyn SyntaxNode) -> bool) -> bool {
            visitor(self)
        }

        fn kind(&self) -> &'static str {
            "Document"
        }

        fn expr(&self) -> String {
            format!("{} chars", self.0)
        }
    }

    impl SourceParser for WholeTextParser {
        fn parse(&self, text: &str) -> Result<Box<dyn SyntaxNode>, ParseError> {
            Ok(Box::new(WholeText(text.chars().count())))
        }
    }

    #[tokio::test]
    async fn test_custom_parser_is_used_for_hover() {
        let mut handler = LanguageHandler::with_collaborators(
            ShutdownSignal::new(),
            Box::new(WholeTextParser),
            Box::new(BuiltinRegistry),
        );
        handler
            .handle("textDocument/didOpen", did_open("anything @ goes"))
            .await
            .unwrap();

        let result = handler
            .handle("textDocument/hover", hover_at(0, 3))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            result["contents"]["value"],
            "**Document**\n\n```dlitescript\n15 chars\n```"
        );
    }
}
