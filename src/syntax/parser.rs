//! Pratt parser for DLiteScript expressions
//!
//! Statements are expressions separated by newlines; the whole document
//! becomes a single [`Expr::StatementList`] spanning every character of the
//! input.

use crate::syntax::ast::{Expr, Span};
use crate::syntax::lexer::{Lexer, Token, TokenKind};
use crate::syntax::{ParseError, SourceParser, SyntaxNode};

/// Binding power of prefix operators
const PREFIX_BINDING_POWER: u8 = 15;

/// Deepest expression nesting accepted before parsing fails
pub const MAX_NESTING_DEPTH: usize = 256;

/// Left/right binding power of an infix operator
fn infix_binding_power(op: &str) -> Option<(u8, u8)> {
    let power = match op {
        "||" => (1, 2),
        "&&" => (3, 4),
        "==" | "!=" => (5, 6),
        "<" | "<=" | ">" | ">=" => (7, 8),
        "+" | "-" => (9, 10),
        "*" | "/" | "%" => (11, 12),
        // Right-associative
        "**" => (14, 13),
        _ => return None,
    };

    Some(power)
}

/// Default [`SourceParser`] for DLiteScript documents
#[derive(Debug, Clone, Copy, Default)]
pub struct ExprParser;

impl ExprParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse into the concrete tree type
    pub fn parse_program(&self, text: &str) -> Result<Expr, ParseError> {
        let tokens = Lexer::new(text).tokenize()?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };

        let statements = parser.statements()?;
        Ok(Expr::StatementList {
            statements,
            span: Span::new(0, text.chars().count()),
        })
    }
}

impl SourceParser for ExprParser {
    fn parse(&self, text: &str) -> Result<Box<dyn SyntaxNode>, ParseError> {
        Ok(Box::new(self.parse_program(text)?))
    }
}

// ============================================================================
// Parser State
// ============================================================================

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Active `expression` calls; bounds recursion on nested input
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        // The lexer always terminates the stream with Eof and `advance`
        // never moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        let token = self.advance();
        if token.kind == kind {
            Ok(token)
        } else {
            Err(ParseError::new(format!("expected {what}"), token.start))
        }
    }

    fn statements(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut statements = Vec::new();

        loop {
            while self.peek().kind == TokenKind::Newline {
                self.advance();
            }

            if self.peek().kind == TokenKind::Eof {
                return Ok(statements);
            }

            statements.push(self.expression(0)?);

            let next = self.peek();
            match next.kind {
                TokenKind::Newline | TokenKind::Eof => {}
                _ => return Err(ParseError::new("unexpected token", next.start)),
            }
        }
    }

    fn expression(&mut self, min_power: u8) -> Result<Expr, ParseError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::new(
                "expression nested too deeply",
                self.peek().start,
            ));
        }

        self.depth += 1;
        let result = self.binary(min_power);
        self.depth -= 1;
        result
    }

    fn binary(&mut self, min_power: u8) -> Result<Expr, ParseError> {
        let mut left = self.prefix()?;

        loop {
            let TokenKind::Operator(op) = self.peek().kind else {
                break;
            };
            let Some((left_power, right_power)) = infix_binding_power(op) else {
                break;
            };
            if left_power < min_power {
                break;
            }

            self.advance();
            let right = self.expression(right_power)?;
            let span = left.span().join(right.span());

            left = Expr::BinaryExpr {
                left: Box::new(left),
                operator: op.to_string(),
                right: Box::new(right),
                span,
            };
        }

        Ok(left)
    }

    fn prefix(&mut self) -> Result<Expr, ParseError> {
        let token = self.advance();
        let span = Span::new(token.start, token.end);

        let expr = match token.kind {
            TokenKind::Identifier(name) => self.identifier_or_call(name, span)?,
            TokenKind::Number(value) => Expr::NumberLiteral { value, span },
            TokenKind::Str(value) => Expr::StringLiteral { value, span },
            TokenKind::True => Expr::BoolLiteral { value: true, span },
            TokenKind::False => Expr::BoolLiteral { value: false, span },
            TokenKind::Null => Expr::NullLiteral { span },
            TokenKind::Operator(op @ ("-" | "!")) => {
                let operand = self.expression(PREFIX_BINDING_POWER)?;
                Expr::PrefixExpr {
                    operator: op.to_string(),
                    span: span.join(operand.span()),
                    operand: Box::new(operand),
                }
            }
            TokenKind::LeftParen => {
                let inner = self.expression(0)?;
                self.expect(TokenKind::RightParen, "')'")?;
                inner
            }
            TokenKind::Eof => return Err(ParseError::new("unexpected end of input", token.start)),
            _ => return Err(ParseError::new("expected an expression", token.start)),
        };

        Ok(expr)
    }

    /// Parse `name`, `name(args)` or `namespace.name(args)`
    fn identifier_or_call(&mut self, name: String, span: Span) -> Result<Expr, ParseError> {
        match self.peek().kind {
            TokenKind::LeftParen => self.call(String::new(), name, span),
            TokenKind::Dot => {
                self.advance();
                let member = self.advance();
                let TokenKind::Identifier(member_name) = member.kind else {
                    return Err(ParseError::new("expected a function name", member.start));
                };

                if self.peek().kind != TokenKind::LeftParen {
                    return Err(ParseError::new("expected '('", self.peek().start));
                }
                self.call(name, member_name, span)
            }
            _ => Ok(Expr::Identifier { name, span }),
        }
    }

    fn call(&mut self, namespace: String, name: String, start: Span) -> Result<Expr, ParseError> {
        self.expect(TokenKind::LeftParen, "'('")?;
        let mut arguments = Vec::new();

        if self.peek().kind != TokenKind::RightParen {
            loop {
                arguments.push(self.expression(0)?);

                if self.peek().kind == TokenKind::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        let close = self.expect(TokenKind::RightParen, "')'")?;
        Ok(Expr::FunctionCall {
            namespace,
            name,
            arguments,
            span: start.join(Span::new(close.start, close.end)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_single(text: &str) -> Expr {
        match ExprParser::new().parse_program(text).unwrap() {
            Expr::StatementList { mut statements, .. } => {
                assert_eq!(statements.len(), 1, "expected one statement in {text:?}");
                statements.remove(0)
            }
            other => panic!("expected a statement list, got {other:?}"),
        }
    }

    #[test]
    fn test_binary_expression_spans() {
        let expr = parse_single("x + 5");

        assert_eq!(expr.expr(), "(x + 5)");
        assert_eq!(expr.span(), Span::new(0, 5));
        let Expr::BinaryExpr { left, right, .. } = expr else {
            panic!("expected a binary expression");
        };
        assert_eq!(left.span(), Span::new(0, 1));
        assert_eq!(right.span(), Span::new(4, 5));
    }

    #[test]
    fn test_precedence_and_associativity() {
        let cases = [
            ("1 + 2 * 3", "(1 + (2 * 3))"),
            ("1 - 2 - 3", "((1 - 2) - 3)"),
            ("2 ** 3 ** 2", "(2 ** (3 ** 2))"),
            ("(1 + 2) * 3", "((1 + 2) * 3)"),
            ("-a * b", "((-a) * b)"),
            ("a < b && !c || d == e", "(((a < b) && (!c)) || (d == e))"),
        ];

        for (input, expected) in cases {
            assert_eq!(parse_single(input).expr(), expected, "input: {input}");
        }
    }

    #[test]
    fn test_function_calls() {
        let call = parse_single("math.max(a, 1)");
        assert_eq!(call.expr(), "math.max(a, 1)");
        assert_eq!(call.span(), Span::new(0, 14));
        assert_eq!(call.callee().map(|c| (c.namespace, c.name)), Some(("math", "max")));

        let call = parse_single("printf(\"%d\", 1 + 2)");
        assert_eq!(call.expr(), "printf(\"%d\", (1 + 2))");
        assert_eq!(call.callee().map(|c| c.namespace), Some(""));
    }

    #[test]
    fn test_statements_and_root_span() {
        let root = ExprParser::new()
            .parse_program("a + 1\n\n// note\nprintf(b)\n")
            .unwrap();

        let Expr::StatementList { statements, span } = root else {
            panic!("expected a statement list");
        };
        assert_eq!(statements.len(), 2);
        assert_eq!(span, Span::new(0, 25));
        assert_eq!(statements[1].span(), Span::new(15, 24));
    }

    #[test]
    fn test_empty_document_parses() {
        let root = ExprParser::new().parse("").unwrap();

        assert_eq!(root.kind(), "StatementList");
        assert_eq!((root.start(), root.end()), (0, 0));
    }

    #[test]
    fn test_parse_errors() {
        let cases = [
            ("1 +", "unexpected end of input at character 3"),
            ("(1 + 2", "expected ')' at character 6"),
            ("a b", "unexpected token at character 2"),
            ("math.pi", "expected '(' at character 7"),
            ("printf(,)", "expected an expression at character 7"),
        ];

        for (input, expected) in cases {
            let error = ExprParser::new().parse(input).unwrap_err();
            assert_eq!(error.to_string(), expected, "input: {input}");
        }
    }

    #[test]
    fn test_nesting_depth_limit() {
        let nested = |depth: usize| format!("{}1{}", "(".repeat(depth), ")".repeat(depth));

        let deep = ExprParser::new().parse(&nested(100_000)).unwrap_err();
        assert_eq!(deep.message, "expression nested too deeply");
        assert_eq!(deep.offset, MAX_NESTING_DEPTH);

        let within_limit = parse_single(&nested(MAX_NESTING_DEPTH - 1));
        assert_eq!(within_limit.expr(), "1");

        let prefixes = format!("{}x", "-".repeat(100_000));
        assert!(ExprParser::new().parse(&prefixes).is_err());
    }
}
