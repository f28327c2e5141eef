//! DLiteScript expression tree

use crate::syntax::{Callee, SyntaxNode};

/// Half-open character range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`
    pub fn join(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

/// Expression and statement nodes
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Identifier {
        name: String,
        span: Span,
    },
    NumberLiteral {
        value: String,
        span: Span,
    },
    StringLiteral {
        value: String,
        span: Span,
    },
    BoolLiteral {
        value: bool,
        span: Span,
    },
    NullLiteral {
        span: Span,
    },
    PrefixExpr {
        operator: String,
        operand: Box<Expr>,
        span: Span,
    },
    BinaryExpr {
        left: Box<Expr>,
        operator: String,
        right: Box<Expr>,
        span: Span,
    },
    FunctionCall {
        namespace: String,
        name: String,
        arguments: Vec<Expr>,
        span: Span,
    },
    StatementList {
        statements: Vec<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Identifier { span, .. }
            | Expr::NumberLiteral { span, .. }
            | Expr::StringLiteral { span, .. }
            | Expr::BoolLiteral { span, .. }
            | Expr::NullLiteral { span }
            | Expr::PrefixExpr { span, .. }
            | Expr::BinaryExpr { span, .. }
            | Expr::FunctionCall { span, .. }
            | Expr::StatementList { span, .. } => *span,
        }
    }

    fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::PrefixExpr { operand, .. } => vec![operand.as_ref()],
            Expr::BinaryExpr { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Expr::FunctionCall { arguments, .. } => arguments.iter().collect(),
            Expr::StatementList { statements, .. } => statements.iter().collect(),
            _ => Vec::new(),
        }
    }
}

impl SyntaxNode for Expr {
    fn start(&self) -> usize {
        self.span().start
    }

    fn end(&self) -> usize {
        self.span().end
    }

    fn walk<'a>(&'a self, visitor: &mut dyn FnMut(&'a dyn SyntaxNode) -> bool) -> bool {
        if !visitor(self) {
            return false;
        }

        self.children()
            .into_iter()
            .all(|child| child.walk(&mut *visitor))
    }

    fn kind(&self) -> &'static str {
        match self {
            Expr::Identifier { .. } => "Identifier",
            Expr::NumberLiteral { .. } => "NumberLiteral",
            Expr::StringLiteral { .. } => "StringLiteral",
            Expr::BoolLiteral { .. } => "BoolLiteral",
            Expr::NullLiteral { .. } => "NullLiteral",
            Expr::PrefixExpr { .. } => "PrefixExpr",
            Expr::BinaryExpr { .. } => "BinaryExpr",
            Expr::FunctionCall { .. } => "FunctionCall",
            Expr::StatementList { .. } => "StatementList",
        }
    }

    fn expr(&self) -> String {
        match self {
            Expr::Identifier { name, .. } => name.clone(),
            Expr::NumberLiteral { value, .. } => value.clone(),
            Expr::StringLiteral { value, .. } => format!("{value:?}"),
            Expr::BoolLiteral { value, .. } => value.to_string(),
            Expr::NullLiteral { .. } => "null".to_string(),
            Expr::PrefixExpr {
                operator, operand, ..
            } => format!("({}{})", operator, operand.expr()),
            Expr::BinaryExpr {
                left,
                operator,
                right,
                ..
            } => format!("({} {} {})", left.expr(), operator, right.expr()),
            Expr::FunctionCall {
                namespace,
                name,
                arguments,
                ..
            } => {
                let args = arguments
                    .iter()
                    .map(|arg| arg.expr())
                    .collect::<Vec<_>>()
                    .join(", ");

                if namespace.is_empty() {
                    format!("{name}({args})")
                } else {
                    format!("{namespace}.{name}({args})")
                }
            }
            Expr::StatementList { statements, .. } => statements
                .iter()
                .map(|statement| statement.expr())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    fn callee(&self) -> Option<Callee<'_>> {
        match self {
            Expr::FunctionCall {
                namespace, name, ..
            } => Some(Callee {
                namespace: namespace.as_str(),
                name: name.as_str(),
            }),
            _ => None,
        }
    }
}
