//! Tokenizer for DLiteScript source text
//!
//! Token offsets are character offsets, matching the offsets used by the
//! document store.

use crate::syntax::ParseError;

/// Token kinds produced by the [`Lexer`]
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Identifier(String),
    Number(String),
    Str(String),
    True,
    False,
    Null,
    Operator(&'static str),
    LeftParen,
    RightParen,
    Comma,
    Dot,
    Newline,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

/// Operators, longest first so that `**` wins over `*`
const OPERATORS: &[&str] = &[
    "**", "==", "!=", "<=", ">=", "&&", "||", "+", "-", "*", "/", "%", "<", ">", "!",
];

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    /// Tokenize the whole input; the last token is always [`TokenKind::Eof`]
    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);

            if done {
                return Ok(tokens);
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c == '/' && self.peek_at(1) == Some('/') {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.pos += 1;
                }
            } else if c.is_whitespace() && c != '\n' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_trivia();

        let start = self.pos;
        let Some(c) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                start,
                end: start,
            });
        };

        let kind = match c {
            '\n' => {
                self.pos += 1;
                TokenKind::Newline
            }
            '(' => {
                self.pos += 1;
                TokenKind::LeftParen
            }
            ')' => {
                self.pos += 1;
                TokenKind::RightParen
            }
            ',' => {
                self.pos += 1;
                TokenKind::Comma
            }
            '.' => {
                self.pos += 1;
                TokenKind::Dot
            }
            '"' => self.read_string()?,
            c if c.is_ascii_digit() => self.read_number(),
            c if c.is_alphabetic() || c == '_' => self.read_word(),
            _ => self.read_operator()?,
        };

        Ok(Token {
            kind,
            start,
            end: self.pos,
        })
    }

    fn read_string(&mut self) -> Result<TokenKind, ParseError> {
        let start = self.pos;
        self.pos += 1;
        let mut value = String::new();

        loop {
            match self.peek() {
                None | Some('\n') => return Err(ParseError::new("unterminated string", start)),
                Some('"') => {
                    self.pos += 1;
                    return Ok(TokenKind::Str(value));
                }
                Some('\\') => {
                    let escaped = match self.peek_at(1) {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('"') => '"',
                        Some('\\') => '\\',
                        _ => return Err(ParseError::new("invalid escape sequence", self.pos)),
                    };
                    value.push(escaped);
                    self.pos += 2;
                }
                Some(c) => {
                    value.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    fn read_number(&mut self) -> TokenKind {
        let start = self.pos;
        let mut seen_dot = false;

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.pos += 1;
            } else if c == '.'
                && !seen_dot
                && self.peek_at(1).is_some_and(|next| next.is_ascii_digit())
            {
                seen_dot = true;
                self.pos += 1;
            } else {
                break;
            }
        }

        TokenKind::Number(self.chars[start..self.pos].iter().collect())
    }

    fn read_word(&mut self) -> TokenKind {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.pos += 1;
        }

        let word: String = self.chars[start..self.pos].iter().collect();
        match word.as_str() {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            _ => TokenKind::Identifier(word),
        }
    }

    fn read_operator(&mut self) -> Result<TokenKind, ParseError> {
        for op in OPERATORS {
            let matches = op
                .chars()
                .enumerate()
                .all(|(i, c)| self.peek_at(i) == Some(c));

            if matches {
                self.pos += op.chars().count();
                return Ok(TokenKind::Operator(op));
            }
        }

        let c = self.peek().unwrap_or_default();
        Err(ParseError::new(format!("unexpected character {c:?}"), self.pos))
    }
}
