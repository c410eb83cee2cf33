//! Character stream to token stream.

use std::{collections::HashMap, error::Error, fmt::Display, iter::Peekable, str::Chars};

use once_cell::sync::Lazy;

use crate::token::{Literal, Token, TokenKind};

static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    use TokenKind::*;
    HashMap::from([
        ("and", And),
        ("or", Or),
        ("true", True),
        ("false", False),
        ("nil", Nil),
        ("var", Var),
        ("fun", Fun),
        ("return", Return),
        ("print", Print),
        ("for", For),
        ("while", While),
        ("if", If),
        ("else", Else),
        ("break", Break),
    ])
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError(pub String);

impl Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Error for LexError {}

pub type LexResult<T> = Result<T, LexError>;

/// Scans source text into a flat token stream, tracking line numbers as it
/// goes and shunting backtick comments into a side channel that the parser
/// never sees.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    tokens: Vec<Token>,
    comments: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            tokens: Vec::new(),
            comments: Vec::new(),
        }
    }

    /// Consumes the lexer, returning the full token stream (terminated by a
    /// single `Eof` token) or the first lexical error encountered.
    pub fn lex(mut self) -> LexResult<Vec<Token>> {
        while self.peek().is_some() {
            self.scan_one()?;
        }
        self.tokens.push(Token::eof(self.line));
        Ok(self.tokens)
    }

    /// Comments collected while scanning, each a `Backtick`-kinded token
    /// carrying the comment text as its lexeme. Never reaches the parser;
    /// exposed mainly for tooling and tests.
    pub fn comments(&self) -> &[Token] {
        &self.comments
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let next = self.chars.next();
        if next == Some('\n') {
            self.line += 1;
        }
        next
    }

    fn advance_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn scan_one(&mut self) -> LexResult<()> {
        let Some(c) = self.advance() else {
            return Ok(());
        };

        match c {
            ' ' | '\t' | '\r' | '\n' => Ok(()),
            '`' => {
                self.scan_comment();
                Ok(())
            }
            '+' => self.emit_single(TokenKind::Plus, "+"),
            '-' => self.emit_single(TokenKind::Minus, "-"),
            '/' => self.emit_single(TokenKind::Slash, "/"),
            '*' => self.emit_single(TokenKind::Star, "*"),
            '^' => self.emit_single(TokenKind::Caret, "^"),
            '?' => self.emit_single(TokenKind::Question, "?"),
            '%' => self.emit_single(TokenKind::Percent, "%"),
            '(' => self.emit_single(TokenKind::LeftParen, "("),
            ')' => self.emit_single(TokenKind::RightParen, ")"),
            '{' => self.emit_single(TokenKind::LeftBrace, "{"),
            '}' => self.emit_single(TokenKind::RightBrace, "}"),
            ',' => self.emit_single(TokenKind::Comma, ","),
            ':' => self.emit_single(TokenKind::Colon, ":"),
            ';' => self.emit_single(TokenKind::SemiColon, ";"),
            '&' => self.emit_single(TokenKind::Ampersand, "&"),
            '|' => self.emit_single(TokenKind::Pipe, "|"),
            '!' => {
                if self.advance_if('=') {
                    self.emit_single(TokenKind::BangEqual, "!=")
                } else {
                    self.emit_single(TokenKind::Bang, "!")
                }
            }
            '=' => {
                if self.advance_if('=') {
                    self.emit_single(TokenKind::EqualEqual, "==")
                } else {
                    self.emit_single(TokenKind::Equal, "=")
                }
            }
            '>' => {
                if self.advance_if('=') {
                    self.emit_single(TokenKind::GreaterEqual, ">=")
                } else {
                    self.emit_single(TokenKind::Greater, ">")
                }
            }
            '<' => {
                if self.advance_if('=') {
                    self.emit_single(TokenKind::LessEqual, "<=")
                } else {
                    self.emit_single(TokenKind::Less, "<")
                }
            }
            '\'' | '"' => self.scan_string(c),
            '0'..='9' => self.scan_number(c),
            c if c.is_ascii_alphabetic() || c == '_' => self.scan_identifier(c),
            other => Err(LexError(format!(
                "[Error on L{}]: Unexpected character {}",
                self.line, other
            ))),
        }
    }

    fn emit_single(&mut self, kind: TokenKind, lexeme: &str) -> LexResult<()> {
        self.tokens
            .push(Token::new(kind, lexeme, Literal::None, self.line));
        Ok(())
    }

    fn scan_comment(&mut self) {
        let start_line = self.line;
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.advance();
        }
        self.comments.push(Token::new(
            TokenKind::Backtick,
            text.clone(),
            Literal::String(text),
            start_line,
        ));
    }

    fn scan_string(&mut self, quote: char) -> LexResult<()> {
        let start_line = self.line;
        let mut value = String::new();

        loop {
            match self.peek() {
                None => {
                    return Err(LexError(format!(
                        "[Error on L{}]: Quotes do not match in {}",
                        start_line, value
                    )))
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some('\'') | Some('"') => {
                    return Err(LexError(format!(
                        "[Error on L{}]: Quotes do not match in {}",
                        start_line, value
                    )))
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }

        if value.is_empty() {
            return Err(LexError(format!(
                "[Error on L{}]: Can not use empty string",
                start_line
            )));
        }

        self.tokens.push(Token::new(
            TokenKind::String,
            format!("{quote}{value}{quote}"),
            Literal::String(value),
            start_line,
        ));
        Ok(())
    }

    fn scan_number(&mut self, first: char) -> LexResult<()> {
        let start_line = self.line;
        let mut lexeme = String::from(first);

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '.' {
                lexeme.push(c);
                self.advance();
            } else {
                break;
            }
        }

        let value: f64 = lexeme
            .parse()
            .map_err(|_| LexError(format!("[Error on L{start_line}]: Invalid number {lexeme}")))?;

        self.tokens.push(Token::new(
            TokenKind::Number,
            lexeme,
            Literal::Number(value),
            start_line,
        ));
        Ok(())
    }

    fn scan_identifier(&mut self, first: char) -> LexResult<()> {
        let start_line = self.line;
        let mut lexeme = String::from(first);

        while let Some(c) = self.peek() {
            if c.is_ascii_alphabetic() || c == '_' {
                lexeme.push(c);
                self.advance();
            } else {
                break;
            }
        }

        let kind = KEYWORDS
            .get(lexeme.as_str())
            .copied()
            .unwrap_or(TokenKind::Identifier);
        self.tokens
            .push(Token::new(kind, lexeme, Literal::None, start_line));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .lex()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_arithmetic() {
        assert_eq!(
            kinds("1 + 2 * 3"),
            vec![
                TokenKind::Number,
                TokenKind::Plus,
                TokenKind::Number,
                TokenKind::Star,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_keywords_and_identifiers() {
        assert_eq!(
            kinds("var foo = true;"),
            vec![
                TokenKind::Var,
                TokenKind::Identifier,
                TokenKind::Equal,
                TokenKind::True,
                TokenKind::SemiColon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn identifiers_do_not_continue_through_digits() {
        let tokens = Lexer::new("x1").lex().unwrap();
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![TokenKind::Identifier, TokenKind::Number, TokenKind::Eof]
        );
        assert_eq!(tokens[0].lexeme, "x");
        assert_eq!(tokens[1].lexeme, "1");
    }

    #[test]
    fn lexes_two_char_operators() {
        assert_eq!(
            kinds(">= <= == !="),
            vec![
                TokenKind::GreaterEqual,
                TokenKind::LessEqual,
                TokenKind::EqualEqual,
                TokenKind::BangEqual,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tracks_line_numbers() {
        let tokens = Lexer::new("var a\n= 1;").lex().unwrap();
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[2].line, 2);
    }

    #[test]
    fn rejects_empty_string() {
        let err = Lexer::new("''").lex().unwrap_err();
        assert!(err.0.contains("Can not use empty string"));
    }

    #[test]
    fn rejects_mismatched_quotes() {
        let err = Lexer::new("'abc\"").lex().unwrap_err();
        assert!(err.0.contains("Quotes do not match"));
    }

    #[test]
    fn rejects_unknown_character() {
        let err = Lexer::new("@").lex().unwrap_err();
        assert!(err.0.contains("Unexpected character @"));
    }

    #[test]
    fn strips_backtick_comments() {
        let lexer = Lexer::new("1 `comment\n2");
        let tokens = lexer.lex().unwrap();
        assert_eq!(tokens.len(), 3); // 1, 2, Eof
    }
}
