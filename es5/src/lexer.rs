//! On-demand ES5 tokenizer.
//!
//! The lexer hands out one token at a time. A `/` is always scanned as a
//! punctuator; the parser calls [`Lexer::rescan_regex`] when it sits at a
//! position where an operand is expected.
use std::collections::BTreeSet;

use crate::error::{Result, SyntaxError};

/// Location of a token in the source: char offset plus 1-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or reserved word.
    Name,
    Punct,
    Number,
    String,
    Regex,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub pos: Position,
    /// A line terminator sits between this token and the previous one.
    pub newline_before: bool,
}

impl Token {
    /// True for the punctuator or reserved word spelled `text`.
    pub fn is(&self, text: &str) -> bool {
        matches!(self.kind, TokenKind::Punct | TokenKind::Name) && self.text == text
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    /// An identifier that is not a reserved word.
    pub fn is_identifier(&self) -> bool {
        self.kind == TokenKind::Name && !is_reserved(&self.text)
    }
}

/// Words the grammar never accepts as identifiers.
pub const KEYWORDS: &[&str] = &[
    "break", "case", "catch", "continue", "debugger", "default", "delete", "do", "else",
    "finally", "for", "function", "if", "in", "instanceof", "new", "return", "switch", "this",
    "throw", "try", "typeof", "var", "void", "while", "with", "class", "const", "enum",
    "export", "extends", "import", "super", "null", "true", "false",
];

/// Words reserved only in strict mode code.
pub const STRICT_RESERVED: &[&str] = &[
    "implements", "interface", "let", "package", "private", "protected", "public", "static",
    "yield",
];

// Longest first so that the first prefix match wins.
const PUNCTUATORS: &[&str] = &[
    ">>>=", "===", "!==", ">>>", "<<=", ">>=", "==", "!=", "<=", ">=", "&&", "||", "++", "--",
    "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "{", "}", "(", ")", "[", "]",
    ";", ",", "<", ">", "+", "-", "*", "/", "%", "&", "|", "^", "!", "~", "?", ":", "=", ".",
];

/// Every word an obfuscated identifier must avoid.
pub fn reserved_words() -> BTreeSet<String> {
    KEYWORDS
        .iter()
        .chain(STRICT_RESERVED)
        .map(|word| word.to_string())
        .collect()
}

pub fn is_reserved(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

pub fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn is_whitespace(c: char) -> bool {
    matches!(c, '\t' | '\u{0B}' | '\u{0C}' | ' ' | '\u{A0}' | '\u{FEFF}')
        || (c.is_whitespace() && !is_line_terminator(c))
}

pub(crate) fn is_id_start(c: char) -> bool {
    c == '$' || c == '_' || c.is_alphabetic()
}

pub(crate) fn is_id_part(c: char) -> bool {
    is_id_start(c) || c.is_alphanumeric() || c == '\u{200C}' || c == '\u{200D}'
}

pub struct Lexer {
    chars: Vec<char>,
    index: usize,
    line: u32,
    column: u32,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            index: 0,
            line: 1,
            column: 1,
        }
    }

    fn position(&self) -> Position {
        Position {
            offset: self.index,
            line: self.line,
            column: self.column,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.index + ahead).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.index += 1;
        if is_line_terminator(c) {
            if c == '\r' && self.peek() == Some('\n') {
                self.index += 1;
            }
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn text_from(&self, start: usize) -> String {
        self.chars[start..self.index].iter().collect()
    }

    /// Skip whitespace and comments, reporting whether a line terminator was crossed.
    fn skip_trivia(&mut self) -> Result<bool> {
        let mut newline = false;
        while let Some(c) = self.peek() {
            if is_line_terminator(c) {
                newline = true;
                self.bump();
            } else if is_whitespace(c) {
                self.bump();
            } else if c == '/' && self.peek_at(1) == Some('/') {
                while self.peek().is_some_and(|c| !is_line_terminator(c)) {
                    self.bump();
                }
            } else if c == '/' && self.peek_at(1) == Some('*') {
                let start = self.position();
                self.bump();
                self.bump();
                loop {
                    match self.peek() {
                        None => return Err(SyntaxError::new("Unterminated comment", start)),
                        Some('*') if self.peek_at(1) == Some('/') => {
                            self.bump();
                            self.bump();
                            break;
                        }
                        Some(c) => {
                            newline |= is_line_terminator(c);
                            self.bump();
                        }
                    }
                }
            } else {
                break;
            }
        }
        Ok(newline)
    }

    pub fn next_token(&mut self) -> Result<Token> {
        let newline_before = self.skip_trivia()?;
        let pos = self.position();
        let Some(c) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                text: String::new(),
                pos,
                newline_before,
            });
        };

        let kind = if is_id_start(c) || c == '\\' {
            self.scan_name(pos)?;
            TokenKind::Name
        } else if c.is_ascii_digit() || (c == '.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit())) {
            self.scan_number(pos)?;
            TokenKind::Number
        } else if c == '"' || c == '\'' {
            self.scan_string(pos)?;
            TokenKind::String
        } else {
            self.scan_punct(pos)?;
            TokenKind::Punct
        };

        Ok(Token {
            kind,
            text: self.text_from(pos.offset),
            pos,
            newline_before,
        })
    }

    /// Re-read the `/` or `/=` token `start` as a regular expression literal.
    pub fn rescan_regex(&mut self, start: &Token) -> Result<Token> {
        self.index = start.pos.offset;
        self.line = start.pos.line;
        self.column = start.pos.column;

        let pos = self.position();
        let unterminated = || SyntaxError::new("Unterminated regular expression", pos);
        self.bump();
        let mut in_class = false;
        loop {
            match self.peek() {
                None => return Err(unterminated()),
                Some(c) if is_line_terminator(c) => return Err(unterminated()),
                Some('\\') => {
                    self.bump();
                    match self.peek() {
                        Some(c) if !is_line_terminator(c) => {
                            self.bump();
                        }
                        _ => return Err(unterminated()),
                    }
                }
                Some('[') => {
                    in_class = true;
                    self.bump();
                }
                Some(']') => {
                    in_class = false;
                    self.bump();
                }
                Some('/') if !in_class => {
                    self.bump();
                    break;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
        while self.peek().is_some_and(is_id_part) {
            self.bump();
        }

        Ok(Token {
            kind: TokenKind::Regex,
            text: self.text_from(pos.offset),
            pos,
            newline_before: start.newline_before,
        })
    }

    fn scan_name(&mut self, pos: Position) -> Result<()> {
        loop {
            match self.peek() {
                Some('\\') => self.scan_unicode_escape()?,
                Some(c) if is_id_part(c) => {
                    self.bump();
                }
                _ => break,
            }
        }
        if self.index == pos.offset {
            return Err(SyntaxError::new("Illegal character '\\'", pos));
        }
        Ok(())
    }

    fn scan_unicode_escape(&mut self) -> Result<()> {
        let pos = self.position();
        let valid = self.peek_at(1) == Some('u')
            && (2..6).all(|i| self.peek_at(i).is_some_and(|c| c.is_ascii_hexdigit()));
        if !valid {
            return Err(SyntaxError::new("Invalid Unicode escape sequence", pos));
        }
        for _ in 0..6 {
            self.bump();
        }
        Ok(())
    }

    fn scan_number(&mut self, pos: Position) -> Result<()> {
        let hex = self.peek() == Some('0') && matches!(self.peek_at(1), Some('x' | 'X'));
        if hex {
            self.bump();
            self.bump();
            let digits = self.index;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.bump();
            }
            if self.index == digits {
                return Err(SyntaxError::new("Invalid hexadecimal literal", pos));
            }
        } else {
            self.digits();
            if self.peek() == Some('.') {
                self.bump();
                self.digits();
            }
            if matches!(self.peek(), Some('e' | 'E')) {
                self.bump();
                if matches!(self.peek(), Some('+' | '-')) {
                    self.bump();
                }
                let exponent = self.index;
                self.digits();
                if self.index == exponent {
                    return Err(SyntaxError::new("Invalid numeric literal", pos));
                }
            }
        }
        if self.peek().is_some_and(|c| is_id_start(c) || c.is_ascii_digit() || c == '\\') {
            return Err(SyntaxError::new("Invalid numeric literal", pos));
        }
        Ok(())
    }

    fn digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
    }

    fn scan_string(&mut self, pos: Position) -> Result<()> {
        let unterminated = || SyntaxError::new("Unterminated string literal", pos);
        let quote = self.bump();
        loop {
            match self.peek() {
                None => return Err(unterminated()),
                Some(c) if is_line_terminator(c) => return Err(unterminated()),
                Some('\\') => {
                    self.bump();
                    // an escaped line terminator continues the literal
                    if self.bump().is_none() {
                        return Err(unterminated());
                    }
                }
                Some(c) => {
                    self.bump();
                    if Some(c) == quote {
                        return Ok(());
                    }
                }
            }
        }
    }

    fn scan_punct(&mut self, pos: Position) -> Result<()> {
        let rest = &self.chars[self.index..];
        let matched = PUNCTUATORS.iter().find(|p| {
            let len = p.chars().count();
            rest.len() >= len && p.chars().zip(rest).all(|(a, b)| a == *b)
        });
        match matched {
            Some(p) => {
                for _ in 0..p.chars().count() {
                    self.bump();
                }
                Ok(())
            }
            None => {
                let c = rest.first().copied().unwrap_or_default();
                Err(SyntaxError::new(format!("Illegal character '{c}'"), pos))
            }
        }
    }
}
