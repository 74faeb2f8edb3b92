//! Syntax errors raised while tokenizing or parsing ES5 source.
use thiserror::Error;

use crate::lexer::Position;

pub type Result<T> = std::result::Result<T, SyntaxError>;

/// A lexical or grammatical error, positioned at a 1-based line and column.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at {line}:{column}{}", in_source(.source_name))]
pub struct SyntaxError {
    pub message: String,
    pub line: u32,
    pub column: u32,
    pub source_name: Option<String>,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, pos: Position) -> Self {
        Self {
            message: message.into(),
            line: pos.line,
            column: pos.column,
            source_name: None,
        }
    }

    /// Attach the name of the source the error was found in.
    pub fn with_source(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }
}

fn in_source(name: &Option<String>) -> String {
    name.as_ref()
        .map(|n| format!(" in '{n}'"))
        .unwrap_or_default()
}
