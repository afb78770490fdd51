//! Unified error type for the engine's public surface.

use thiserror::Error;

pub type GraphliteResult<T> = Result<T, GraphliteError>;

#[derive(Error, Debug)]
pub enum GraphliteError {
    #[error("lexical error at {line}:{column}: {message}")]
    Lexical { line: u32, column: u32, message: String },

    #[error("syntax error at {line}:{column}: expected {expected}, found {found}")]
    Syntax { line: u32, column: u32, expected: String, found: String },

    #[error("semantic error: {0}")]
    Semantic(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("resource error: {0}")]
    Resource(String),

    #[error("unknown procedure: {0}")]
    UnknownProcedure(String),
}

impl From<crate::parser::SyntaxError> for GraphliteError {
    fn from(e: crate::parser::SyntaxError) -> Self {
        GraphliteError::Syntax { line: e.line, column: e.column, expected: e.expected, found: e.found }
    }
}
