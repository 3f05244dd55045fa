#![forbid(unsafe_code)]

mod graph;

pub use graph::{Graph, InvalidEdge, Link, Node, PathValidationResult, SubgraphRecord};

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Location of a token or AST node in the source it was read from.
///
/// `line` and `column` are 1-indexed; `offset` is a byte offset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub filename: String,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    #[must_use]
    pub fn new(filename: impl Into<String>, offset: usize, line: usize, column: usize) -> Self {
        Self {
            filename: filename.into(),
            offset,
            line,
            column,
        }
    }

    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.line > 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.filename.is_empty() {
            write!(f, "{}:{}", self.line, self.column)
        } else {
            write!(f, "{}:{}:{}", self.filename, self.line, self.column)
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DotErrorCode {
    #[default]
    Parse,
    Lex,
}

impl DotErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lex => "dot/error/lex",
            Self::Parse => "dot/error/parse",
        }
    }
}

/// A positioned, non-fatal diagnostic produced while reading DOT source.
#[derive(Debug, Clone, Serialize, Deserialize, Error, PartialEq, Eq)]
pub enum DotError {
    #[error("{position}: {message}")]
    Lex { position: Position, message: String },
    #[error("{position}: {message}")]
    Parse { position: Position, message: String },
}

impl DotError {
    #[must_use]
    pub fn lex(position: Position, message: impl Into<String>) -> Self {
        Self::Lex {
            position,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn parse(position: Position, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn code(&self) -> DotErrorCode {
        match self {
            Self::Lex { .. } => DotErrorCode::Lex,
            Self::Parse { .. } => DotErrorCode::Parse,
        }
    }

    #[must_use]
    pub const fn position(&self) -> &Position {
        match self {
            Self::Lex { position, .. } | Self::Parse { position, .. } => position,
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Lex { message, .. } | Self::Parse { message, .. } => message,
        }
    }
}

/// Aggregate of every lexer and parser diagnostic for one input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("parse errors:\n{}", join_diagnostics(.errors))]
pub struct ParseFailure {
    pub errors: Vec<DotError>,
}

fn join_diagnostics(errors: &[DotError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Settings shared by the front ends that drive the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Filename label used in diagnostics when the source has no path (stdin, inline text).
    pub filename: String,
    /// Pretty-print JSON output.
    pub pretty: bool,
    /// `tracing` env-filter directive; overrides the verbosity flags when set.
    pub log_filter: Option<String>,
    /// Treat a highlight path that references unknown nodes as a failure.
    pub fail_on_invalid_path: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            filename: "<stdin>".to_string(),
            pretty: false,
            log_filter: None,
            fail_on_invalid_path: true,
        }
    }
}
