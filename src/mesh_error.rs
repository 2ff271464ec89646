//! MeshIoError: unified error type for mesh-mdpa public APIs
//!
//! Every fatal condition met while scanning, reading, graph building or
//! partitioning aborts the current pass and surfaces here. Grammar-level
//! problems carry the 1-based line number of the offending token so that a
//! `.mdpa` file can be debugged without a separate validator.

use crate::partitioning::error::PartitionError;
use std::fmt;
use thiserror::Error;

/// Unified error type for mesh-mdpa operations.
#[derive(Debug, Error)]
pub enum MeshIoError {
    /// The input stream violates the `.mdpa` grammar or references unknown data.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Reading the source or writing an output stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The partitioning input is inconsistent.
    #[error(transparent)]
    Partition(#[from] PartitionError),
    /// A partitioning description could not be (de)serialized.
    #[error("Partitioning info JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Classification of a [`ParseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// Mismatched `Begin`/`End` names or a token where a statement was expected.
    Grammar,
    /// The stream ended inside a block.
    UnexpectedEof,
    /// An element, condition or geometry type name is not registered.
    UnknownType,
    /// A variable name is not registered.
    UnknownVariable,
    /// A token could not be converted to the value it should hold.
    InvalidValue,
    /// An id is zero, or references an entity that was never read.
    MissingId,
    /// A node has no graph adjacency after a full pass.
    HangingNode,
    /// An entity has no valid target partition.
    InvalidPartition,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ParseErrorKind::Grammar => "Grammar error",
            ParseErrorKind::UnexpectedEof => "Unexpected end of input",
            ParseErrorKind::UnknownType => "Unknown entity type",
            ParseErrorKind::UnknownVariable => "Unknown variable",
            ParseErrorKind::InvalidValue => "Invalid value",
            ParseErrorKind::MissingId => "Id error",
            ParseErrorKind::HangingNode => "Hanging node",
            ParseErrorKind::InvalidPartition => "Invalid partition",
        };
        f.write_str(label)
    }
}

/// A fatal diagnostic raised while scanning a `.mdpa` stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} in line {line}: {message}{}", token_suffix(.expected, .found))]
pub struct ParseError {
    /// What went wrong.
    pub kind: ParseErrorKind,
    /// 1-based line of the offending token.
    pub line: usize,
    /// Human readable description.
    pub message: String,
    /// The statement the reader expected, if any.
    pub expected: Option<String>,
    /// The literal token that was found instead, if any.
    pub found: Option<String>,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, line: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            message: message.into(),
            expected: None,
            found: None,
        }
    }

    /// Attach the expected statement and the token actually read.
    pub fn with_tokens(mut self, expected: impl Into<String>, found: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self.found = Some(found.into());
        self
    }

    /// Attach only the offending token.
    pub fn with_found(mut self, found: impl Into<String>) -> Self {
        self.found = Some(found.into());
        self
    }
}

fn token_suffix(expected: &Option<String>, found: &Option<String>) -> String {
    match (expected, found) {
        (Some(expected), Some(found)) => format!(" (expected `{expected}`, found `{found}`)"),
        (None, Some(found)) => format!(" (found `{found}`)"),
        (Some(expected), None) => format!(" (expected `{expected}`)"),
        (None, None) => String::new(),
    }
}

impl MeshIoError {
    /// The parse diagnostic, if this error came from the grammar layer.
    pub fn as_parse(&self) -> Option<&ParseError> {
        match self {
            MeshIoError::Parse(err) => Some(err),
            _ => None,
        }
    }

    /// The parse error kind, if any.
    pub fn parse_kind(&self) -> Option<ParseErrorKind> {
        self.as_parse().map(|err| err.kind)
    }
}
