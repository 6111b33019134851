use std::{fmt, io, path::PathBuf};

use serde::Serialize;
use thiserror::Error;

// Aborts the conversion of one file
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("line {line}: expected {expected} columns but found {found}")]
    RowArity {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: expected {expected} header columns but found {found:?}")]
    Header {
        line: usize,
        expected: usize,
        found: Vec<String>,
    },

    #[error("line {line}: missing reference")]
    MissingReference { line: usize },

    #[error("line {line}: invalid reference {value:?}")]
    Reference { line: usize, value: String },

    #[error("line {line}: {message}")]
    Markdown { line: usize, message: String },

    #[error("line {line}: {message}")]
    Row { line: usize, message: String },

    #[error("text is not valid {encoding}")]
    Encoding { encoding: &'static str },

    #[error("table is empty")]
    EmptyTable,
}

// Per row: the value is left empty and processing continues
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("line {line}: no entry for key {key:?}")]
pub struct LookupError {
    pub line: usize,
    pub key: String,
}

// Needs manual review, never stops processing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsistencyWarning {
    pub location: String,
    pub message: String,
}

impl ConsistencyWarning {
    pub fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConsistencyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

#[derive(Debug, Error)]
pub enum NotesError {
    #[error("{}: {source}", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    #[error("failed to access {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    // Format error of data that did not come from a single file
    #[error(transparent)]
    Invalid(#[from] FormatError),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl NotesError {
    pub fn format(path: impl Into<PathBuf>, source: FormatError) -> Self {
        Self::Format {
            path: path.into(),
            source,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
