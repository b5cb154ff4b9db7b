use std::path::PathBuf;

use thiserror::Error;

use crate::format::FormatError;
use crate::query::SyntaxError;

/// Main error type for confquill
#[derive(Error, Debug)]
pub enum ConfError {
    #[error("Invalid path query: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("Cannot traverse through non-map value at '{key}'")]
    Traversal { key: String },

    #[error("Cannot assign '{key}': a map cannot be placed inside itself")]
    Cycle { key: String },

    #[error("Cannot assign with an empty path")]
    EmptyPath,

    #[error("Default for '{key}' conflicts with existing data: {reason}")]
    Conflict { key: String, reason: String },

    #[error("Failed to access config at '{}' due to {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at '{}': {source}", .path.display())]
    Codec {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    #[error("Configuration at '{}' is unwritable", .path.display())]
    Unwritable { path: PathBuf },

    #[error("Configuration does not exist at the given path(s): {}", display_paths(.paths))]
    NotFound { paths: Vec<PathBuf> },

    #[error("Invalid file name filter '{pattern}': {source}")]
    InvalidFilter {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl ConfError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn codec(path: impl Into<PathBuf>, source: FormatError) -> Self {
        ConfError::Codec {
            path: path.into(),
            source,
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| format!("'{}'", path.display()))
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, ConfError>;
