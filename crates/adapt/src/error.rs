use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────
    // Record source
    // ─────────────────────────────────────────────────────────────────────
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("error reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// One line failed to decode; the source keeps going.
    #[error("line {line}: error parsing JSON: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    // ─────────────────────────────────────────────────────────────────────
    // Filter expressions
    // ─────────────────────────────────────────────────────────────────────
    #[error("invalid filter format: {0}")]
    InvalidFilter(String),

    #[error("unknown operator: {0}")]
    UnknownOperator(String),

    #[error("operator {operator} expects {expected} argument(s), got {got}")]
    Arity {
        operator: &'static str,
        expected: String,
        got: usize,
    },

    #[error("argument {position} of {operator}: {reason}")]
    InvalidArgument {
        operator: &'static str,
        position: usize,
        reason: String,
    },

    #[error("invalid regex: {0}")]
    Regex(#[from] regex::Error),

    // ─────────────────────────────────────────────────────────────────────
    // Settings
    // ─────────────────────────────────────────────────────────────────────
    #[error("config error: {0}")]
    Config(String),
}
