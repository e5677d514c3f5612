use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type ForgeResult<T> = Result<T, ForgeError>;

/// Fatal errors. Anything returned here aborts the request with no partial output.
#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("Parse error at line {line}, column {column}: {message}")]
    Parse {
        line: u32,
        column: u32,
        message: String,
    },

    #[error("Unsafe markup rejected: {reason}")]
    UnsafeMarkup { reason: String },

    #[error("Markup limit exceeded for '{limit}': {value} (max {max})")]
    LimitExceeded {
        limit: &'static str,
        value: usize,
        max: usize,
    },

    #[error("Empty document: no root element found")]
    EmptyDocument,

    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ForgeError {
    pub fn validation(message: impl Into<String>) -> Self {
        ForgeError::Validation(vec![message.into()])
    }
}

impl From<roxmltree::Error> for ForgeError {
    fn from(err: roxmltree::Error) -> Self {
        let pos = err.pos();
        ForgeError::Parse {
            line: pos.row,
            column: pos.col,
            message: err.to_string(),
        }
    }
}

/// Non-fatal conditions collected alongside a successful result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Warning {
    /// A build node referenced a key the palette does not know.
    UnresolvedComponentKey { key: String },
    /// The design oracle failed or timed out; the deterministic path was used.
    OracleUnavailable { stage: String, reason: String },
    /// A prop was dropped because its name is not a valid JSX attribute.
    DroppedProp { key: String, prop: String },
    /// The requested component name was not a PascalCase identifier.
    RenamedComponent { requested: String, used: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnresolvedComponentKey { key } => {
                write!(f, "unknown component key '{}', placeholder emitted", key)
            }
            Warning::OracleUnavailable { stage, reason } => {
                write!(f, "oracle unavailable during {}: {}", stage, reason)
            }
            Warning::DroppedProp { key, prop } => {
                write!(f, "dropped invalid prop '{}' on '{}'", prop, key)
            }
            Warning::RenamedComponent { requested, used } => {
                write!(f, "component name '{}' normalized to '{}'", requested, used)
            }
        }
    }
}
