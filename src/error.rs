//! Typed failures for the pipeline core.
//!
//! Store and config failures are fatal for a run; collaborator, validation
//! and template failures are scoped to the item being processed unless the
//! stage decides otherwise. Command handlers wrap these in `anyhow` with
//! context.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoutError {
    /// The persisted status store is not well-formed; nothing may be saved
    /// over it.
    #[error("status store {} is corrupt: {message}", path.display())]
    CorruptState { path: PathBuf, message: String },

    #[error("invalid config: {0}")]
    Config(String),

    /// A single marketplace or model call failed.
    #[error("{collaborator} call failed: {message}")]
    Collaborator {
        collaborator: &'static str,
        message: String,
    },

    /// An input item or model payload lacks a field the pipeline requires.
    #[error("invalid {what}: {message}")]
    Validation { what: &'static str, message: String },

    #[error("template {template} has no value for placeholder {{{placeholder}}}")]
    MissingPlaceholder {
        template: String,
        placeholder: String,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScoutError {
    pub fn collaborator(collaborator: &'static str, message: impl ToString) -> Self {
        ScoutError::Collaborator {
            collaborator,
            message: message.to_string(),
        }
    }

    pub fn validation(what: &'static str, message: impl ToString) -> Self {
        ScoutError::Validation {
            what,
            message: message.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScoutError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type ScoutResult<T> = std::result::Result<T, ScoutError>;
