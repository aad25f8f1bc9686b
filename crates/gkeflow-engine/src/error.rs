//! Provisioning engine error types

use std::sync::Arc;
use thiserror::Error;

/// Provisioning engine errors
///
/// Errors are `Clone` because a failed [`Output`](crate::Output) hands the
/// same error to every consumer awaiting it.
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    #[error("Declaration of {resource} rejected: {reason}")]
    Declaration { resource: String, reason: String },

    #[error("Stack output '{key}' is missing from stack '{stack}'")]
    MissingOutput { stack: String, key: String },

    #[error("Stack not found: {0}")]
    StackNotFound(String),

    #[error("Invalid stack name '{name}': {reason}")]
    InvalidStackName { name: String, reason: String },

    #[error("Invalid declaration input: {0}")]
    InvalidInput(String),

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("IO error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(Arc<serde_json::Error>),
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Io(Arc::new(e))
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Json(Arc::new(e))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
