//! Composition error types

use gkeflow_engine::EngineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("failed to create {stage}: {error}")]
    Stage {
        stage: &'static str,
        error: EngineError,
    },

    #[error("failed to resolve {what}: {error}")]
    Resolve {
        what: &'static str,
        error: EngineError,
    },

    #[error("failed to publish stack outputs: {0}")]
    Publish(EngineError),
}

impl ComposeError {
    pub fn stage(stage: &'static str) -> impl FnOnce(EngineError) -> Self {
        move |error| ComposeError::Stage { stage, error }
    }

    pub fn resolve(what: &'static str) -> impl FnOnce(EngineError) -> Self {
        move |error| ComposeError::Resolve { what, error }
    }
}

pub type Result<T> = std::result::Result<T, ComposeError>;
