//! File-backed provisioning engine
//!
//! Keeps every stack's resources and exports under a local state directory.
//! Identifiers are derived deterministically from the declaration, so
//! re-running the same program against the same state reports `NoOp` for
//! every resource instead of creating duplicates.

use crate::engine::{Declaration, ProvisioningEngine, RegisteredResource, StackName};
use crate::error::{EngineError, Result};
use crate::state::StateManager;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::Path;
use tokio::sync::Mutex;

/// Local state-file engine
pub struct LocalEngine {
    state: StateManager,
    project: String,
    preview: bool,
    // Serializes load-modify-save cycles within this process
    guard: Mutex<()>,
}

impl LocalEngine {
    pub fn new(state_dir: impl AsRef<Path>, project: impl Into<String>) -> Self {
        Self {
            state: StateManager::new(state_dir),
            project: project.into(),
            preview: false,
            guard: Mutex::new(()),
        }
    }

    /// Compute actions without persisting anything
    pub fn with_preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

}

#[async_trait]
impl ProvisioningEngine for LocalEngine {
    fn name(&self) -> &str {
        "local"
    }

    async fn register(
        &self,
        stack: &StackName,
        declaration: &Declaration,
    ) -> Result<RegisteredResource> {
        if !declaration.properties.is_object() {
            return Err(EngineError::Declaration {
                resource: declaration.urn(stack),
                reason: "properties must be an object".to_string(),
            });
        }

        let _guard = self.guard.lock().await;
        let lock = if self.preview {
            None
        } else {
            Some(self.state.acquire_lock(stack).await?)
        };

        let mut state = self.state.load(stack).await?.unwrap_or_default();
        let registered = state.register(stack, &self.project, declaration);

        if let Some(lock) = lock {
            self.state.save(stack, &state).await?;
            lock.release().await?;
        }

        tracing::debug!(
            "{} {} ({})",
            registered.action,
            registered.urn,
            registered.id
        );
        Ok(registered)
    }

    async fn read_outputs(&self, stack: &StackName) -> Result<Option<Map<String, Value>>> {
        Ok(self.state.load(stack).await?.map(|s| s.outputs))
    }

    async fn publish_outputs(&self, stack: &StackName, outputs: Map<String, Value>) -> Result<()> {
        if self.preview {
            tracing::debug!("Preview: not publishing {} outputs of {}", outputs.len(), stack);
            return Ok(());
        }

        let _guard = self.guard.lock().await;
        let lock = self.state.acquire_lock(stack).await?;

        let mut state = self.state.load(stack).await?.unwrap_or_default();
        state.set_outputs(outputs);
        self.state.save(stack, &state).await?;
        lock.release().await?;
        Ok(())
    }
}
