//! In-memory provisioning engine
//!
//! Records every declaration it receives and can be told to reject a
//! resource type, which makes it the engine of choice for composer tests.

use crate::engine::{Declaration, ProvisioningEngine, RegisteredResource, StackName};
use crate::error::{EngineError, Result};
use crate::state::StackState;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct Inner {
    stacks: HashMap<StackName, StackState>,
    declarations: Vec<(StackName, Declaration)>,
    failing_types: HashSet<String>,
}

/// Engine that keeps all state in memory
pub struct MemoryEngine {
    project: String,
    inner: Mutex<Inner>,
}

impl MemoryEngine {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reject every declaration of `resource_type`
    pub fn fail_on(&self, resource_type: impl Into<String>) {
        self.lock().failing_types.insert(resource_type.into());
    }

    /// Seed the exported outputs of another stack
    pub fn seed_outputs(&self, stack: &StackName, outputs: Map<String, Value>) {
        self.lock()
            .stacks
            .entry(stack.clone())
            .or_default()
            .set_outputs(outputs);
    }

    /// Every declaration received, in submission order
    pub fn declarations(&self) -> Vec<(StackName, Declaration)> {
        self.lock().declarations.clone()
    }

    /// Declarations of one resource type
    pub fn declarations_of(&self, resource_type: &str) -> Vec<Declaration> {
        self.lock()
            .declarations
            .iter()
            .filter(|(_, d)| d.resource_type == resource_type)
            .map(|(_, d)| d.clone())
            .collect()
    }

    /// Outputs currently published by a stack
    pub fn outputs(&self, stack: &StackName) -> Option<Map<String, Value>> {
        self.lock().stacks.get(stack).map(|s| s.outputs.clone())
    }
}

#[async_trait]
impl ProvisioningEngine for MemoryEngine {
    fn name(&self) -> &str {
        "memory"
    }

    async fn register(
        &self,
        stack: &StackName,
        declaration: &Declaration,
    ) -> Result<RegisteredResource> {
        let mut inner = self.lock();
        inner
            .declarations
            .push((stack.clone(), declaration.clone()));

        if inner.failing_types.contains(&declaration.resource_type) {
            return Err(EngineError::Declaration {
                resource: declaration.urn(stack),
                reason: "rejected by engine".to_string(),
            });
        }

        let project = self.project.clone();
        Ok(inner
            .stacks
            .entry(stack.clone())
            .or_default()
            .register(stack, &project, declaration))
    }

    async fn read_outputs(&self, stack: &StackName) -> Result<Option<Map<String, Value>>> {
        Ok(self.outputs(stack))
    }

    async fn publish_outputs(&self, stack: &StackName, outputs: Map<String, Value>) -> Result<()> {
        self.seed_outputs(stack, outputs);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionType;
    use serde_json::json;

    #[tokio::test]
    async fn test_records_declarations() {
        let engine = MemoryEngine::new("p");
        let stack = StackName::parse("dev").unwrap();
        let decl = Declaration::new("gcp:compute/router:Router", "router", json!({ "name": "r" }));

        let registered = engine.register(&stack, &decl).await.unwrap();
        assert_eq!(registered.action, ActionType::Create);
        assert_eq!(engine.declarations_of("gcp:compute/router:Router").len(), 1);
    }

    #[tokio::test]
    async fn test_fail_on_rejects_type() {
        let engine = MemoryEngine::new("p");
        engine.fail_on("gcp:compute/router:Router");
        let stack = StackName::parse("dev").unwrap();
        let decl = Declaration::new("gcp:compute/router:Router", "router", json!({}));

        let err = engine.register(&stack, &decl).await.unwrap_err();
        assert!(err.to_string().contains("dev::gcp:compute/router:Router::router"));
    }
}
