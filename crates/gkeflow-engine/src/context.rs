//! Per-run context
//!
//! A [`RunContext`] carries the engine handle and the stack being deployed
//! through every composer call. It also collects the stack's exports and the
//! actions the engine reported, and publishes the exports once the run
//! finishes.

use crate::action::{Action, Plan};
use crate::engine::{Declaration, ProvisioningEngine, RegisteredResource, StackName};
use crate::error::{EngineError, Result};
use crate::output::Output;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Engine handle and bookkeeping for one deployment run
pub struct RunContext {
    engine: Arc<dyn ProvisioningEngine>,
    stack: StackName,
    exports: Mutex<Vec<(String, Output<Value>)>>,
    actions: Mutex<Vec<Action>>,
}

/// Result of a finished run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub stack: StackName,
    pub plan: Plan,
    pub outputs: Map<String, Value>,
}

impl RunContext {
    pub fn new(engine: Arc<dyn ProvisioningEngine>, stack: StackName) -> Self {
        Self {
            engine,
            stack,
            exports: Mutex::new(Vec::new()),
            actions: Mutex::new(Vec::new()),
        }
    }

    pub fn stack(&self) -> &StackName {
        &self.stack
    }

    pub fn engine(&self) -> &Arc<dyn ProvisioningEngine> {
        &self.engine
    }

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Submit a declaration to the engine
    pub async fn register(&self, declaration: Declaration) -> Result<ResourceHandle> {
        let registered = self.engine.register(&self.stack, &declaration).await?;

        Self::lock(&self.actions).push(Action {
            urn: registered.urn.clone(),
            action_type: registered.action,
            resource_type: declaration.resource_type.clone(),
            logical_name: declaration.name.clone(),
            physical_name: declaration.physical_name().to_string(),
            live_id: registered.id.clone(),
        });

        Ok(ResourceHandle {
            stack: self.stack.clone(),
            resource: Arc::new(registered),
        })
    }

    /// Export a value under `key` once it resolves
    pub fn export<T>(&self, key: impl Into<String>, output: &Output<T>)
    where
        T: Serialize + Clone + Send + Sync + 'static,
    {
        let value = output.try_map(|v| Ok(serde_json::to_value(v)?));
        Self::lock(&self.exports).push((key.into(), value));
    }

    /// Keys exported so far
    pub fn export_keys(&self) -> Vec<String> {
        Self::lock(&self.exports)
            .iter()
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Actions reported so far
    pub fn plan(&self) -> Plan {
        Plan::new(Self::lock(&self.actions).clone())
    }

    /// Resolve every export and publish them
    pub async fn finish(self) -> Result<RunSummary> {
        let exports = std::mem::take(&mut *Self::lock(&self.exports));

        let mut outputs = Map::new();
        for (key, output) in exports {
            let value = output.resolve().await?;
            outputs.insert(key, value);
        }

        self.engine
            .publish_outputs(&self.stack, outputs.clone())
            .await?;
        tracing::debug!("Published {} outputs of {}", outputs.len(), self.stack);

        Ok(RunSummary {
            plan: self.plan(),
            stack: self.stack,
            outputs,
        })
    }
}

/// Handle to a resource the engine has registered
#[derive(Debug, Clone)]
pub struct ResourceHandle {
    stack: StackName,
    resource: Arc<RegisteredResource>,
}

impl ResourceHandle {
    /// Live identifier
    pub fn id(&self) -> Output<String> {
        Output::ready(self.resource.id.clone())
    }

    /// A resolved attribute, failing if the engine did not produce it
    pub fn output(&self, key: &str) -> Output<Value> {
        match self.resource.outputs.get(key) {
            Some(value) if !value.is_null() => Output::ready(value.clone()),
            _ => Output::failed(EngineError::MissingOutput {
                stack: self.stack.to_string(),
                key: format!("{}.{}", self.resource.urn, key),
            }),
        }
    }

    /// A resolved string attribute
    pub fn string_output(&self, key: &str) -> Output<String> {
        let urn = self.resource.urn.clone();
        let key_name = key.to_string();
        self.output(key).try_map(move |value| match value {
            Value::String(s) => Ok(s),
            other => Err(EngineError::InvalidInput(format!(
                "{}.{} is not a string: {}",
                urn, key_name, other
            ))),
        })
    }
}
