//! Stack Output Bridge
//!
//! Reads the exports of a separately deployed stack. Every lookup is an
//! [`Output`]; an export that is absent (or null) resolves to
//! [`EngineError::MissingOutput`] instead of a default value.

use gkeflow_config::NetworkNames;
use gkeflow_engine::{EngineError, Output, ProvisioningEngine, RunContext, StackName};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Reference to another stack's outputs
#[derive(Clone)]
pub struct StackReference {
    name: StackName,
    outputs: Output<Arc<Map<String, Value>>>,
}

impl std::fmt::Debug for StackReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StackReference")
            .field("name", &self.name)
            .finish()
    }
}

impl StackReference {
    /// Open a reference to `name`; the stack is read lazily, once
    pub fn new(ctx: &RunContext, name: &str) -> gkeflow_engine::Result<Self> {
        let name = StackName::parse(name)?;
        let engine: Arc<dyn ProvisioningEngine> = ctx.engine().clone();
        let stack = name.clone();

        let outputs = Output::from_future(async move {
            match engine.read_outputs(&stack).await? {
                Some(outputs) => Ok(Arc::new(outputs)),
                None => Err(EngineError::StackNotFound(stack.to_string())),
            }
        });

        Ok(Self { name, outputs })
    }

    pub fn name(&self) -> &StackName {
        &self.name
    }

    /// A named output of the referenced stack
    pub fn output(&self, key: &str) -> Output<Value> {
        let stack = self.name.to_string();
        let key = key.to_string();
        self.outputs.try_map(move |outputs| match outputs.get(&key) {
            Some(value) if !value.is_null() => Ok(value.clone()),
            _ => Err(EngineError::MissingOutput { stack, key }),
        })
    }

    /// A named output that must be a non-empty string
    pub fn string_output(&self, key: &str) -> Output<String> {
        let stack = self.name.to_string();
        let key = key.to_string();
        self.output(&key).try_map(move |value| match value {
            Value::String(s) if !s.is_empty() => Ok(s),
            Value::String(_) => Err(EngineError::MissingOutput { stack, key }),
            other => Err(EngineError::InvalidInput(format!(
                "output '{}' of stack '{}' is not a string: {}",
                key, stack, other
            ))),
        })
    }
}

/// Resolve the four names a cluster needs from a networking stack
pub async fn resolve_networking_outputs(
    reference: &StackReference,
) -> gkeflow_engine::Result<NetworkNames> {
    let (network_name, subnet_name, pod_range_name, svc_range_name) = futures_util::try_join!(
        reference.string_output("networkName").resolve(),
        reference.string_output("subnetName").resolve(),
        reference.string_output("secPodRangeName").resolve(),
        reference.string_output("secSvcRangeName").resolve()
    )?;

    tracing::debug!("networkName: {}", network_name);
    tracing::debug!("subnetName: {}", subnet_name);
    tracing::debug!("secPodRangeName: {}", pod_range_name);
    tracing::debug!("secSvcRangeName: {}", svc_range_name);

    Ok(NetworkNames {
        network_name,
        subnet_name,
        pod_range_name,
        svc_range_name,
    })
}
