use crate::StackArgs;
use crate::utils;
use gkeflow_engine::{EngineError, ProvisioningEngine, StackName};

pub async fn handle(stack: &StackArgs) -> anyhow::Result<()> {
    let stack_name = StackName::parse(&stack.stack)?;
    let engine = utils::local_engine(&stack.state_dir, utils::DEFAULT_PROJECT.to_string(), true);

    let outputs = engine
        .read_outputs(&stack_name)
        .await?
        .ok_or_else(|| EngineError::StackNotFound(stack_name.to_string()))?;

    println!("{}", serde_json::to_string_pretty(&outputs)?);
    Ok(())
}
