use crate::utils;
use crate::{RunArgs, StackArgs};
use colored::Colorize;
use gkeflow_config::{ClusterSettings, NetworkSource};
use gkeflow_engine::{RunContext, StackName};

pub async fn handle(stack: &StackArgs, run: &RunArgs) -> anyhow::Result<()> {
    let stack_name = StackName::parse(&stack.stack)?;
    println!("{}", "Composing GKE cluster stack...".blue().bold());
    println!("Stack: {}", stack_name.as_str().cyan());

    let config = utils::load_config(&stack_name)?;
    let settings = ClusterSettings::resolve(&config)?;

    match &settings.network {
        NetworkSource::StackReference(name) => {
            println!("Networking: {} (stack reference)", name.cyan())
        }
        NetworkSource::Explicit(names) => {
            println!("Networking: {} (explicit)", names.network_name.cyan())
        }
    }

    let project = utils::resolve_project(run.project.as_deref(), &config);
    let engine = utils::local_engine(&stack.state_dir, project, run.preview);
    let ctx = RunContext::new(engine, stack_name);

    gkeflow_gcp::compose_cluster(&ctx, &settings).await?;

    let summary = gkeflow_gcp::publish(ctx).await?;
    utils::print_summary(&summary, run.preview);
    Ok(())
}
