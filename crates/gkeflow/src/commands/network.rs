use crate::utils;
use crate::{RunArgs, StackArgs};
use colored::Colorize;
use gkeflow_config::NetworkSettings;
use gkeflow_engine::{RunContext, StackName};

pub async fn handle(stack: &StackArgs, run: &RunArgs) -> anyhow::Result<()> {
    let stack_name = StackName::parse(&stack.stack)?;
    println!("{}", "Composing networking stack...".blue().bold());
    println!("Stack: {}", stack_name.as_str().cyan());

    // Settings are validated before anything is declared
    let config = utils::load_config(&stack_name)?;
    let settings = NetworkSettings::resolve(&config)?;

    let project = utils::resolve_project(run.project.as_deref(), &config);
    let engine = utils::local_engine(&stack.state_dir, project, run.preview);
    let ctx = RunContext::new(engine, stack_name);

    gkeflow_gcp::compose_network(&ctx, &settings).await?;

    let summary = gkeflow_gcp::publish(ctx).await?;
    utils::print_summary(&summary, run.preview);
    Ok(())
}
