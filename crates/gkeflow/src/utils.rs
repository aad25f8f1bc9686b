use colored::Colorize;
use gkeflow_config::{ConfigSource, StackConfig};
use gkeflow_engine::{ActionType, LocalEngine, RunSummary, StackName};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Project id used when neither `--project` nor the stack config names one
pub const DEFAULT_PROJECT: &str = "local-project";

/// Load the configuration file of a stack and show where it came from
pub fn load_config(stack: &StackName) -> anyhow::Result<StackConfig> {
    let config = gkeflow_config::load_stack_config(stack.short_name())?;
    if let Some(path) = config.path() {
        println!("📄 Config: {}", path.display().to_string().cyan());
    }
    Ok(config)
}

/// Project id for the local engine: flag, then `hostProject`, then the default
pub fn resolve_project(flag: Option<&str>, config: &StackConfig) -> String {
    flag.map(str::to_string)
        .or_else(|| config.get("hostProject").filter(|p| !p.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_PROJECT.to_string())
}

pub fn local_engine(state_dir: &Path, project: String, preview: bool) -> Arc<LocalEngine> {
    tracing::debug!(
        "Local engine: state_dir={}, project={}, preview={}",
        state_dir.display(),
        project,
        preview
    );
    Arc::new(LocalEngine::new(state_dir, project).with_preview(preview))
}

/// Print the actions and exports of a finished run
pub fn print_summary(summary: &RunSummary, preview: bool) {
    println!();
    println!("{}", format!("Stack: {}", summary.stack).bold());

    for action in &summary.plan.actions {
        let line = format!(
            "  {} {} ({})",
            action.action_type.symbol(),
            action.physical_name,
            action.resource_type
        );
        match action.action_type {
            ActionType::Create => println!("{}", line.green()),
            ActionType::Update => println!("{}", line.yellow()),
            ActionType::NoOp => println!("{}", line.dimmed()),
        }
    }

    println!();
    println!("{}", summary.plan.summary().to_string().bold());

    if !summary.outputs.is_empty() {
        println!();
        println!("{}", "Outputs:".bold());
        for (key, value) in &summary.outputs {
            println!("  {}: {}", key.cyan(), display_value(value));
        }
    }

    if preview {
        println!();
        println!("{}", "Preview only, no state was written.".yellow());
    } else {
        println!();
        println!("{}", "✓ Done".green().bold());
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
