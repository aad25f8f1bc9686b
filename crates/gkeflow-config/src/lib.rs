pub mod error;
pub mod settings;
pub mod source;

pub use error::*;
pub use settings::{ClusterSettings, NetworkNames, NetworkSettings, NetworkSource, validate_cidr};
pub use source::{ConfigSource, StackConfig};

use std::path::PathBuf;

/// File name of a stack's configuration
pub fn stack_file_name(stack: &str) -> String {
    format!("gkeflow.{}.yaml", stack)
}

/// Find the configuration file of a stack
///
/// Lookup order:
/// 1. `GKEFLOW_CONFIG_PATH` environment variable (direct path)
/// 2. `./gkeflow.<stack>.yaml`
/// 3. `./.gkeflow/gkeflow.<stack>.yaml`
/// 4. `~/.config/gkeflow/gkeflow.<stack>.yaml`
pub fn find_stack_file(stack: &str) -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var("GKEFLOW_CONFIG_PATH") {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!(
            "GKEFLOW_CONFIG_PATH points to {} which does not exist",
            path.display()
        );
    }

    let file_name = stack_file_name(stack);
    let current_dir = std::env::current_dir()?;

    let local = current_dir.join(&file_name);
    if local.exists() {
        return Ok(local);
    }

    let in_dir = current_dir.join(".gkeflow").join(&file_name);
    if in_dir.exists() {
        return Ok(in_dir);
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global = config_dir.join("gkeflow").join(&file_name);
        if global.exists() {
            return Ok(global);
        }
    }

    Err(ConfigError::StackFileNotFound {
        stack: stack.to_string(),
    })
}

/// Find and load the configuration of a stack
pub fn load_stack_config(stack: &str) -> Result<StackConfig> {
    StackConfig::load(find_stack_file(stack)?)
}
