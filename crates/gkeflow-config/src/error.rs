use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required configuration key '{0}'")]
    MissingKey(String),

    #[error("invalid value '{value}' for configuration key '{key}': {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error(
        "no network source configured: set 'networkingStackName' or all of \
        'networkName', 'subnetName', 'secPodRangeName', 'secSvcRangeName'"
    )]
    MissingNetworkSource,

    #[error(
        "conflicting network sources: 'networkingStackName' is set together with explicit key(s) {0}"
    )]
    ConflictingNetworkSource(String),

    #[error(
        "stack configuration for '{stack}' not found. Looked for:\n\
        - GKEFLOW_CONFIG_PATH environment variable\n\
        - ./gkeflow.{stack}.yaml\n\
        - ./.gkeflow/gkeflow.{stack}.yaml\n\
        - ~/.config/gkeflow/gkeflow.{stack}.yaml"
    )]
    StackFileNotFound { stack: String },

    #[error("configuration key '{key}' is set more than once ('{first}' and '{second}')")]
    DuplicateKey {
        key: String,
        first: String,
        second: String,
    },

    #[error("YAML error in {path}: {error}")]
    Yaml {
        path: String,
        error: serde_yaml::Error,
    },

    #[error("IO error: {0}")]
    Io(std::io::Error),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
