//! Provisioning engine trait definition

use crate::action::ActionType;
use crate::error::{EngineError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Provisioning engine abstraction trait
///
/// The engine owns everything past a declaration: diffing against live
/// state, talking to the cloud provider and persisting stack state.
/// Composers only ever talk to it through this trait.
#[async_trait]
pub trait ProvisioningEngine: Send + Sync {
    /// Returns the engine name (e.g., "local", "memory")
    fn name(&self) -> &str;

    /// Register a declared resource and return its resolved identity
    async fn register(
        &self,
        stack: &StackName,
        declaration: &Declaration,
    ) -> Result<RegisteredResource>;

    /// Read every output exported by a stack, `None` if the stack is unknown
    async fn read_outputs(&self, stack: &StackName) -> Result<Option<Map<String, Value>>>;

    /// Publish the outputs of a finished run
    async fn publish_outputs(&self, stack: &StackName, outputs: Map<String, Value>) -> Result<()>;
}

/// Name of an independently deployable stack
///
/// Either a bare stack name (`networking-dev`) or a fully qualified
/// `org/project/stack` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StackName(String);

impl StackName {
    pub fn parse(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let invalid = |reason: &str| EngineError::InvalidStackName {
            name: name.clone(),
            reason: reason.to_string(),
        };

        let segments: Vec<&str> = name.split('/').collect();
        if segments.len() != 1 && segments.len() != 3 {
            return Err(invalid("expected 'stack' or 'org/project/stack'"));
        }
        for segment in &segments {
            if segment.is_empty() {
                return Err(invalid("empty segment"));
            }
            if !segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            {
                return Err(invalid("only letters, digits, '-', '_' and '.' are allowed"));
            }
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The last segment (`stack` in `org/project/stack`)
    pub fn short_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// File-system friendly form of the name
    pub fn file_stem(&self) -> String {
        self.0.replace('/', ".")
    }
}

impl std::fmt::Display for StackName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for StackName {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for StackName {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<StackName> for String {
    fn from(name: StackName) -> Self {
        name.0
    }
}

/// A named, typed intent submitted to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    /// Resource type token (e.g., "gcp:compute/network:Network")
    pub resource_type: String,

    /// Logical name, unique per type within a stack
    pub name: String,

    /// Declared property set
    pub properties: Value,
}

impl Declaration {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>, properties: Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            properties,
        }
    }

    /// Build a declaration from any serializable argument struct
    pub fn from_args<A: Serialize>(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        args: &A,
    ) -> Result<Self> {
        Ok(Self::new(resource_type, name, serde_json::to_value(args)?))
    }

    /// Unique resource name within a stack
    pub fn urn(&self, stack: &StackName) -> String {
        format!("{}::{}::{}", stack, self.resource_type, self.name)
    }

    /// Lower-cased last segment of the type token (`network` for `...:Network`)
    pub fn kind(&self) -> String {
        self.resource_type
            .rsplit(':')
            .next()
            .unwrap_or(&self.resource_type)
            .to_ascii_lowercase()
    }

    /// The physical name: the `name` property if declared, else the logical name
    pub fn physical_name(&self) -> &str {
        self.properties
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(&self.name)
    }

    /// Get a property as a specific type
    pub fn get_property<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.properties
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// A declaration the engine has accepted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredResource {
    pub urn: String,

    /// Live identifier
    pub id: String,

    /// What the engine did with the declaration
    pub action: ActionType,

    /// Declared properties merged with provider-computed attributes
    pub outputs: Map<String, Value>,
}

impl RegisteredResource {
    /// Get an output as a specific type
    pub fn output<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.outputs
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}
