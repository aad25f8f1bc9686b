//! State management for declared resources
//!
//! Each stack keeps its own `<state-dir>/stacks/<stack>.json` file which
//! tracks the resources registered by the stack and the outputs its last
//! successful run exported.

use crate::action::ActionType;
use crate::engine::{Declaration, RegisteredResource, StackName};
use crate::error::{EngineError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

const STATE_VERSION: u32 = 1;
const STACKS_DIR: &str = "stacks";

/// State of one stack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackState {
    /// State file version
    pub version: u32,

    /// Last modified timestamp
    pub updated_at: DateTime<Utc>,

    /// Resources indexed by URN
    pub resources: BTreeMap<String, ResourceState>,

    /// Outputs exported by the last completed run
    #[serde(default)]
    pub outputs: Map<String, Value>,
}

impl Default for StackState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            updated_at: Utc::now(),
            resources: BTreeMap::new(),
            outputs: Map::new(),
        }
    }
}

impl StackState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a declaration and return what it resolved to
    ///
    /// Identical re-declarations keep their identifier and report `NoOp`.
    pub fn register(
        &mut self,
        stack: &StackName,
        project: &str,
        declaration: &Declaration,
    ) -> RegisteredResource {
        let urn = declaration.urn(stack);
        let now = Utc::now();

        let action = match self.resources.get(&urn) {
            None => ActionType::Create,
            Some(existing) if existing.properties == declaration.properties => ActionType::NoOp,
            Some(_) => ActionType::Update,
        };

        let id = derive_id(project, declaration);
        let outputs = computed_outputs(project, declaration, &id);

        match self.resources.get_mut(&urn) {
            Some(existing) => {
                if action == ActionType::Update {
                    existing.properties = declaration.properties.clone();
                    existing.outputs = outputs.clone();
                    existing.id = id.clone();
                    existing.updated_at = now;
                }
            }
            None => {
                self.resources.insert(
                    urn.clone(),
                    ResourceState {
                        id: id.clone(),
                        resource_type: declaration.resource_type.clone(),
                        properties: declaration.properties.clone(),
                        outputs: outputs.clone(),
                        created_at: now,
                        updated_at: now,
                    },
                );
            }
        }

        if action != ActionType::NoOp {
            self.updated_at = now;
        }

        RegisteredResource {
            urn,
            id,
            action,
            outputs,
        }
    }

    pub fn set_outputs(&mut self, outputs: Map<String, Value>) {
        self.outputs = outputs;
        self.updated_at = Utc::now();
    }
}

/// State of a single resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceState {
    /// Live identifier
    pub id: String,

    /// Resource type token
    pub resource_type: String,

    /// Properties as last declared
    pub properties: Value,

    /// Declared properties merged with computed attributes
    pub outputs: Map<String, Value>,

    /// When the resource was created
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Deterministic live identifier for a declaration
pub fn derive_id(project: &str, declaration: &Declaration) -> String {
    format!(
        "projects/{}/{}/{}",
        project,
        declaration.kind(),
        declaration.physical_name()
    )
}

/// Attributes the provider computes on top of the declared properties
fn computed_outputs(project: &str, declaration: &Declaration, id: &str) -> Map<String, Value> {
    let mut outputs = match &declaration.properties {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    outputs.insert("id".to_string(), Value::String(id.to_string()));
    if !outputs.contains_key("name") {
        outputs.insert(
            "name".to_string(),
            Value::String(declaration.physical_name().to_string()),
        );
    }

    // Service accounts get their IAM email
    if let Some(account_id) = declaration.get_property::<String>("accountId") {
        outputs.insert(
            "email".to_string(),
            Value::String(format!("{}@{}.iam.gserviceaccount.com", account_id, project)),
        );
    }

    outputs
}

/// State manager for reading/writing stack state files
pub struct StateManager {
    state_dir: PathBuf,
}

impl StateManager {
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            state_dir: state_dir.as_ref().to_path_buf(),
        }
    }

    fn stacks_dir(&self) -> PathBuf {
        self.state_dir.join(STACKS_DIR)
    }

    /// Get the state file path of a stack
    fn state_path(&self, stack: &StackName) -> PathBuf {
        self.stacks_dir().join(format!("{}.json", stack.file_stem()))
    }

    fn backup_path(&self, stack: &StackName) -> PathBuf {
        self.stacks_dir()
            .join(format!("{}.json.backup", stack.file_stem()))
    }

    fn lock_path(&self, stack: &StackName) -> PathBuf {
        self.stacks_dir().join(format!("{}.lock", stack.file_stem()))
    }

    /// Ensure the stacks directory exists
    async fn ensure_state_dir(&self) -> Result<()> {
        let dir = self.stacks_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
            tracing::debug!("Created state directory: {}", dir.display());
        }
        Ok(())
    }

    /// Load the state of a stack, `None` if it was never deployed
    pub async fn load(&self, stack: &StackName) -> Result<Option<StackState>> {
        let path = self.state_path(stack);
        if !path.exists() {
            tracing::debug!("No state file for stack {}", stack);
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await?;
        let state: StackState = serde_json::from_str(&content)?;

        // Version check
        if state.version > STATE_VERSION {
            return Err(EngineError::StateError(format!(
                "State file version {} is newer than supported version {}",
                state.version, STATE_VERSION
            )));
        }

        tracing::debug!(
            "Loaded state of {} with {} resources",
            stack,
            state.resources.len()
        );
        Ok(Some(state))
    }

    /// Save the state of a stack
    pub async fn save(&self, stack: &StackName, state: &StackState) -> Result<()> {
        self.ensure_state_dir().await?;

        let path = self.state_path(stack);
        let backup = self.backup_path(stack);

        // Create backup if state file exists
        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&path, &backup).await?;
            tracing::debug!("Created state backup for {}", stack);
        }

        let content = serde_json::to_string_pretty(state)?;
        fs::write(&path, content).await?;

        tracing::debug!(
            "Saved state of {} with {} resources",
            stack,
            state.resources.len()
        );
        Ok(())
    }

    /// Acquire a lock for exclusive access to a stack's state
    pub async fn acquire_lock(&self, stack: &StackName) -> Result<StateLock> {
        self.ensure_state_dir().await?;

        let lock_path = self.lock_path(stack);

        if lock_path.exists() {
            let content = fs::read_to_string(&lock_path).await?;
            let lock_info: LockInfo = serde_json::from_str(&content)?;

            // Locks older than 1 hour are stale
            let age = Utc::now().signed_duration_since(lock_info.acquired_at);
            if age.num_hours() < 1 {
                return Err(EngineError::LockError(format!(
                    "Stack {} is locked by {} since {}",
                    stack, lock_info.holder, lock_info.acquired_at
                )));
            }

            tracing::warn!("Removing stale lock on {} from {}", stack, lock_info.holder);
        }

        let lock_info = LockInfo {
            holder: std::env::var("HOSTNAME")
                .or_else(|_| std::env::var("HOST"))
                .unwrap_or_else(|_| "unknown".to_string()),
            acquired_at: Utc::now(),
        };

        let content = serde_json::to_string_pretty(&lock_info)?;
        fs::write(&lock_path, content).await?;

        tracing::debug!("Acquired state lock on {}", stack);
        Ok(StateLock {
            lock_path,
            released: false,
        })
    }
}

/// Lock information
#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    holder: String,
    acquired_at: DateTime<Utc>,
}

/// RAII guard for a stack lock
pub struct StateLock {
    lock_path: PathBuf,
    released: bool,
}

impl StateLock {
    /// Release the lock
    pub async fn release(mut self) -> Result<()> {
        if !self.released {
            if self.lock_path.exists() {
                fs::remove_file(&self.lock_path).await?;
                tracing::debug!("Released state lock");
            }
            self.released = true;
        }
        Ok(())
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if !self.released && self.lock_path.exists() {
            let _ = std::fs::remove_file(&self.lock_path);
        }
    }
}
