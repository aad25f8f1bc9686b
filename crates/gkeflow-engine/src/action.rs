//! Action types reported for each declaration of a run

use serde::{Deserialize, Serialize};

/// What the engine decided to do with one declared resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub urn: String,

    pub action_type: ActionType,

    /// Provider type token (e.g., "gcp:compute/network:Network")
    pub resource_type: String,

    /// Name the resource was declared under
    pub logical_name: String,

    /// Name of the live resource
    pub physical_name: String,

    /// Identifier the engine assigned
    pub live_id: String,
}

/// Type of action to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Create a new resource
    Create,
    /// Update an existing resource
    Update,
    /// No changes needed
    NoOp,
}

impl ActionType {
    /// Symbol used when printing a plan
    pub fn symbol(&self) -> &'static str {
        match self {
            ActionType::Create => "+",
            ActionType::Update => "~",
            ActionType::NoOp => "=",
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Create => write!(f, "create"),
            ActionType::Update => write!(f, "update"),
            ActionType::NoOp => write!(f, "no-op"),
        }
    }
}

/// Every action of a run, in declaration order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub actions: Vec<Action>,
    pub has_changes: bool,
}

impl Plan {
    pub fn new(actions: Vec<Action>) -> Self {
        let has_changes = actions.iter().any(|a| a.action_type != ActionType::NoOp);
        Self {
            actions,
            has_changes,
        }
    }

    /// Number of actions of one type
    pub fn count(&self, action_type: ActionType) -> usize {
        self.actions
            .iter()
            .filter(|a| a.action_type == action_type)
            .count()
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            create: self.count(ActionType::Create),
            update: self.count(ActionType::Update),
            no_change: self.count(ActionType::NoOp),
        }
    }
}

/// Summary of planned actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub no_change: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to create, {} to update, {} unchanged",
            self.create, self.update, self.no_change
        )
    }
}
