//! gkeflow provisioning engine
//!
//! This crate defines the contract between infrastructure composers and the
//! provisioning engine that turns their declarations into live resources.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  gkeflow CLI                    │
//! │           (gkeflow network / cluster)           │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                gkeflow-gcp                      │
//! │   Network Composer · Cluster Composer ·         │
//! │   Stack Output Bridge                           │
//! └─────────────────┬───────────────────────────────┘
//!                   │ RunContext (explicit handle)
//! ┌─────────────────▼───────────────────────────────┐
//! │               gkeflow-engine                    │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │   trait ProvisioningEngine { ... }       │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐             │
//! │  │  Output<T>   │  │  State Mgmt  │             │
//! │  └──────────────┘  └──────────────┘             │
//! └───────┬─────────────────┬───────────────────────┘
//!         │                 │
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │  LocalEngine  │ │ MemoryEngine  │
//! └───────────────┘ └───────────────┘
//! ```

pub mod action;
pub mod context;
pub mod engine;
pub mod error;
pub mod local;
pub mod memory;
pub mod output;
pub mod state;

// Re-exports
pub use action::{Action, ActionType, Plan, PlanSummary};
pub use context::{ResourceHandle, RunContext, RunSummary};
pub use engine::{Declaration, ProvisioningEngine, RegisteredResource, StackName};
pub use error::{EngineError, Result};
pub use local::LocalEngine;
pub use memory::MemoryEngine;
pub use output::Output;
pub use state::{ResourceState, StackState, StateLock, StateManager};
