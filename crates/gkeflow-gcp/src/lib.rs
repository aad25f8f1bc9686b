//! GCP composition for gkeflow
//!
//! Two programs built on [`gkeflow_engine::RunContext`]:
//!
//! - [`compose_network`]: shared VPC, subnetwork with secondary ranges,
//!   shared-VPC host project and Cloud NAT router
//! - [`compose_cluster`]: node service account, GKE cluster and a
//!   preemptible node pool, attached to a networking stack's outputs
//!
//! ```text
//! networking stack                       cluster stack
//! ┌──────────────────┐   exports    ┌──────────────────────┐
//! │ network          │──────────────▶ StackReference       │
//! │ subnetwork       │ networkName  │   ↓                  │
//! │ shared VPC host  │ subnetName   │ service account      │
//! │ NAT router       │ sec*Name     │ cluster → node pool  │
//! └──────────────────┘              └──────────────────────┘
//! ```

pub mod cluster;
pub mod error;
pub mod naming;
pub mod network;
pub mod resources;
pub mod stack_ref;

pub use cluster::{
    ClusterRef, ClusterStack, NodePoolRef, ServiceAccountRef, compose_cluster, create_cluster,
    create_node_pool, create_service_account, resolve_networking_outputs,
};
pub use error::{ComposeError, Result};
pub use network::{
    NetworkRef, NetworkStack, RouterRef, SharedVpcRef, SubnetRef, compose_network,
    create_network, create_subnetwork, nat_router, shared_vpc,
};
pub use resources::{GcpResource, register};
pub use stack_ref::StackReference;

use gkeflow_engine::{RunContext, RunSummary};

/// Resolve a finished run's exports and publish them
pub async fn publish(ctx: RunContext) -> Result<RunSummary> {
    ctx.finish().await.map_err(ComposeError::Publish)
}
