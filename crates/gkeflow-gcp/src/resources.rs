//! Typed arguments of the GCP resources gkeflow declares
//!
//! Each argument struct serializes to the property set the provisioning
//! engine receives (camelCase, like the provider schema).

use crate::error::ComposeError;
use gkeflow_engine::{Declaration, ResourceHandle, Result, RunContext};
use serde::Serialize;

/// A resource argument struct with its provider type token
pub trait GcpResource: Serialize + Sized {
    const TYPE_TOKEN: &'static str;

    /// Turn the arguments into a declaration under `logical_name`
    fn declare(&self, logical_name: &str) -> Result<Declaration> {
        Declaration::from_args(Self::TYPE_TOKEN, logical_name, self)
    }
}

/// Declare `args` and submit it, labelling failures with `stage`
pub async fn register<R: GcpResource>(
    ctx: &RunContext,
    stage: &'static str,
    logical_name: &str,
    args: &R,
) -> crate::Result<ResourceHandle> {
    let declaration = args
        .declare(logical_name)
        .map_err(ComposeError::stage(stage))?;
    ctx.register(declaration)
        .await
        .map_err(ComposeError::stage(stage))
}

// Compute

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkArgs {
    pub name: String,
    pub auto_create_subnetworks: bool,
}

impl GcpResource for NetworkArgs {
    const TYPE_TOKEN: &'static str = "gcp:compute/network:Network";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetworkArgs {
    pub name: String,
    pub ip_cidr_range: String,
    pub region: String,
    /// Live identifier of the parent network
    pub network: String,
    pub secondary_ip_ranges: Vec<SecondaryIpRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondaryIpRange {
    pub range_name: String,
    pub ip_cidr_range: String,
}

impl GcpResource for SubnetworkArgs {
    const TYPE_TOKEN: &'static str = "gcp:compute/subnetwork:Subnetwork";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedVpcHostProjectArgs {
    pub project: String,
}

impl GcpResource for SharedVpcHostProjectArgs {
    const TYPE_TOKEN: &'static str = "gcp:compute/sharedVPCHostProject:SharedVPCHostProject";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedVpcServiceProjectArgs {
    pub host_project: String,
    pub service_project: String,
}

impl GcpResource for SharedVpcServiceProjectArgs {
    const TYPE_TOKEN: &'static str =
        "gcp:compute/sharedVPCServiceProject:SharedVPCServiceProject";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterArgs {
    pub name: String,
    pub region: String,
    pub network: String,
    pub bgp: RouterBgp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterBgp {
    pub asn: u32,
}

impl GcpResource for RouterArgs {
    const TYPE_TOKEN: &'static str = "gcp:compute/router:Router";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterNatArgs {
    pub name: String,
    pub router: String,
    pub region: String,
    pub nat_ip_allocate_option: String,
    pub source_subnetwork_ip_ranges_to_nat: String,
    pub log_config: RouterNatLogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterNatLogConfig {
    pub enable: bool,
    pub filter: String,
}

impl GcpResource for RouterNatArgs {
    const TYPE_TOKEN: &'static str = "gcp:compute/routerNat:RouterNat";
}

// IAM

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccountArgs {
    pub account_id: String,
    pub display_name: String,
}

impl GcpResource for ServiceAccountArgs {
    const TYPE_TOKEN: &'static str = "gcp:serviceaccount/account:Account";
}

// Container

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterArgs {
    pub name: String,
    pub location: String,
    pub remove_default_node_pool: bool,
    pub initial_node_count: u32,
    pub network: String,
    pub subnetwork: String,
    pub ip_allocation_policy: IpAllocationPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IpAllocationPolicy {
    pub cluster_secondary_range_name: String,
    pub services_secondary_range_name: String,
    pub pod_cidr_overprovision_config: PodCidrOverprovisionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodCidrOverprovisionConfig {
    pub disabled: bool,
}

impl GcpResource for ClusterArgs {
    const TYPE_TOKEN: &'static str = "gcp:container/cluster:Cluster";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePoolArgs {
    pub name: String,
    /// Live identifier of the cluster
    pub cluster: String,
    pub node_count: u32,
    pub node_config: NodeConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    pub preemptible: bool,
    pub machine_type: String,
    pub service_account: String,
    pub oauth_scopes: Vec<String>,
}

impl GcpResource for NodePoolArgs {
    const TYPE_TOKEN: &'static str = "gcp:container/nodePool:NodePool";
}
