//! Cluster Composer
//!
//! Declares a node service account, a GKE cluster bound to the networking
//! stack's subnetwork and secondary ranges, and a preemptible node pool
//! running as that service account.

use crate::error::{ComposeError, Result};
use crate::naming;
use crate::resources::{
    ClusterArgs, IpAllocationPolicy, NodeConfig, NodePoolArgs, PodCidrOverprovisionConfig,
    ServiceAccountArgs, register,
};
use crate::stack_ref::{StackReference, resolve_networking_outputs as resolve_from_stack};
use gkeflow_config::{ClusterSettings, NetworkNames, NetworkSource};
use gkeflow_engine::{EngineError, Output, ResourceHandle, RunContext};

/// A declared service account
#[derive(Debug, Clone)]
pub struct ServiceAccountRef {
    pub email: Output<String>,
    pub handle: ResourceHandle,
}

/// A declared GKE cluster
#[derive(Debug, Clone)]
pub struct ClusterRef {
    pub name: String,
    pub id: Output<String>,
    pub handle: ResourceHandle,
}

/// A declared node pool
#[derive(Debug, Clone)]
pub struct NodePoolRef {
    pub name: String,
    pub handle: ResourceHandle,
}

/// Everything the cluster program declared
#[derive(Debug, Clone)]
pub struct ClusterStack {
    pub service_account: ServiceAccountRef,
    pub network: NetworkNames,
    pub cluster: ClusterRef,
    pub node_pool: NodePoolRef,
}

pub async fn create_service_account(
    ctx: &RunContext,
    account_id: &str,
    display_name: &str,
) -> Result<ServiceAccountRef> {
    let args = ServiceAccountArgs {
        account_id: account_id.to_string(),
        display_name: display_name.to_string(),
    };
    let handle = register(ctx, "service account", "default", &args).await?;

    let email = handle.string_output("email").non_empty("service account email");
    ctx.export("serviceAccountEmail", &email);

    Ok(ServiceAccountRef { email, handle })
}

/// Network, subnetwork and secondary range names for the cluster
pub async fn resolve_networking_outputs(
    ctx: &RunContext,
    source: &NetworkSource,
) -> Result<NetworkNames> {
    let names = match source {
        NetworkSource::StackReference(stack) => {
            let reference =
                StackReference::new(ctx, stack).map_err(ComposeError::resolve("networking outputs"))?;
            resolve_from_stack(&reference)
                .await
                .map_err(ComposeError::resolve("networking outputs"))?
        }
        NetworkSource::Explicit(names) => names.clone(),
    };

    for (what, value) in [
        ("networkName", &names.network_name),
        ("subnetName", &names.subnet_name),
        ("secPodRangeName", &names.pod_range_name),
        ("secSvcRangeName", &names.svc_range_name),
    ] {
        if value.trim().is_empty() {
            return Err(ComposeError::Resolve {
                what: "networking outputs",
                error: EngineError::InvalidInput(format!("{} is empty", what)),
            });
        }
    }

    Ok(names)
}

pub async fn create_cluster(
    ctx: &RunContext,
    settings: &ClusterSettings,
    network: &NetworkNames,
    service_account: &ServiceAccountRef,
) -> Result<ClusterRef> {
    // The cluster is never declared ahead of its node identity
    service_account
        .email
        .non_empty("service account email")
        .resolve()
        .await
        .map_err(ComposeError::stage("GKE cluster"))?;

    let name = naming::cluster_name(&settings.app, &settings.env);
    let args = ClusterArgs {
        name: name.clone(),
        location: settings.location.clone(),
        // Node pools are managed explicitly
        remove_default_node_pool: true,
        initial_node_count: settings.node_count,
        network: network.network_name.clone(),
        subnetwork: network.subnet_name.clone(),
        ip_allocation_policy: IpAllocationPolicy {
            cluster_secondary_range_name: network.pod_range_name.clone(),
            services_secondary_range_name: network.svc_range_name.clone(),
            pod_cidr_overprovision_config: PodCidrOverprovisionConfig {
                disabled: settings.disable_pod_cidr_overprovision,
            },
        },
    };
    let handle = register(ctx, "GKE cluster", "primary", &args).await?;
    ctx.export("clusterName", &handle.string_output("name"));

    Ok(ClusterRef {
        name,
        id: handle.id(),
        handle,
    })
}

pub async fn create_node_pool(
    ctx: &RunContext,
    settings: &ClusterSettings,
    cluster: &ClusterRef,
    service_account: &ServiceAccountRef,
) -> Result<NodePoolRef> {
    let (cluster_id, email) = futures_util::try_join!(
        cluster.id.non_empty("cluster id").resolve(),
        service_account.email.non_empty("service account email").resolve()
    )
    .map_err(ComposeError::stage("node pool"))?;

    let name = naming::node_pool_name(&settings.app, &settings.env);
    let args = NodePoolArgs {
        name: name.clone(),
        cluster: cluster_id,
        node_count: settings.node_count,
        node_config: NodeConfig {
            preemptible: true,
            machine_type: settings.machine_type.clone(),
            service_account: email,
            oauth_scopes: vec![naming::CLOUD_PLATFORM_SCOPE.to_string()],
        },
    };
    let handle = register(ctx, "node pool", "primary", &args).await?;
    ctx.export("nodePoolName", &handle.string_output("name"));

    Ok(NodePoolRef { name, handle })
}

/// Run the cluster program: service account, network lookup, cluster, node pool
pub async fn compose_cluster(ctx: &RunContext, settings: &ClusterSettings) -> Result<ClusterStack> {
    let service_account = create_service_account(
        ctx,
        &settings.service_account_id,
        &settings.service_account_display_name,
    )
    .await?;
    tracing::info!("Service account created: {}", settings.service_account_id);

    let network = resolve_networking_outputs(ctx, &settings.network).await?;
    tracing::info!(
        "Networking resolved: {} / {}",
        network.network_name,
        network.subnet_name
    );

    let cluster = create_cluster(ctx, settings, &network, &service_account).await?;
    tracing::info!("GKE cluster created: {}", cluster.name);

    let node_pool = create_node_pool(ctx, settings, &cluster, &service_account).await?;
    tracing::info!("Node pool created: {}", node_pool.name);

    Ok(ClusterStack {
        service_account,
        network,
        cluster,
        node_pool,
    })
}
