//! Network Composer
//!
//! Declares the shared VPC of an environment: the network, its subnetwork
//! with pod/service secondary ranges, the shared-VPC host project and a
//! Cloud NAT router. Everything a cluster stack needs is exported.

use crate::error::{ComposeError, Result};
use crate::naming;
use crate::resources::{
    NetworkArgs, RouterArgs, RouterBgp, RouterNatArgs, RouterNatLogConfig, SecondaryIpRange,
    SharedVpcHostProjectArgs, SharedVpcServiceProjectArgs, SubnetworkArgs, register,
};
use gkeflow_config::NetworkSettings;
use gkeflow_engine::{Output, ResourceHandle, RunContext};

/// A declared VPC network
#[derive(Debug, Clone)]
pub struct NetworkRef {
    pub name: String,
    pub id: Output<String>,
    pub handle: ResourceHandle,
}

/// A declared subnetwork
#[derive(Debug, Clone)]
pub struct SubnetRef {
    pub name: String,
    pub id: Output<String>,
    pub handle: ResourceHandle,
}

/// The shared-VPC host project and its optional service-project attachment
#[derive(Debug, Clone)]
pub struct SharedVpcRef {
    pub host: ResourceHandle,
    pub service: Option<ResourceHandle>,
}

/// A Cloud Router with its NAT configuration
#[derive(Debug, Clone)]
pub struct RouterRef {
    pub name: String,
    pub router: ResourceHandle,
    pub nat: ResourceHandle,
}

/// Everything the networking program declared
#[derive(Debug, Clone)]
pub struct NetworkStack {
    pub network: NetworkRef,
    pub subnet: SubnetRef,
    pub shared_vpc: SharedVpcRef,
    pub router: RouterRef,
}

pub async fn create_network(ctx: &RunContext, settings: &NetworkSettings) -> Result<NetworkRef> {
    let name = naming::network_name(&settings.env);
    let args = NetworkArgs {
        name: name.clone(),
        // Subnets are managed explicitly
        auto_create_subnetworks: false,
    };
    let handle = register(ctx, "network", &name, &args).await?;

    let id = handle.id();
    ctx.export("network", &id);
    ctx.export("networkName", &Output::ready(name.clone()));

    Ok(NetworkRef { name, id, handle })
}

pub async fn create_subnetwork(
    ctx: &RunContext,
    settings: &NetworkSettings,
    network_id: &Output<String>,
) -> Result<SubnetRef> {
    let network = network_id
        .non_empty("network id")
        .resolve()
        .await
        .map_err(ComposeError::stage("subnetwork"))?;

    let name = naming::subnet_name(&settings.env);
    let args = SubnetworkArgs {
        name: name.clone(),
        ip_cidr_range: settings.primary_ip_cidr_range.clone(),
        region: settings.region.clone(),
        network,
        secondary_ip_ranges: vec![
            SecondaryIpRange {
                range_name: naming::POD_RANGE_NAME.to_string(),
                ip_cidr_range: settings.sec_pod_ip_cidr_range.clone(),
            },
            SecondaryIpRange {
                range_name: naming::SVC_RANGE_NAME.to_string(),
                ip_cidr_range: settings.sec_svc_ip_cidr_range.clone(),
            },
        ],
    };
    let handle = register(ctx, "subnetwork", &name, &args).await?;

    let id = handle.id();
    ctx.export("subnet", &id);
    ctx.export("subnetName", &Output::ready(name.clone()));
    ctx.export(
        "primaryIpCidrRange",
        &Output::ready(settings.primary_ip_cidr_range.clone()),
    );
    ctx.export("secPodRangeName", &Output::ready(naming::POD_RANGE_NAME.to_string()));
    ctx.export("secSvcRangeName", &Output::ready(naming::SVC_RANGE_NAME.to_string()));

    Ok(SubnetRef { name, id, handle })
}

/// Declare the host project, and attach the service project when enabled
pub async fn shared_vpc(ctx: &RunContext, settings: &NetworkSettings) -> Result<SharedVpcRef> {
    let host = register(
        ctx,
        "shared VPC",
        "host",
        &SharedVpcHostProjectArgs {
            project: settings.host_project.clone(),
        },
    )
    .await?;
    ctx.export("HostProject", &host.id());

    if !settings.attach_service_project {
        tracing::debug!("Service project attachment disabled");
        return Ok(SharedVpcRef {
            host,
            service: None,
        });
    }

    let host_project = host
        .string_output("project")
        .resolve()
        .await
        .map_err(ComposeError::stage("shared VPC service project"))?;
    let service = register(
        ctx,
        "shared VPC service project",
        "service",
        &SharedVpcServiceProjectArgs {
            host_project,
            service_project: settings.service_project.clone(),
        },
    )
    .await?;
    ctx.export("ServiceProject", &service.id());

    Ok(SharedVpcRef {
        host,
        service: Some(service),
    })
}

/// Declare a Cloud Router and a NAT on it covering every subnetwork
pub async fn nat_router(
    ctx: &RunContext,
    settings: &NetworkSettings,
    network_id: &Output<String>,
) -> Result<RouterRef> {
    let network = network_id
        .non_empty("network id")
        .resolve()
        .await
        .map_err(ComposeError::stage("NAT router"))?;

    let router_args = RouterArgs {
        name: naming::router_name(&settings.env),
        region: settings.region.clone(),
        network,
        bgp: RouterBgp {
            asn: naming::ROUTER_ASN,
        },
    };
    let router = register(ctx, "NAT router", "router", &router_args).await?;
    let router_name = router.string_output("name");
    ctx.export("router", &router_name);

    let (router_name, region) = futures_util::try_join!(
        router_name.resolve(),
        router.string_output("region").resolve()
    )
    .map_err(ComposeError::stage("NAT router"))?;

    let nat_args = RouterNatArgs {
        name: naming::nat_name(&settings.env),
        router: router_name.clone(),
        region,
        nat_ip_allocate_option: "AUTO_ONLY".to_string(),
        source_subnetwork_ip_ranges_to_nat: "ALL_SUBNETWORKS_ALL_IP_RANGES".to_string(),
        log_config: RouterNatLogConfig {
            enable: true,
            filter: "ERRORS_ONLY".to_string(),
        },
    };
    let nat = register(ctx, "NAT router", "nat", &nat_args).await?;
    ctx.export("nat", &nat.id());

    Ok(RouterRef {
        name: router_name,
        router,
        nat,
    })
}

/// Run the networking program: network, subnetwork, shared VPC, NAT router
pub async fn compose_network(ctx: &RunContext, settings: &NetworkSettings) -> Result<NetworkStack> {
    let network = create_network(ctx, settings).await?;
    tracing::info!("Network created: {}", network.name);

    let subnet = create_subnetwork(ctx, settings, &network.id).await?;
    tracing::info!("Subnetwork created: {}", subnet.name);

    let shared_vpc = shared_vpc(ctx, settings).await?;
    tracing::info!("Shared VPC created for host project {}", settings.host_project);

    let router = nat_router(ctx, settings, &network.id).await?;
    tracing::info!("NAT router created: {}", router.name);

    Ok(NetworkStack {
        network,
        subnet,
        shared_vpc,
        router,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gkeflow_engine::{ActionType, EngineError, MemoryEngine, StackName};
    use serde_json::json;
    use std::sync::Arc;

    fn settings() -> NetworkSettings {
        NetworkSettings {
            env: "dev".to_string(),
            app: "demo".to_string(),
            region: "us-central1".to_string(),
            host_project: "host-project".to_string(),
            service_project: "service-project".to_string(),
            primary_ip_cidr_range: "10.0.0.0/20".to_string(),
            sec_pod_ip_cidr_range: "10.1.0.0/16".to_string(),
            sec_svc_ip_cidr_range: "10.2.0.0/20".to_string(),
            attach_service_project: false,
        }
    }

    fn context(engine: &Arc<MemoryEngine>) -> RunContext {
        RunContext::new(engine.clone(), StackName::parse("networking-dev").unwrap())
    }

    #[tokio::test]
    async fn test_subnet_references_network_id() {
        let engine = Arc::new(MemoryEngine::new("host-project"));
        let ctx = context(&engine);

        let network = create_network(&ctx, &settings()).await.unwrap();
        create_subnetwork(&ctx, &settings(), &network.id)
            .await
            .unwrap();

        let network_id = network.id.resolve().await.unwrap();
        let subnets = engine.declarations_of("gcp:compute/subnetwork:Subnetwork");
        assert_eq!(subnets.len(), 1);
        assert_eq!(subnets[0].properties["network"], json!(network_id));
    }

    #[tokio::test]
    async fn test_scenario_dev_network() {
        let engine = Arc::new(MemoryEngine::new("host-project"));
        let ctx = context(&engine);

        let stack = compose_network(&ctx, &settings()).await.unwrap();
        assert_eq!(stack.network.name, "shared-dev-network");
        assert_eq!(stack.subnet.name, "shared-dev-subnet");
        assert_eq!(stack.router.name, "shared-dev-cloud-nat-router");

        let network = &engine.declarations_of("gcp:compute/network:Network")[0];
        assert_eq!(network.properties["autoCreateSubnetworks"], json!(false));

        let subnet = &engine.declarations_of("gcp:compute/subnetwork:Subnetwork")[0];
        assert_eq!(subnet.properties["region"], json!("us-central1"));
        assert_eq!(subnet.properties["ipCidrRange"], json!("10.0.0.0/20"));
        assert_eq!(
            subnet.properties["secondaryIpRanges"],
            json!([
                { "rangeName": "sec-pod-range", "ipCidrRange": "10.1.0.0/16" },
                { "rangeName": "sec-svc-range", "ipCidrRange": "10.2.0.0/20" },
            ])
        );

        let router = &engine.declarations_of("gcp:compute/router:Router")[0];
        assert_eq!(router.properties["bgp"]["asn"], json!(64514));

        let nat = &engine.declarations_of("gcp:compute/routerNat:RouterNat")[0];
        assert_eq!(nat.properties["name"], json!("shared-dev-nat-router"));
        assert_eq!(nat.properties["router"], json!("shared-dev-cloud-nat-router"));
        assert_eq!(nat.properties["region"], json!("us-central1"));
        assert_eq!(nat.properties["natIpAllocateOption"], json!("AUTO_ONLY"));
        assert_eq!(
            nat.properties["sourceSubnetworkIpRangesToNat"],
            json!("ALL_SUBNETWORKS_ALL_IP_RANGES")
        );
        assert_eq!(
            nat.properties["logConfig"],
            json!({ "enable": true, "filter": "ERRORS_ONLY" })
        );

        // No service project unless the capability flag is set
        assert!(
            engine
                .declarations_of("gcp:compute/sharedVPCServiceProject:SharedVPCServiceProject")
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_networking_exports() {
        let engine = Arc::new(MemoryEngine::new("host-project"));
        let ctx = context(&engine);

        compose_network(&ctx, &settings()).await.unwrap();
        let summary = ctx.finish().await.unwrap();

        for key in [
            "network",
            "networkName",
            "subnet",
            "subnetName",
            "primaryIpCidrRange",
            "secPodRangeName",
            "secSvcRangeName",
            "HostProject",
            "router",
            "nat",
        ] {
            assert!(summary.outputs.contains_key(key), "missing export {}", key);
        }
        assert_eq!(summary.outputs["networkName"], json!("shared-dev-network"));
        assert_eq!(summary.outputs["router"], json!("shared-dev-cloud-nat-router"));
        assert!(!summary.outputs.contains_key("ServiceProject"));
        assert_eq!(summary.plan.summary().create, 5);
    }

    #[tokio::test]
    async fn test_service_project_attachment_flag() {
        let engine = Arc::new(MemoryEngine::new("host-project"));
        let ctx = context(&engine);
        let settings = NetworkSettings {
            attach_service_project: true,
            ..settings()
        };

        let shared = shared_vpc(&ctx, &settings).await.unwrap();
        assert!(shared.service.is_some());

        let attachments = engine
            .declarations_of("gcp:compute/sharedVPCServiceProject:SharedVPCServiceProject");
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].properties["hostProject"], json!("host-project"));
        assert_eq!(
            attachments[0].properties["serviceProject"],
            json!("service-project")
        );
        assert!(ctx.export_keys().contains(&"ServiceProject".to_string()));
    }

    #[tokio::test]
    async fn test_failure_aborts_remaining_steps() {
        let engine = Arc::new(MemoryEngine::new("host-project"));
        engine.fail_on("gcp:compute/subnetwork:Subnetwork");
        let ctx = context(&engine);

        let err = compose_network(&ctx, &settings()).await.unwrap_err();
        assert!(err.to_string().starts_with("failed to create subnetwork:"));
        assert!(matches!(
            err,
            ComposeError::Stage {
                stage: "subnetwork",
                error: EngineError::Declaration { .. },
            }
        ));

        // Nothing after the failing step was declared
        let types: Vec<String> = engine
            .declarations()
            .into_iter()
            .map(|(_, d)| d.resource_type)
            .collect();
        assert_eq!(
            types,
            vec![
                "gcp:compute/network:Network".to_string(),
                "gcp:compute/subnetwork:Subnetwork".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_unresolved_network_id_is_not_declared() {
        let engine = Arc::new(MemoryEngine::new("host-project"));
        let ctx = context(&engine);

        let err = create_subnetwork(&ctx, &settings(), &Output::ready(String::new()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("network id"));
        assert!(engine.declarations().is_empty());
    }

    #[tokio::test]
    async fn test_rerun_declares_same_resources() {
        let engine = Arc::new(MemoryEngine::new("host-project"));

        let first = context(&engine);
        compose_network(&first, &settings()).await.unwrap();
        let first = first.finish().await.unwrap();

        let second = context(&engine);
        compose_network(&second, &settings()).await.unwrap();
        let second = second.finish().await.unwrap();

        assert!(!second.plan.has_changes);
        assert_eq!(first.outputs, second.outputs);
        assert!(
            second
                .plan
                .actions
                .iter()
                .all(|a| a.action_type == ActionType::NoOp)
        );
    }
}
