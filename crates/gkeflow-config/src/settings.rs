//! Typed settings for the networking and cluster programs
//!
//! Settings are resolved once per run, before anything is declared, and are
//! read-only afterwards.

use crate::error::{ConfigError, Result};
use crate::source::ConfigSource;
use std::net::Ipv4Addr;

/// Settings of the networking program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSettings {
    pub env: String,
    pub app: String,
    pub region: String,
    pub host_project: String,
    pub service_project: String,
    pub primary_ip_cidr_range: String,
    pub sec_pod_ip_cidr_range: String,
    pub sec_svc_ip_cidr_range: String,
    /// Attach `service_project` to the shared-VPC host
    pub attach_service_project: bool,
}

impl NetworkSettings {
    pub fn resolve(source: &impl ConfigSource) -> Result<Self> {
        let settings = Self {
            env: source.require("env")?,
            app: source.get_or_default("app"),
            region: source.require("region")?,
            host_project: source.require("hostProject")?,
            service_project: source.require("serviceProject")?,
            primary_ip_cidr_range: require_cidr(source, "primaryIpCidrRange")?,
            sec_pod_ip_cidr_range: require_cidr(source, "secondaryPodIpCidrRange")?,
            sec_svc_ip_cidr_range: require_cidr(source, "secondarySvcIpCidrRange")?,
            attach_service_project: source.get_bool("attachServiceProject")?.unwrap_or(false),
        };
        Ok(settings)
    }
}

/// Names a cluster needs from the networking stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkNames {
    pub network_name: String,
    pub subnet_name: String,
    pub pod_range_name: String,
    pub svc_range_name: String,
}

/// Where the cluster program gets its network from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkSource {
    /// Outputs of a separately deployed networking stack
    StackReference(String),
    /// Names given directly in configuration
    Explicit(NetworkNames),
}

const EXPLICIT_NETWORK_KEYS: [&str; 4] =
    ["networkName", "subnetName", "secPodRangeName", "secSvcRangeName"];

impl NetworkSource {
    fn resolve(source: &impl ConfigSource) -> Result<Self> {
        let present: Vec<&str> = EXPLICIT_NETWORK_KEYS
            .iter()
            .copied()
            .filter(|k| source.get(k).is_some_and(|v| !v.trim().is_empty()))
            .collect();

        if let Some(stack) = source.get("networkingStackName").filter(|s| !s.trim().is_empty()) {
            if !present.is_empty() {
                return Err(ConfigError::ConflictingNetworkSource(present.join(", ")));
            }
            return Ok(NetworkSource::StackReference(stack));
        }

        if present.is_empty() {
            return Err(ConfigError::MissingNetworkSource);
        }

        // Partial explicit configuration reports the first missing key
        Ok(NetworkSource::Explicit(NetworkNames {
            network_name: source.require("networkName")?,
            subnet_name: source.require("subnetName")?,
            pod_range_name: source.require("secPodRangeName")?,
            svc_range_name: source.require("secSvcRangeName")?,
        }))
    }
}

/// Settings of the cluster program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSettings {
    pub env: String,
    pub app: String,
    pub location: String,
    pub node_count: u32,
    pub machine_type: String,
    pub service_account_id: String,
    pub service_account_display_name: String,
    pub network: NetworkSource,
    /// Overprovisioning of pod CIDRs stays on unless explicitly disabled
    pub disable_pod_cidr_overprovision: bool,
}

impl ClusterSettings {
    pub fn resolve(source: &impl ConfigSource) -> Result<Self> {
        let env = source.require("env")?;
        let app = source.require("app")?;
        let location = source.require("location")?;

        let raw_count = source.require_int("nodeCount")?;
        let node_count = u32::try_from(raw_count)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| ConfigError::InvalidValue {
                key: "nodeCount".to_string(),
                value: raw_count.to_string(),
                reason: "must be a positive integer".to_string(),
            })?;

        Ok(Self {
            env,
            app,
            location,
            node_count,
            machine_type: source.require("machineType")?,
            service_account_id: source.require("serviceAccountId")?,
            service_account_display_name: source.require("serviceAccountDisplayName")?,
            network: NetworkSource::resolve(source)?,
            disable_pod_cidr_overprovision: source
                .get_bool("disablePodCidrOverprovision")?
                .unwrap_or(false),
        })
    }
}

fn require_cidr(source: &impl ConfigSource, key: &str) -> Result<String> {
    let value = source.require(key)?;
    validate_cidr(&value).map_err(|reason| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.clone(),
        reason,
    })?;
    Ok(value)
}

/// Check an IPv4 `a.b.c.d/n` block
pub fn validate_cidr(value: &str) -> std::result::Result<(), String> {
    let (addr, prefix) = value
        .split_once('/')
        .ok_or_else(|| "expected <address>/<prefix>".to_string())?;
    addr.parse::<Ipv4Addr>()
        .map_err(|e| format!("bad address: {}", e))?;
    let prefix: u8 = prefix
        .parse()
        .map_err(|e| format!("bad prefix length: {}", e))?;
    if prefix > 32 {
        return Err(format!("prefix length {} exceeds 32", prefix));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn source(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn network_pairs() -> Vec<(&'static str, &'static str)> {
        vec![
            ("env", "dev"),
            ("app", "demo"),
            ("region", "us-central1"),
            ("hostProject", "host-project"),
            ("serviceProject", "service-project"),
            ("primaryIpCidrRange", "10.0.0.0/20"),
            ("secondaryPodIpCidrRange", "10.1.0.0/16"),
            ("secondarySvcIpCidrRange", "10.2.0.0/20"),
        ]
    }

    fn cluster_pairs() -> Vec<(&'static str, &'static str)> {
        vec![
            ("env", "prod"),
            ("app", "svc"),
            ("location", "us-central1-a"),
            ("nodeCount", "3"),
            ("machineType", "n2-standard-4"),
            ("serviceAccountId", "gke-nodes"),
            ("serviceAccountDisplayName", "GKE nodes"),
            ("networkingStackName", "acme/gcp-platform/networking"),
        ]
    }

    #[test]
    fn test_network_settings() {
        let settings = NetworkSettings::resolve(&source(&network_pairs())).unwrap();
        assert_eq!(settings.env, "dev");
        assert_eq!(settings.sec_pod_ip_cidr_range, "10.1.0.0/16");
        assert!(!settings.attach_service_project);
    }

    #[test]
    fn test_network_app_is_optional() {
        let pairs: Vec<_> = network_pairs()
            .into_iter()
            .filter(|(k, _)| *k != "app")
            .collect();
        let settings = NetworkSettings::resolve(&source(&pairs)).unwrap();
        assert_eq!(settings.app, "");
    }

    #[test]
    fn test_network_missing_region() {
        let pairs: Vec<_> = network_pairs()
            .into_iter()
            .filter(|(k, _)| *k != "region")
            .collect();
        let err = NetworkSettings::resolve(&source(&pairs)).unwrap_err();
        assert_eq!(err.to_string(), "missing required configuration key 'region'");
    }

    #[test]
    fn test_network_malformed_cidr() {
        let mut pairs = network_pairs();
        pairs.retain(|(k, _)| *k != "primaryIpCidrRange");
        pairs.push(("primaryIpCidrRange", "10.0.0.0/33"));
        assert!(matches!(
            NetworkSettings::resolve(&source(&pairs)),
            Err(ConfigError::InvalidValue { key, .. }) if key == "primaryIpCidrRange"
        ));
    }

    #[test]
    fn test_cluster_settings_with_stack_reference() {
        let settings = ClusterSettings::resolve(&source(&cluster_pairs())).unwrap();
        assert_eq!(settings.node_count, 3);
        assert_eq!(
            settings.network,
            NetworkSource::StackReference("acme/gcp-platform/networking".to_string())
        );
        assert!(!settings.disable_pod_cidr_overprovision);
    }

    #[test]
    fn test_cluster_settings_with_explicit_network() {
        let mut pairs: Vec<_> = cluster_pairs()
            .into_iter()
            .filter(|(k, _)| *k != "networkingStackName")
            .collect();
        pairs.extend([
            ("networkName", "shared-prod-network"),
            ("subnetName", "shared-prod-subnet"),
            ("secPodRangeName", "sec-pod-range"),
            ("secSvcRangeName", "sec-svc-range"),
        ]);

        let settings = ClusterSettings::resolve(&source(&pairs)).unwrap();
        match settings.network {
            NetworkSource::Explicit(names) => {
                assert_eq!(names.network_name, "shared-prod-network");
                assert_eq!(names.svc_range_name, "sec-svc-range");
            }
            other => panic!("expected explicit network, got {:?}", other),
        }
    }

    #[test]
    fn test_cluster_partial_explicit_network() {
        let mut pairs: Vec<_> = cluster_pairs()
            .into_iter()
            .filter(|(k, _)| *k != "networkingStackName")
            .collect();
        pairs.push(("networkName", "shared-prod-network"));

        assert!(matches!(
            ClusterSettings::resolve(&source(&pairs)),
            Err(ConfigError::MissingKey(k)) if k == "subnetName"
        ));
    }

    #[test]
    fn test_cluster_conflicting_network_sources() {
        let mut pairs = cluster_pairs();
        pairs.push(("subnetName", "shared-prod-subnet"));

        assert!(matches!(
            ClusterSettings::resolve(&source(&pairs)),
            Err(ConfigError::ConflictingNetworkSource(_))
        ));
    }

    #[test]
    fn test_cluster_without_network_source() {
        let pairs: Vec<_> = cluster_pairs()
            .into_iter()
            .filter(|(k, _)| *k != "networkingStackName")
            .collect();

        assert!(matches!(
            ClusterSettings::resolve(&source(&pairs)),
            Err(ConfigError::MissingNetworkSource)
        ));
    }

    #[test]
    fn test_cluster_rejects_zero_nodes() {
        let mut pairs = cluster_pairs();
        pairs.retain(|(k, _)| *k != "nodeCount");
        pairs.push(("nodeCount", "0"));

        assert!(matches!(
            ClusterSettings::resolve(&source(&pairs)),
            Err(ConfigError::InvalidValue { key, .. }) if key == "nodeCount"
        ));
    }

    #[test]
    fn test_every_required_cluster_key() {
        for required in [
            "env",
            "app",
            "location",
            "nodeCount",
            "machineType",
            "serviceAccountId",
            "serviceAccountDisplayName",
        ] {
            let pairs: Vec<_> = cluster_pairs()
                .into_iter()
                .filter(|(k, _)| *k != required)
                .collect();
            match ClusterSettings::resolve(&source(&pairs)) {
                Err(ConfigError::MissingKey(k)) => assert_eq!(k, required),
                other => panic!("{} should be required, got {:?}", required, other),
            }
        }
    }

    #[test]
    fn test_validate_cidr() {
        assert!(validate_cidr("10.0.0.0/20").is_ok());
        assert!(validate_cidr("10.0.0.0").is_err());
        assert!(validate_cidr("10.0.0.300/20").is_err());
        assert!(validate_cidr("10.0.0.0/x").is_err());
    }
}
