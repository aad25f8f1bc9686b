//! Deterministic resource names

/// Secondary range carrying pod addresses
pub const POD_RANGE_NAME: &str = "sec-pod-range";

/// Secondary range carrying service addresses
pub const SVC_RANGE_NAME: &str = "sec-svc-range";

/// Private ASN of the Cloud NAT router
pub const ROUTER_ASN: u32 = 64514;

pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

pub fn network_name(env: &str) -> String {
    format!("shared-{}-network", env)
}

pub fn subnet_name(env: &str) -> String {
    format!("shared-{}-subnet", env)
}

pub fn router_name(env: &str) -> String {
    format!("shared-{}-cloud-nat-router", env)
}

pub fn nat_name(env: &str) -> String {
    format!("shared-{}-nat-router", env)
}

pub fn cluster_name(app: &str, env: &str) -> String {
    format!("{}-{}-gke", app, env)
}

pub fn node_pool_name(app: &str, env: &str) -> String {
    format!("{}-{}-nodepool", app, env)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_names_follow_env() {
        assert_eq!(network_name("dev"), "shared-dev-network");
        assert_eq!(subnet_name("dev"), "shared-dev-subnet");
        assert_eq!(router_name("dev"), "shared-dev-cloud-nat-router");
        assert_eq!(nat_name("dev"), "shared-dev-nat-router");
    }

    #[test]
    fn test_cluster_names_change_independently() {
        assert_eq!(cluster_name("svc", "prod"), "svc-prod-gke");
        assert_eq!(node_pool_name("svc", "prod"), "svc-prod-nodepool");

        // Changing app or env changes both names, and only through that input
        assert_eq!(cluster_name("api", "prod"), "api-prod-gke");
        assert_eq!(node_pool_name("svc", "stg"), "svc-stg-nodepool");
        assert_ne!(cluster_name("svc", "prod"), cluster_name("svc", "stg"));
        assert_ne!(node_pool_name("svc", "prod"), node_pool_name("api", "prod"));
    }
}
