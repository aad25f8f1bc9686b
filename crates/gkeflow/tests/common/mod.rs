use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const NETWORKING_YAML: &str = r#"config:
  gcp-platform:env: dev
  gcp-platform:region: us-central1
  gcp-platform:hostProject: host-project
  gcp-platform:serviceProject: svc-project
  gcp-platform:primaryIpCidrRange: 10.0.0.0/20
  gcp-platform:secondaryPodIpCidrRange: 10.4.0.0/14
  gcp-platform:secondarySvcIpCidrRange: 10.8.0.0/20
"#;

pub const CLUSTER_YAML: &str = r#"config:
  gcp-platform:env: dev
  gcp-platform:app: svc
  gcp-platform:location: us-central1
  gcp-platform:nodeCount: 1
  gcp-platform:machineType: e2-medium
  gcp-platform:serviceAccountId: gke-nodes
  gcp-platform:serviceAccountDisplayName: GKE nodes
  gcp-platform:networkingStackName: networking-dev
"#;

/// A throwaway project directory with stack files and a state directory
pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    pub fn write_stack(&self, stack: &str, content: &str) {
        let path = self.root.path().join(format!("gkeflow.{}.yaml", stack));
        fs::write(path, content).unwrap();
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.path().join("state")
    }

    pub fn state_file(&self, stack: &str) -> PathBuf {
        self.state_dir().join("stacks").join(format!("{}.json", stack))
    }
}
