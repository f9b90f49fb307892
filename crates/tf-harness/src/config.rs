//! Harness configuration
//!
//! Everything environment-specific lives here so that argument fixtures in
//! scenarios stay the same across staging, integration and production.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::TfError;
use crate::Result;

/// Gateway used when `RHCS_URL` is not set.
pub const DEFAULT_GATEWAY_URL: &str = "https://api.openshift.com";

/// Default per-invocation time limit for terraform, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 3600;

/// Harness configuration
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    /// Management API gateway, stamped into every resource's arguments
    pub gateway_url: String,
    /// Offline token for the gateway (optional, manifests may read it from env)
    pub token: Option<String>,
    /// Root directory holding the per-resource manifest directories
    pub manifests_dir: PathBuf,
    /// terraform executable
    pub terraform_binary: PathBuf,
    /// Time limit per terraform invocation (`None` = unbounded)
    pub timeout: Option<Duration>,
    /// Existing cluster targeted by day-2 scenarios
    pub cluster_id: Option<String>,
    /// oc executable for login checks
    pub oc_binary: PathBuf,
    /// Where login checks write their per-user kubeconfig files
    pub kubeconfig_dir: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            token: None,
            manifests_dir: PathBuf::from("tests/tf-manifests"),
            terraform_binary: PathBuf::from("terraform"),
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            cluster_id: None,
            oc_binary: PathBuf::from("oc"),
            kubeconfig_dir: None,
        }
    }
}

impl HarnessConfig {
    /// Read configuration from environment variables:
    ///
    /// - `RHCS_URL` - gateway URL
    /// - `RHCS_TOKEN` - gateway token
    /// - `RHCS_MANIFESTS_DIR` - manifests root
    /// - `TF_BINARY` - terraform executable
    /// - `TF_TIMEOUT_SECS` - per-invocation limit, `0` disables it
    /// - `RHCS_CLUSTER_ID` - existing cluster for day-2 scenarios
    /// - `OC_BINARY` - oc executable
    /// - `RHCS_KUBECONFIG_DIR` - kubeconfig directory for login checks
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = HarnessConfig::default();

        if let Some(url) = get("RHCS_URL") {
            config.gateway_url = url;
        }
        config.token = get("RHCS_TOKEN");
        if let Some(dir) = get("RHCS_MANIFESTS_DIR") {
            config.manifests_dir = PathBuf::from(dir);
        }
        if let Some(bin) = get("TF_BINARY") {
            config.terraform_binary = PathBuf::from(bin);
        }
        if let Some(raw) = get("TF_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                TfError::Config(format!("TF_TIMEOUT_SECS must be whole seconds, got {:?}", raw))
            })?;
            config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        config.cluster_id = get("RHCS_CLUSTER_ID");
        if let Some(bin) = get("OC_BINARY") {
            config.oc_binary = PathBuf::from(bin);
        }
        config.kubeconfig_dir = get("RHCS_KUBECONFIG_DIR").map(PathBuf::from);

        Ok(config)
    }

    pub fn with_gateway_url(mut self, url: &str) -> Self {
        self.gateway_url = url.to_string();
        self
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn with_manifests_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.manifests_dir = dir.into();
        self
    }

    pub fn with_terraform_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.terraform_binary = binary.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cluster_id(mut self, cluster_id: &str) -> Self {
        self.cluster_id = Some(cluster_id.to_string());
        self
    }

    pub fn with_oc_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.oc_binary = binary.into();
        self
    }

    pub fn with_kubeconfig_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.kubeconfig_dir = Some(dir.into());
        self
    }

    /// Manifest directory `relative` under the manifests root.
    pub fn manifest_dir(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.manifests_dir.join(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_env_empty() {
        let config = HarnessConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, HarnessConfig::default());
        assert_eq!(config.gateway_url, DEFAULT_GATEWAY_URL);
        assert_eq!(config.timeout, Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_reads_all_variables() {
        let config = HarnessConfig::from_lookup(lookup(&[
            ("RHCS_URL", "https://api.stage.openshift.com"),
            ("RHCS_TOKEN", "tok"),
            ("RHCS_MANIFESTS_DIR", "/manifests"),
            ("TF_BINARY", "/usr/local/bin/terraform"),
            ("TF_TIMEOUT_SECS", "120"),
            ("RHCS_CLUSTER_ID", "2abc"),
            ("OC_BINARY", "/usr/bin/oc"),
            ("RHCS_KUBECONFIG_DIR", "/tmp/kube"),
        ]))
        .unwrap();

        assert_eq!(config.gateway_url, "https://api.stage.openshift.com");
        assert_eq!(config.token.as_deref(), Some("tok"));
        assert_eq!(
            config.manifest_dir("rhcs/idps/ldap"),
            PathBuf::from("/manifests/rhcs/idps/ldap")
        );
        assert_eq!(config.terraform_binary, PathBuf::from("/usr/local/bin/terraform"));
        assert_eq!(config.timeout, Some(Duration::from_secs(120)));
        assert_eq!(config.cluster_id.as_deref(), Some("2abc"));
        assert_eq!(config.oc_binary, PathBuf::from("/usr/bin/oc"));
        assert_eq!(config.kubeconfig_dir, Some(PathBuf::from("/tmp/kube")));
    }

    #[test]
    fn test_zero_timeout_disables_limit() {
        let config = HarnessConfig::from_lookup(lookup(&[("TF_TIMEOUT_SECS", "0")])).unwrap();
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_invalid_timeout_is_config_error() {
        let err = HarnessConfig::from_lookup(lookup(&[("TF_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, TfError::Config(_)));
        assert!(err.to_string().contains("TF_TIMEOUT_SECS"));
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let config = HarnessConfig::from_lookup(lookup(&[("RHCS_URL", "  "), ("RHCS_TOKEN", "")]))
            .unwrap();
        assert_eq!(config.gateway_url, DEFAULT_GATEWAY_URL);
        assert!(config.token.is_none());
    }
}
