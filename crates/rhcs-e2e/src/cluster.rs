//! ROSA classic cluster resource kind.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tf_harness::{HarnessConfig, Outputs, ResourceKind, ResourceService};

use crate::constants::CLUSTER_DIR;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "ocm_environment", skip_serializing_if = "Option::is_none")]
    pub ocm_env: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openshift_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_availability_zones: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_subnet_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compute_machine_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi_az: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_link: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClusterOutput {
    pub cluster_id: String,
    pub cluster_name: String,
    pub openshift_version: String,
    pub api_url: String,
    pub state: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterKind;

impl ResourceKind for ClusterKind {
    type Args = ClusterArgs;
    type Output = ClusterOutput;

    fn name(&self) -> &str {
        "cluster"
    }

    fn default_manifest_dir(&self, config: &HarnessConfig) -> PathBuf {
        config.manifest_dir(CLUSTER_DIR)
    }

    fn stamp_endpoint(&self, args: &mut ClusterArgs, endpoint: &str) {
        args.url = Some(endpoint.to_string());
    }

    fn project(&self, outputs: &Outputs) -> ClusterOutput {
        ClusterOutput {
            cluster_id: outputs.string(&["cluster_id", "value"]),
            cluster_name: outputs.string(&["cluster_name", "value"]),
            openshift_version: outputs.string(&["openshift_version", "value"]),
            api_url: outputs.string(&["api_url", "value"]),
            state: outputs.string(&["state", "value"]),
        }
    }
}

pub type ClusterService = ResourceService<ClusterKind>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tf_harness::encode_vars;

    #[test]
    fn test_zones_encode_as_list_literal() {
        let args = ClusterArgs {
            cluster_name: Some("qe-1".to_string()),
            aws_availability_zones: Some(vec!["us-east-1a".to_string(), "us-east-1b".to_string()]),
            multi_az: Some(false),
            ..Default::default()
        };
        let flags = encode_vars(&args).unwrap();
        assert_eq!(
            flags,
            vec![
                "-var",
                r#"aws_availability_zones=["us-east-1a","us-east-1b"]"#,
                "-var",
                "cluster_name=qe-1",
            ]
        );
    }

    #[test]
    fn test_project() {
        let outputs = Outputs::from_value(json!({
            "cluster_id": {"value": "abc123", "type": "string"},
            "openshift_version": {"value": "4.14.2"}
        }));
        let out = ClusterKind.project(&outputs);
        assert_eq!(out.cluster_id, "abc123");
        assert_eq!(out.openshift_version, "4.14.2");
        assert_eq!(out.api_url, "");
    }
}
