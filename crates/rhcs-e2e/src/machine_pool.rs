//! Machine pool resource kind.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tf_harness::{HarnessConfig, Outputs, ResourceKind, ResourceService};

use crate::constants::MACHINE_POOL_DIR;

/// Machine pool arguments. Unset fields fall back to the manifest defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachinePoolArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    #[serde(rename = "ocm_environment", skip_serializing_if = "Option::is_none")]
    pub ocm_env: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoscaling_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_spot_instances: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_replicas: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_replicas: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_spot_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taints: Option<Vec<BTreeMap<String, String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
    #[serde(rename = "multi_availability_zone", skip_serializing_if = "Option::is_none")]
    pub multi_az: Option<bool>,
}

impl MachinePoolArgs {
    /// Taint entry in the shape the manifest expects.
    pub fn taint(key: &str, value: &str, effect: &str) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("key".to_string(), key.to_string()),
            ("value".to_string(), value.to_string()),
            ("schedule_type".to_string(), effect.to_string()),
        ])
    }
}

/// Machine pool as reported by the manifest outputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MachinePoolOutput {
    #[serde(rename = "machine_pool_id")]
    pub id: String,
    pub name: String,
    pub cluster_id: String,
    pub replicas: i64,
    pub machine_type: String,
    pub autoscaling_enabled: bool,
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MachinePoolKind;

impl ResourceKind for MachinePoolKind {
    type Args = MachinePoolArgs;
    type Output = MachinePoolOutput;

    fn name(&self) -> &str {
        "machine-pool"
    }

    fn default_manifest_dir(&self, config: &HarnessConfig) -> PathBuf {
        config.manifest_dir(MACHINE_POOL_DIR)
    }

    fn stamp_endpoint(&self, args: &mut MachinePoolArgs, endpoint: &str) {
        args.url = Some(endpoint.to_string());
    }

    fn project(&self, outputs: &Outputs) -> MachinePoolOutput {
        MachinePoolOutput {
            id: outputs.string(&["machine_pool_id", "value"]),
            name: outputs.string(&["name", "value"]),
            cluster_id: outputs.string(&["cluster_id", "value"]),
            replicas: outputs.int(&["replicas", "value"]),
            machine_type: outputs.string(&["machine_type", "value"]),
            autoscaling_enabled: outputs.bool(&["autoscaling_enabled", "value"]),
            labels: outputs.string_map(&["labels", "value"]),
        }
    }
}

pub type MachinePoolService = ResourceService<MachinePoolKind>;
