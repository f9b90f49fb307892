//! Cloud provider catalog data source.
//!
//! The data source lists the cloud providers known to the management API,
//! optionally filtered by a search expression and sorted. `item` is only
//! set when the query matches exactly one provider.
//!
//! Besides the checked-in manifest directory, a self-contained manifest can
//! be rendered into any workspace with [`prepare_workspace`], e.g. to point
//! the provider at a local API with its own CA.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tf_harness::{HarnessConfig, ManifestWorkspace, Outputs, ResourceKind, ResourceService};

use crate::constants::CLOUD_PROVIDERS_DIR;
use crate::Result;

/// Data source type name in state.
pub const DATA_SOURCE_TYPE: &str = "rhcs_cloud_providers";

/// Data source name used by the rendered manifest.
pub const DATA_SOURCE_NAME: &str = "catalog";

const MAIN_TF: &str = r#"terraform {
  required_providers {
    rhcs = {
      source = "terraform-redhat/rhcs"
    }
  }
}

variable "url" {
  type = string
}

variable "token" {
  type      = string
  sensitive = true
}

variable "search" {
  type    = string
  default = null
}

variable "order" {
  type    = string
  default = null
}

provider "rhcs" {
  url   = var.url
  token = var.token
{{ .TrustedCas }}}

data "rhcs_cloud_providers" "{{ .Name }}" {
  search = var.search
  order  = var.order
}

output "search" {
  value = data.rhcs_cloud_providers.{{ .Name }}.search
}

output "order" {
  value = data.rhcs_cloud_providers.{{ .Name }}.order
}

output "items" {
  value = data.rhcs_cloud_providers.{{ .Name }}.items
}

output "item" {
  value = data.rhcs_cloud_providers.{{ .Name }}.item
}
"#;

/// Catalog query. `url` and `token` configure the provider block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudProvidersArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
}

impl CloudProvidersArgs {
    pub fn filtered(search: &str, order: &str) -> Self {
        Self {
            search: Some(search.to_string()),
            order: Some(order.to_string()),
            ..Default::default()
        }
    }
}

/// One catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudProvider {
    pub id: String,
    pub name: String,
    pub display_name: String,
}

impl CloudProvider {
    pub fn new(id: &str, display_name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            display_name: display_name.to_string(),
        }
    }
}

/// Data source attributes after apply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CloudProvidersOutput {
    pub search: String,
    pub order: String,
    pub items: Vec<CloudProvider>,
    pub item: Option<CloudProvider>,
}

impl CloudProvidersOutput {
    /// Read the attributes of a data source from `terraform show -json`.
    pub fn from_state_values(values: &Value) -> Self {
        Self::from_attributes(
            values.get("search"),
            values.get("order"),
            values.get("items"),
            values.get("item"),
        )
    }

    fn from_attributes(
        search: Option<&Value>,
        order: Option<&Value>,
        items: Option<&Value>,
        item: Option<&Value>,
    ) -> Self {
        let text = |v: Option<&Value>| v.and_then(Value::as_str).unwrap_or_default().to_string();
        CloudProvidersOutput {
            search: text(search),
            order: text(order),
            items: items
                .cloned()
                .and_then(|v| serde_json::from_value(v).ok())
                .unwrap_or_default(),
            item: item
                .filter(|v| !v.is_null())
                .cloned()
                .and_then(|v| serde_json::from_value(v).ok()),
        }
    }

    pub fn ids(&self) -> Vec<&str> {
        self.items.iter().map(|p| p.id.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CloudProvidersKind;

impl ResourceKind for CloudProvidersKind {
    type Args = CloudProvidersArgs;
    type Output = CloudProvidersOutput;

    fn name(&self) -> &str {
        "cloud-providers"
    }

    fn default_manifest_dir(&self, config: &HarnessConfig) -> PathBuf {
        config.manifest_dir(CLOUD_PROVIDERS_DIR)
    }

    fn stamp_endpoint(&self, args: &mut CloudProvidersArgs, endpoint: &str) {
        args.url = Some(endpoint.to_string());
    }

    fn project(&self, outputs: &Outputs) -> CloudProvidersOutput {
        CloudProvidersOutput::from_attributes(
            outputs.value("search"),
            outputs.value("order"),
            outputs.value("items"),
            outputs.value("item"),
        )
    }
}

pub type CloudProvidersService = ResourceService<CloudProvidersKind>;

/// Render the catalog manifest into `workspace` as `main.tf`.
///
/// `trusted_ca` is a PEM file path for a gateway with a private CA.
pub fn prepare_workspace(
    workspace: &ManifestWorkspace,
    trusted_ca: Option<&str>,
) -> Result<PathBuf> {
    let trusted_cas = match trusted_ca {
        // Terraform's file() wants forward slashes on every platform.
        Some(path) => format!("  trusted_cas = file(\"{}\")\n", path.replace('\\', "/")),
        None => String::new(),
    };
    let path = workspace.render(
        "main.tf",
        MAIN_TF,
        &[("TrustedCas", &trusted_cas), ("Name", DATA_SOURCE_NAME)],
    )?;
    Ok(path)
}
