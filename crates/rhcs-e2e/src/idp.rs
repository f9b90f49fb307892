//! Identity provider resource kinds.
//!
//! All provider types share one argument record; each type has its own
//! manifest directory declaring only the variables it uses. The provider's
//! own `url` (LDAP server, GitLab instance) is a regular argument, so the
//! gateway endpoint is passed separately as `gateway_url`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tf_harness::{HarnessConfig, Outputs, ResourceKind, ResourceService};

use crate::constants::IDPS_DIR;

/// Identity provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdpType {
    Htpasswd,
    Github,
    Gitlab,
    Google,
    Ldap,
    Openid,
}

impl IdpType {
    pub const ALL: [IdpType; 6] = [
        IdpType::Htpasswd,
        IdpType::Github,
        IdpType::Gitlab,
        IdpType::Google,
        IdpType::Ldap,
        IdpType::Openid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IdpType::Htpasswd => "htpasswd",
            IdpType::Github => "github",
            IdpType::Gitlab => "gitlab",
            IdpType::Google => "google",
            IdpType::Ldap => "ldap",
            IdpType::Openid => "openid",
        }
    }

    /// Manifest directory relative to the manifests root.
    pub fn manifest_subdir(&self) -> PathBuf {
        PathBuf::from(IDPS_DIR).join(self.as_str())
    }
}

impl fmt::Display for IdpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdpType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IdpType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown identity provider type: {}", s))
    }
}

/// One htpasswd user entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtpasswdUser {
    pub username: String,
    pub password: String,
}

impl HtpasswdUser {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

/// Identity provider arguments, the union of every provider type's variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdpArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub htpasswd_users: Option<Vec<HtpasswdUser>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<BTreeMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizations: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hosted_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
}

impl IdpArgs {
    /// Arguments common to every provider type.
    pub fn for_cluster(token: &str, cluster_id: &str, name: &str) -> Self {
        Self {
            token: Some(token.to_string()),
            cluster_id: Some(cluster_id.to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        }
    }
}

/// Identity provider outputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdpOutput {
    pub id: String,
}

#[derive(Debug, Clone, Copy)]
pub struct IdpKind {
    idp_type: IdpType,
}

impl IdpKind {
    pub fn new(idp_type: IdpType) -> Self {
        Self { idp_type }
    }

    pub fn idp_type(&self) -> IdpType {
        self.idp_type
    }
}

impl ResourceKind for IdpKind {
    type Args = IdpArgs;
    type Output = IdpOutput;

    fn name(&self) -> &str {
        self.idp_type.as_str()
    }

    fn default_manifest_dir(&self, config: &HarnessConfig) -> PathBuf {
        config.manifest_dir(self.idp_type.manifest_subdir())
    }

    fn stamp_endpoint(&self, args: &mut IdpArgs, endpoint: &str) {
        args.gateway_url = Some(endpoint.to_string());
    }

    fn project(&self, outputs: &Outputs) -> IdpOutput {
        IdpOutput {
            id: outputs.string(&["idp_id", "value"]),
        }
    }
}

pub type IdpService = ResourceService<IdpKind>;
