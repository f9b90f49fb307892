//! Fixed values shared by scenarios: manifest locations and third-party
//! endpoints used by the identity provider fixtures.

/// ROSA classic cluster manifests.
pub const CLUSTER_DIR: &str = "rosa-classic";

/// Machine pool manifests.
pub const MACHINE_POOL_DIR: &str = "machine-pools";

/// Cloud provider catalog data source manifests.
pub const CLOUD_PROVIDERS_DIR: &str = "cloud-providers";

/// Identity provider manifests, one directory per provider type.
pub const IDPS_DIR: &str = "idps";

/// Public test LDAP server.
pub const LDAP_URL: &str = "ldap://ldap.forumsys.com/dc=example,dc=com?uid";

pub const GITLAB_URL: &str = "https://gitlab.com";

/// Hosted domain for the Google IDP fixture.
pub const HOSTED_DOMAIN: &str = "redhat.com";

/// GitHub organizations allowed by the GitHub IDP fixture.
pub const ORGANIZATIONS: &[&str] = &["openshift"];

/// Management API path prefix.
pub const CLUSTERS_MGMT_PREFIX: &str = "/api/clusters_mgmt/v1";
