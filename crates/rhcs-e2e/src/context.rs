//! Scenario context: one configuration and one terraform runner shared by
//! every resource service a scenario builds.

use std::path::PathBuf;

use tf_harness::{ExecContext, HarnessConfig, Lifecycle, ResourceKind, ResourceService, Terraform};

use crate::cloud_providers::CloudProvidersKind;
use crate::cluster::ClusterKind;
use crate::cms::ManagementClient;
use crate::error::E2eError;
use crate::idp::{IdpKind, IdpType};
use crate::machine_pool::MachinePoolKind;
use crate::openshift::{OcCli, OcLogin};
use crate::{CloudProvidersService, ClusterService, IdpService, MachinePoolService, Result};

#[derive(Debug, Clone)]
pub struct E2eContext {
    config: HarnessConfig,
    terraform: Terraform,
    exec: ExecContext,
}

impl E2eContext {
    pub fn new(config: HarnessConfig, terraform: Terraform) -> Self {
        let exec = ExecContext::from_config(&config);
        Self {
            config,
            terraform,
            exec,
        }
    }

    /// Context for the real terraform binary, configured from the environment.
    pub fn from_env() -> Result<Self> {
        let config = HarnessConfig::from_env()?;
        let terraform = Terraform::from_config(&config);
        Ok(Self::new(config, terraform))
    }

    /// Execution context handed to every service (timeout, cancellation).
    pub fn with_exec_context(mut self, exec: ExecContext) -> Self {
        self.exec = exec;
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn terraform(&self) -> &Terraform {
        &self.terraform
    }

    pub fn exec_context(&self) -> &ExecContext {
        &self.exec
    }

    /// Existing cluster for day-2 scenarios.
    pub fn cluster_id(&self) -> Option<&str> {
        self.config.cluster_id.as_deref()
    }

    /// Token for the gateway, empty when not configured.
    pub fn token(&self) -> &str {
        self.config.token.as_deref().unwrap_or_default()
    }

    pub fn cms(&self) -> Result<ManagementClient> {
        ManagementClient::from_config(&self.config)
    }

    pub fn oc(&self) -> OcCli {
        OcCli::from_config(&self.config)
    }

    /// Log in to `cluster_id` as an identity provider user.
    ///
    /// The server URL comes from the management API; the kubeconfig goes to
    /// the configured kubeconfig directory.
    pub async fn login(&self, cluster_id: &str, username: &str, password: &str) -> Result<String> {
        let resp = self.cms()?.retrieve_cluster(cluster_id).await?;
        let server = match resp.body {
            Some(cluster) if resp.status.is_success() => cluster.api.url,
            _ => {
                return Err(E2eError::Login {
                    server: String::new(),
                    username: username.to_string(),
                    reason: format!(
                        "cluster {} lookup returned {}: {}",
                        cluster_id,
                        resp.status.as_u16(),
                        resp.error_body
                    ),
                })
            }
        };

        let mut login = OcLogin::new(&server, username, password, cluster_id);
        if let Some(dir) = &self.config.kubeconfig_dir {
            login = login.with_kubeconfig_dir(dir);
        }
        self.oc().login(&login, &self.exec).await
    }

    fn service<K: ResourceKind>(&self, kind: K) -> ResourceService<K> {
        ResourceService::new(kind, self.terraform.clone(), self.config.clone())
            .with_context(self.exec.clone())
    }

    pub async fn machine_pool_service(&self, dir: Option<PathBuf>) -> Result<MachinePoolService> {
        self.started(MachinePoolKind, dir).await
    }

    pub async fn cluster_service(&self, dir: Option<PathBuf>) -> Result<ClusterService> {
        self.started(ClusterKind, dir).await
    }

    pub async fn idp_service(&self, idp_type: IdpType, dir: Option<PathBuf>) -> Result<IdpService> {
        self.started(IdpKind::new(idp_type), dir).await
    }

    pub async fn cloud_providers_service(
        &self,
        dir: Option<PathBuf>,
    ) -> Result<CloudProvidersService> {
        self.started(CloudProvidersKind, dir).await
    }

    async fn started<K: ResourceKind>(
        &self,
        kind: K,
        dir: Option<PathBuf>,
    ) -> Result<ResourceService<K>> {
        let mut service = self.service(kind);
        service.init(dir).await?;
        Ok(service)
    }
}
