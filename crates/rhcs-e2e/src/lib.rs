//! rhcs-e2e: RHCS resource kinds and scenario support
//!
//! Each resource kind (cluster, machine pool, identity providers, cloud
//! provider catalog) plugs its argument and output records into the generic
//! [`tf_harness::ResourceService`]. Scenarios live under `tests/` and combine
//! those services with the [`cms::ManagementClient`] to check what Terraform
//! created.

pub mod cloud_providers;
pub mod cluster;
pub mod cms;
pub mod constants;
pub mod context;
pub mod error;
pub mod helper;
pub mod idp;
pub mod machine_pool;
pub mod openshift;

pub use cloud_providers::{
    CloudProvider, CloudProvidersArgs, CloudProvidersKind, CloudProvidersOutput,
    CloudProvidersService,
};
pub use cluster::{ClusterArgs, ClusterKind, ClusterOutput, ClusterService};
pub use cms::{ApiResponse, ManagementClient};
pub use context::E2eContext;
pub use error::E2eError;
pub use helper::rand_string_with_upper;
pub use idp::{HtpasswdUser, IdpArgs, IdpKind, IdpOutput, IdpService, IdpType};
pub use machine_pool::{MachinePoolArgs, MachinePoolKind, MachinePoolOutput, MachinePoolService};
pub use openshift::{OcCli, OcLogin};

/// Result type for rhcs-e2e operations
pub type Result<T> = std::result::Result<T, E2eError>;
