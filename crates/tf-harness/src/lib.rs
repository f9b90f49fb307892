//! tf-harness: Terraform lifecycle harness for acceptance tests
//!
//! Drives Terraform manifests through init/apply/output/destroy as an
//! external process and reads the results back as typed records.
//!
//! ## Pieces
//!
//! - [`args`]: argument records to `-var` flags, unset fields omitted
//! - [`runner`]: process execution with timeout and cancellation
//! - [`dig`]: path lookup over output JSON, absent values read as zero
//! - [`service`]: the generic per-resource lifecycle
//! - [`manifest`]: manifest workspaces and template rendering
//! - [`fakes`]: scripted executor for tests that must not spawn terraform

pub mod args;
pub mod config;
pub mod dig;
pub mod error;
pub mod fakes;
pub mod manifest;
pub mod outputs;
pub mod runner;
pub mod service;
pub mod telemetry;
pub mod value;

pub use args::{combine_args, encode_var_files, encode_vars};
pub use config::HarnessConfig;
pub use error::TfError;
pub use manifest::ManifestWorkspace;
pub use outputs::{Outputs, State};
pub use runner::{
    CommandExecutor, ExecContext, Invocation, ProcessOutput, Subcommand, Terraform, TerraformCli,
};
pub use service::{Lifecycle, LifecycleState, ResourceKind, ResourceService};
pub use telemetry::init_tracing;
pub use value::is_zero;

pub use tokio_util::sync::CancellationToken;

/// Result type for harness operations
pub type Result<T> = std::result::Result<T, TfError>;
