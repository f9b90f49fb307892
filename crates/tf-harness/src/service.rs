//! Generic resource lifecycle: init, create, output, destroy.
//!
//! One [`ResourceService`] drives one manifest directory for one resource
//! kind. Kinds differ only in their argument and output record shapes and in
//! where their outputs live; those differences are supplied by a
//! [`ResourceKind`] value held by the service.
//!
//! ```text
//! Uninitialized --init--> Initialized --create--> Created
//!                                          ^         |
//!                                          |      destroy
//!                                        create      v
//!                                          +---- Destroyed
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::args::combine_args;
use crate::config::HarnessConfig;
use crate::error::TfError;
use crate::outputs::Outputs;
use crate::runner::{ExecContext, Terraform};
use crate::Result;

/// What varies between resource kinds.
pub trait ResourceKind: Send + Sync {
    /// Argument record passed to apply/destroy as `-var` flags.
    type Args: Serialize + Clone + Send + Sync;

    /// Typed projection of the kind's Terraform outputs.
    type Output: Send + 'static;

    /// Short name for logs.
    fn name(&self) -> &str;

    /// Manifest directory used when `init` is not given one.
    fn default_manifest_dir(&self, config: &HarnessConfig) -> PathBuf;

    /// Write the environment's gateway endpoint into `args`.
    fn stamp_endpoint(&self, args: &mut Self::Args, endpoint: &str);

    /// Project raw outputs into the typed output record.
    fn project(&self, outputs: &Outputs) -> Self::Output;
}

/// Position in the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initialized,
    Created,
    Destroyed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Initialized => "initialized",
            LifecycleState::Created => "created",
            LifecycleState::Destroyed => "destroyed",
        };
        f.write_str(s)
    }
}

/// Init/Create/Output/Destroy over one resource.
#[async_trait]
pub trait Lifecycle: Send {
    type Args: Send;
    type Output: Send;

    /// Initialise the manifest directory (the kind's default when `None`).
    async fn init(&mut self, manifest_dir: Option<PathBuf>) -> Result<()>;

    /// Apply with `args`; `extra` flags are passed through after the variables.
    async fn create(&mut self, args: Self::Args, extra: &[String]) -> Result<()>;

    /// Read back the typed outputs.
    async fn output(&mut self) -> Result<Self::Output>;

    /// Destroy using `args`, or the arguments of the last create when `None`.
    async fn destroy(&mut self, args: Option<Self::Args>) -> Result<()>;
}

/// The lifecycle of one resource kind bound to one manifest directory.
pub struct ResourceService<K: ResourceKind> {
    kind: K,
    terraform: Terraform,
    config: HarnessConfig,
    ctx: ExecContext,
    manifest_dir: Option<PathBuf>,
    state: LifecycleState,
    applied: bool,
    creation_args: Option<K::Args>,
}

impl<K: ResourceKind> fmt::Debug for ResourceService<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceService")
            .field("kind", &self.kind.name())
            .field("manifest_dir", &self.manifest_dir)
            .field("state", &self.state)
            .field("applied", &self.applied)
            .finish_non_exhaustive()
    }
}

impl<K: ResourceKind> ResourceService<K> {
    /// Uninitialised service; call [`Lifecycle::init`] before anything else.
    pub fn new(kind: K, terraform: Terraform, config: HarnessConfig) -> Self {
        let ctx = ExecContext::from_config(&config);
        Self {
            kind,
            terraform,
            config,
            ctx,
            manifest_dir: None,
            state: LifecycleState::Uninitialized,
            applied: false,
            creation_args: None,
        }
    }

    /// Build and initialise in one step.
    pub async fn start(
        kind: K,
        terraform: Terraform,
        config: HarnessConfig,
        manifest_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let mut service = Self::new(kind, terraform, config);
        service.init(manifest_dir).await?;
        Ok(service)
    }

    /// Replace the execution context (timeout, cancellation token).
    pub fn with_context(mut self, ctx: ExecContext) -> Self {
        self.ctx = ctx;
        self
    }

    pub fn kind(&self) -> &K {
        &self.kind
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn manifest_dir(&self) -> Option<&Path> {
        self.manifest_dir.as_deref()
    }

    /// Arguments remembered from the last create, endpoint included.
    pub fn creation_args(&self) -> Option<&K::Args> {
        self.creation_args.as_ref()
    }

    /// Like `create`, with variable files merged in after the variables.
    pub async fn create_with_var_files<P: AsRef<Path> + Sync>(
        &mut self,
        args: K::Args,
        var_files: &[P],
    ) -> Result<()> {
        let dir = self.prepare_create(args)?;
        let vars = self.remembered_vars(&[])?;
        let applied = self
            .terraform
            .apply_with_var_files(&dir, &vars, var_files, &self.ctx)
            .await;
        self.finish_create(applied.map(|_| ()))
    }

    fn initialized_dir(&self, step: &str) -> Result<PathBuf> {
        match (&self.state, &self.manifest_dir) {
            (LifecycleState::Uninitialized, _) | (_, None) => Err(TfError::ContractViolation(
                format!("{} {} called before a successful init", self.kind.name(), step),
            )),
            (_, Some(dir)) => Ok(dir.clone()),
        }
    }

    /// Stamp, remember and return the workspace for a create.
    fn prepare_create(&mut self, mut args: K::Args) -> Result<PathBuf> {
        let dir = self.initialized_dir("create")?;
        self.kind.stamp_endpoint(&mut args, &self.config.gateway_url);
        self.creation_args = Some(args);
        info!(kind = self.kind.name(), dir = %dir.display(), "creating resource");
        Ok(dir)
    }

    fn remembered_vars(&self, extra: &[String]) -> Result<Vec<String>> {
        let args = self.creation_args.as_ref().ok_or_else(|| {
            TfError::ContractViolation("no remembered creation arguments".to_string())
        })?;
        combine_args(args, extra)
    }

    /// Record the outcome of an apply.
    ///
    /// A failed apply over a created resource drops back to `Initialized`
    /// and forgets the earlier apply, so `output` cannot read the state a
    /// failed apply left behind.
    fn finish_create(&mut self, applied: Result<()>) -> Result<()> {
        match applied {
            Ok(()) => {
                self.applied = true;
                self.state = LifecycleState::Created;
                debug!(kind = self.kind.name(), "resource created");
                Ok(())
            }
            Err(err) => {
                if self.state == LifecycleState::Created {
                    self.state = LifecycleState::Initialized;
                    self.applied = false;
                }
                warn!(kind = self.kind.name(), state = %self.state, "create failed");
                Err(err)
            }
        }
    }
}

#[async_trait]
impl<K: ResourceKind> Lifecycle for ResourceService<K> {
    type Args = K::Args;
    type Output = K::Output;

    async fn init(&mut self, manifest_dir: Option<PathBuf>) -> Result<()> {
        let dir = manifest_dir.unwrap_or_else(|| self.kind.default_manifest_dir(&self.config));
        info!(kind = self.kind.name(), dir = %dir.display(), "initialising workspace");

        // A failed init leaves the service unusable until init succeeds.
        self.state = LifecycleState::Uninitialized;
        self.manifest_dir = None;

        self.terraform.init(&dir, &self.ctx).await?;
        self.manifest_dir = Some(dir);
        self.state = LifecycleState::Initialized;
        Ok(())
    }

    async fn create(&mut self, args: K::Args, extra: &[String]) -> Result<()> {
        let dir = self.prepare_create(args)?;
        let vars = self.remembered_vars(extra)?;
        let applied = self.terraform.apply(&dir, &vars, &self.ctx).await;
        self.finish_create(applied.map(|_| ()))
    }

    async fn output(&mut self) -> Result<K::Output> {
        let dir = self.initialized_dir("output")?;
        if !self.applied {
            return Err(TfError::ContractViolation(format!(
                "{} output requested before any successful create",
                self.kind.name()
            )));
        }
        let outputs = self.terraform.output(&dir, &self.ctx).await?;
        debug!(kind = self.kind.name(), names = ?outputs.names(), "read outputs");
        Ok(self.kind.project(&outputs))
    }

    async fn destroy(&mut self, args: Option<K::Args>) -> Result<()> {
        let mut args = match args.or_else(|| self.creation_args.clone()) {
            Some(args) => args,
            None => {
                return Err(TfError::ContractViolation(
                    "got unset destroy args, set it in object or pass as a parameter".to_string(),
                ))
            }
        };
        let dir = self.initialized_dir("destroy")?;
        self.kind.stamp_endpoint(&mut args, &self.config.gateway_url);
        let vars = combine_args(&args, &[])?;

        info!(kind = self.kind.name(), dir = %dir.display(), "destroying resource");
        self.terraform.destroy(&dir, &vars, &self.ctx).await?;
        self.state = LifecycleState::Destroyed;
        Ok(())
    }
}
