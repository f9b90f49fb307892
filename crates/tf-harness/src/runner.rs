//! Terraform process execution.
//!
//! [`CommandExecutor`] runs one Terraform subcommand in a workspace and
//! reports what happened. [`Terraform`] sits on top of it and turns exit
//! codes into the step-specific errors callers match on.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::args::{encode_var_files, redact};
use crate::config::HarnessConfig;
use crate::error::TfError;
use crate::outputs::{Outputs, State};
use crate::Result;

/// Terraform subcommands the harness drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subcommand {
    Init,
    Apply,
    Destroy,
    Output,
    Show,
}

impl Subcommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subcommand::Init => "init",
            Subcommand::Apply => "apply",
            Subcommand::Destroy => "destroy",
            Subcommand::Output => "output",
            Subcommand::Show => "show",
        }
    }
}

impl fmt::Display for Subcommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One Terraform invocation: subcommand, working directory and arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub subcommand: Subcommand,
    pub workspace: PathBuf,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(subcommand: Subcommand, workspace: &Path, args: Vec<String>) -> Self {
        Self {
            subcommand,
            workspace: workspace.to_path_buf(),
            args,
        }
    }
}

/// Scheduling context for an invocation: optional time limit plus a
/// cancellation token. Both apply to the whole process, not its sub-steps.
#[derive(Debug, Clone, Default)]
pub struct ExecContext {
    pub timeout: Option<Duration>,
    pub cancel: CancellationToken,
}

impl ExecContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context using the configured per-invocation time limit.
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self {
            timeout: config.timeout,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }
}

/// Result of a completed Terraform process.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutput {
    pub subcommand: Subcommand,

    /// Exit code (-1 when killed by a signal).
    pub exit_code: i32,

    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl ProcessOutput {
    /// Build a successful result with the given stdout.
    pub fn ok(subcommand: Subcommand, stdout: impl Into<String>) -> Self {
        Self {
            subcommand,
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
            duration_ms: 0,
        }
    }

    /// Build a failed result with the given stderr.
    pub fn failed(subcommand: Subcommand, exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            subcommand,
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
            duration_ms: 0,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// stdout followed by stderr, the diagnostic payload of a failure.
    ///
    /// Both streams are kept as written; a newline is inserted between them
    /// only when stdout does not already end with one.
    pub fn combined(&self) -> String {
        match (self.stdout.as_str(), self.stderr.as_str()) {
            ("", err) => err.to_string(),
            (out, "") => out.to_string(),
            (out, err) if out.ends_with('\n') => format!("{}{}", out, err),
            (out, err) => format!("{}\n{}", out, err),
        }
    }
}

/// Runs Terraform invocations.
///
/// Implementations return `Ok` whenever the process ran to completion,
/// whatever its exit code; `Err` means it could not be run, timed out, or
/// was cancelled.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, invocation: &Invocation, ctx: &ExecContext) -> Result<ProcessOutput>;
}

/// Executor backed by the real `terraform` binary.
#[derive(Debug, Clone)]
pub struct TerraformCli {
    binary: PathBuf,
    env: Vec<(String, String)>,
}

impl TerraformCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            env: Vec::new(),
        }
    }

    /// Add an environment variable for every child process.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

#[async_trait]
impl CommandExecutor for TerraformCli {
    async fn execute(&self, invocation: &Invocation, ctx: &ExecContext) -> Result<ProcessOutput> {
        let subcommand = invocation.subcommand;
        let workspace = &invocation.workspace;

        if !workspace.is_dir() {
            return Err(TfError::Execution {
                subcommand,
                workspace: workspace.clone(),
                reason: "workspace is not a directory".to_string(),
            });
        }

        debug!(
            binary = %self.binary.display(),
            %subcommand,
            args = ?redact(&invocation.args),
            "spawning terraform"
        );

        let start = Instant::now();
        let child = Command::new(&self.binary)
            .arg(subcommand.as_str())
            .args(&invocation.args)
            .current_dir(workspace)
            .env("TF_IN_AUTOMATION", "1")
            .env("TF_INPUT", "0")
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TfError::Execution {
                subcommand,
                workspace: workspace.clone(),
                reason: format!("failed to start {}: {}", self.binary.display(), e),
            })?;

        // Dropping the wait future drops the child, which kills it.
        let waited = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => {
                warn!(%subcommand, workspace = %workspace.display(), "terraform cancelled");
                return Err(TfError::Cancelled {
                    subcommand,
                    workspace: workspace.clone(),
                });
            }
            res = within(ctx.timeout, child.wait_with_output()) => res,
        };

        let output = match waited {
            Some(res) => res.map_err(|e| TfError::Execution {
                subcommand,
                workspace: workspace.clone(),
                reason: format!("failed to collect output: {}", e),
            })?,
            None => {
                let limit_secs = ctx.timeout.map(|d| d.as_secs()).unwrap_or_default();
                warn!(
                    %subcommand,
                    workspace = %workspace.display(),
                    limit_secs,
                    "terraform timed out"
                );
                return Err(TfError::Timeout {
                    subcommand,
                    workspace: workspace.clone(),
                    limit_secs,
                });
            }
        };

        let result = ProcessOutput {
            subcommand,
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
        };
        debug!(
            %subcommand,
            exit_code = result.exit_code,
            duration_ms = result.duration_ms,
            "terraform exited"
        );
        Ok(result)
    }
}

async fn within<F: Future>(limit: Option<Duration>, fut: F) -> Option<F::Output> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await.ok(),
        None => Some(fut.await),
    }
}

/// Terraform lifecycle steps over a [`CommandExecutor`].
#[derive(Clone)]
pub struct Terraform {
    executor: Arc<dyn CommandExecutor>,
}

impl fmt::Debug for Terraform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Terraform").finish_non_exhaustive()
    }
}

impl Terraform {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    /// Runner for the configured terraform binary.
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(Arc::new(TerraformCli::new(&config.terraform_binary)))
    }

    /// `terraform init`. Safe to repeat on an initialised workspace.
    pub async fn init(&self, workspace: &Path, ctx: &ExecContext) -> Result<ProcessOutput> {
        let args = vec!["-no-color".to_string(), "-input=false".to_string()];
        let out = self.run(Subcommand::Init, workspace, args, ctx).await?;
        if !out.success() {
            return Err(TfError::Init {
                workspace: workspace.to_path_buf(),
                diagnostics: out.combined(),
            });
        }
        Ok(out)
    }

    /// `terraform apply -auto-approve` with the given variable flags.
    ///
    /// Failures are never retried: a rejected apply is frequently the very
    /// thing a scenario is asserting on.
    pub async fn apply(
        &self,
        workspace: &Path,
        vars: &[String],
        ctx: &ExecContext,
    ) -> Result<ProcessOutput> {
        let args = mutating_args(vars);
        let out = self.run(Subcommand::Apply, workspace, args, ctx).await?;
        if !out.success() {
            return Err(TfError::Apply {
                workspace: workspace.to_path_buf(),
                diagnostics: out.combined(),
            });
        }
        Ok(out)
    }

    /// Apply with variable files merged in after the variable flags.
    pub async fn apply_with_var_files<P: AsRef<Path>>(
        &self,
        workspace: &Path,
        vars: &[String],
        var_files: &[P],
        ctx: &ExecContext,
    ) -> Result<ProcessOutput> {
        let mut all = vars.to_vec();
        all.extend(encode_var_files(var_files));
        self.apply(workspace, &all, ctx).await
    }

    /// `terraform destroy -auto-approve` with the given variable flags.
    pub async fn destroy(
        &self,
        workspace: &Path,
        vars: &[String],
        ctx: &ExecContext,
    ) -> Result<ProcessOutput> {
        let args = mutating_args(vars);
        let out = self.run(Subcommand::Destroy, workspace, args, ctx).await?;
        if !out.success() {
            return Err(TfError::Destroy {
                workspace: workspace.to_path_buf(),
                diagnostics: out.combined(),
            });
        }
        Ok(out)
    }

    /// `terraform output -json`, parsed without flattening.
    pub async fn output(&self, workspace: &Path, ctx: &ExecContext) -> Result<Outputs> {
        let args = vec!["-json".to_string(), "-no-color".to_string()];
        let out = self.run(Subcommand::Output, workspace, args, ctx).await?;
        if !out.success() {
            return Err(TfError::Output {
                subcommand: Subcommand::Output,
                workspace: workspace.to_path_buf(),
                diagnostics: out.combined(),
            });
        }
        Outputs::parse(&out.stdout).map_err(|e| TfError::Output {
            subcommand: Subcommand::Output,
            workspace: workspace.to_path_buf(),
            diagnostics: format!("unparsable output JSON: {}", e),
        })
    }

    /// `terraform show -json`: the applied state document.
    pub async fn show(&self, workspace: &Path, ctx: &ExecContext) -> Result<State> {
        let args = vec!["-json".to_string(), "-no-color".to_string()];
        let out = self.run(Subcommand::Show, workspace, args, ctx).await?;
        if !out.success() {
            return Err(TfError::Output {
                subcommand: Subcommand::Show,
                workspace: workspace.to_path_buf(),
                diagnostics: out.combined(),
            });
        }
        State::parse(&out.stdout).map_err(|e| TfError::Output {
            subcommand: Subcommand::Show,
            workspace: workspace.to_path_buf(),
            diagnostics: format!("unparsable state JSON: {}", e),
        })
    }

    async fn run(
        &self,
        subcommand: Subcommand,
        workspace: &Path,
        args: Vec<String>,
        ctx: &ExecContext,
    ) -> Result<ProcessOutput> {
        info!(%subcommand, workspace = %workspace.display(), "running terraform");
        let invocation = Invocation::new(subcommand, workspace, args);
        let out = self.executor.execute(&invocation, ctx).await?;
        if !out.success() {
            warn!(
                %subcommand,
                workspace = %workspace.display(),
                exit_code = out.exit_code,
                "terraform exited non-zero"
            );
        }
        Ok(out)
    }
}

fn mutating_args(vars: &[String]) -> Vec<String> {
    let mut args = vec![
        "-auto-approve".to_string(),
        "-no-color".to_string(),
        "-input=false".to_string(),
    ];
    args.extend(vars.iter().cloned());
    args
}
