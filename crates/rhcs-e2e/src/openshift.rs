//! `oc login` against a cluster API.
//!
//! A created identity provider is only useful if its users can log in, so
//! IDP scenarios finish by logging in with the provisioned credentials.

use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tf_harness::{ExecContext, HarnessConfig};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::E2eError;
use crate::Result;

/// One `oc login` attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct OcLogin {
    /// Cluster API URL, as reported by the management API.
    pub server: String,
    pub username: String,
    pub password: String,
    pub cluster_id: String,
    /// Directory for the per-user kubeconfig; oc's default file when unset.
    pub kubeconfig_dir: Option<PathBuf>,
    pub insecure_skip_tls_verify: bool,
    /// Passed through after the generated flags.
    pub extra_flags: Vec<String>,
}

impl OcLogin {
    pub fn new(server: &str, username: &str, password: &str, cluster_id: &str) -> Self {
        Self {
            server: server.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            cluster_id: cluster_id.to_string(),
            kubeconfig_dir: None,
            insecure_skip_tls_verify: true,
            extra_flags: Vec::new(),
        }
    }

    pub fn with_kubeconfig_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.kubeconfig_dir = Some(dir.into());
        self
    }

    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.extra_flags.push(flag.into());
        self
    }

    /// `<kubeconfig_dir>/<cluster_id>.<username>`
    pub fn kubeconfig(&self) -> Option<PathBuf> {
        self.kubeconfig_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.{}", self.cluster_id, self.username)))
    }

    /// Arguments after the binary name.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "login".to_string(),
            self.server.clone(),
            format!("--username={}", self.username),
            format!("--password={}", self.password),
        ];
        if self.insecure_skip_tls_verify {
            args.push("--insecure-skip-tls-verify".to_string());
        }
        if let Some(path) = self.kubeconfig() {
            args.push(format!("--kubeconfig={}", path.display()));
        }
        args.extend(self.extra_flags.iter().cloned());
        args
    }

    fn redacted_args(&self) -> Vec<String> {
        self.args()
            .into_iter()
            .map(|arg| {
                if arg.starts_with("--password=") {
                    "--password=***".to_string()
                } else {
                    arg
                }
            })
            .collect()
    }
}

/// Runs `oc` as a child process.
#[derive(Debug, Clone)]
pub struct OcCli {
    binary: PathBuf,
}

impl OcCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(&config.oc_binary)
    }

    /// Log in and return oc's stdout.
    ///
    /// Honours the context's timeout and cancellation; the child is killed
    /// when either fires.
    pub async fn login(&self, login: &OcLogin, ctx: &ExecContext) -> Result<String> {
        let fail = |reason: String| E2eError::Login {
            server: login.server.clone(),
            username: login.username.clone(),
            reason,
        };

        if let Some(dir) = &login.kubeconfig_dir {
            std::fs::create_dir_all(dir)
                .map_err(|e| fail(format!("cannot create {}: {}", dir.display(), e)))?;
        }

        debug!(binary = %self.binary.display(), args = ?login.redacted_args(), "spawning oc");
        let start = Instant::now();
        let child = Command::new(&self.binary)
            .args(login.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| fail(format!("failed to start {}: {}", self.binary.display(), e)))?;

        let waited = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => {
                warn!(server = %login.server, "oc login cancelled");
                return Err(fail("cancelled".to_string()));
            }
            res = within(ctx.timeout, child.wait_with_output()) => res,
        };

        let output = match waited {
            Some(res) => res.map_err(|e| fail(format!("failed to collect output: {}", e)))?,
            None => {
                let limit_secs = ctx.timeout.map(|d| d.as_secs()).unwrap_or_default();
                warn!(server = %login.server, limit_secs, "oc login timed out");
                return Err(fail(format!("timed out after {}s", limit_secs)));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            warn!(
                server = %login.server,
                exit_code = output.status.code().unwrap_or(-1),
                "oc login failed"
            );
            return Err(fail(if stderr.is_empty() { stdout } else { stderr }));
        }

        info!(
            server = %login.server,
            username = %login.username,
            duration_ms = start.elapsed().as_millis() as u64,
            "logged in"
        );
        Ok(stdout)
    }
}

/// `None` when `limit` elapses first.
async fn within<F: Future>(limit: Option<Duration>, fut: F) -> Option<F::Output> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await.ok(),
        None => Some(fut.await),
    }
}
