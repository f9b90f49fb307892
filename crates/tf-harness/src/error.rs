//! Error types for tf-harness
//!
//! The step-specific variants carry Terraform's own diagnostics untouched.
//! Negative scenarios match on substrings of those diagnostics, so the text
//! is included in `Display` as-is.

use std::path::PathBuf;

use thiserror::Error;

use crate::runner::Subcommand;

/// Errors that can occur while driving Terraform
#[derive(Error, Debug)]
pub enum TfError {
    /// The binary could not be started or the workspace is unusable
    #[error("terraform {subcommand} could not run in {workspace:?}: {reason}")]
    Execution {
        subcommand: Subcommand,
        workspace: PathBuf,
        reason: String,
    },

    /// `terraform init` ran and failed
    #[error("terraform init failed in {workspace:?}: {diagnostics}")]
    Init {
        workspace: PathBuf,
        diagnostics: String,
    },

    /// `terraform apply` ran and rejected the input or failed mid-way
    #[error("terraform apply failed in {workspace:?}: {diagnostics}")]
    Apply {
        workspace: PathBuf,
        diagnostics: String,
    },

    /// `terraform destroy` ran and failed
    #[error("terraform destroy failed in {workspace:?}: {diagnostics}")]
    Destroy {
        workspace: PathBuf,
        diagnostics: String,
    },

    /// The state query (`output` / `show`) failed or returned garbage
    #[error("terraform {subcommand} failed in {workspace:?}: {diagnostics}")]
    Output {
        subcommand: Subcommand,
        workspace: PathBuf,
        diagnostics: String,
    },

    /// The invocation exceeded its time limit and was killed
    #[error("terraform {subcommand} timed out after {limit_secs}s in {workspace:?}")]
    Timeout {
        subcommand: Subcommand,
        workspace: PathBuf,
        limit_secs: u64,
    },

    /// The invocation was cancelled by its caller and was killed
    #[error("terraform {subcommand} cancelled in {workspace:?}")]
    Cancelled {
        subcommand: Subcommand,
        workspace: PathBuf,
    },

    /// A lifecycle method was called out of order
    #[error("contract violation: {0}")]
    ContractViolation(String),

    /// Argument record could not be turned into variables
    #[error("cannot encode arguments: {0}")]
    Encode(String),

    /// Invalid harness configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Manifest workspace preparation failed
    #[error("workspace error: {0}")]
    Workspace(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TfError {
    /// Raw Terraform diagnostics, when the tool itself produced the failure.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            TfError::Init { diagnostics, .. }
            | TfError::Apply { diagnostics, .. }
            | TfError::Destroy { diagnostics, .. }
            | TfError::Output { diagnostics, .. } => Some(diagnostics),
            _ => None,
        }
    }

    /// Whether the tool ran to completion and reported the failure itself,
    /// as opposed to never running.
    pub fn is_tool_failure(&self) -> bool {
        self.diagnostics().is_some()
    }
}

impl From<serde_json::Error> for TfError {
    fn from(err: serde_json::Error) -> Self {
        TfError::Encode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_error_keeps_diagnostics_verbatim() {
        let diag = "Error: No value for required variable\n\n  on variables.tf line 3:";
        let err = TfError::Apply {
            workspace: PathBuf::from("/tmp/ws"),
            diagnostics: diag.to_string(),
        };
        assert!(err.to_string().contains(diag));
        assert_eq!(err.diagnostics(), Some(diag));
        assert!(err.is_tool_failure());
    }

    #[test]
    fn test_execution_error_has_no_diagnostics() {
        let err = TfError::Execution {
            subcommand: Subcommand::Apply,
            workspace: PathBuf::from("/missing"),
            reason: "No such file or directory".to_string(),
        };
        assert!(err.diagnostics().is_none());
        assert!(!err.is_tool_failure());
        assert!(err.to_string().contains("terraform apply could not run"));
    }

    #[test]
    fn test_contract_violation_display() {
        let err = TfError::ContractViolation("destroy called before create".to_string());
        assert_eq!(
            err.to_string(),
            "contract violation: destroy called before create"
        );
    }
}
