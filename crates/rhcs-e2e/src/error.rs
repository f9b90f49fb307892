//! Error types for rhcs-e2e

use thiserror::Error;
use tf_harness::TfError;

/// Errors from scenario helpers and the management API client
#[derive(Error, Debug)]
pub enum E2eError {
    /// Terraform step failed
    #[error(transparent)]
    Harness(#[from] TfError),

    /// Management API request could not be completed
    #[error("management API request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// Management API answered with a body that does not match its schema
    #[error("unexpected management API response from {path}: {reason}")]
    Decode { path: String, reason: String },

    /// Client could not be built
    #[error("management API client error: {0}")]
    Client(String),

    /// `oc login` did not succeed
    #[error("oc login to {server} as {username} failed: {reason}")]
    Login {
        server: String,
        username: String,
        reason: String,
    },
}

impl E2eError {
    /// Diagnostics carried by a harness or login error.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            E2eError::Harness(e) => e.diagnostics(),
            E2eError::Login { reason, .. } => Some(reason),
            _ => None,
        }
    }
}
