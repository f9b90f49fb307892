//! Manifest workspaces - directories holding `.tf` sources and state.
//!
//! A workspace either points at an existing manifest directory (never
//! deleted by the harness) or is a temporary directory created here and
//! removed when the [`ManifestWorkspace`] is dropped.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::error::TfError;
use crate::Result;

#[derive(Debug)]
enum Location {
    Existing(PathBuf),
    Temporary(TempDir),
}

/// A Terraform working directory.
#[derive(Debug)]
pub struct ManifestWorkspace {
    location: Location,
}

impl ManifestWorkspace {
    /// Use an existing directory. It must already exist.
    pub fn at(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(TfError::Workspace(format!(
                "manifest directory {:?} does not exist",
                dir
            )));
        }
        Ok(Self {
            location: Location::Existing(dir),
        })
    }

    /// Create an empty temporary directory, removed on drop.
    pub fn temporary() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("tf-harness-").tempdir()?;
        debug!(path = %dir.path().display(), "created temporary workspace");
        Ok(Self {
            location: Location::Temporary(dir),
        })
    }

    pub fn path(&self) -> &Path {
        match &self.location {
            Location::Existing(p) => p,
            Location::Temporary(t) => t.path(),
        }
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self.location, Location::Temporary(_))
    }

    /// Write `file_name` into the workspace from `template`, replacing each
    /// `{{ .Key }}` placeholder with its value from `vars`.
    ///
    /// A placeholder without a value is an error: Terraform would otherwise
    /// receive a half-rendered manifest.
    pub fn render(
        &self,
        file_name: &str,
        template: &str,
        vars: &[(&str, &str)],
    ) -> Result<PathBuf> {
        let rendered = render_template(template, vars)?;
        let target = self.path().join(file_name);
        std::fs::write(&target, rendered)?;
        debug!(file = %target.display(), "rendered manifest");
        Ok(target)
    }

    /// Write `content` verbatim as `file_name`.
    pub fn write(&self, file_name: &str, content: &str) -> Result<PathBuf> {
        let target = self.path().join(file_name);
        std::fs::write(&target, content)?;
        Ok(target)
    }
}

/// Substitute `{{ .Key }}` placeholders (whitespace inside braces optional).
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find("}}").ok_or_else(|| {
            TfError::Workspace("unterminated {{ placeholder in template".to_string())
        })?;
        let key = after[..end].trim();
        let key = key.strip_prefix('.').ok_or_else(|| {
            TfError::Workspace(format!("placeholder {{{{ {} }}}} must start with '.'", key))
        })?;
        let value = vars
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
            .ok_or_else(|| TfError::Workspace(format!("no value for placeholder .{}", key)))?;
        out.push_str(value);
        rest = &after[end + 2..];
    }
    out.push_str(rest);

    Ok(out)
}
