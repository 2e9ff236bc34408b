//! Diff acquisition for the client CLI.
//!
//! Plumbing around the protocol core: the diff may be given literally,
//! read from a file, or taken from the version-control staging area. All
//! three produce a plain string for the session.

use std::path::PathBuf;
use std::process::Command;

#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    #[error("Error reading diff file {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Error getting git diff: {0}")]
    Git(String),
}

/// Where the diff text comes from.
#[derive(Debug, Clone)]
pub enum DiffSource {
    Literal(String),
    File(PathBuf),
    Staged,
}

impl DiffSource {
    pub fn load(&self) -> Result<String, DiffError> {
        match self {
            Self::Literal(text) => Ok(text.clone()),
            Self::File(path) => std::fs::read_to_string(path).map_err(|source| DiffError::File {
                path: path.display().to_string(),
                source,
            }),
            Self::Staged => staged_diff(),
        }
    }
}

fn staged_diff() -> Result<String, DiffError> {
    let output = Command::new("git")
        .args(["diff", "--staged"])
        .output()
        .map_err(|e| DiffError::Git(e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DiffError::Git(stderr.trim().to_string()));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
