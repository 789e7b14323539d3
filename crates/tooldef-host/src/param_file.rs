// SPDX-License-Identifier: MIT OR Apache-2.0
//! The JSON parameter file handed to a tool.

use crate::HostError;
use std::path::{Path, PathBuf};
use tooldef_resolve::ResolvedParameterSet;
use tracing::debug;
use uuid::Uuid;

/// A transport document written to disk.
///
/// The file is left in place after the tool runs; call [`remove`](Self::remove)
/// to clean it up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterFile {
    path: PathBuf,
}

impl ParameterFile {
    /// Write `set` as `<tool_name>-<uuid>.json` inside `dir`, creating `dir`
    /// if needed.
    ///
    /// The returned path is absolute because tools run in their own directory.
    pub async fn write(
        set: &ResolvedParameterSet,
        dir: &Path,
        tool_name: &str,
    ) -> Result<Self, HostError> {
        let io_err = |source| HostError::Io {
            path: dir.to_path_buf(),
            source,
        };
        tokio::fs::create_dir_all(dir).await.map_err(io_err)?;
        let dir = tokio::fs::canonicalize(dir).await.map_err(io_err)?;
        let path = dir.join(format!("{}-{}.json", file_stem(tool_name), Uuid::new_v4()));
        let body = set.to_json_string_pretty()?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|source| HostError::Io {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), parameters = set.len(), "wrote parameter file");
        Ok(Self { path })
    }

    /// Location of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file.
    pub async fn remove(self) -> Result<(), HostError> {
        tokio::fs::remove_file(&self.path)
            .await
            .map_err(|source| HostError::Io {
                path: self.path.clone(),
                source,
            })
    }
}

/// Tool names become file names; keep them to a safe alphabet.
fn file_stem(tool_name: &str) -> String {
    let stem: String = tool_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() { "tool".into() } else { stem }
}
