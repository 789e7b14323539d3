// SPDX-License-Identifier: MIT OR Apache-2.0
//! Build and invoke tools described by a manifest.
//!
//! A tool is run by writing its [`ResolvedParameterSet`](tooldef_resolve::ResolvedParameterSet)
//! to a JSON [`ParameterFile`] and handing that file's path to the tool's run
//! command as its only argument. Tools that declare `[tool.build]` are built
//! first by running the `build.sh` hook in the tool directory.
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod param_file;
mod process;

pub use param_file::ParameterFile;
pub use process::{BUILD_HOOK_FILE, BuildHook, ExecutionOutcome, ToolHost};

use std::path::PathBuf;
use std::time::Duration;

/// Errors raised while building or invoking a tool.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// A file or directory operation failed.
    #[error("I/O error at '{}': {source}", .path.display())]
    Io {
        /// Path involved in the operation.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The parameter set could not be serialized.
    #[error("failed to serialize parameters: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The shell could not be started.
    #[error("failed to spawn '{shell}': {source}")]
    Spawn {
        /// Shell that was executed.
        shell: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// `[tool.build]` is declared but the tool directory has no build hook.
    #[error("tool declares a build step but '{}' does not exist", .path.display())]
    MissingBuildHook {
        /// Expected hook location.
        path: PathBuf,
    },

    /// The build hook exited unsuccessfully.
    #[error("build failed (code={code:?}): {stderr}")]
    BuildFailed {
        /// Exit code, `None` when killed by a signal.
        code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },

    /// The tool exited unsuccessfully.
    #[error("tool failed (code={code:?}): {stderr}")]
    ToolFailed {
        /// Exit code, `None` when killed by a signal.
        code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },

    /// The child did not finish within the configured timeout and was killed.
    #[error("timed out after {after:?}")]
    TimedOut {
        /// The timeout that elapsed.
        after: Duration,
    },
}
