// SPDX-License-Identifier: MIT OR Apache-2.0
//! Running build hooks and tool commands through a shell.

use crate::HostError;
use crate::param_file::ParameterFile;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tooldef_manifest::ToolDescriptor;
use tracing::{debug, info, warn};

/// File name of the build hook inside a tool directory.
pub const BUILD_HOOK_FILE: &str = "build.sh";

/// Location of a tool's build hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildHook {
    path: PathBuf,
}

impl BuildHook {
    /// The hook inside `tool_dir`, if the file exists.
    pub fn locate(tool_dir: &Path) -> Option<Self> {
        let path = tool_dir.join(BUILD_HOOK_FILE);
        path.is_file().then_some(Self { path })
    }

    /// Path to the hook script.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Captured result of one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Exit code, `None` when the tool was killed by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl ExecutionOutcome {
    /// `true` when the tool exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Turn a non-zero exit into [`HostError::ToolFailed`].
    pub fn into_result(self) -> Result<Self, HostError> {
        if self.success() {
            Ok(self)
        } else {
            Err(HostError::ToolFailed {
                code: self.exit_code,
                stderr: self.stderr,
            })
        }
    }

    fn from_output(output: Output) -> Self {
        Self {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Builds and invokes tools through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolHost {
    shell: String,
    timeout: Option<Duration>,
}

impl Default for ToolHost {
    fn default() -> Self {
        Self {
            shell: "sh".into(),
            timeout: None,
        }
    }
}

impl ToolHost {
    /// A host using `sh` and no timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `shell` for build hooks and run commands.
    #[must_use]
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Kill build hooks and tools still running after `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Shell in use.
    pub fn shell(&self) -> &str {
        &self.shell
    }

    /// Timeout in use.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run the build hook for `descriptor` in `tool_dir`.
    ///
    /// Returns `Ok(false)` when there is nothing to build. A declared
    /// `[tool.build]` without a hook is an error; a hook without a declared
    /// build section still runs.
    pub async fn build(&self, descriptor: &ToolDescriptor, tool_dir: &Path) -> Result<bool, HostError> {
        let Some(hook) = BuildHook::locate(tool_dir) else {
            if descriptor.requires_build() {
                return Err(HostError::MissingBuildHook {
                    path: tool_dir.join(BUILD_HOOK_FILE),
                });
            }
            debug!(tool = %descriptor.name, "no build step");
            return Ok(false);
        };

        info!(tool = %descriptor.name, hook = %hook.path().display(), "building tool");
        let mut cmd = Command::new(&self.shell);
        cmd.arg(BUILD_HOOK_FILE).current_dir(tool_dir);
        let outcome = self.run(cmd).await?;
        if !outcome.success() {
            warn!(tool = %descriptor.name, code = ?outcome.exit_code, "build failed");
            return Err(HostError::BuildFailed {
                code: outcome.exit_code,
                stderr: outcome.stderr,
            });
        }
        Ok(true)
    }

    /// Run the tool's command in `tool_dir` with `param_file` as its only
    /// argument.
    ///
    /// The exit code is reported verbatim; use
    /// [`ExecutionOutcome::into_result`] to treat non-zero exits as errors.
    pub async fn invoke(
        &self,
        descriptor: &ToolDescriptor,
        tool_dir: &Path,
        param_file: &ParameterFile,
    ) -> Result<ExecutionOutcome, HostError> {
        let script = format!("{} \"$1\"", descriptor.run.command);
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(&script)
            .arg(&descriptor.name)
            .arg(param_file.path())
            .current_dir(tool_dir);

        info!(
            tool = %descriptor.name,
            command = %descriptor.run.command,
            params = %param_file.path().display(),
            "invoking tool"
        );
        let outcome = self.run(cmd).await?;
        debug!(tool = %descriptor.name, code = ?outcome.exit_code, "tool finished");
        Ok(outcome)
    }

    async fn run(&self, mut cmd: Command) -> Result<ExecutionOutcome, HostError> {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        let child = cmd.spawn().map_err(|source| HostError::Spawn {
            shell: self.shell.clone(),
            source,
        })?;
        let output = child.wait_with_output();
        let output = match self.timeout {
            Some(after) => tokio::time::timeout(after, output)
                .await
                .map_err(|_| HostError::TimedOut { after })?,
            None => output.await,
        };
        let output = output.map_err(|source| HostError::Spawn {
            shell: self.shell.clone(),
            source,
        })?;
        Ok(ExecutionOutcome::from_output(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_into_result() {
        let ok = ExecutionOutcome {
            exit_code: Some(0),
            stdout: "out".into(),
            stderr: String::new(),
        };
        assert!(ok.clone().into_result().is_ok());

        let failed = ExecutionOutcome {
            exit_code: Some(3),
            ..ok
        };
        match failed.into_result().unwrap_err() {
            HostError::ToolFailed { code, .. } => assert_eq!(code, Some(3)),
            other => panic!("expected ToolFailed, got {other:?}"),
        }
    }

    #[test]
    fn signal_exit_is_not_success() {
        let killed = ExecutionOutcome {
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(!killed.success());
    }

    #[test]
    fn builder_sets_shell_and_timeout() {
        let host = ToolHost::new()
            .with_shell("bash")
            .with_timeout(Some(Duration::from_secs(5)));
        assert_eq!(host.shell(), "bash");
        assert_eq!(host.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(ToolHost::new().shell(), "sh");
    }
}
