// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared command implementations for the tooldef CLI.
//!
//! These functions are library-level so they can be tested without
//! spawning the binary.

use anyhow::{Context, Result};
use schemars::schema_for;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tooldef_config::HostConfig;
use tooldef_host::ToolHost;
use tooldef_manifest::{ManifestWarning, ToolDescriptor, load_dir, load_file};

/// Schema types that can be printed by the `schema` subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    /// JSON schema for [`ToolDescriptor`].
    Descriptor,
    /// JSON schema for [`HostConfig`].
    Config,
}

/// Return the JSON schema string for the given kind.
pub fn schema_json(kind: SchemaKind) -> Result<String> {
    let value = match kind {
        SchemaKind::Descriptor => serde_json::to_value(schema_for!(ToolDescriptor))?,
        SchemaKind::Config => serde_json::to_value(schema_for!(HostConfig))?,
    };
    serde_json::to_string_pretty(&value).context("serialize schema")
}

/// A loaded manifest and the directory its tool lives in.
#[derive(Debug, Clone)]
pub struct LoadedTool {
    /// The validated manifest.
    pub descriptor: ToolDescriptor,
    /// Directory holding the manifest and the tool's files.
    pub dir: PathBuf,
}

/// Load a manifest from a tool directory or a manifest file.
pub fn load_tool(path: &Path) -> Result<LoadedTool> {
    let (descriptor, dir) = if path.is_dir() {
        (load_dir(path)?, path.to_path_buf())
    } else {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        (load_file(path)?, dir)
    };
    let dir = std::fs::canonicalize(&dir)
        .with_context(|| format!("resolve tool directory '{}'", dir.display()))?;
    Ok(LoadedTool { descriptor, dir })
}

/// Human-readable summary printed by `check`.
pub fn check_summary(descriptor: &ToolDescriptor, warnings: &[ManifestWarning]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", descriptor.name, descriptor.version);
    if !descriptor.summary.is_empty() {
        let _ = writeln!(out, "  {}", descriptor.summary);
    }
    let _ = writeln!(out, "run: {}", descriptor.run.command);
    if let Some(build) = &descriptor.build {
        let deps: Vec<_> = build.dependencies.iter().map(String::as_str).collect();
        let _ = writeln!(out, "build: {}", deps.join(", "));
    }
    let _ = writeln!(out, "parameters: {}", descriptor.parameters.len());
    for p in &descriptor.parameters {
        match p.default_value() {
            Some(default) => {
                let _ = writeln!(out, "  {} ({}) = {default}", p.name, p.kind());
            }
            None => {
                let _ = writeln!(out, "  {} ({}, mandatory)", p.name, p.kind());
            }
        }
    }
    for w in warnings {
        let _ = writeln!(out, "warning: {w}");
    }
    out
}

/// Build a [`ToolHost`] from the host configuration.
///
/// Fails early when the shell cannot be found on `PATH`.
pub fn host_from_config(config: &HostConfig) -> Result<ToolHost> {
    let shell = config.shell();
    if !Path::new(shell).is_absolute() && which(shell).is_none() {
        anyhow::bail!("shell '{shell}' not found in PATH");
    }
    Ok(ToolHost::new()
        .with_shell(shell)
        .with_timeout(config.timeout()))
}

/// Map a tool's exit code onto the CLI's own.
///
/// Codes outside `0..=255` and signal deaths become 1.
pub fn exit_status(code: Option<i32>) -> u8 {
    code.and_then(|c| u8::try_from(c).ok()).unwrap_or(1)
}

fn which(bin: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    for p in std::env::split_paths(&path) {
        let candidate = p.join(bin);
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tooldef_manifest::load_str;

    const MANIFEST: &str = r#"
[tool]
name = "demo"
version = "1.0.0"
summary = "Demo tool"

[tool.run]
command = "sh demo.sh"

[tool.build]
dependencies = ["make"]

[tool.input_parameters.input]
kind = "string"
mandatory = true

[tool.input_parameters.n]
kind = "integer"
default = 3
"#;

    #[test]
    fn summary_lists_parameters_and_warnings() {
        let d = load_str(MANIFEST).unwrap();
        let text = check_summary(&d, &tooldef_manifest::lint_descriptor(&d));
        assert!(text.starts_with("demo 1.0.0\n"));
        assert!(text.contains("run: sh demo.sh"));
        assert!(text.contains("build: make"));
        assert!(text.contains("input (string, mandatory)"));
        assert!(text.contains("n (integer) = 3"));
        assert!(text.contains("warning: missing optional field 'tool.authors'"));
    }

    #[test]
    fn schemas_are_json_objects() {
        for kind in [SchemaKind::Descriptor, SchemaKind::Config] {
            let text = schema_json(kind).unwrap();
            let value: serde_json::Value = serde_json::from_str(&text).unwrap();
            assert!(value.is_object());
        }
    }

    #[test]
    fn exit_status_mapping() {
        assert_eq!(exit_status(Some(0)), 0);
        assert_eq!(exit_status(Some(7)), 7);
        assert_eq!(exit_status(Some(-1)), 1);
        assert_eq!(exit_status(Some(300)), 1);
        assert_eq!(exit_status(None), 1);
    }

    #[test]
    fn load_tool_from_file_and_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("tool.toml");
        std::fs::write(&file, MANIFEST).unwrap();
        let canonical = std::fs::canonicalize(dir.path()).unwrap();

        let by_file = load_tool(&file).unwrap();
        assert_eq!(by_file.dir, canonical);
        let by_dir = load_tool(dir.path()).unwrap();
        assert_eq!(by_dir.descriptor, by_file.descriptor);
    }

    #[test]
    fn unknown_shell_is_rejected() {
        let config = HostConfig {
            shell: Some("definitely-not-a-shell-xyz".into()),
            ..Default::default()
        };
        assert!(host_from_config(&config).is_err());
    }
}
