// SPDX-License-Identifier: MIT OR Apache-2.0
//! Process-level tests: parameter files, build hooks, and invocation.
#![cfg(unix)]

use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tooldef_host::{BuildHook, HostError, ParameterFile, ToolHost};
use tooldef_manifest::{ToolDescriptor, load_dir};
use tooldef_resolve::{ResolvedParameterSet, resolve};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn demos_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos")
}

/// Copy a demo tool into a fresh temp dir so builds never touch the source tree.
fn copy_demo(name: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for entry in std::fs::read_dir(demos_dir().join(name)).unwrap() {
        let entry = entry.unwrap();
        std::fs::copy(entry.path(), dir.path().join(entry.file_name())).unwrap();
    }
    dir
}

/// A tool dir holding `tool.toml` plus the given script files.
fn tool_dir(manifest: &str, files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("tool.toml"), manifest).unwrap();
    for (name, body) in files {
        std::fs::write(dir.path().join(name), body).unwrap();
    }
    dir
}

fn manifest(command: &str, extra: &str) -> String {
    format!(
        "[tool]\nname = \"probe\"\nversion = \"0.1.0\"\n\n[tool.run]\ncommand = \"{command}\"\n{extra}"
    )
}

fn resolved(tool: &ToolDescriptor, supplied: Value) -> ResolvedParameterSet {
    let map: BTreeMap<String, Value> = serde_json::from_value(supplied).unwrap();
    resolve(tool, &map).unwrap()
}

async fn param_file(tool: &ToolDescriptor, supplied: Value, dir: &Path) -> ParameterFile {
    ParameterFile::write(&resolved(tool, supplied), dir, &tool.name)
        .await
        .unwrap()
}

// ===========================================================================
// 1. Parameter files
// ===========================================================================

#[tokio::test]
async fn parameter_file_holds_the_transport_document() {
    let demo = copy_demo("shell-script");
    let tool = load_dir(demo.path()).unwrap();
    let work = tempfile::tempdir().unwrap();
    let nested = work.path().join("a/b");

    let set = resolved(&tool, json!({"parameter_2": "input.nc"}));
    let file = ParameterFile::write(&set, &nested, &tool.name).await.unwrap();

    let name = file.path().file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("shell-example-"), "{name}");
    assert!(name.ends_with(".json"), "{name}");
    let written: Value =
        serde_json::from_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
    assert_eq!(written, set.to_json_value());

    let path = file.path().to_path_buf();
    file.remove().await.unwrap();
    assert!(!path.exists());
}

#[tokio::test]
async fn parameter_files_never_collide() {
    let demo = copy_demo("build-step");
    let tool = load_dir(demo.path()).unwrap();
    let work = tempfile::tempdir().unwrap();
    let a = param_file(&tool, json!({}), work.path()).await;
    let b = param_file(&tool, json!({}), work.path()).await;
    assert_ne!(a.path(), b.path());
}

// ===========================================================================
// 2. Invocation
// ===========================================================================

#[tokio::test]
async fn parameter_file_is_the_single_argument() {
    let dir = tool_dir(
        &manifest("sh args.sh", ""),
        &[("args.sh", "echo \"argc=$#\"\necho \"arg1=$1\"\n")],
    );
    let tool = load_dir(dir.path()).unwrap();
    let file = param_file(&tool, json!({}), dir.path()).await;

    let outcome = ToolHost::new()
        .invoke(&tool, dir.path(), &file)
        .await
        .unwrap();
    assert!(outcome.success());
    assert_eq!(
        outcome.stdout,
        format!("argc=1\narg1={}\n", file.path().display())
    );
}

#[tokio::test]
async fn shell_demo_reads_its_parameters() {
    let demo = copy_demo("shell-script");
    let tool = load_dir(demo.path()).unwrap();
    let file = param_file(&tool, json!({"parameter_2": "input.nc"}), demo.path()).await;

    let outcome = ToolHost::new()
        .invoke(&tool, demo.path(), &file)
        .await
        .unwrap()
        .into_result()
        .unwrap();
    assert!(outcome.stdout.contains("evaluating configuration from"));
    assert!(outcome.stdout.contains("\"parameter_2\": \"input.nc\""));
}

#[tokio::test]
async fn non_zero_exit_is_reported_verbatim() {
    let dir = tool_dir(
        &manifest("sh fail.sh", ""),
        &[("fail.sh", "echo boom >&2\nexit 7\n")],
    );
    let tool = load_dir(dir.path()).unwrap();
    let file = param_file(&tool, json!({}), dir.path()).await;

    let outcome = ToolHost::new()
        .invoke(&tool, dir.path(), &file)
        .await
        .unwrap();
    assert_eq!(outcome.exit_code, Some(7));
    assert_eq!(outcome.stderr, "boom\n");
    match outcome.into_result().unwrap_err() {
        HostError::ToolFailed { code, stderr } => {
            assert_eq!(code, Some(7));
            assert_eq!(stderr, "boom\n");
        }
        other => panic!("expected ToolFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn slow_tool_times_out() {
    let dir = tool_dir(&manifest("sh slow.sh", ""), &[("slow.sh", "sleep 5\n")]);
    let tool = load_dir(dir.path()).unwrap();
    let file = param_file(&tool, json!({}), dir.path()).await;

    let err = ToolHost::new()
        .with_timeout(Some(Duration::from_millis(200)))
        .invoke(&tool, dir.path(), &file)
        .await
        .unwrap_err();
    assert!(matches!(err, HostError::TimedOut { .. }), "{err:?}");
}

#[tokio::test]
async fn missing_shell_is_a_spawn_error() {
    let dir = tool_dir(&manifest("true", ""), &[]);
    let tool = load_dir(dir.path()).unwrap();
    let file = param_file(&tool, json!({}), dir.path()).await;

    let err = ToolHost::new()
        .with_shell("/nonexistent/shell")
        .invoke(&tool, dir.path(), &file)
        .await
        .unwrap_err();
    assert!(matches!(err, HostError::Spawn { .. }), "{err:?}");
}

// ===========================================================================
// 3. Build step
// ===========================================================================

#[tokio::test]
async fn build_then_run() {
    let demo = copy_demo("build-step");
    let tool = load_dir(demo.path()).unwrap();
    let host = ToolHost::new();
    let file = param_file(&tool, json!({"greeting": "hi"}), demo.path()).await;

    let unbuilt = host.invoke(&tool, demo.path(), &file).await.unwrap();
    assert_eq!(unbuilt.exit_code, Some(2));

    assert!(host.build(&tool, demo.path()).await.unwrap());
    assert!(demo.path().join("artifact.txt").is_file());

    let outcome = host.invoke(&tool, demo.path(), &file).await.unwrap();
    assert!(outcome.success(), "{outcome:?}");
    assert!(outcome.stdout.starts_with("built\n"));
    assert!(outcome.stdout.contains("\"greeting\": \"hi\""));
}

#[tokio::test]
async fn declared_build_without_hook_fails() {
    let dir = tool_dir(&manifest("true", "\n[tool.build]\n"), &[]);
    let tool = load_dir(dir.path()).unwrap();
    let err = ToolHost::new().build(&tool, dir.path()).await.unwrap_err();
    match err {
        HostError::MissingBuildHook { path } => assert!(path.ends_with("build.sh")),
        other => panic!("expected MissingBuildHook, got {other:?}"),
    }
}

#[tokio::test]
async fn nothing_to_build() {
    let dir = tool_dir(&manifest("true", ""), &[]);
    let tool = load_dir(dir.path()).unwrap();
    assert!(BuildHook::locate(dir.path()).is_none());
    assert!(!ToolHost::new().build(&tool, dir.path()).await.unwrap());
}

#[tokio::test]
async fn failing_build_reports_code_and_stderr() {
    let dir = tool_dir(
        &manifest("true", "\n[tool.build]\ndependencies = [\"make\"]\n"),
        &[("build.sh", "echo 'no compiler' >&2\nexit 4\n")],
    );
    let tool = load_dir(dir.path()).unwrap();
    match ToolHost::new().build(&tool, dir.path()).await.unwrap_err() {
        HostError::BuildFailed { code, stderr } => {
            assert_eq!(code, Some(4));
            assert_eq!(stderr, "no compiler\n");
        }
        other => panic!("expected BuildFailed, got {other:?}"),
    }
}
