// SPDX-License-Identifier: MIT OR Apache-2.0
//! Host configuration loading, validation, and merging for tooldef.
//!
//! [`HostConfig`] holds the settings that govern how tools are built and
//! invoked on this machine: the log level, where parameter files are written,
//! the invocation timeout, and the shell used to run commands.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration loading or validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested configuration file was not found.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The file could not be parsed as valid TOML, or an override is malformed.
    #[error("failed to parse config: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// Semantic validation failed (one or more problems).
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Advisory-level issues that do not prevent operation but deserve attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// A recommended optional field is missing.
    MissingOptionalField {
        /// Name of the missing field.
        field: String,
        /// Why it matters.
        hint: String,
    },
    /// The invocation timeout is unusually large.
    LargeTimeout {
        /// Timeout value in seconds.
        secs: u64,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::MissingOptionalField { field, hint } => {
                write!(f, "missing optional field '{field}': {hint}")
            }
            ConfigWarning::LargeTimeout { secs } => {
                write!(f, "tool invocations may run for a long time ({secs}s)")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// Settings for building and invoking tools on this host.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    /// Log level (`error`, `warn`, `info`, `debug`, `trace`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Directory for parameter files. The system temp dir when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<String>,

    /// Invocation timeout in seconds (1 to 86 400). No timeout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Shell used to run build hooks and tool commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            log_level: Some("info".into()),
            work_dir: None,
            timeout_secs: None,
            shell: None,
        }
    }
}

impl HostConfig {
    /// The configured shell, or [`DEFAULT_SHELL`].
    pub fn shell(&self) -> &str {
        self.shell.as_deref().unwrap_or(DEFAULT_SHELL)
    }

    /// The configured timeout as a [`Duration`].
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// The configured work directory, or the system temp dir.
    pub fn work_dir(&self) -> PathBuf {
        self.work_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Shell used when none is configured.
pub const DEFAULT_SHELL: &str = "sh";

/// Maximum allowed timeout in seconds (24 hours).
pub const MAX_TIMEOUT_SECS: u64 = 86_400;

/// Threshold above which a timeout generates a warning.
const LARGE_TIMEOUT_THRESHOLD: u64 = 3_600;

/// Recognised log levels.
const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Environment variable overriding [`HostConfig::log_level`].
pub const ENV_LOG_LEVEL: &str = "TOOLDEF_LOG_LEVEL";
/// Environment variable overriding [`HostConfig::work_dir`].
pub const ENV_WORK_DIR: &str = "TOOLDEF_WORK_DIR";
/// Environment variable overriding [`HostConfig::timeout_secs`].
pub const ENV_TIMEOUT_SECS: &str = "TOOLDEF_TIMEOUT_SECS";
/// Environment variable overriding [`HostConfig::shell`].
pub const ENV_SHELL: &str = "TOOLDEF_SHELL";

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a [`HostConfig`] from an optional TOML file path.
///
/// * If `path` is `Some`, reads and parses the file.
/// * If `path` is `None`, returns [`HostConfig::default()`].
///
/// Environment variable overrides are applied on top in both cases.
pub fn load_config(path: Option<&Path>) -> Result<HostConfig, ConfigError> {
    let mut config = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p).map_err(|_| ConfigError::FileNotFound {
                path: p.display().to_string(),
            })?;
            parse_toml(&content)?
        }
        None => HostConfig::default(),
    };
    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Parse a TOML string into a [`HostConfig`].
pub fn parse_toml(content: &str) -> Result<HostConfig, ConfigError> {
    toml::from_str::<HostConfig>(content).map_err(|e| ConfigError::ParseError {
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Env overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides.
///
/// Recognised variables:
/// - `TOOLDEF_LOG_LEVEL`
/// - `TOOLDEF_WORK_DIR`
/// - `TOOLDEF_TIMEOUT_SECS`
/// - `TOOLDEF_SHELL`
pub fn apply_env_overrides(config: &mut HostConfig) -> Result<(), ConfigError> {
    apply_overrides_from(config, |key| std::env::var(key).ok())
}

/// Apply overrides read through `lookup` instead of the process environment.
pub fn apply_overrides_from<F>(config: &mut HostConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup(ENV_LOG_LEVEL) {
        config.log_level = Some(val);
    }
    if let Some(val) = lookup(ENV_WORK_DIR) {
        config.work_dir = Some(val);
    }
    if let Some(val) = lookup(ENV_TIMEOUT_SECS) {
        let secs = val.trim().parse::<u64>().map_err(|_| ConfigError::ParseError {
            reason: format!("{ENV_TIMEOUT_SECS}='{val}' is not a whole number of seconds"),
        })?;
        config.timeout_secs = Some(secs);
    }
    if let Some(val) = lookup(ENV_SHELL) {
        config.shell = Some(val);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a parsed configuration, returning advisory warnings.
///
/// Hard errors (unknown log level, out-of-range timeout, blank shell) are
/// returned as a [`ConfigError::ValidationError`]; soft issues come back as
/// warnings.
pub fn validate_config(config: &HostConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<ConfigWarning> = Vec::new();

    if let Some(ref level) = config.log_level
        && !VALID_LOG_LEVELS.contains(&level.as_str())
    {
        errors.push(format!("invalid log_level '{level}'"));
    }

    if let Some(t) = config.timeout_secs {
        if t == 0 || t > MAX_TIMEOUT_SECS {
            errors.push(format!(
                "timeout {t}s out of range (1..{MAX_TIMEOUT_SECS})"
            ));
        } else if t > LARGE_TIMEOUT_THRESHOLD {
            warnings.push(ConfigWarning::LargeTimeout { secs: t });
        }
    }

    if let Some(ref shell) = config.shell
        && shell.trim().is_empty()
    {
        errors.push("shell must not be empty".into());
    }

    if config.work_dir.is_none() {
        warnings.push(ConfigWarning::MissingOptionalField {
            field: "work_dir".into(),
            hint: "parameter files will be written to the system temp dir".into(),
        });
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigError::ValidationError { reasons: errors })
    }
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

/// Merge two configurations.  Values in `overlay` take precedence over `base`.
pub fn merge_configs(base: HostConfig, overlay: HostConfig) -> HostConfig {
    HostConfig {
        log_level: overlay.log_level.or(base.log_level),
        work_dir: overlay.work_dir.or(base.work_dir),
        timeout_secs: overlay.timeout_secs.or(base.timeout_secs),
        shell: overlay.shell.or(base.shell),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    // -- 1. Default config is valid ------------------------------------------

    #[test]
    fn default_config_is_valid() {
        let cfg = HostConfig::default();
        let warnings = validate_config(&cfg).expect("default config should be valid");
        assert_eq!(warnings.len(), 1, "only the work_dir hint: {warnings:?}");
    }

    // -- 2. Defaults ---------------------------------------------------------

    #[test]
    fn default_config_has_sensible_defaults() {
        let cfg = HostConfig::default();
        assert_eq!(cfg.log_level.as_deref(), Some("info"));
        assert_eq!(cfg.shell(), "sh");
        assert_eq!(cfg.timeout(), None);
        assert_eq!(cfg.work_dir(), std::env::temp_dir());
    }

    // -- 3. Parse TOML -------------------------------------------------------

    #[test]
    fn parse_valid_toml_string() {
        let cfg = parse_toml(
            r#"
            log_level = "debug"
            work_dir = "/var/tmp/tooldef"
            timeout_secs = 120
            shell = "bash"
        "#,
        )
        .unwrap();
        assert_eq!(cfg.log_level.as_deref(), Some("debug"));
        assert_eq!(cfg.work_dir(), PathBuf::from("/var/tmp/tooldef"));
        assert_eq!(cfg.timeout(), Some(Duration::from_secs(120)));
        assert_eq!(cfg.shell(), "bash");
    }

    // -- 4. Parse errors -----------------------------------------------------

    #[test]
    fn parse_errors() {
        assert!(matches!(
            parse_toml("this is [not valid toml =").unwrap_err(),
            ConfigError::ParseError { .. }
        ));
        assert!(matches!(
            parse_toml("timeout_secs = \"ten\"").unwrap_err(),
            ConfigError::ParseError { .. }
        ));
        assert!(matches!(
            parse_toml("unknown_key = 1").unwrap_err(),
            ConfigError::ParseError { .. }
        ));
    }

    // -- 5. Env overrides ----------------------------------------------------

    #[test]
    fn overrides_replace_file_values() {
        let mut cfg = parse_toml("log_level = \"warn\"\nshell = \"bash\"").unwrap();
        apply_overrides_from(
            &mut cfg,
            env(&[
                (ENV_LOG_LEVEL, "trace"),
                (ENV_WORK_DIR, "/w"),
                (ENV_TIMEOUT_SECS, " 30 "),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.log_level.as_deref(), Some("trace"));
        assert_eq!(cfg.work_dir.as_deref(), Some("/w"));
        assert_eq!(cfg.timeout_secs, Some(30));
        assert_eq!(cfg.shell.as_deref(), Some("bash"));
    }

    #[test]
    fn malformed_timeout_override_is_rejected() {
        let mut cfg = HostConfig::default();
        let err = apply_overrides_from(&mut cfg, env(&[(ENV_TIMEOUT_SECS, "soon")])).unwrap_err();
        assert!(err.to_string().contains(ENV_TIMEOUT_SECS));
    }

    // -- 6. Validation -------------------------------------------------------

    #[test]
    fn validation_catches_invalid_log_level() {
        let cfg = HostConfig {
            log_level: Some("verbose".into()),
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&cfg).unwrap_err(),
            ConfigError::ValidationError { .. }
        ));
    }

    #[test]
    fn validation_collects_every_problem() {
        let cfg = HostConfig {
            log_level: Some("loud".into()),
            timeout_secs: Some(0),
            shell: Some(" ".into()),
            work_dir: None,
        };
        match validate_config(&cfg).unwrap_err() {
            ConfigError::ValidationError { reasons } => assert_eq!(reasons.len(), 3),
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn large_timeout_produces_warning() {
        let cfg = HostConfig {
            timeout_secs: Some(7200),
            work_dir: Some("/w".into()),
            ..Default::default()
        };
        assert_eq!(
            validate_config(&cfg).unwrap(),
            vec![ConfigWarning::LargeTimeout { secs: 7200 }]
        );
    }

    // -- 7. Merge ------------------------------------------------------------

    #[test]
    fn merge_overlay_overrides_base() {
        let base = HostConfig {
            log_level: Some("info".into()),
            shell: Some("bash".into()),
            timeout_secs: Some(60),
            ..Default::default()
        };
        let overlay = HostConfig {
            log_level: None,
            shell: Some("zsh".into()),
            ..Default::default()
        };
        let merged = merge_configs(base, overlay);
        assert_eq!(merged.log_level.as_deref(), Some("info"));
        assert_eq!(merged.shell(), "zsh");
        assert_eq!(merged.timeout_secs, Some(60));
    }

    // -- 8. Files ------------------------------------------------------------

    #[test]
    fn load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tooldef.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "log_level = \"warn\"\ntimeout_secs = 10").unwrap();
        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.timeout_secs, Some(10));
    }

    #[test]
    fn load_missing_file_gives_file_not_found() {
        let err = load_config(Some(Path::new("/nonexistent/tooldef.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    // -- 9. Display ----------------------------------------------------------

    #[test]
    fn warning_display() {
        assert!(
            ConfigWarning::LargeTimeout { secs: 9999 }
                .to_string()
                .contains("9999")
        );
        let w = ConfigWarning::MissingOptionalField {
            field: "work_dir".into(),
            hint: "h".into(),
        };
        assert!(w.to_string().contains("work_dir"));
    }
}
