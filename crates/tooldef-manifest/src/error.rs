// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors raised while loading a manifest.

use crate::version::VersionError;
use std::path::PathBuf;

/// Errors that abort manifest loading. No partial descriptor is ever returned.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("cannot read manifest at '{}': {source}", .path.display())]
    Io {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// No manifest file exists in the tool directory.
    #[error("no tool.toml or pyproject.toml found in '{}'", .dir.display())]
    NotFound {
        /// Directory that was searched.
        dir: PathBuf,
    },

    /// The bytes are not UTF-8 TOML, or a field has the wrong TOML type.
    #[error("failed to parse manifest: {reason}")]
    Parse {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// A required field is absent or blank.
    #[error("missing required field '{field}'")]
    MissingField {
        /// Dotted path of the missing field.
        field: String,
    },

    /// `tool.version` is not a semantic version.
    #[error("invalid version '{version}' in 'tool.version': {source}")]
    InvalidVersion {
        /// The declared version text.
        version: String,
        /// Why parsing failed.
        #[source]
        source: VersionError,
    },

    /// A parameter declares a kind outside the closed set.
    #[error("parameter '{parameter}': unknown kind '{kind}'")]
    UnknownParameterKind {
        /// Parameter name.
        parameter: String,
        /// The declared kind text.
        kind: String,
    },

    /// A mandatory parameter also declares a default.
    #[error("parameter '{parameter}': mandatory parameters must not declare a default")]
    ConflictingParameterSpec {
        /// Parameter name.
        parameter: String,
    },

    /// An optional parameter lacks a default, or the default has the wrong type.
    #[error("parameter '{parameter}': invalid default: {reason}")]
    InvalidDefault {
        /// Parameter name.
        parameter: String,
        /// Why the default was rejected.
        reason: String,
    },

    /// A range default is not a well-formed `[start, end, step]` triple.
    #[error("parameter '{parameter}': invalid range: {reason}")]
    InvalidRangeSpec {
        /// Parameter name.
        parameter: String,
        /// Why the range was rejected.
        reason: String,
    },

    /// The same parameter table is declared twice.
    #[error("parameter '{parameter}' is declared more than once")]
    DuplicateParameter {
        /// Parameter name.
        parameter: String,
    },
}

impl ManifestError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "MANIFEST_IO",
            Self::NotFound { .. } => "MANIFEST_NOT_FOUND",
            Self::Parse { .. } => "MANIFEST_PARSE",
            Self::MissingField { .. } => "MISSING_FIELD",
            Self::InvalidVersion { .. } => "INVALID_VERSION",
            Self::UnknownParameterKind { .. } => "UNKNOWN_PARAMETER_KIND",
            Self::ConflictingParameterSpec { .. } => "CONFLICTING_PARAMETER_SPEC",
            Self::InvalidDefault { .. } => "INVALID_DEFAULT",
            Self::InvalidRangeSpec { .. } => "INVALID_RANGE_SPEC",
            Self::DuplicateParameter { .. } => "DUPLICATE_PARAMETER",
        }
    }

    /// Dotted path of the offending field, when the error concerns one.
    pub fn field(&self) -> Option<String> {
        match self {
            Self::MissingField { field } => Some(field.clone()),
            Self::InvalidVersion { .. } => Some("tool.version".into()),
            Self::UnknownParameterKind { parameter, .. } => {
                Some(format!("tool.input_parameters.{parameter}.kind"))
            }
            Self::ConflictingParameterSpec { parameter }
            | Self::InvalidDefault { parameter, .. }
            | Self::InvalidRangeSpec { parameter, .. } => {
                Some(format!("tool.input_parameters.{parameter}.default"))
            }
            Self::DuplicateParameter { parameter } => {
                Some(format!("tool.input_parameters.{parameter}"))
            }
            Self::Io { .. } | Self::NotFound { .. } | Self::Parse { .. } => None,
        }
    }
}
