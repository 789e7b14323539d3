// SPDX-License-Identifier: MIT OR Apache-2.0
//! Semantic version parsing for `tool.version`.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur when parsing a [`ToolVersion`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    /// The string is empty (or only a `v` prefix).
    #[error("empty version string")]
    Empty,

    /// The core is not `MAJOR.MINOR.PATCH`.
    #[error("expected MAJOR.MINOR.PATCH")]
    InvalidFormat,

    /// A numeric core component is not a non-negative integer without leading zeros.
    #[error("invalid {component} component '{value}'")]
    InvalidComponent {
        /// `major`, `minor` or `patch`.
        component: &'static str,
        /// The offending text.
        value: String,
    },

    /// A pre-release identifier is empty or contains illegal characters.
    #[error("invalid pre-release identifier '{0}'")]
    InvalidPreRelease(String),

    /// A build-metadata identifier is empty or contains illegal characters.
    #[error("invalid build metadata identifier '{0}'")]
    InvalidBuild(String),
}

// ---------------------------------------------------------------------------
// ToolVersion
// ---------------------------------------------------------------------------

/// A parsed `MAJOR.MINOR.PATCH[-PRE][+BUILD]` version.
///
/// A leading `v` or `V` is accepted and dropped, so `"v1.2.0"` and `"1.2.0"`
/// parse to the same value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ToolVersion {
    /// Major version number.
    pub major: u64,
    /// Minor version number.
    pub minor: u64,
    /// Patch version number.
    pub patch: u64,
    /// Pre-release identifiers (without the leading `-`).
    pub pre: Option<String>,
    /// Build metadata (without the leading `+`).
    pub build: Option<String>,
}

impl ToolVersion {
    /// Parse a version string.
    ///
    /// ```
    /// # use tooldef_manifest::ToolVersion;
    /// let v = ToolVersion::parse("v1.4.0-rc.1").unwrap();
    /// assert_eq!((v.major, v.minor, v.patch), (1, 4, 0));
    /// assert_eq!(v.pre.as_deref(), Some("rc.1"));
    /// assert!(ToolVersion::parse("1.4").is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`VersionError`] describing the first problem found.
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let s = s.trim();
        let s = s
            .strip_prefix('v')
            .or_else(|| s.strip_prefix('V'))
            .unwrap_or(s);
        if s.is_empty() {
            return Err(VersionError::Empty);
        }

        let (rest, build) = match s.split_once('+') {
            Some((rest, build)) => (rest, Some(build)),
            None => (s, None),
        };
        let (core, pre) = match rest.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (rest, None),
        };

        let parts: Vec<&str> = core.split('.').collect();
        let [major, minor, patch] = parts.as_slice() else {
            return Err(VersionError::InvalidFormat);
        };

        let pre = pre
            .map(|p| check_identifiers(p, true).map_err(VersionError::InvalidPreRelease))
            .transpose()?;
        let build = build
            .map(|b| check_identifiers(b, false).map_err(VersionError::InvalidBuild))
            .transpose()?;

        Ok(Self {
            major: numeric(major, "major")?,
            minor: numeric(minor, "minor")?,
            patch: numeric(patch, "patch")?,
            pre,
            build,
        })
    }

    /// `true` for pre-release versions such as `1.0.0-alpha`.
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some()
    }
}

fn numeric(value: &str, component: &'static str) -> Result<u64, VersionError> {
    let invalid = || VersionError::InvalidComponent {
        component,
        value: value.to_string(),
    };
    if value.is_empty()
        || !value.bytes().all(|b| b.is_ascii_digit())
        || (value.len() > 1 && value.starts_with('0'))
    {
        return Err(invalid());
    }
    value.parse::<u64>().map_err(|_| invalid())
}

/// Validate dot-separated identifiers; returns the whole string on success
/// and the first bad identifier on failure.
fn check_identifiers(s: &str, reject_leading_zero: bool) -> Result<String, String> {
    for ident in s.split('.') {
        let legal = !ident.is_empty()
            && ident
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-');
        let numeric_with_zero = reject_leading_zero
            && ident.len() > 1
            && ident.starts_with('0')
            && ident.bytes().all(|b| b.is_ascii_digit());
        if !legal || numeric_with_zero {
            return Err(ident.to_string());
        }
    }
    Ok(s.to_string())
}

impl FromStr for ToolVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{pre}")?;
        }
        if let Some(build) = &self.build {
            write!(f, "+{build}")?;
        }
        Ok(())
    }
}

impl Serialize for ToolVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
