// SPDX-License-Identifier: MIT OR Apache-2.0
//! Advisory checks that never block loading.

use crate::descriptor::ToolDescriptor;
use std::fmt;

/// Advisory-level issues that do not prevent a tool from running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestWarning {
    /// A recommended optional field is missing.
    MissingOptionalField {
        /// Dotted field path.
        field: String,
        /// Why it matters.
        hint: String,
    },
    /// A dependency string does not look like `NAME[CONSTRAINT]`.
    InvalidDependencySpec {
        /// `tool.run` or `tool.build`.
        section: String,
        /// The offending specifier.
        spec: String,
    },
    /// `[tool.build]` is declared without dependencies.
    EmptyBuildSection,
}

impl fmt::Display for ManifestWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestWarning::MissingOptionalField { field, hint } => {
                write!(f, "missing optional field '{field}': {hint}")
            }
            ManifestWarning::InvalidDependencySpec { section, spec } => {
                write!(f, "'{section}.dependencies': malformed specifier '{spec}'")
            }
            ManifestWarning::EmptyBuildSection => {
                f.write_str("'tool.build' has no dependencies; only the build hook will run")
            }
        }
    }
}

/// A package specifier split into name and version constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpec {
    /// Package name (`[A-Za-z0-9_-]+`).
    pub name: String,
    /// Constraint such as `>=3.10`, if any.
    pub constraint: Option<String>,
}

impl DependencySpec {
    /// Split `"numpy>=1.26"` into `numpy` and `>=1.26`.
    ///
    /// Returns `None` when the name is empty, contains other characters, or the
    /// remainder does not start with one of `< > = ! ~ ^`.
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        let split = spec
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(spec.len());
        let (name, rest) = spec.split_at(split);
        if name.is_empty() {
            return None;
        }
        if rest.is_empty() {
            return Some(Self {
                name: name.to_string(),
                constraint: None,
            });
        }
        if !rest.starts_with(['<', '>', '=', '!', '~', '^']) {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            constraint: Some(rest.to_string()),
        })
    }
}

/// Collect advisory warnings for a loaded descriptor.
pub fn lint_descriptor(descriptor: &ToolDescriptor) -> Vec<ManifestWarning> {
    let mut warnings = Vec::new();

    if descriptor.authors.is_empty() {
        warnings.push(ManifestWarning::MissingOptionalField {
            field: "tool.authors".into(),
            hint: "users cannot tell who maintains the tool".into(),
        });
    }
    if descriptor.summary.trim().is_empty() {
        warnings.push(ManifestWarning::MissingOptionalField {
            field: "tool.summary".into(),
            hint: "listings will show the tool without a description".into(),
        });
    }

    let mut check = |section: &str, deps: &std::collections::BTreeSet<String>| {
        for spec in deps {
            if DependencySpec::parse(spec).is_none() {
                warnings.push(ManifestWarning::InvalidDependencySpec {
                    section: section.to_string(),
                    spec: spec.clone(),
                });
            }
        }
    };
    check("tool.run", &descriptor.run.dependencies);
    if let Some(build) = &descriptor.build {
        check("tool.build", &build.dependencies);
        if build.dependencies.is_empty() {
            warnings.push(ManifestWarning::EmptyBuildSection);
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependency_without_constraint() {
        assert_eq!(
            DependencySpec::parse("jq"),
            Some(DependencySpec {
                name: "jq".into(),
                constraint: None
            })
        );
    }

    #[test]
    fn dependency_with_constraint() {
        let d = DependencySpec::parse("python>=3.10").unwrap();
        assert_eq!(d.name, "python");
        assert_eq!(d.constraint.as_deref(), Some(">=3.10"));
        assert_eq!(
            DependencySpec::parse("r-base~=4.3").unwrap().name,
            "r-base"
        );
    }

    #[test]
    fn malformed_dependencies() {
        assert_eq!(DependencySpec::parse(""), None);
        assert_eq!(DependencySpec::parse(">=1"), None);
        assert_eq!(DependencySpec::parse("numpy 1.2"), None);
        assert_eq!(DependencySpec::parse("conda-forge::numpy"), None);
    }

    #[test]
    fn warning_display() {
        let w = ManifestWarning::InvalidDependencySpec {
            section: "tool.run".into(),
            spec: "a b".into(),
        };
        assert!(w.to_string().contains("'a b'"));
        assert!(ManifestWarning::EmptyBuildSection
            .to_string()
            .contains("build hook"));
    }
}
