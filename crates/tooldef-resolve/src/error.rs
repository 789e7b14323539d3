// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors raised while resolving supplied values.

use tooldef_manifest::ParameterKind;

/// Why a supplied-value set could not be resolved.
///
/// Resolution stops at the first error, so exactly one parameter is named.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParameterError {
    /// The supplied value cannot be read as the declared kind.
    #[error("parameter '{parameter}': expected {expected}: {reason}")]
    TypeMismatch {
        /// Parameter name.
        parameter: String,
        /// Declared kind.
        expected: ParameterKind,
        /// What was wrong with the value.
        reason: String,
    },

    /// A mandatory parameter was not supplied.
    #[error("parameter '{parameter}' is mandatory but was not supplied")]
    MissingMandatoryParameter {
        /// Parameter name.
        parameter: String,
    },

    /// A supplied key matches no declared parameter.
    #[error("unknown parameter '{parameter}'")]
    UnknownParameter {
        /// The supplied key.
        parameter: String,
    },

    /// The search facility does not know a `databrowser` value.
    #[error("parameter '{parameter}': '{value}' is not a known value for '{search_key}'")]
    UnknownSearchValue {
        /// Parameter name.
        parameter: String,
        /// Facet that was queried.
        search_key: String,
        /// The rejected value.
        value: String,
    },
}

impl ParameterError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::TypeMismatch { .. } => "TYPE_MISMATCH",
            Self::MissingMandatoryParameter { .. } => "MISSING_MANDATORY_PARAMETER",
            Self::UnknownParameter { .. } => "UNKNOWN_PARAMETER",
            Self::UnknownSearchValue { .. } => "UNKNOWN_SEARCH_VALUE",
        }
    }

    /// The parameter this error concerns.
    pub fn parameter(&self) -> &str {
        match self {
            Self::TypeMismatch { parameter, .. }
            | Self::MissingMandatoryParameter { parameter }
            | Self::UnknownParameter { parameter }
            | Self::UnknownSearchValue { parameter, .. } => parameter,
        }
    }
}
