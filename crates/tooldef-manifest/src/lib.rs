// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tool manifest loading and validation.
//!
//! A manifest is a TOML document with a `[tool]` table, a `[tool.run]` table,
//! an optional `[tool.build]` table, and zero or more
//! `[tool.input_parameters.<name>]` tables. [`load`] turns it into an immutable
//! [`ToolDescriptor`] or fails with the first [`ManifestError`] found.
//!
//! ```
//! let manifest = r#"
//! [tool]
//! name = "anomalies"
//! version = "1.0.0"
//!
//! [tool.run]
//! command = "python3 anomalies.py"
//!
//! [tool.input_parameters.threshold]
//! kind = "float"
//! default = 0.5
//! "#;
//! let tool = tooldef_manifest::load(manifest.as_bytes()).unwrap();
//! assert_eq!(tool.parameters.len(), 1);
//! assert!(!tool.parameters[0].is_mandatory());
//! ```
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod descriptor;
mod error;
mod lint;
mod loader;
mod version;

pub use descriptor::{
    BuildSpec, ParameterKind, ParameterSpec, ParameterType, ParameterValue, RangeError,
    RangeTriple, RunSpec, ToolDescriptor,
};
pub use error::ManifestError;
pub use lint::{DependencySpec, ManifestWarning, lint_descriptor};
pub use loader::{MANIFEST_FILE_NAMES, discover, load, load_dir, load_file, load_str};
pub use version::{ToolVersion, VersionError};
