// SPDX-License-Identifier: MIT OR Apache-2.0
//! Parameter resolution for tool manifests.
//!
//! [`resolve`] merges caller-supplied raw values with the defaults declared by
//! a [`ToolDescriptor`](tooldef_manifest::ToolDescriptor), coerces each value
//! to its declared kind, and yields a [`ResolvedParameterSet`] ready to be
//! written as the tool's JSON transport document.
//!
//! Resolution is fail-fast: the first problem found is returned.
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod coerce;
mod error;
mod resolver;
mod set;

pub use error::ParameterError;
pub use resolver::{Resolver, SearchLookup, resolve};
pub use set::ResolvedParameterSet;
pub use tooldef_manifest::ParameterValue;
