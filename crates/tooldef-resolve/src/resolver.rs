// SPDX-License-Identifier: MIT OR Apache-2.0
//! Resolution of supplied values against a [`ToolDescriptor`].

use crate::coerce::coerce;
use crate::error::ParameterError;
use crate::set::ResolvedParameterSet;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use tooldef_manifest::{ParameterType, ParameterValue, ToolDescriptor};
use tracing::{debug, trace};

/// External data-search facility consulted for `databrowser` parameters.
pub trait SearchLookup {
    /// `true` when `value` is a known value of the `search_key` facet.
    fn lookup(&self, search_key: &str, value: &str) -> bool;
}

impl<F> SearchLookup for F
where
    F: Fn(&str, &str) -> bool,
{
    fn lookup(&self, search_key: &str, value: &str) -> bool {
        self(search_key, value)
    }
}

/// Resolves supplied values, optionally checking `databrowser` values
/// against a [`SearchLookup`].
///
/// Without a lookup any string is accepted for a `databrowser` parameter.
#[derive(Default)]
pub struct Resolver {
    lookup: Option<Box<dyn SearchLookup + Send + Sync>>,
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("lookup", &self.lookup.is_some())
            .finish()
    }
}

impl Resolver {
    /// A resolver without a search lookup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check `databrowser` values with `lookup`.
    #[must_use]
    pub fn with_lookup<L>(mut self, lookup: L) -> Self
    where
        L: SearchLookup + Send + Sync + 'static,
    {
        self.lookup = Some(Box::new(lookup));
        self
    }

    /// Merge `supplied` with the declared defaults.
    ///
    /// Unknown keys are reported first, in sorted order. Declared parameters
    /// are then resolved in declaration order and the first failure is
    /// returned. A JSON `null` counts as not supplied.
    pub fn resolve(
        &self,
        descriptor: &ToolDescriptor,
        supplied: &BTreeMap<String, Value>,
    ) -> Result<ResolvedParameterSet, ParameterError> {
        if let Some(key) = supplied
            .keys()
            .find(|key| descriptor.parameter(key).is_none())
        {
            return Err(ParameterError::UnknownParameter {
                parameter: key.clone(),
            });
        }

        let mut entries = Vec::with_capacity(descriptor.parameters.len());
        for spec in &descriptor.parameters {
            let value = match supplied.get(&spec.name).filter(|v| !v.is_null()) {
                Some(raw) => {
                    let value = coerce(spec.kind(), raw).map_err(|reason| {
                        ParameterError::TypeMismatch {
                            parameter: spec.name.clone(),
                            expected: spec.kind(),
                            reason,
                        }
                    })?;
                    self.check_search(&spec.name, &spec.ty, &value)?;
                    trace!(parameter = %spec.name, %value, "using supplied value");
                    value
                }
                None => spec.default_value().ok_or_else(|| {
                    ParameterError::MissingMandatoryParameter {
                        parameter: spec.name.clone(),
                    }
                })?,
            };
            entries.push((spec.name.clone(), value));
        }

        debug!(
            tool = %descriptor.name,
            supplied = supplied.len(),
            resolved = entries.len(),
            "resolved parameters"
        );
        Ok(ResolvedParameterSet::from_entries(entries))
    }

    fn check_search(
        &self,
        parameter: &str,
        ty: &ParameterType,
        value: &ParameterValue,
    ) -> Result<(), ParameterError> {
        let (Some(lookup), ParameterType::Databrowser { search_key, .. }, ParameterValue::String(v)) =
            (&self.lookup, ty, value)
        else {
            return Ok(());
        };
        if lookup.lookup(search_key, v) {
            Ok(())
        } else {
            Err(ParameterError::UnknownSearchValue {
                parameter: parameter.to_string(),
                search_key: search_key.clone(),
                value: v.clone(),
            })
        }
    }
}

/// Resolve with a default [`Resolver`].
pub fn resolve(
    descriptor: &ToolDescriptor,
    supplied: &BTreeMap<String, Value>,
) -> Result<ResolvedParameterSet, ParameterError> {
    Resolver::new().resolve(descriptor, supplied)
}
