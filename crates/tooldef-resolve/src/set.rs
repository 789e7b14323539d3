// SPDX-License-Identifier: MIT OR Apache-2.0
//! The resolved, serializable parameter set.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use tooldef_manifest::ParameterValue;

/// One concrete value per declared parameter, in declaration order.
///
/// Serializes to the transport document: a JSON object whose keys appear in
/// declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedParameterSet {
    entries: Vec<(String, ParameterValue)>,
}

impl ResolvedParameterSet {
    pub(crate) fn from_entries(entries: Vec<(String, ParameterValue)>) -> Self {
        Self { entries }
    }

    /// Value of parameter `name`.
    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Number of resolved parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when the tool declares no parameters.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// The transport document as a JSON value.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.entries
                .iter()
                .map(|(n, v)| (n.clone(), v.to_json()))
                .collect(),
        )
    }

    /// The transport document as compact JSON text.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// The transport document as indented JSON text.
    pub fn to_json_string_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for ResolvedParameterSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'a> IntoIterator for &'a ResolvedParameterSet {
    type Item = (&'a str, &'a ParameterValue);
    type IntoIter = Box<dyn Iterator<Item = Self::Item> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
