// SPDX-License-Identifier: MIT OR Apache-2.0
//! Parsing helpers for `--param KEY=VALUE` flags and parameter files.

use anyhow::{Context, Result};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::path::Path;

/// Parse a `KEY=VALUE` style CLI flag payload.
///
/// Returns an error if `=` is missing or if the key portion is empty.
pub fn parse_key_value_flag(raw: &str, flag_name: &str) -> Result<(String, String)> {
    let (raw_key, raw_value) = raw
        .split_once('=')
        .with_context(|| format!("{flag_name} expects KEY=VALUE, got '{raw}'"))?;

    let key = raw_key.trim();
    if key.is_empty() {
        anyhow::bail!("{flag_name} key cannot be empty (got '{raw}')");
    }

    Ok((key.to_string(), raw_value.to_string()))
}

/// Read a JSON object of supplied values from `path`.
pub fn read_params_file(path: &Path) -> Result<BTreeMap<String, JsonValue>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read params file '{}'", path.display()))?;
    let value: JsonValue = serde_json::from_str(&content)
        .with_context(|| format!("parse JSON from '{}'", path.display()))?;
    match value {
        JsonValue::Object(map) => Ok(map.into_iter().collect()),
        other => anyhow::bail!(
            "params file '{}' must hold a JSON object, got {other}",
            path.display()
        ),
    }
}

/// Merge a params file with `--param` flags; flags win.
///
/// Flag values stay strings and are coerced by the resolver against each
/// parameter's declared kind.
pub fn collect_supplied(
    flags: &[String],
    params_file: Option<&Path>,
) -> Result<BTreeMap<String, JsonValue>> {
    let mut supplied = match params_file {
        Some(path) => read_params_file(path)?,
        None => BTreeMap::new(),
    };
    for raw in flags {
        let (key, value) = parse_key_value_flag(raw, "--param")?;
        supplied.insert(key, JsonValue::String(value));
    }
    Ok(supplied)
}
