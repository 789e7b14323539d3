// SPDX-License-Identifier: MIT OR Apache-2.0
//! TOML to [`ToolDescriptor`] conversion.
//!
//! Parsing happens in two stages: `toml` deserializes into loosely typed raw
//! structs (every field optional), then [`validate`] walks them in document
//! order and either builds the descriptor or returns the first violation.

use crate::descriptor::{
    BuildSpec, ParameterKind, ParameterSpec, ParameterType, RangeTriple, RunSpec, ToolDescriptor,
};
use crate::error::ManifestError;
use crate::version::ToolVersion;
use serde::Deserialize;
use serde_json::Number;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Manifest file names searched by [`discover`], in priority order.
pub const MANIFEST_FILE_NAMES: &[&str] = &["tool.toml", "pyproject.toml"];

// ---------------------------------------------------------------------------
// Raw TOML shape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawDocument {
    tool: Option<RawTool>,
    project: Option<RawProject>,
}

/// `[project]` in a `pyproject.toml`; only the version is consulted.
#[derive(Debug, Deserialize)]
struct RawProject {
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTool {
    name: Option<String>,
    version: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    summary: Option<String>,
    title: Option<String>,
    description: Option<String>,
    run: Option<RawRun>,
    build: Option<RawBuild>,
    #[serde(default)]
    input_parameters: toml::Table,
}

#[derive(Debug, Deserialize)]
struct RawRun {
    command: Option<String>,
    #[serde(default)]
    dependencies: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawBuild {
    #[serde(default)]
    dependencies: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawParameter {
    title: Option<String>,
    #[serde(default)]
    help: String,
    #[serde(alias = "type")]
    kind: Option<String>,
    mandatory: Option<bool>,
    default: Option<toml::Value>,
    search_key: Option<String>,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Load a descriptor from raw manifest bytes.
pub fn load(source: &[u8]) -> Result<ToolDescriptor, ManifestError> {
    let text = std::str::from_utf8(source).map_err(|e| ManifestError::Parse {
        reason: format!("manifest is not valid UTF-8: {e}"),
    })?;
    load_str(text)
}

/// Load a descriptor from manifest text.
pub fn load_str(text: &str) -> Result<ToolDescriptor, ManifestError> {
    let raw = match toml::from_str::<RawDocument>(text) {
        Ok(raw) => raw,
        Err(e) => {
            if e.message().contains("duplicate")
                && let Some(parameter) = find_duplicate_parameter(text)
            {
                return Err(ManifestError::DuplicateParameter { parameter });
            }
            return Err(ManifestError::Parse {
                reason: e.to_string().trim_end().to_string(),
            });
        }
    };
    let descriptor = validate(raw)?;
    debug!(
        tool = %descriptor.name,
        version = %descriptor.version,
        parameters = descriptor.parameters.len(),
        "loaded tool manifest"
    );
    Ok(descriptor)
}

/// Read and load exactly one manifest file.
pub fn load_file(path: &Path) -> Result<ToolDescriptor, ManifestError> {
    let bytes = std::fs::read(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load(&bytes)
}

/// Locate the manifest inside a tool directory.
///
/// `tool.toml` wins over `pyproject.toml` when both exist.
pub fn discover(dir: &Path) -> Result<PathBuf, ManifestError> {
    MANIFEST_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
        .ok_or_else(|| ManifestError::NotFound {
            dir: dir.to_path_buf(),
        })
}

/// [`discover`] the manifest in `dir` and load it.
pub fn load_dir(dir: &Path) -> Result<ToolDescriptor, ManifestError> {
    let path = discover(dir)?;
    debug!(path = %path.display(), "discovered tool manifest");
    load_file(&path)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(raw: RawDocument) -> Result<ToolDescriptor, ManifestError> {
    let project_version = raw.project.and_then(|p| p.version);
    let tool = raw.tool.ok_or_else(|| missing("tool"))?;

    let name = required(tool.name, "tool.name")?;
    let version_text = required(tool.version.or(project_version), "tool.version")?;
    let version =
        ToolVersion::parse(&version_text).map_err(|source| ManifestError::InvalidVersion {
            version: version_text.clone(),
            source,
        })?;

    let run = tool.run.ok_or_else(|| missing("tool.run.command"))?;
    let run = RunSpec {
        command: required(run.command, "tool.run.command")?,
        dependencies: dependency_set(run.dependencies),
    };
    let build = tool.build.map(|b| BuildSpec {
        dependencies: dependency_set(b.dependencies),
    });

    let mut parameters = Vec::with_capacity(tool.input_parameters.len());
    for (pname, value) in tool.input_parameters {
        let raw_param = RawParameter::deserialize(value).map_err(|e| ManifestError::Parse {
            reason: format!("tool.input_parameters.{pname}: {}", e.message()),
        })?;
        parameters.push(validate_parameter(pname, raw_param)?);
    }

    Ok(ToolDescriptor {
        name,
        version,
        authors: tool.authors,
        summary: tool.summary.unwrap_or_default(),
        title: tool.title,
        description: tool.description,
        run,
        build,
        parameters,
    })
}

fn validate_parameter(name: String, raw: RawParameter) -> Result<ParameterSpec, ManifestError> {
    let kind = match raw.kind.as_deref() {
        None => ParameterKind::String,
        Some(text) => {
            ParameterKind::parse(text).ok_or_else(|| ManifestError::UnknownParameterKind {
                parameter: name.clone(),
                kind: text.to_string(),
            })?
        }
    };

    let mandatory = raw.mandatory.unwrap_or(false);
    let default = match (mandatory, raw.default) {
        (true, Some(_)) => {
            return Err(ManifestError::ConflictingParameterSpec { parameter: name });
        }
        (true, None) => None,
        (false, None) => {
            return Err(ManifestError::InvalidDefault {
                parameter: name,
                reason: "optional parameters must declare a default".into(),
            });
        }
        (false, Some(v)) => Some(v),
    };

    let ty = match kind {
        ParameterKind::String => ParameterType::String {
            default: default.map(|v| expect_string(&name, v)).transpose()?,
        },
        ParameterKind::Integer => ParameterType::Integer {
            default: default.map(|v| expect_integer(&name, v)).transpose()?,
        },
        ParameterKind::Float => ParameterType::Float {
            default: default.map(|v| expect_float(&name, v)).transpose()?,
        },
        ParameterKind::Bool => ParameterType::Bool {
            default: default.map(|v| expect_bool(&name, v)).transpose()?,
        },
        ParameterKind::Range => ParameterType::Range {
            default: default.map(|v| expect_range(&name, v)).transpose()?,
        },
        ParameterKind::Databrowser => {
            let default = default.map(|v| expect_string(&name, v)).transpose()?;
            let search_key = match raw.search_key {
                Some(k) if !k.trim().is_empty() => k,
                _ => return Err(missing(&format!("tool.input_parameters.{name}.search_key"))),
            };
            ParameterType::Databrowser {
                search_key,
                default,
            }
        }
    };

    Ok(ParameterSpec {
        title: raw.title.unwrap_or_else(|| name.clone()),
        help: raw.help,
        name,
        ty,
    })
}

fn missing(field: &str) -> ManifestError {
    ManifestError::MissingField {
        field: field.to_string(),
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, ManifestError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(missing(field)),
    }
}

fn dependency_set(deps: Vec<String>) -> BTreeSet<String> {
    deps.into_iter()
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// Typed defaults
// ---------------------------------------------------------------------------

fn wrong_type(parameter: &str, expected: ParameterKind, got: &toml::Value) -> ManifestError {
    ManifestError::InvalidDefault {
        parameter: parameter.to_string(),
        reason: format!("expected {expected}, got {}", got.type_str()),
    }
}

fn expect_string(parameter: &str, v: toml::Value) -> Result<String, ManifestError> {
    match v {
        toml::Value::String(s) => Ok(s),
        other => Err(wrong_type(parameter, ParameterKind::String, &other)),
    }
}

fn expect_integer(parameter: &str, v: toml::Value) -> Result<i64, ManifestError> {
    match v {
        toml::Value::Integer(i) => Ok(i),
        other => Err(wrong_type(parameter, ParameterKind::Integer, &other)),
    }
}

fn expect_float(parameter: &str, v: toml::Value) -> Result<f64, ManifestError> {
    match v {
        toml::Value::Float(f) if f.is_finite() => Ok(f),
        toml::Value::Float(_) => Err(ManifestError::InvalidDefault {
            parameter: parameter.to_string(),
            reason: "float default must be finite".into(),
        }),
        toml::Value::Integer(i) => Ok(i as f64),
        other => Err(wrong_type(parameter, ParameterKind::Float, &other)),
    }
}

fn expect_bool(parameter: &str, v: toml::Value) -> Result<bool, ManifestError> {
    match v {
        toml::Value::Boolean(b) => Ok(b),
        other => Err(wrong_type(parameter, ParameterKind::Bool, &other)),
    }
}

fn expect_range(parameter: &str, v: toml::Value) -> Result<RangeTriple, ManifestError> {
    let invalid = |reason: String| ManifestError::InvalidRangeSpec {
        parameter: parameter.to_string(),
        reason,
    };
    let items = match v {
        toml::Value::Array(items) => items,
        other => {
            return Err(invalid(format!(
                "expected [start, end, step], got {}",
                other.type_str()
            )));
        }
    };
    let numbers: Vec<serde_json::Value> = items
        .iter()
        .map(|item| match item {
            toml::Value::Integer(i) => serde_json::Value::from(*i),
            toml::Value::Float(f) => Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            _ => serde_json::Value::Null,
        })
        .collect();
    RangeTriple::from_json(&numbers).map_err(|e| invalid(e.to_string()))
}

// ---------------------------------------------------------------------------
// Duplicate detection
// ---------------------------------------------------------------------------

/// Where a parameter's table was first defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Header,
    Dotted { section: usize },
}

/// Find a parameter whose table is defined more than once.
///
/// A parameter table is defined either by its own
/// `[tool.input_parameters.<name>]` header or by dotted keys under a shorter
/// header such as `[tool.input_parameters]`. Lines inside multi-line strings
/// are skipped. Only consulted after `toml` has reported a duplicate key.
fn find_duplicate_parameter(text: &str) -> Option<String> {
    let mut origins: HashMap<String, Origin> = HashMap::new();
    let mut table: Vec<String> = Vec::new();
    let mut section = 0usize;
    let mut open_string: Option<&'static str> = None;

    for line in text.lines() {
        if let Some(delim) = open_string {
            if line.contains(delim) {
                open_string = None;
            }
            continue;
        }
        let line = line.trim_start();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(rest) = line.strip_prefix("[[") {
            table = split_key(rest, ']').map(|(path, _)| path).unwrap_or_default();
            section += 1;
            continue;
        }
        if let Some(rest) = line.strip_prefix('[') {
            let Some((path, _)) = split_key(rest, ']') else {
                continue;
            };
            section += 1;
            if path.len() == 3
                && let Some(name) = parameter_name(&path)
                && origins.insert(name.to_string(), Origin::Header).is_some()
            {
                return Some(name.to_string());
            }
            table = path;
            continue;
        }

        let Some((key, value)) = split_key(line, '=') else {
            continue;
        };
        open_string = opens_multiline_string(value);
        if table.len() >= 3 {
            continue;
        }
        let full: Vec<String> = table.iter().chain(key.iter()).cloned().collect();
        let Some(name) = parameter_name(&full) else {
            continue;
        };
        let assigns_whole_table = full.len() == 3;
        match origins.get(name) {
            None => {
                origins.insert(name.to_string(), Origin::Dotted { section });
            }
            Some(Origin::Dotted { section: first })
                if *first == section && !assigns_whole_table => {}
            Some(_) => return Some(name.to_string()),
        }
    }
    None
}

/// `<name>` when `path` starts with `tool.input_parameters.<name>`.
fn parameter_name(path: &[String]) -> Option<&str> {
    match path {
        [tool, params, name, ..] if tool == "tool" && params == "input_parameters" => {
            Some(name.as_str())
        }
        _ => None,
    }
}

/// The closing delimiter when `value` opens a multi-line string that does not
/// close on the same line.
fn opens_multiline_string(value: &str) -> Option<&'static str> {
    let value = value.trim_start();
    for delim in ["\"\"\"", "'''"] {
        if let Some(rest) = value.strip_prefix(delim) {
            return (!rest.contains(delim)).then_some(delim);
        }
    }
    None
}

/// Split a dotted key such as `a."b.c"` up to the unquoted `end` character.
///
/// Returns the key segments and the text after `end`, or `None` when the line
/// is not a key (array items, inline table bodies).
fn split_key(line: &str, end: char) -> Option<(Vec<String>, &str)> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for (i, c) in line.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, c) if c == end => {
                segments.push(current.trim().to_string());
                return Some((segments, &line[i + c.len_utf8()..]));
            }
            (None, '"' | '\'') => quote = Some(c),
            (None, '.') => segments.push(std::mem::take(&mut current).trim().to_string()),
            (None, '#' | '[' | ']' | '{' | '}' | ',') => return None,
            (None, c) => current.push(c),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [tool]
        name = "demo"
        version = "0.1.0"

        [tool.run]
        command = "python3 demo.py"
    "#;

    #[test]
    fn minimal_manifest_loads() {
        let d = load_str(MINIMAL).unwrap();
        assert_eq!(d.name, "demo");
        assert_eq!(d.version.to_string(), "0.1.0");
        assert!(d.parameters.is_empty());
        assert!(d.build.is_none());
        assert!(d.summary.is_empty());
    }

    #[test]
    fn missing_tool_table() {
        let err = load_str("[project]\nname = \"x\"").unwrap_err();
        assert!(matches!(err, ManifestError::MissingField { ref field } if field == "tool"));
    }

    #[test]
    fn split_key_handles_quotes_and_comments() {
        let (path, rest) = split_key(r#"tool.input_parameters."a.b"] # note"#, ']').unwrap();
        assert_eq!(path, ["tool", "input_parameters", "a.b"]);
        assert_eq!(rest, " # note");
        let (key, value) = split_key("a . kind = \"x=y\"", '=').unwrap();
        assert_eq!(key, ["a", "kind"]);
        assert_eq!(value, " \"x=y\"");
        assert_eq!(split_key("  0, 10, 1,", '='), None);
        assert_eq!(split_key("[1, 2]", '='), None);
    }

    #[test]
    fn duplicate_scan_finds_second_declaration() {
        let text = "[tool.input_parameters.x]\n[tool.input_parameters.y]\n[tool.input_parameters.x]\n";
        assert_eq!(find_duplicate_parameter(text).as_deref(), Some("x"));
        assert_eq!(find_duplicate_parameter(MINIMAL), None);
    }

    #[test]
    fn duplicate_scan_sees_dotted_keys() {
        let text = "[tool.input_parameters.a]\nkind = \"string\"\n[tool.input_parameters]\na.kind = \"bool\"\n";
        assert_eq!(find_duplicate_parameter(text).as_deref(), Some("a"));

        let text = "[tool]\ninput_parameters.b.kind = \"bool\"\n[tool.input_parameters.b]\n";
        assert_eq!(find_duplicate_parameter(text).as_deref(), Some("b"));
    }

    #[test]
    fn dotted_keys_of_one_table_are_not_duplicates() {
        let text = "[tool.input_parameters]\na.kind = \"bool\"\na.default = true\nb.default = \"x\"\n";
        assert_eq!(find_duplicate_parameter(text), None);
    }

    #[test]
    fn duplicate_scan_skips_multiline_strings() {
        let text = "[tool]\ndescription = \"\"\"\n[tool.input_parameters.a]\n\"\"\"\n[tool.input_parameters.a]\n";
        assert_eq!(find_duplicate_parameter(text), None);

        let text = "[tool]\nnote = '''\n[tool.input_parameters.a]\n'''\n[tool.input_parameters.a]\n";
        assert_eq!(find_duplicate_parameter(text), None);

        let text = "[tool]\nsummary = \"\"\"one line\"\"\"\n[tool.input_parameters.a]\n[tool.input_parameters.a]\n";
        assert_eq!(find_duplicate_parameter(text).as_deref(), Some("a"));
    }

    #[test]
    fn invalid_utf8_is_a_parse_error() {
        let err = load(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
    }

    #[test]
    fn integer_literal_is_accepted_for_float() {
        let text = format!(
            "{MINIMAL}\n[tool.input_parameters.f]\nkind = \"float\"\ndefault = 2\n"
        );
        let d = load_str(&text).unwrap();
        assert_eq!(
            d.parameters[0].ty,
            ParameterType::Float { default: Some(2.0) }
        );
    }
}
