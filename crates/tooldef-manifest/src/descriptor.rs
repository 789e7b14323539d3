// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-memory representation of a validated tool manifest.

use crate::version::ToolVersion;
use schemars::JsonSchema;
use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;
use serde_json::Number;
use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// ToolDescriptor
// ---------------------------------------------------------------------------

/// Validated, immutable form of one tool manifest.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ToolDescriptor {
    /// Unique tool name.
    pub name: String,
    /// Semantic version of the tool.
    #[schemars(with = "String")]
    pub version: ToolVersion,
    /// Authors in declaration order.
    pub authors: Vec<String>,
    /// One-line summary (empty when not declared).
    pub summary: String,
    /// Optional display title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Optional long description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// How the tool is run.
    pub run: RunSpec,
    /// Build step, if the tool needs one before it can run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildSpec>,
    /// Input parameters in declaration order.
    pub parameters: Vec<ParameterSpec>,
}

impl ToolDescriptor {
    /// Look up a declared parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Names of all declared parameters in declaration order.
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|p| p.name.as_str())
    }

    /// Names of the parameters the caller must always supply.
    pub fn mandatory_parameters(&self) -> impl Iterator<Item = &str> {
        self.parameters
            .iter()
            .filter(|p| p.is_mandatory())
            .map(|p| p.name.as_str())
    }

    /// `true` when a build step must run before the tool is invoked.
    pub fn requires_build(&self) -> bool {
        self.build.is_some()
    }
}

/// The `[tool.run]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct RunSpec {
    /// Shell-invocable command; the parameter file path is appended as its only argument.
    pub command: String,
    /// Runtime package specifiers.
    pub dependencies: BTreeSet<String>,
}

/// The `[tool.build]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct BuildSpec {
    /// Build-time package specifiers.
    pub dependencies: BTreeSet<String>,
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// One input parameter's contract.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ParameterSpec {
    /// Parameter name (the key under `[tool.input_parameters]`).
    pub name: String,
    /// Display title.
    pub title: String,
    /// Help text.
    pub help: String,
    /// Kind and typed default.
    #[serde(flatten)]
    pub ty: ParameterType,
}

impl ParameterSpec {
    /// The declared kind.
    pub fn kind(&self) -> ParameterKind {
        self.ty.kind()
    }

    /// A parameter is mandatory exactly when it has no default.
    pub fn is_mandatory(&self) -> bool {
        self.ty.default_value().is_none()
    }

    /// The default as a transport value, if any.
    pub fn default_value(&self) -> Option<ParameterValue> {
        self.ty.default_value()
    }
}

/// Closed set of parameter kinds, each carrying a default of its own type.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParameterType {
    /// Free-form text.
    String {
        /// Default value.
        #[serde(skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },
    /// Signed 64-bit integer.
    Integer {
        /// Default value.
        #[serde(skip_serializing_if = "Option::is_none")]
        default: Option<i64>,
    },
    /// Finite 64-bit float.
    Float {
        /// Default value.
        #[serde(skip_serializing_if = "Option::is_none")]
        default: Option<f64>,
    },
    /// Boolean flag.
    Bool {
        /// Default value.
        #[serde(skip_serializing_if = "Option::is_none")]
        default: Option<bool>,
    },
    /// `[start, end, step]` triple, interpreted by the tool itself.
    Range {
        /// Default value.
        #[serde(skip_serializing_if = "Option::is_none")]
        default: Option<RangeTriple>,
    },
    /// Value looked up in an external data-search facility.
    Databrowser {
        /// Facet to query in the search facility.
        search_key: String,
        /// Default value.
        #[serde(skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },
}

impl ParameterType {
    /// The fieldless kind tag of this variant.
    pub fn kind(&self) -> ParameterKind {
        match self {
            Self::String { .. } => ParameterKind::String,
            Self::Integer { .. } => ParameterKind::Integer,
            Self::Float { .. } => ParameterKind::Float,
            Self::Bool { .. } => ParameterKind::Bool,
            Self::Range { .. } => ParameterKind::Range,
            Self::Databrowser { .. } => ParameterKind::Databrowser,
        }
    }

    /// The default converted to a transport value.
    pub fn default_value(&self) -> Option<ParameterValue> {
        match self {
            Self::String { default } | Self::Databrowser { default, .. } => {
                default.clone().map(ParameterValue::String)
            }
            Self::Integer { default } => default.map(ParameterValue::Integer),
            Self::Float { default } => default.map(ParameterValue::Float),
            Self::Bool { default } => default.map(ParameterValue::Bool),
            Self::Range { default } => default.clone().map(ParameterValue::Range),
        }
    }
}

/// Kind tag used in manifests and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// `string`
    String,
    /// `integer`
    Integer,
    /// `float`
    Float,
    /// `bool`
    Bool,
    /// `range`
    Range,
    /// `databrowser`
    Databrowser,
}

impl ParameterKind {
    /// All kinds, in manifest documentation order.
    pub const ALL: [ParameterKind; 6] = [
        Self::String,
        Self::Integer,
        Self::Float,
        Self::Bool,
        Self::Range,
        Self::Databrowser,
    ];

    /// Manifest spelling of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Range => "range",
            Self::Databrowser => "databrowser",
        }
    }

    /// Parse the manifest spelling (case-insensitive, surrounding whitespace ignored).
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RangeTriple
// ---------------------------------------------------------------------------

/// A validated `[start, end, step]` triple.
///
/// Elements keep their literal form: integers stay integers, floats stay floats.
#[derive(Debug, Clone, PartialEq, JsonSchema)]
pub struct RangeTriple {
    #[schemars(with = "f64")]
    start: Number,
    #[schemars(with = "f64")]
    end: Number,
    #[schemars(with = "f64")]
    step: Number,
}

/// Why a triple is not a well-formed range.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RangeError {
    /// Not exactly three elements.
    #[error("expected [start, end, step], got {0} element(s)")]
    Arity(usize),
    /// An element is not a finite number.
    #[error("element {index} is not a finite number")]
    NotNumeric {
        /// Zero-based position of the element.
        index: usize,
    },
    /// `step` is zero.
    #[error("step must not be zero")]
    ZeroStep,
    /// `start`/`end` order disagrees with the sign of `step`.
    #[error("start {start} and end {end} run against step {step}")]
    Direction {
        /// Start value.
        start: f64,
        /// End value.
        end: f64,
        /// Step value.
        step: f64,
    },
}

impl RangeTriple {
    /// Build a triple from three numbers, checking step and direction.
    pub fn new(start: Number, end: Number, step: Number) -> Result<Self, RangeError> {
        let [s, e, st] = [&start, &end, &step].map(|n| n.as_f64().unwrap_or(f64::NAN));
        for (index, v) in [s, e, st].into_iter().enumerate() {
            if !v.is_finite() {
                return Err(RangeError::NotNumeric { index });
            }
        }
        if st == 0.0 {
            return Err(RangeError::ZeroStep);
        }
        if (st > 0.0 && s > e) || (st < 0.0 && s < e) {
            return Err(RangeError::Direction {
                start: s,
                end: e,
                step: st,
            });
        }
        Ok(Self { start, end, step })
    }

    /// Build a triple from a slice of JSON values.
    pub fn from_json(values: &[serde_json::Value]) -> Result<Self, RangeError> {
        if values.len() != 3 {
            return Err(RangeError::Arity(values.len()));
        }
        let mut nums = Vec::with_capacity(3);
        for (index, v) in values.iter().enumerate() {
            match v {
                serde_json::Value::Number(n) => nums.push(n.clone()),
                _ => return Err(RangeError::NotNumeric { index }),
            }
        }
        let step = nums.pop().ok_or(RangeError::Arity(0))?;
        let end = nums.pop().ok_or(RangeError::Arity(1))?;
        let start = nums.pop().ok_or(RangeError::Arity(2))?;
        Self::new(start, end, step)
    }

    /// Convenience constructor for integer triples.
    pub fn integers(start: i64, end: i64, step: i64) -> Result<Self, RangeError> {
        Self::new(start.into(), end.into(), step.into())
    }

    /// Start value.
    pub fn start(&self) -> &Number {
        &self.start
    }

    /// End value.
    pub fn end(&self) -> &Number {
        &self.end
    }

    /// Step value.
    pub fn step(&self) -> &Number {
        &self.step
    }
}

impl Serialize for RangeTriple {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(3))?;
        seq.serialize_element(&self.start)?;
        seq.serialize_element(&self.end)?;
        seq.serialize_element(&self.step)?;
        seq.end()
    }
}

impl fmt::Display for RangeTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.start, self.end, self.step)
    }
}

// ---------------------------------------------------------------------------
// ParameterValue
// ---------------------------------------------------------------------------

/// A concrete, typed parameter value as written to the transport document.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    /// `string` and `databrowser` values.
    String(String),
    /// `integer` values.
    Integer(i64),
    /// `float` values.
    Float(f64),
    /// `bool` values.
    Bool(bool),
    /// `range` values, passed through unexpanded.
    Range(RangeTriple),
}

impl ParameterValue {
    /// Convert to the JSON representation used in the transport document.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Integer(i) => serde_json::Value::from(*i),
            Self::Float(f) => Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Range(r) => serde_json::Value::Array(vec![
                serde_json::Value::Number(r.start.clone()),
                serde_json::Value::Number(r.end.clone()),
                serde_json::Value::Number(r.step.clone()),
            ]),
        }
    }
}

impl Serialize for ParameterValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::String(s) => serializer.serialize_str(s),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Range(r) => r.serialize(serializer),
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Range(r) => write!(f, "{r}"),
        }
    }
}
