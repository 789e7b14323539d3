// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-kind coercion of raw JSON values.
//!
//! Values arriving from a command line or a form are often strings, so every
//! non-string kind also accepts a textual spelling of its value.

use serde_json::{Number, Value};
use tooldef_manifest::{ParameterKind, ParameterValue, RangeTriple};

/// Coerce `raw` into a value of `kind`. The error is a human-readable reason.
pub(crate) fn coerce(kind: ParameterKind, raw: &Value) -> Result<ParameterValue, String> {
    match kind {
        ParameterKind::String | ParameterKind::Databrowser => match raw {
            Value::String(s) => Ok(ParameterValue::String(s.clone())),
            other => Err(format!("got {}", json_type(other))),
        },
        ParameterKind::Integer => integer(raw).map(ParameterValue::Integer),
        ParameterKind::Float => float(raw).map(ParameterValue::Float),
        ParameterKind::Bool => boolean(raw).map(ParameterValue::Bool),
        ParameterKind::Range => range(raw).map(ParameterValue::Range),
    }
}

fn integer(raw: &Value) -> Result<i64, String> {
    match raw {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| format!("{n} is not a 64-bit integer")),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("'{s}' is not an integer")),
        other => Err(format!("got {}", json_type(other))),
    }
}

fn float(raw: &Value) -> Result<f64, String> {
    let f = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        other => return Err(format!("got {}", json_type(other))),
    };
    match f {
        Some(f) if f.is_finite() => Ok(f),
        _ => Err(format!("{raw} is not a finite number")),
    }
}

fn boolean(raw: &Value) -> Result<bool, String> {
    match raw {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Ok(true),
        Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Ok(false),
        Value::String(s) => Err(format!("'{s}' is neither true nor false")),
        other => Err(format!("got {}", json_type(other))),
    }
}

fn range(raw: &Value) -> Result<RangeTriple, String> {
    let items = match raw {
        Value::Array(items) => items.clone(),
        Value::String(s) => range_items(s)?,
        other => return Err(format!("got {}", json_type(other))),
    };
    RangeTriple::from_json(&items).map_err(|e| e.to_string())
}

/// Split `"[0, 10, 1]"`, `"0,10,1"` or `"0:10:1"` into JSON numbers.
fn range_items(text: &str) -> Result<Vec<Value>, String> {
    let text = text.trim();
    if text.starts_with('[') {
        return serde_json::from_str::<Vec<Value>>(text)
            .map_err(|e| format!("'{text}' is not a JSON array: {e}"));
    }
    let sep = if text.contains(':') { ':' } else { ',' };
    text.split(sep)
        .map(|part| {
            number(part.trim())
                .map(Value::Number)
                .ok_or_else(|| format!("'{part}' in '{text}' is not a number"))
        })
        .collect()
}

/// Parse a number, keeping integers integral.
fn number(text: &str) -> Option<Number> {
    if let Ok(i) = text.parse::<i64>() {
        return Some(i.into());
    }
    text.parse::<f64>().ok().and_then(Number::from_f64)
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
