use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CellValue – a single spreadsheet cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value. One logical spreadsheet column may mix
/// numbers, numeric-looking text and blanks, so every cell carries its own tag.
///
/// Serialized untagged: `"abc"`, `3`, `2.5`, `true`, `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, "<null>"),
            other => write!(f, "{}", other.canonical_text().unwrap_or_default()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Integer(i)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float(v)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl CellValue {
    /// Guess a typed value from raw text, as a CSV cell or an edited grid cell.
    /// Empty text is a missing value.
    pub fn guess(s: &str) -> CellValue {
        if s.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::Float(f);
        }
        if s == "true" || s == "false" {
            return CellValue::Bool(s == "true");
        }
        CellValue::Text(s.to_string())
    }

    /// The value's string representation as a spreadsheet round-trip would
    /// write it: `1`, `1.0`, `2.5`, `true`. Missing cells have none.
    pub fn canonical_text(&self) -> Option<String> {
        match self {
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Integer(i) => Some(i.to_string()),
            CellValue::Float(v) => Some(format_float(*v)),
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::Null => None,
        }
    }

    /// Numeric interpretation: numbers as-is, text parsed after trimming.
    /// Booleans and missing cells have no numeric value.
    pub fn coerce_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Float(v) => Some(*v),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            CellValue::Bool(_) | CellValue::Null => None,
        }
    }

    /// Convert a JSON scalar. Integers that fit `i64` stay integers; arrays and
    /// objects are kept as their JSON text.
    pub fn from_json(val: &serde_json::Value) -> CellValue {
        use serde_json::Value;
        match val {
            Value::String(s) => CellValue::Text(s.clone()),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => CellValue::Integer(i),
                (None, Some(f)) => CellValue::Float(f),
                (None, None) => CellValue::Text(n.to_string()),
            },
            Value::Bool(b) => CellValue::Bool(*b),
            Value::Null => CellValue::Null,
            other => CellValue::Text(other.to_string()),
        }
    }
}

/// Floats without a fractional part keep a trailing `.0` so they stay
/// distinguishable from integers.
fn format_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}
