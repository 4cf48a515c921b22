//! Worksheet cell values

use std::borrow::Cow;

/// Tokens accepted as "true" in flag columns and boolean settings.
const TRUTHY_TOKENS: &[&str] = &["yes", "y", "true", "t", "si", "1"];

/// A single cell value as stored in the workbook
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// Build a text cell
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// True for empty cells and for text that is blank after trimming.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Trim textual values, leave other values untouched.
    pub fn trimmed(&self) -> CellValue {
        match self {
            CellValue::Text(s) => CellValue::Text(s.trim().to_string()),
            other => other.clone(),
        }
    }

    /// Render the value as text. Empty cells and blank text yield `None`.
    ///
    /// Integral numbers drop the fractional part (`255.0` → `"255"`), which matters
    /// for length tokens typed as numbers in the workbook.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(Cow::Borrowed(trimmed))
                }
            }
            CellValue::Number(n) => Some(Cow::Owned(format_number(*n))),
            CellValue::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
        }
    }

    /// Render the value as an owned string, if any.
    pub fn to_text(&self) -> Option<String> {
        self.as_text().map(Cow::into_owned)
    }

    /// Check for the exact (trimmed) text `marker`.
    pub fn is_marker(&self, marker: &str) -> bool {
        matches!(self, CellValue::Text(s) if s.trim() == marker)
    }

    /// Interpret a flag cell (`yes`, `y`, `true`, `t`, `si`, `1`, case-insensitive).
    ///
    /// Everything else, including empty cells, is false.
    pub fn is_truthy(&self) -> bool {
        match self {
            CellValue::Bool(b) => *b,
            CellValue::Number(n) => *n == 1.0,
            CellValue::Text(s) => {
                let token = s.trim().to_lowercase();
                TRUTHY_TOKENS.contains(&token.as_str())
            }
            CellValue::Empty => false,
        }
    }

    /// JSON form used for settings kept verbatim in the metadata document.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CellValue::Empty => serde_json::Value::String(String::new()),
            CellValue::Text(s) => serde_json::Value::String(s.trim().to_string()),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    serde_json::Value::from(*n as i64)
                } else {
                    serde_json::Number::from_f64(*n)
                        .map(serde_json::Value::Number)
                        .unwrap_or(serde_json::Value::Null)
                }
            }
            CellValue::Bool(b) => serde_json::Value::Bool(*b),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
