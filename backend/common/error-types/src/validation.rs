//! Field-level violations
//!
//! Structured record of which field broke which rule. Attached to `Parse` errors
//! (provider contract) and `Validation` errors (user input) alike.

use serde::Serialize;

/// Individual field violation
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{field}: {message}")]
pub struct FieldViolation {
    /// Dotted field path, e.g. `online_price.high`
    pub field: String,

    /// Rule code, e.g. "length", "range", "price_range"
    pub code: String,

    /// Human-readable message
    pub message: String,
}

impl FieldViolation {
    pub fn new(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Flatten `validator` errors into violations, prefixing each field with `prefix`
///
/// Output is sorted by field so messages are deterministic.
pub fn violations_from(prefix: &str, errors: &validator::ValidationErrors) -> Vec<FieldViolation> {
    let mut violations: Vec<FieldViolation> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let path = if prefix.is_empty() {
                field.to_string()
            } else {
                format!("{}.{}", prefix, field)
            };
            errs.iter().map(move |e| FieldViolation {
                field: path.clone(),
                code: e.code.to_string(),
                message: e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| describe(e)),
            })
        })
        .collect();

    violations.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.code.cmp(&b.code)));
    violations
}

/// Summary line for logs
pub fn summarize(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn describe(error: &validator::ValidationError) -> String {
    let bound = |name: &str| error.params.get(name).map(|v| v.to_string());

    match error.code.as_ref() {
        "length" => match (bound("min"), bound("max")) {
            (Some(min), Some(max)) => format!("{}〜{}文字で入力してください", min, max),
            (None, Some(max)) => format!("{}文字以内で入力してください", max),
            (Some(min), None) => format!("{}文字以上で入力してください", min),
            (None, None) => "文字数が不正です".to_string(),
        },
        "range" => match (bound("min"), bound("max")) {
            (Some(min), Some(max)) => format!("{}〜{}の範囲で入力してください", min, max),
            (None, Some(max)) => format!("{}以下で入力してください", max),
            (Some(min), None) => format!("{}以上で入力してください", min),
            (None, None) => "値が範囲外です".to_string(),
        },
        other => format!("入力値が不正です ({})", other),
    }
}
