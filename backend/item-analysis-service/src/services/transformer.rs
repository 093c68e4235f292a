//! Provider reply -> validated [`ItemAnalysis`]
use error_types::validation::summarize;
use error_types::{AppError, AppResult};
use tracing::{debug, warn};

use crate::models::ItemAnalysis;

/// Parse and validate the raw text returned by the vision provider
///
/// Everything that goes wrong here is a provider contract violation, so every failure
/// is a `Parse` error: bad JSON, wrong types, unknown enum values, missing required
/// fields, field rules and the `high >= low` price rule.
pub fn parse_item_analysis(raw: &str) -> AppResult<ItemAnalysis> {
    let json_str = extract_json(raw);

    let value: serde_json::Value = serde_json::from_str(json_str).map_err(|e| {
        warn!(error = %e, reply_len = raw.len(), "Provider reply is not valid JSON");
        AppError::parse().with_detail(format!("invalid JSON in provider reply: {}", e))
    })?;

    let analysis: ItemAnalysis = serde_json::from_value(value).map_err(|e| {
        warn!(error = %e, "Provider reply does not match the item schema");
        AppError::parse().with_detail(format!("schema mismatch in provider reply: {}", e))
    })?;

    let violations = analysis.contract_violations();
    if !violations.is_empty() {
        let summary = summarize(&violations);
        warn!(violations = %summary, "Provider reply violates field rules");
        return Err(AppError::parse()
            .with_detail(summary)
            .with_violations(violations));
    }

    debug!(
        category = ?analysis.category,
        action = ?analysis.recommended_action,
        "Provider reply accepted"
    );
    Ok(analysis)
}

/// Strip Markdown code fences that models like to wrap JSON in
///
/// A reply that already starts with an object is taken as is, so backticks inside
/// string values survive.
fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();
    if trimmed.starts_with('{') {
        return trimmed;
    }

    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };
    // Skip the opening fence line, including any language tag
    let after_open = &trimmed[open + 3..];
    let body = match after_open.find('\n') {
        Some(newline) => &after_open[newline + 1..],
        None => after_open.trim_start_matches("json"),
    };
    let body = match body.rfind("```") {
        Some(close) => &body[..close],
        None => body,
    };
    body.trim()
}
