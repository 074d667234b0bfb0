use crate::recognition::error::RecognitionError;
use serde::{Deserialize, Serialize};

/// One expression/result pair returned by the recognition service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecognitionEntry {
    pub expr: String,
    pub result: String,
    pub assign: bool,
}

impl RecognitionEntry {
    pub fn new(expr: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            expr: expr.into(),
            result: result.into(),
            assign: false,
        }
    }

    pub fn assignment(expr: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            assign: true,
            ..Self::new(expr, result)
        }
    }
}

#[derive(Debug, Deserialize)]
struct EntryWire {
    expr: String,
    result: String,
    #[serde(default)]
    assign: Option<bool>,
}

/// Parses the service answer into entries, rejecting the whole batch on the
/// first schema violation.
pub fn parse_entries(raw: &str) -> Result<Vec<RecognitionEntry>, RecognitionError> {
    let body = strip_code_fence(raw);
    let wire: Vec<EntryWire> = serde_json::from_str(body)
        .map_err(|err| RecognitionError::parse(format!("invalid entry array: {err}"), raw))?;

    wire.into_iter()
        .enumerate()
        .map(|(index, entry)| {
            if entry.expr.trim().is_empty() {
                return Err(RecognitionError::parse(
                    format!("entry {index} has an empty `expr`"),
                    raw,
                ));
            }
            if entry.result.trim().is_empty() {
                return Err(RecognitionError::parse(
                    format!("entry {index} has an empty `result`"),
                    raw,
                ));
            }
            Ok(RecognitionEntry {
                expr: entry.expr,
                result: entry.result,
                assign: entry.assign.unwrap_or(false),
            })
        })
        .collect()
}

/// Removes one surrounding Markdown code fence, e.g. "```json\n[...]\n```".
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    match body.find('\n') {
        Some(newline) => body[newline + 1..].trim(),
        None => body.trim(),
    }
}
