use jsonpath_lib::select;
use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Evaluates a JSONPath expression. Zero matches give `None`, one match gives the
/// value itself, several give an array of the matches. Paths without a leading `$`
/// are taken relative to the root (`data.id` is `$.data.id`).
pub fn extract(document: &Value, path: &str) -> Result<Option<Value>, String> {
    let normalized = normalize(path);
    // jsonpath_lib panics on some malformed slices such as `[1:0:0]`.
    let matches = catch_unwind(AssertUnwindSafe(|| select(document, &normalized)))
        .map_err(|_| format!("invalid JSONPath '{path}'"))?
        .map_err(|e| format!("invalid JSONPath '{path}': {e}"))?;

    match matches.len() {
        0 => Ok(None),
        1 => Ok(Some(matches[0].clone())),
        _ => Ok(Some(Value::Array(
            matches.into_iter().cloned().collect(),
        ))),
    }
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.starts_with('$') {
        trimmed.to_string()
    } else if trimmed.starts_with('[') {
        format!("${trimmed}")
    } else {
        format!("$.{trimmed}")
    }
}
