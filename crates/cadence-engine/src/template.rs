//! `{{dotted.path}}` template interpolation over JSON variables.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{([^{}]+)\}\}").unwrap());

fn resolve_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Replace each `{{dotted.path}}` placeholder by descending `variables`
/// along the dot-separated path.
///
/// A path with any missing segment leaves the placeholder verbatim; a
/// path that resolves renders the value's string form, so an explicit
/// null renders as "null" rather than the placeholder.
pub fn interpolate_template(template: &str, variables: &Value) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures| {
            let path = caps[1].trim();
            match resolve_path(variables, path) {
                Some(value) => stringify(value),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}
