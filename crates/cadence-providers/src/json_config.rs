//! JSON fallback config: entries under a top-level `mcpServers` object.
//!
//! Parse failures are never propagated; a missing or corrupt file is
//! treated as an empty document so the fallback write can proceed.

use std::path::Path;

use serde_json::{Map, Value, json};

/// Load a config document, substituting an empty object for a missing
/// file or a parse failure.
pub fn load_or_default(path: &Path) -> Map<String, Value> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Map::new();
    };
    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn write_doc(path: &Path, doc: &Map<String, Value>) -> std::io::Result<()> {
    let mut content = serde_json::to_string_pretty(&Value::Object(doc.clone()))
        .map_err(std::io::Error::other)?;
    content.push('\n');
    std::fs::write(path, content)
}

/// Upsert the named server entry, preserving all unrelated top-level
/// keys.
pub fn upsert_server(
    path: &Path,
    name: &str,
    command: &str,
    args: &[String],
) -> std::io::Result<()> {
    let mut doc = load_or_default(path);
    let servers = doc
        .entry("mcpServers".to_string())
        .or_insert_with(|| json!({}));
    if !servers.is_object() {
        *servers = json!({});
    }
    servers[name] = json!({ "command": command, "args": args });
    write_doc(path, &doc)
}

/// Remove the named server entry. A missing file or entry is a no-op.
pub fn remove_server(path: &Path, name: &str) -> std::io::Result<()> {
    if !path.exists() {
        return Ok(());
    }
    let mut doc = load_or_default(path);
    let removed = doc
        .get_mut("mcpServers")
        .and_then(Value::as_object_mut)
        .and_then(|servers| servers.remove(name))
        .is_some();
    if removed {
        write_doc(path, &doc)?;
    }
    Ok(())
}

/// True iff the named entry exists and its args contain `expected_path`.
pub fn is_registered(path: &Path, name: &str, expected_path: &str) -> bool {
    let doc = load_or_default(path);
    doc.get("mcpServers")
        .and_then(|servers| servers.get(name))
        .and_then(|entry| entry.get("args"))
        .and_then(Value::as_array)
        .is_some_and(|args| args.iter().any(|a| a.as_str() == Some(expected_path)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_preserves_unrelated_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"theme": "dark", "mcpServers": {"other": {"command": "x", "args": []}}}"#,
        )
        .unwrap();

        upsert_server(&path, "cadence", "cadence-mcp", &["--stdio".to_string()]).unwrap();

        let doc = load_or_default(&path);
        assert_eq!(doc["theme"], "dark");
        assert_eq!(doc["mcpServers"]["other"]["command"], "x");
        assert_eq!(doc["mcpServers"]["cadence"]["command"], "cadence-mcp");
    }

    #[test]
    fn test_upsert_overwrites_only_named_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        upsert_server(&path, "a", "cmd-a", &["1".to_string()]).unwrap();
        upsert_server(&path, "b", "cmd-b", &[]).unwrap();
        upsert_server(&path, "a", "cmd-a2", &["2".to_string()]).unwrap();

        let doc = load_or_default(&path);
        assert_eq!(doc["mcpServers"]["a"]["command"], "cmd-a2");
        assert_eq!(doc["mcpServers"]["a"]["args"][0], "2");
        assert_eq!(doc["mcpServers"]["b"]["command"], "cmd-b");
    }

    #[test]
    fn test_corrupt_file_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        upsert_server(&path, "cadence", "cadence-mcp", &[]).unwrap();
        let doc = load_or_default(&path);
        assert!(doc["mcpServers"]["cadence"].is_object());
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        remove_server(&path, "ghost").unwrap();
        assert!(!path.exists());

        upsert_server(&path, "a", "cmd", &[]).unwrap();
        remove_server(&path, "ghost").unwrap();
        let doc = load_or_default(&path);
        assert!(doc["mcpServers"]["a"].is_object());
    }

    #[test]
    fn test_is_registered_requires_path_match() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        upsert_server(&path, "cadence", "cadence-mcp", &["/srv/proj".to_string()]).unwrap();

        assert!(is_registered(&path, "cadence", "/srv/proj"));
        assert!(!is_registered(&path, "cadence", "/srv/other"));
        assert!(!is_registered(&path, "missing", "/srv/proj"));
        assert!(!is_registered(dir.path().join("none.json").as_path(), "cadence", "/srv/proj"));
    }
}
