//! TOML fallback config: one `[mcp_servers.<name>]` section per server.
//!
//! Sections are edited by text splice rather than through a TOML document
//! model so that every byte of unrelated content survives a rewrite. An
//! upsert locates the exact section header, replaces the header and all
//! following lines up to (not including) the next section header or end
//! of file, and appends a new section when none exists. After an upsert
//! there is exactly one section with that header.

fn escape_toml_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Render a complete server section.
pub fn render_section(name: &str, command: &str, args: &[String]) -> String {
    let args_list = args
        .iter()
        .map(|a| format!("\"{}\"", escape_toml_string(a)))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "[mcp_servers.{name}]\ncommand = \"{}\"\nargs = [{args_list}]\n",
        escape_toml_string(command)
    )
}

/// Find the line span `[start, end)` of the named section: the header
/// line through the line before the next section header (or EOF).
fn section_span(lines: &[&str], name: &str) -> Option<(usize, usize)> {
    let header = format!("[mcp_servers.{name}]");
    let start = lines.iter().position(|line| line.trim() == header)?;
    let end = lines[start + 1..]
        .iter()
        .position(|line| line.trim_start().starts_with('['))
        .map_or(lines.len(), |offset| start + 1 + offset);
    Some((start, end))
}

fn join_lines(lines: &[&str]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Insert or replace the named server section.
pub fn upsert_section(content: &str, name: &str, command: &str, args: &[String]) -> String {
    let section = render_section(name, command, args);
    let lines: Vec<&str> = content.lines().collect();

    match section_span(&lines, name) {
        Some((start, end)) => {
            let mut out = join_lines(&lines[..start]);
            out.push_str(&section);
            out.push_str(&join_lines(&lines[end..]));
            out
        }
        None => {
            let mut out = join_lines(&lines);
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&section);
            out
        }
    }
}

/// Strip the named server section. Unknown names leave the content
/// unchanged.
pub fn remove_section(content: &str, name: &str) -> String {
    let lines: Vec<&str> = content.lines().collect();
    match section_span(&lines, name) {
        Some((start, end)) => {
            let mut out = join_lines(&lines[..start]);
            out.push_str(&join_lines(&lines[end..]));
            out
        }
        None => content.to_string(),
    }
}

/// True iff the named section exists and its `args` contain
/// `expected_path`. Unparsable content reads as unregistered.
pub fn is_registered(content: &str, name: &str, expected_path: &str) -> bool {
    let Ok(table) = content.parse::<toml::Table>() else {
        return false;
    };
    table
        .get("mcp_servers")
        .and_then(|servers| servers.get(name))
        .and_then(|entry| entry.get("args"))
        .and_then(|args| args.as_array())
        .is_some_and(|args| args.iter().any(|a| a.as_str() == Some(expected_path)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXISTING: &str = "\
model = \"o4\"

[profile.fast]
temperature = 0.2

[mcp_servers.other]
command = \"other-mcp\"
args = [\"--x\"]
";

    #[test]
    fn test_append_when_absent() {
        let updated = upsert_section(EXISTING, "cadence", "cadence-mcp", &["/srv".to_string()]);
        // Everything that was there survives untouched.
        assert!(updated.starts_with(EXISTING));
        assert!(updated.contains("[mcp_servers.cadence]\ncommand = \"cadence-mcp\"\nargs = [\"/srv\"]\n"));
    }

    #[test]
    fn test_replace_in_place() {
        let with_cadence = upsert_section(EXISTING, "cadence", "cadence-mcp", &["/a".to_string()]);
        let updated = upsert_section(&with_cadence, "cadence", "cadence-mcp", &["/b".to_string()]);

        assert_eq!(updated.matches("[mcp_servers.cadence]").count(), 1);
        assert!(updated.contains("args = [\"/b\"]"));
        assert!(!updated.contains("args = [\"/a\"]"));
        // The unrelated section is untouched.
        assert!(updated.contains("[mcp_servers.other]\ncommand = \"other-mcp\"\nargs = [\"--x\"]"));
        assert!(updated.contains("[profile.fast]"));
    }

    #[test]
    fn test_replace_stops_at_next_section_header() {
        let content = "\
[mcp_servers.cadence]
command = \"old\"
args = []

[profile.fast]
temperature = 0.2
";
        let updated = upsert_section(content, "cadence", "new", &[]);
        assert!(updated.contains("command = \"new\""));
        assert!(!updated.contains("command = \"old\""));
        assert!(updated.contains("[profile.fast]\ntemperature = 0.2"));
    }

    #[test]
    fn test_replace_last_section_through_eof() {
        let content = "\
[mcp_servers.cadence]
command = \"old\"
args = []
extra = true
";
        let updated = upsert_section(content, "cadence", "new", &[]);
        assert!(!updated.contains("extra = true"));
        assert_eq!(updated.matches("[mcp_servers.cadence]").count(), 1);
    }

    #[test]
    fn test_upsert_into_empty_file() {
        let updated = upsert_section("", "cadence", "cadence-mcp", &[]);
        assert_eq!(
            updated,
            "[mcp_servers.cadence]\ncommand = \"cadence-mcp\"\nargs = []\n"
        );
    }

    #[test]
    fn test_remove_section() {
        let with_cadence = upsert_section(EXISTING, "cadence", "cadence-mcp", &[]);
        let removed = remove_section(&with_cadence, "cadence");
        assert!(!removed.contains("[mcp_servers.cadence]"));
        assert!(removed.contains("[mcp_servers.other]"));

        // Removing an absent section changes nothing.
        assert_eq!(remove_section(EXISTING, "cadence"), EXISTING);
    }

    #[test]
    fn test_render_escapes_quotes_and_backslashes() {
        let section = render_section(
            "cadence",
            r#"C:\tools\mcp.exe"#,
            &[r#"say "hi""#.to_string()],
        );
        assert!(section.contains(r#"command = "C:\\tools\\mcp.exe""#));
        assert!(section.contains(r#"args = ["say \"hi\""]"#));
        // The rendered section parses back as valid TOML.
        assert!(section.parse::<toml::Table>().is_ok());
    }

    #[test]
    fn test_is_registered() {
        let content = upsert_section(EXISTING, "cadence", "cadence-mcp", &["/srv".to_string()]);
        assert!(is_registered(&content, "cadence", "/srv"));
        assert!(!is_registered(&content, "cadence", "/other"));
        assert!(!is_registered(&content, "missing", "/srv"));
        assert!(!is_registered("not = [valid", "cadence", "/srv"));
    }
}
