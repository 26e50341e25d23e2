//! cadence-security: input validation and escaping.
//!
//! Pure, stateless checks used before any shell command is constructed
//! or any outbound webhook URL is contacted. Validators reject by
//! returning `false`; they never panic or raise.

use std::net::Ipv4Addr;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static REPO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._-]+/[A-Za-z0-9._-]+$").unwrap()
});

/// Validate an `owner/name` repository slug.
///
/// Exactly one slash, non-empty segments, no shell metacharacters.
pub fn is_valid_repo(repo: &str) -> bool {
    REPO_RE.is_match(repo)
}

/// Validate a JSON value as a positive integer identifier.
///
/// Rejects floats, zero, negatives, and non-numeric types.
pub fn is_valid_issue_number(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Number(n) => n.as_u64().is_some_and(|v| v > 0),
        _ => false,
    }
}

/// Escape a string for interpolation inside a double-quoted shell
/// argument.
///
/// Backslash is escaped first so the backslashes inserted for the
/// remaining characters are not themselves re-escaped.
pub fn escape_shell_arg(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('$', "\\$")
        .replace('`', "\\`")
        .replace('!', "\\!")
}

fn is_blocked_ipv4(ip: Ipv4Addr) -> bool {
    let [a, b, _, _] = ip.octets();
    match a {
        127 | 10 | 0 => true,
        172 => (16..=31).contains(&b),
        192 => b == 168,
        169 => b == 254,
        _ => false,
    }
}

/// Check a webhook target against the SSRF allowlist.
///
/// Requires https and rejects loopback, private, link-local, and
/// this-network IPv4 ranges as well as the `localhost` and `[::1]`
/// hostnames. Malformed URLs are rejected.
pub fn is_allowed_webhook_url(raw: &str) -> bool {
    let Ok(url) = Url::parse(raw) else {
        return false;
    };
    if url.scheme() != "https" {
        return false;
    }
    let Some(host) = url.host_str() else {
        return false;
    };
    if host.eq_ignore_ascii_case("localhost") || host == "[::1]" || host == "::1" {
        return false;
    }
    if let Ok(ip) = host.parse::<Ipv4Addr>() {
        if is_blocked_ipv4(ip) {
            return false;
        }
    }
    true
}
