//! Resource-identifier extraction from browser navigation state
//!
//! The suite derives identifiers from the page URL after the dashboard
//! creates a resource; the tracker consumes them as opaque strings.

use once_cell::sync::Lazy;
use regex::Regex;

static SESSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/sessions/([A-Za-z0-9_-]+)").expect("valid session pattern"));

static ISSUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?&]issue=([^&#]+)").expect("valid issue pattern"));

/// Session id from a `/sessions/<id>` path segment, if present.
pub fn session_id_from_url(url: &str) -> Option<String> {
    SESSION_RE
        .captures(url)
        .map(|caps| caps[1].to_string())
}

/// Issue id from the `issue` query parameter, if present.
pub fn issue_id_from_url(url: &str) -> Option<String> {
    ISSUE_RE.captures(url).map(|caps| caps[1].to_string())
}
