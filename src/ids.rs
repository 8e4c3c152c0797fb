//! Identifier canonicalization
//!
//! Notion accepts page ids with or without dashes, but the client always
//! sends the dashed, lowercase `8-4-4-4-12` form so that paths and payloads
//! are stable. Anything that is not a UUID is left untouched for the upstream
//! to judge.

use uuid::Uuid;

/// Rewrite `id` to the canonical hyphenated UUID form if it parses as one.
///
/// Surrounding whitespace, braces, a `urn:uuid:` prefix and hyphens in any
/// position are accepted; the remaining text must be exactly 32 hex digits.
pub fn canonicalize_id(id: &str) -> String {
    parse_loose(id).map_or_else(
        || id.to_string(),
        |uuid| uuid.hyphenated().to_string(),
    )
}

/// Check whether `id` would be rewritten as a UUID
pub fn is_uuid_like(id: &str) -> bool {
    parse_loose(id).is_some()
}

fn parse_loose(id: &str) -> Option<Uuid> {
    let trimmed = id.trim();
    let without_prefix = trimmed
        .strip_prefix("urn:")
        .unwrap_or(trimmed);
    let without_prefix = without_prefix
        .strip_prefix("uuid:")
        .unwrap_or(without_prefix);
    let bare = without_prefix.trim_matches(|c| c == '{' || c == '}');

    let digits: String = bare.chars().filter(|c| *c != '-').collect();
    if digits.len() != 32 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    Uuid::try_parse(&digits).ok()
}
