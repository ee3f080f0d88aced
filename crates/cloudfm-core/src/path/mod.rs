//! Canonical path grammar for the virtual filesystem.
//!
//! Every function here is pure. Storage keys have the shape
//! `{owner}/{folder}/{name}` with single `/` separators and no leading slash;
//! folder-document keys additionally end with `/`.

mod date;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

pub use date::{date_aware_compare, parse_day_month};

use crate::error::AppError;
use crate::result::AppResult;

/// Zero-byte marker object that makes an empty folder visible in listings.
pub const PLACEHOLDER: &str = ".placeholder";

/// Upper-bound sentinel for prefix range queries (maximum BMP private-use codepoint).
pub const RANGE_SENTINEL: char = '\u{f8ff}';

/// Join a parent path and a name with exactly one `/` between non-empty parts.
pub fn join(parent: &str, name: &str) -> String {
    let parent = parent.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    match (parent.is_empty(), name.is_empty()) {
        (true, _) => name.to_string(),
        (false, true) => parent.to_string(),
        (false, false) => format!("{parent}/{name}"),
    }
}

/// Join any number of segments.
pub fn join_all<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts.into_iter().fold(String::new(), |acc, part| join(&acc, part))
}

/// Drop the last segment of a path (a trailing slash is ignored).
pub fn parent_of(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => trimmed[..idx].to_string(),
        None => String::new(),
    }
}

/// The last segment of a path (a trailing slash is ignored).
pub fn name_of(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Storage key of an entry: `{owner}/{folder}/{name}`.
pub fn owner_path(owner: &str, folder: &str, name: &str) -> String {
    join_all([owner, folder, name])
}

/// Storage key prefix of a directory: `{owner}/{folder}` (no trailing slash).
pub fn directory_key(owner: &str, folder: &str) -> String {
    join(owner, folder)
}

/// Key of a folder document: the folder's storage key with a trailing `/`.
pub fn folder_doc_path(owner: &str, folder: &str) -> String {
    format!("{}/", directory_key(owner, folder))
}

/// Key of the placeholder object inside a folder.
pub fn placeholder_key(folder_key: &str) -> String {
    join(folder_key, PLACEHOLDER)
}

/// Whether a listing name is the folder placeholder sentinel.
pub fn is_placeholder(name: &str) -> bool {
    name_of(name) == PLACEHOLDER
}

/// Whether `path` equals `prefix` or lies beneath it, respecting segment
/// boundaries (`projects2` is not within `projects`).
pub fn is_within(prefix: &str, path: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    let path = path.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }
    path == prefix
        || (path.starts_with(prefix) && path.as_bytes().get(prefix.len()) == Some(&b'/'))
}

/// Replace the `old` prefix of `path` with `new`. Returns `None` when `path`
/// is not within `old`. A trailing slash on `path` is preserved.
pub fn rebase(path: &str, old: &str, new: &str) -> Option<String> {
    if !is_within(old, path) {
        return None;
    }
    let old = old.trim_end_matches('/');
    let rest = &path[old.len()..];
    Some(format!("{}{}", new.trim_end_matches('/'), rest))
}

/// Strip the `{owner}/` prefix from a storage key.
pub fn relative_to(owner: &str, full_path: &str) -> String {
    full_path
        .strip_prefix(owner)
        .map(|rest| rest.trim_start_matches('/').to_string())
        .unwrap_or_else(|| full_path.to_string())
}

/// Lowercased extension including the leading dot, if the name has one.
pub fn extension_of(name: &str) -> Option<String> {
    let name = name_of(name);
    name.rfind('.').map(|idx| name[idx..].to_ascii_lowercase())
}

/// Inclusive upper bound for a prefix range query.
pub fn range_upper_bound(prefix: &str) -> String {
    format!("{prefix}{RANGE_SENTINEL}")
}

/// Encode a storage key as a metadata document id.
pub fn encode_doc_id(path: &str) -> String {
    STANDARD.encode(path.as_bytes())
}

/// Decode a metadata document id back into its storage key.
pub fn decode_doc_id(id: &str) -> AppResult<String> {
    let bytes = STANDARD
        .decode(id)
        .map_err(|e| AppError::validation(format!("Malformed document id '{id}': {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| AppError::validation(format!("Document id '{id}' is not UTF-8: {e}")))
}

/// Validate a user-supplied entry name.
pub fn validate_name(name: &str) -> AppResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("Name cannot be empty"));
    }
    if trimmed.contains('/') {
        return Err(AppError::validation(format!(
            "Name '{trimmed}' cannot contain '/'"
        )));
    }
    if trimmed == "." || trimmed == ".." || trimmed == PLACEHOLDER {
        return Err(AppError::validation(format!("'{trimmed}' is a reserved name")));
    }
    Ok(trimmed)
}
