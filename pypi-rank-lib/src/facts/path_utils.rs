//! Path utilities for safe filesystem operations.

/// Sanitize a string for use as a path component
///
/// Removes path traversal sequences and characters that are invalid in file names on
/// common platforms, so that package and repository names can be used as cache file names.
#[must_use]
pub fn sanitize_path_component(s: &str) -> String {
    // ".." is replaced but a single "." survives, since package names like "zope.interface" are common
    let s = s.replace("..", "__");
    s.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_")
}

/// Build a relative cache file path from a slash-separated parameter
///
/// Every segment is sanitized independently and empty segments are dropped, so
/// `"psf/requests"` becomes `"psf/requests.json"`.
#[must_use]
pub fn cache_file_path(source: &str, param: &str) -> String {
    let mut path = sanitize_path_component(source);
    let mut has_segment = false;

    for segment in param.split('/').filter(|s| !s.is_empty()) {
        path.push('/');
        path.push_str(&sanitize_path_component(segment));
        has_segment = true;
    }

    if !has_segment {
        path.push_str("/_");
    }

    path.push_str(".json");
    path
}
