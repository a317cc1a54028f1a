// Utility functions and helpers

use crate::value::Value;

/// Split a dotted path into its segments.
///
/// Returns `None` if any segment is empty (`"a..b"`, `".a"`, `""`).
pub fn split_path(path: &str) -> Option<Vec<&str>> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        None
    } else {
        Some(segments)
    }
}

/// Follow `segments` through nested objects.
pub fn read_path<'a, S: AsRef<str>>(value: &'a Value, segments: &[S]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(value, |current, segment| current.get(segment.as_ref()))
}
