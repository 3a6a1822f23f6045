//! Filename rules for committed uploads.

use chrono::{DateTime, Utc};

const MAX_FILENAME_BYTES: usize = 255;

/// Reduce a client-supplied name to a safe single path component.
///
/// Directory parts (either separator style), control characters, and leading
/// dots are dropped; everything else, including non-ASCII text and spaces, is
/// preserved. Returns `None` when nothing usable is left.
pub fn sanitize_original_name(name: &str) -> Option<String> {
    let last = name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(name);

    let cleaned: String = last.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim().trim_start_matches('.').trim();

    if cleaned.is_empty() {
        return None;
    }

    Some(truncate_utf8(cleaned, MAX_FILENAME_BYTES).to_string())
}

/// Build a collision-resistant name for an upload that arrived without one.
pub fn synthesize_name(now: DateTime<Utc>, extension: Option<&str>) -> String {
    match extension {
        Some(ext) if !ext.is_empty() => {
            format!("file_{}.{}", now.timestamp_millis(), ext.trim_start_matches('.'))
        }
        _ => format!("file_{}", now.timestamp_millis()),
    }
}

fn truncate_utf8(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
