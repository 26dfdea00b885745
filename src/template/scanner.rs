use std::sync::LazyLock;

use regex::Regex;

use super::MarkerKind;

// Alternation is leftmost-first, so `jb` must come before `j`.
static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?(jb|w|i|d|f|h|j)?").expect("marker regex is valid"));

/// A marker located in a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Marker {
    pub start: usize,
    pub end: usize,
    pub kind: MarkerKind,
}

/// Find the first marker at or after `from` that is not escaped with a backslash.
pub(super) fn next_marker(template: &str, from: usize) -> Option<Marker> {
    let bytes = template.as_bytes();
    MARKER
        .captures_iter(&template[from..])
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let start = from + whole.start();
            if start > 0 && bytes[start - 1] == b'\\' {
                return None;
            }
            let suffix = caps.get(1).map_or("", |m| m.as_str());
            Some(Marker {
                start,
                end: from + whole.end(),
                kind: MarkerKind::from_suffix(suffix)?,
            })
        })
        .next()
}

/// Count the unescaped markers in `template[from..]`.
pub(super) fn count_markers(template: &str, from: usize) -> usize {
    let mut count = 0;
    let mut cursor = from;
    while let Some(marker) = next_marker(template, cursor) {
        count += 1;
        cursor = marker.end;
    }
    count
}

/// Append `segment` to `out`, turning escaped question marks back into plain ones.
pub(super) fn push_unescaped(out: &mut String, segment: &str) {
    out.push_str(&segment.replace("\\?", "?"));
}
