#![deny(unsafe_code)]

use std::sync::LazyLock;

use regex::Regex;
use rulecov_standards::Standard;

/// Citation lines below this marker point at related reading, not at ids the
/// rule actually covers.
const SEE_ALSO_MARKER: &str = "see also";

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("Invalid HTML tag regex"));

/// Extract a standard's reference tokens from a rule's free-text citation
/// block.
///
/// The block is scanned line by line in order. The first line containing the
/// see-also marker (case-insensitive, matched against the raw line before
/// HTML stripping) ends the scan. A line contributes only when it contains
/// the standard's search string; it is then stripped of HTML tags, split on
/// the standard's separator, and every full-token match of the standard's id
/// pattern is kept, in order, duplicates included. The search string itself
/// is a line marker, never an id, even where it happens to match the id
/// pattern (tool standards such as PMD and Checkstyle).
pub fn parse_reference_tokens(raw_text: &str, standard: &Standard) -> Vec<String> {
    let mut tokens = Vec::new();
    for line in raw_text.lines() {
        if line.to_lowercase().contains(SEE_ALSO_MARKER) {
            break;
        }
        if !line.contains(standard.search_string.as_str()) {
            continue;
        }
        let stripped = strip_html(line);
        for piece in stripped.split(standard.separator.as_str()) {
            let piece = piece.trim();
            if piece.is_empty() || piece == standard.search_string {
                continue;
            }
            if standard.matches_token(piece) {
                tokens.push(piece.to_string());
            }
        }
    }
    tokens
}

/// Replace HTML tags with spaces so adjacent tokens do not fuse.
fn strip_html(line: &str) -> String {
    HTML_TAG.replace_all(line, " ").into_owned()
}
