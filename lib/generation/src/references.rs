//! Image reference extraction from generated text

use regex::Regex;
use std::sync::OnceLock;

fn image_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)image\s*[:\-]?\s*(\d+\.(?:jpg|jpeg|png))").expect("valid image pattern")
    })
}

/// Find `image: 1234.jpg` style references, in order of first appearance.
///
/// Matching is case-insensitive and tolerates a colon or dash separator.
/// Returns an empty vector when nothing is referenced.
pub fn extract_image_references(text: &str) -> Vec<String> {
    let mut references: Vec<String> = Vec::new();
    for captures in image_pattern().captures_iter(text) {
        let reference = captures[1].to_lowercase();
        if !references.contains(&reference) {
            references.push(reference);
        }
    }
    references
}
