//! Per-term similarity functions
//!
//! All functions return a similarity in [0.0, 1.0] where 1.0 means a full match.

use std::collections::BTreeSet;

/// Normalized fuzzy ratio between two strings.
///
/// Computed as `2 * LCS / (len_a + len_b)` over lowercase characters, i.e.
/// one minus the normalized insertion/deletion distance. Two empty strings
/// are identical.
pub fn fuzzy_ratio(a: &str, b: &str) -> f32 {
    let a: Vec<char> = a.trim().to_lowercase().chars().collect();
    let b: Vec<char> = b.trim().to_lowercase().chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    (2 * longest_common_subsequence(&a, &b)) as f32 / total as f32
}

/// Length of the longest common subsequence, two-row dynamic programming
fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut prev = vec![0usize; short.len() + 1];
    let mut curr = vec![0usize; short.len() + 1];

    for x in long {
        for (j, y) in short.iter().enumerate() {
            curr[j + 1] = if x == y {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[short.len()]
}

/// Best fuzzy ratio of `value` against any of the requested values.
/// 0.0 when nothing is requested.
pub fn best_fuzzy_match(requested: &BTreeSet<String>, value: &str) -> f32 {
    requested
        .iter()
        .map(|r| fuzzy_ratio(r, value))
        .fold(0.0, f32::max)
}

/// 1.0 if any requested value equals or is contained in `value`
/// (case-insensitive), otherwise 0.0
pub fn contains_any(requested: &BTreeSet<String>, value: Option<&str>) -> f32 {
    let Some(value) = value else {
        return 0.0;
    };
    let value = value.to_lowercase();

    let matched = requested
        .iter()
        .map(|r| r.trim().to_lowercase())
        .any(|r| !r.is_empty() && value.contains(&r));

    if matched {
        1.0
    } else {
        0.0
    }
}

/// Fraction of requested colors present on the record.
///
/// `|record ∩ requested| / max(1, |requested|)`; 0.0 when nothing is requested.
pub fn colour_overlap(record_colours: &[String], requested: &BTreeSet<String>) -> f32 {
    if requested.is_empty() {
        return 0.0;
    }
    let shared = requested
        .iter()
        .filter(|c| record_colours.iter().any(|rc| rc == *c))
        .count();
    shared as f32 / requested.len().max(1) as f32
}
