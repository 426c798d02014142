//! Skin tone to colour palette
//!
//! When a request names a skin tone but no colours, the palette stands in as
//! the colour constraint. Colour names use the catalog's `baseColour`
//! vocabulary, lowercase.

const FAIR: &[&str] = &["navy blue", "maroon", "lavender", "pink", "teal", "grey", "black"];
const MEDIUM: &[&str] = &["olive", "mustard", "peach", "teal", "red", "navy blue", "white"];
const TAN: &[&str] = &["rust", "olive", "cream", "mustard", "brown", "white", "khaki"];
const DARK: &[&str] = &["white", "yellow", "orange", "red", "purple", "gold", "cream"];
const WARM: &[&str] = &["olive", "mustard", "rust", "peach", "cream", "brown", "orange"];
const COOL: &[&str] = &["navy blue", "lavender", "grey", "teal", "pink", "purple", "silver"];
const NEUTRAL: &[&str] = &["beige", "white", "black", "grey", "navy blue", "maroon"];

/// Flattering colours for a skin tone, `None` for an unknown tone.
///
/// Accepts depth (`fair`, `light`, `medium`, `olive`, `tan`, `dark`, `deep`)
/// or undertone (`warm`, `cool`, `neutral`) names, case-insensitively.
pub fn skin_tone_palette(skin_tone: &str) -> Option<&'static [&'static str]> {
    let tone = skin_tone.trim().to_lowercase();
    let palette = match tone.strip_suffix(" skin").unwrap_or(&tone) {
        "fair" | "light" | "pale" => FAIR,
        "medium" | "olive" => MEDIUM,
        "tan" | "brown" => TAN,
        "dark" | "deep" => DARK,
        "warm" => WARM,
        "cool" => COOL,
        "neutral" => NEUTRAL,
        _ => return None,
    };
    Some(palette)
}
