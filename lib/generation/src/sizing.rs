//! Size suggestion from height and weight

/// Suggested garment size and length for a body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeSuggestion {
    pub size: &'static str,
    pub length: Option<&'static str>,
}

impl std::fmt::Display for SizeSuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.length {
            Some(length) => write!(f, "{} ({} lengths)", self.size, length),
            None => f.write_str(self.size),
        }
    }
}

/// Size from body-mass index, with a length hint for short or tall builds.
///
/// Heights outside 100..=250 cm or weights outside 25..=300 kg are treated
/// as input mistakes and yield `None`.
pub fn size_suggestion(height_cm: u32, weight_kg: u32) -> Option<SizeSuggestion> {
    if !(100..=250).contains(&height_cm) || !(25..=300).contains(&weight_kg) {
        return None;
    }

    let height_m = height_cm as f32 / 100.0;
    let bmi = weight_kg as f32 / (height_m * height_m);
    let size = match bmi {
        b if b < 18.5 => "S",
        b if b < 25.0 => "M",
        b if b < 30.0 => "L",
        _ => "XL",
    };
    let length = match height_cm {
        h if h < 160 => Some("petite"),
        h if h >= 185 => Some("tall"),
        _ => None,
    };

    Some(SizeSuggestion { size, length })
}
