//! Structured attribute filter derived from a query

use crate::palette::skin_tone_palette;
use crate::KnowledgeEntry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Color, style and material constraints derived from one query.
///
/// Empty sets mean "no constraint" on that attribute. Colors (and the
/// optional gender and season sets) narrow the candidate set; the other
/// attributes only contribute to the score.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredFilter {
    #[serde(default)]
    pub colors: BTreeSet<String>,
    #[serde(default)]
    pub styles: BTreeSet<String>,
    #[serde(default)]
    pub materials: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub usages: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub genders: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub seasons: BTreeSet<String>,
}

impl StructuredFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the filter constrains nothing
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
            && self.styles.is_empty()
            && self.materials.is_empty()
            && self.usages.is_empty()
            && self.genders.is_empty()
            && self.seasons.is_empty()
    }

    /// Union the attribute hints of a matched knowledge entry into this filter
    pub fn absorb(&mut self, entry: &KnowledgeEntry) {
        self.colors.extend(entry.colors.iter().map(|c| normalize(c)));
        self.styles.extend(entry.styles.iter().map(|s| normalize(s)));
        self.materials.extend(entry.materials.iter().map(|m| normalize(m)));
        self.remove_blank();
    }

    #[must_use]
    pub fn with_colors<I, S>(mut self, colors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.colors.extend(colors.into_iter().map(|c| normalize(c.as_ref())));
        self.remove_blank();
        self
    }

    /// Use the palette for `skin_tone` as the colour constraint, unless
    /// colours were already requested or the tone is unknown
    #[must_use]
    pub fn with_skin_tone(self, skin_tone: Option<&str>) -> Self {
        if !self.colors.is_empty() {
            return self;
        }
        match skin_tone.and_then(skin_tone_palette) {
            Some(palette) => self.with_colors(palette.iter().copied()),
            None => self,
        }
    }

    #[must_use]
    pub fn with_styles<I, S>(mut self, styles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.styles.extend(styles.into_iter().map(|s| normalize(s.as_ref())));
        self.remove_blank();
        self
    }

    #[must_use]
    pub fn with_materials<I, S>(mut self, materials: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.materials.extend(materials.into_iter().map(|m| normalize(m.as_ref())));
        self.remove_blank();
        self
    }

    #[must_use]
    pub fn with_usage(mut self, usage: Option<&str>) -> Self {
        self.usages.extend(usage.map(normalize));
        self.remove_blank();
        self
    }

    #[must_use]
    pub fn with_gender(mut self, gender: Option<&str>) -> Self {
        self.genders.extend(gender.map(normalize));
        self.remove_blank();
        self
    }

    #[must_use]
    pub fn with_season(mut self, season: Option<&str>) -> Self {
        self.seasons.extend(season.map(normalize));
        self.remove_blank();
        self
    }

    fn remove_blank(&mut self) {
        for set in [
            &mut self.colors,
            &mut self.styles,
            &mut self.materials,
            &mut self.usages,
            &mut self.genders,
            &mut self.seasons,
        ] {
            set.remove("");
        }
    }
}

/// Lowercase and trim an attribute value
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}
