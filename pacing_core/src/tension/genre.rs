//! Genre pacing profiles.

use serde::{Deserialize, Serialize};

use crate::preferences::ReaderProfile;

/// Story genre, which selects the default pacing profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Genre {
    #[default]
    Adventure,
    Horror,
    Romance,
    Mystery,
    Thriller,
    SliceOfLife,
    Fantasy,
}

impl Genre {
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "adventure" => Some(Genre::Adventure),
            "horror" => Some(Genre::Horror),
            "romance" => Some(Genre::Romance),
            "mystery" => Some(Genre::Mystery),
            "thriller" => Some(Genre::Thriller),
            "slice-of-life" => Some(Genre::SliceOfLife),
            "fantasy" => Some(Genre::Fantasy),
            _ => None,
        }
    }

    /// Default pacing profile for this genre.
    pub fn profile(&self) -> GenreProfile {
        let (target, min, max, cadence, sustained) = match self {
            Genre::Adventure => (55, 35, 75, 8, false),
            Genre::Horror => (65, 45, 90, 10, true),
            Genre::Romance => (35, 15, 60, 6, false),
            Genre::Mystery => (50, 30, 70, 8, false),
            Genre::Thriller => (70, 50, 90, 10, true),
            Genre::SliceOfLife => (25, 10, 45, 5, false),
            Genre::Fantasy => (50, 30, 75, 8, false),
        };
        GenreProfile {
            genre: *self,
            target_tension: target,
            preferred_range: (min, max),
            breath_cadence: cadence,
            allows_sustained_high: sustained,
        }
    }
}

/// Pacing parameters for a genre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreProfile {
    pub genre: Genre,
    pub target_tension: u8,
    /// Inclusive preferred tension range.
    pub preferred_range: (u8, u8),
    /// Exchanges between breath moments.
    pub breath_cadence: u32,
    /// Whether long stretches of high tension are part of the genre's appeal.
    pub allows_sustained_high: bool,
}

impl Default for GenreProfile {
    fn default() -> Self {
        Genre::default().profile()
    }
}

impl GenreProfile {
    pub fn in_range(&self, tension: u8) -> bool {
        tension >= self.preferred_range.0 && tension <= self.preferred_range.1
    }

    /// Bias this profile toward a reader's preferred tension band.
    ///
    /// The target moves to the midpoint between the genre target and the band
    /// centre; each range bound moves halfway toward the band.
    pub fn biased_by(&self, reader: &ReaderProfile) -> GenreProfile {
        let Some((low, high)) = reader.preferred_tension else {
            return self.clone();
        };
        let center = reader.tension_center().unwrap_or(self.target_tension);
        let mid = |a: u8, b: u8| ((a as u16 + b as u16) / 2) as u8;

        let min = mid(self.preferred_range.0, low);
        let max = mid(self.preferred_range.1, high).max(min);
        GenreProfile {
            target_tension: mid(self.target_tension, center).clamp(min, max),
            preferred_range: (min, max),
            ..self.clone()
        }
    }
}
