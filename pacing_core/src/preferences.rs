//! Reader preference profile, supplied read-only by an external model.

use serde::{Deserialize, Serialize};

/// Soft bias inputs learned about the reader elsewhere.
///
/// Every field is optional; an absent profile means genre defaults apply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderProfile {
    /// Preferred tension band, inclusive.
    pub preferred_tension: Option<(u8, u8)>,
    /// Content tags the reader responds well to (e.g. "mystery", "romance").
    pub enjoyed_tags: Vec<String>,
    /// Content tags the reader tends to skip or disengage from.
    pub avoided_tags: Vec<String>,
    /// Typical session length in turns.
    pub preferred_session_turns: Option<u32>,
}

impl ReaderProfile {
    pub fn with_tension_band(mut self, low: u8, high: u8) -> Self {
        let (low, high) = (low.min(100), high.min(100));
        self.preferred_tension = Some((low.min(high), low.max(high)));
        self
    }

    pub fn enjoying(mut self, tag: impl Into<String>) -> Self {
        self.enjoyed_tags.push(tag.into());
        self
    }

    pub fn avoiding(mut self, tag: impl Into<String>) -> Self {
        self.avoided_tags.push(tag.into());
        self
    }

    pub fn enjoys(&self, tag: &str) -> bool {
        self.enjoyed_tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    pub fn avoids(&self, tag: &str) -> bool {
        self.avoided_tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Midpoint of the preferred tension band.
    pub fn tension_center(&self) -> Option<u8> {
        self.preferred_tension
            .map(|(low, high)| ((low as u16 + high as u16) / 2) as u8)
    }
}
