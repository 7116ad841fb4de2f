//! Tension event vocabulary.

use serde::{Deserialize, Serialize};

/// A named story event with a fixed effect on tension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TensionEvent {
    // Raising
    ThreatIntroduced,
    ConflictEscalates,
    Ambush,
    Betrayal,
    Chase,
    Confrontation,
    Revelation,
    TimePressure,
    MysteryDeepens,
    Discovery,
    Loss,

    // Releasing
    Victory,
    ComicRelief,
    Rest,
    Reunion,
    Comfort,
    Escape,
    Resolution,
}

impl TensionEvent {
    pub const ALL: [TensionEvent; 18] = [
        TensionEvent::ThreatIntroduced,
        TensionEvent::ConflictEscalates,
        TensionEvent::Ambush,
        TensionEvent::Betrayal,
        TensionEvent::Chase,
        TensionEvent::Confrontation,
        TensionEvent::Revelation,
        TensionEvent::TimePressure,
        TensionEvent::MysteryDeepens,
        TensionEvent::Discovery,
        TensionEvent::Loss,
        TensionEvent::Victory,
        TensionEvent::ComicRelief,
        TensionEvent::Rest,
        TensionEvent::Reunion,
        TensionEvent::Comfort,
        TensionEvent::Escape,
        TensionEvent::Resolution,
    ];

    /// Signed tension delta for this event.
    pub fn delta(&self) -> i32 {
        match self {
            TensionEvent::ThreatIntroduced => 15,
            TensionEvent::ConflictEscalates => 10,
            TensionEvent::Ambush => 25,
            TensionEvent::Betrayal => 20,
            TensionEvent::Chase => 18,
            TensionEvent::Confrontation => 15,
            TensionEvent::Revelation => 12,
            TensionEvent::TimePressure => 10,
            TensionEvent::MysteryDeepens => 8,
            TensionEvent::Discovery => 5,
            TensionEvent::Loss => 15,
            TensionEvent::Victory => -20,
            TensionEvent::ComicRelief => -15,
            TensionEvent::Rest => -20,
            TensionEvent::Reunion => -10,
            TensionEvent::Comfort => -12,
            TensionEvent::Escape => -15,
            TensionEvent::Resolution => -25,
        }
    }

    /// Kebab-case key, as used by the generation collaborator.
    pub fn key(&self) -> &'static str {
        match self {
            TensionEvent::ThreatIntroduced => "threat-introduced",
            TensionEvent::ConflictEscalates => "conflict-escalates",
            TensionEvent::Ambush => "ambush",
            TensionEvent::Betrayal => "betrayal",
            TensionEvent::Chase => "chase",
            TensionEvent::Confrontation => "confrontation",
            TensionEvent::Revelation => "revelation",
            TensionEvent::TimePressure => "time-pressure",
            TensionEvent::MysteryDeepens => "mystery-deepens",
            TensionEvent::Discovery => "discovery",
            TensionEvent::Loss => "loss",
            TensionEvent::Victory => "victory",
            TensionEvent::ComicRelief => "comic-relief",
            TensionEvent::Rest => "rest",
            TensionEvent::Reunion => "reunion",
            TensionEvent::Comfort => "comfort",
            TensionEvent::Escape => "escape",
            TensionEvent::Resolution => "resolution",
        }
    }

    /// Look up an event by key. Accepts `_` or spaces in place of `-`.
    pub fn from_key(key: &str) -> Option<Self> {
        let normalized = key.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        Self::ALL.into_iter().find(|e| e.key() == normalized)
    }

    pub fn raises_tension(&self) -> bool {
        self.delta() > 0
    }
}

impl std::fmt::Display for TensionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_lookup() {
        assert_eq!(TensionEvent::from_key("threat-introduced"), Some(TensionEvent::ThreatIntroduced));
        assert_eq!(TensionEvent::from_key("Comic_Relief"), Some(TensionEvent::ComicRelief));
        assert_eq!(TensionEvent::from_key("time pressure"), Some(TensionEvent::TimePressure));
        assert_eq!(TensionEvent::from_key("dragon-sneezes"), None);
    }

    #[test]
    fn test_every_key_round_trips() {
        for event in TensionEvent::ALL {
            assert_eq!(TensionEvent::from_key(event.key()), Some(event));
        }
    }

    #[test]
    fn test_delta_signs() {
        assert!(TensionEvent::Ambush.raises_tension());
        assert!(!TensionEvent::Victory.raises_tension());
        assert_eq!(TensionEvent::Resolution.delta(), -25);
    }
}
