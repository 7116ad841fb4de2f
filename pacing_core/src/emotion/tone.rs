//! Emotional tone vocabulary.

use serde::{Deserialize, Serialize};

/// The emotional colour of a story moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmotionalTone {
    // Releasing
    Joy,
    Hope,
    Warmth,
    Humor,
    Relief,
    Peace,
    Wonder,
    Catharsis,

    // Burdening
    Fear,
    Dread,
    Grief,
    Anger,
    Betrayal,
    Tension,
    Despair,
    Loneliness,
    Shame,

    // Neutral
    Curiosity,
    Melancholy,
    Nostalgia,
    Anticipation,
}

/// How a tone affects catharsis debt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToneValence {
    Burdening,
    Releasing,
    Neutral,
}

impl EmotionalTone {
    pub const ALL: [EmotionalTone; 21] = [
        EmotionalTone::Joy,
        EmotionalTone::Hope,
        EmotionalTone::Warmth,
        EmotionalTone::Humor,
        EmotionalTone::Relief,
        EmotionalTone::Peace,
        EmotionalTone::Wonder,
        EmotionalTone::Catharsis,
        EmotionalTone::Fear,
        EmotionalTone::Dread,
        EmotionalTone::Grief,
        EmotionalTone::Anger,
        EmotionalTone::Betrayal,
        EmotionalTone::Tension,
        EmotionalTone::Despair,
        EmotionalTone::Loneliness,
        EmotionalTone::Shame,
        EmotionalTone::Curiosity,
        EmotionalTone::Melancholy,
        EmotionalTone::Nostalgia,
        EmotionalTone::Anticipation,
    ];

    pub fn valence(&self) -> ToneValence {
        use EmotionalTone::*;
        match self {
            Joy | Hope | Warmth | Humor | Relief | Peace | Wonder | Catharsis => {
                ToneValence::Releasing
            }
            Fear | Dread | Grief | Anger | Betrayal | Tension | Despair | Loneliness | Shame => {
                ToneValence::Burdening
            }
            Curiosity | Melancholy | Nostalgia | Anticipation => ToneValence::Neutral,
        }
    }

    /// Multiplier on the debt a burdening tone accrues. Wounding tones weigh more.
    pub fn debt_weight(&self) -> f32 {
        match self {
            EmotionalTone::Betrayal | EmotionalTone::Grief | EmotionalTone::Despair => 1.25,
            _ => 1.0,
        }
    }

    pub fn key(&self) -> &'static str {
        use EmotionalTone::*;
        match self {
            Joy => "joy",
            Hope => "hope",
            Warmth => "warmth",
            Humor => "humor",
            Relief => "relief",
            Peace => "peace",
            Wonder => "wonder",
            Catharsis => "catharsis",
            Fear => "fear",
            Dread => "dread",
            Grief => "grief",
            Anger => "anger",
            Betrayal => "betrayal",
            Tension => "tension",
            Despair => "despair",
            Loneliness => "loneliness",
            Shame => "shame",
            Curiosity => "curiosity",
            Melancholy => "melancholy",
            Nostalgia => "nostalgia",
            Anticipation => "anticipation",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|t| t.key() == key)
    }
}

impl std::fmt::Display for EmotionalTone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Craft technique used to deliver a moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Technique {
    Contrast,
    Callback,
    Subversion,
    SlowReveal,
    Payoff,
    Understatement,
    Mirroring,
}
