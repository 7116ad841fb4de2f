//! Scene vocabulary: emotional beats, scene types, time of day and weather.

use serde::{Deserialize, Serialize};

/// The emotional beat the story is currently sitting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EmotionalBeat {
    #[default]
    Calm,
    Rising,
    Tense,
    Climax,
    Release,
    Reflective,
    Revelation,
    EmotionalPeak,
    Breath,
}

impl EmotionalBeat {
    /// Beats that leave the reader needing a moment to land.
    pub fn needs_landing(&self) -> bool {
        matches!(self, EmotionalBeat::Revelation | EmotionalBeat::EmotionalPeak)
    }

    /// Beats that count as an emotional high point.
    pub fn is_peak(&self) -> bool {
        matches!(
            self,
            EmotionalBeat::Climax | EmotionalBeat::EmotionalPeak | EmotionalBeat::Revelation
        )
    }
}

/// Kind of scene being played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SceneType {
    #[default]
    Exploration,
    Dialogue,
    Action,
    Intimate,
    Mystery,
    Climax,
    Transition,
    Rest,
}

/// Coarse time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TimeOfDay {
    Dawn,
    Morning,
    #[default]
    Afternoon,
    Evening,
    Night,
    Midnight,
}

impl TimeOfDay {
    /// Check if it's dark out.
    pub fn is_night(&self) -> bool {
        matches!(self, TimeOfDay::Night | TimeOfDay::Midnight)
    }
}

/// Weather conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Weather {
    #[default]
    Clear,
    Cloudy,
    Rainy,
    Stormy,
    Snowy,
    Foggy,
}

impl Weather {
    /// Weather dramatic enough to colour a scene.
    pub fn is_dramatic(&self) -> bool {
        matches!(self, Weather::Stormy | Weather::Foggy | Weather::Snowy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landing_beats() {
        assert!(EmotionalBeat::Revelation.needs_landing());
        assert!(EmotionalBeat::EmotionalPeak.needs_landing());
        assert!(!EmotionalBeat::Climax.needs_landing());
        assert!(EmotionalBeat::Climax.is_peak());
    }

    #[test]
    fn test_night_and_weather() {
        assert!(TimeOfDay::Midnight.is_night());
        assert!(!TimeOfDay::Dawn.is_night());
        assert!(Weather::Stormy.is_dramatic());
        assert!(!Weather::Clear.is_dramatic());
    }

    #[test]
    fn test_beat_serializes_kebab_case() {
        let json = serde_json::to_string(&EmotionalBeat::EmotionalPeak).unwrap();
        assert_eq!(json, "\"emotional-peak\"");
    }
}
