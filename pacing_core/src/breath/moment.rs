//! Breath moments - the pauses themselves.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BreathType {
    /// A pause on one sensory detail.
    Sensory,
    Reflective,
    /// Letting a revelation or emotional peak settle.
    Landing,
    Transition,
    Intimate,
    /// Coming down after a spike.
    Recovery,
}

impl BreathType {
    pub fn default_duration(&self) -> BreathDuration {
        match self {
            BreathType::Sensory | BreathType::Transition => BreathDuration::Brief,
            BreathType::Reflective | BreathType::Landing => BreathDuration::Short,
            BreathType::Intimate | BreathType::Recovery => BreathDuration::Extended,
        }
    }

    /// Channels that suit this kind of pause, most fitting first.
    pub fn preferred_channels(&self) -> &'static [SensoryChannel] {
        use SensoryChannel::*;
        match self {
            BreathType::Sensory => &[Sight, Sound, Smell, Touch, Taste],
            BreathType::Reflective => &[Interior, Sight, Sound],
            BreathType::Landing => &[Interior, Touch, Sound],
            BreathType::Transition => &[Environment, Sight, Sound],
            BreathType::Intimate => &[Touch, Interior, Sound],
            BreathType::Recovery => &[Environment, Sound, Touch, Interior],
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            BreathType::Sensory => "sensory",
            BreathType::Reflective => "reflective",
            BreathType::Landing => "landing",
            BreathType::Transition => "transition",
            BreathType::Intimate => "intimate",
            BreathType::Recovery => "recovery",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BreathDuration {
    Brief,
    Short,
    Extended,
}

impl BreathDuration {
    pub fn key(&self) -> &'static str {
        match self {
            BreathDuration::Brief => "brief",
            BreathDuration::Short => "short",
            BreathDuration::Extended => "extended",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SensoryChannel {
    Sight,
    Sound,
    Smell,
    Touch,
    Taste,
    /// Thought and feeling.
    Interior,
    Environment,
}

impl SensoryChannel {
    pub const ALL: [SensoryChannel; 7] = [
        SensoryChannel::Sight,
        SensoryChannel::Sound,
        SensoryChannel::Smell,
        SensoryChannel::Touch,
        SensoryChannel::Taste,
        SensoryChannel::Interior,
        SensoryChannel::Environment,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            SensoryChannel::Sight => "sight",
            SensoryChannel::Sound => "sound",
            SensoryChannel::Smell => "smell",
            SensoryChannel::Touch => "touch",
            SensoryChannel::Taste => "taste",
            SensoryChannel::Interior => "interior",
            SensoryChannel::Environment => "environment",
        }
    }
}

/// Overrides for `BreathScheduler::create_moment`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BreathOptions {
    pub duration: Option<BreathDuration>,
    pub channel: Option<SensoryChannel>,
    /// What the pause lingers on, e.g. "the smell of rain".
    pub focus: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreathMoment {
    pub breath_type: BreathType,
    pub duration: BreathDuration,
    pub channel: SensoryChannel,
    pub focus: Option<String>,
    pub turn: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_type_has_channels() {
        for breath in [
            BreathType::Sensory,
            BreathType::Reflective,
            BreathType::Landing,
            BreathType::Transition,
            BreathType::Intimate,
            BreathType::Recovery,
        ] {
            assert!(!breath.preferred_channels().is_empty());
        }
        assert_eq!(BreathType::Intimate.default_duration(), BreathDuration::Extended);
    }
}
