//! Recipes for emergent moments.

use serde::{Deserialize, Serialize};

use super::{Condition, ConditionSet};

/// The kinds of moment the default library can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MomentType {
    QuietConfession,
    EchoOfThePast,
    RevelationStorm,
    BreakingPoint,
    StolenLaughter,
    FirstImpression,
    TestedUnderFire,
    SilentCompanionship,
    TwistOfFate,
    RuptureAndRepair,
}

impl MomentType {
    pub const ALL: [MomentType; 10] = [
        MomentType::QuietConfession,
        MomentType::EchoOfThePast,
        MomentType::RevelationStorm,
        MomentType::BreakingPoint,
        MomentType::StolenLaughter,
        MomentType::FirstImpression,
        MomentType::TestedUnderFire,
        MomentType::SilentCompanionship,
        MomentType::TwistOfFate,
        MomentType::RuptureAndRepair,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            MomentType::QuietConfession => "quiet-confession",
            MomentType::EchoOfThePast => "echo-of-the-past",
            MomentType::RevelationStorm => "revelation-storm",
            MomentType::BreakingPoint => "breaking-point",
            MomentType::StolenLaughter => "stolen-laughter",
            MomentType::FirstImpression => "first-impression",
            MomentType::TestedUnderFire => "tested-under-fire",
            MomentType::SilentCompanionship => "silent-companionship",
            MomentType::TwistOfFate => "twist-of-fate",
            MomentType::RuptureAndRepair => "rupture-and-repair",
        }
    }

    pub fn from_key(key: &str) -> Option<MomentType> {
        let normalized = key.trim().to_lowercase().replace(['_', ' '], "-");
        MomentType::ALL.into_iter().find(|m| m.key() == normalized)
    }
}

impl std::fmt::Display for MomentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// How hard a moment lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntensityTier {
    Subtle,
    Moderate,
    Strong,
    Profound,
}

impl IntensityTier {
    pub fn priority_bonus(&self) -> u32 {
        match self {
            IntensityTier::Subtle => 0,
            IntensityTier::Moderate => 5,
            IntensityTier::Strong => 10,
            IntensityTier::Profound => 15,
        }
    }
}

/// A moment that only exists when several conditions align.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub moment: MomentType,
    pub description: String,
    pub required: Vec<Condition>,
    pub optional: Vec<Condition>,
    /// Minimum count of required plus optional conditions met.
    pub min_conditions: usize,
    pub intensity: IntensityTier,
    /// Turns before the recipe may match again after firing.
    pub cooldown: u32,
}

impl Recipe {
    pub fn new(moment: MomentType, description: impl Into<String>) -> Self {
        Self {
            moment,
            description: description.into(),
            required: Vec::new(),
            optional: Vec::new(),
            min_conditions: 1,
            intensity: IntensityTier::Moderate,
            cooldown: 5,
        }
    }

    pub fn requires(mut self, conditions: &[Condition]) -> Self {
        self.required.extend_from_slice(conditions);
        self
    }

    pub fn optionally(mut self, conditions: &[Condition]) -> Self {
        self.optional.extend_from_slice(conditions);
        self
    }

    pub fn min_conditions(mut self, min: usize) -> Self {
        self.min_conditions = min;
        self
    }

    pub fn intensity(mut self, intensity: IntensityTier) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn cooldown(mut self, turns: u32) -> Self {
        self.cooldown = turns;
        self
    }

    /// Conditions met if the recipe matches, otherwise `None`.
    pub fn evaluate(&self, conditions: &ConditionSet) -> Option<usize> {
        if !conditions.contains_all(&self.required) {
            return None;
        }
        let met = conditions.count_of(&self.required) + conditions.count_of(&self.optional);
        (met >= self.min_conditions).then_some(met)
    }

    /// 10 per condition met, plus the intensity bonus, plus 2 per cooldown turn.
    pub fn priority(&self, met: usize) -> u32 {
        10 * met as u32 + self.intensity.priority_bonus() + 2 * self.cooldown
    }

    /// The default library.
    pub fn library() -> Vec<Recipe> {
        use Condition::*;

        vec![
            Recipe::new(MomentType::QuietConfession, "Alone and trusted, a character says what they never have")
                .requires(&[CharactersAlone, RelationshipHigh])
                .optionally(&[NightTime, TensionLow, BreathActive, CatharsisOwed])
                .min_conditions(3)
                .intensity(IntensityTier::Strong)
                .cooldown(8),
            Recipe::new(MomentType::EchoOfThePast, "A present detail rhymes with a shared memory")
                .requires(&[CallbackAvailable])
                .optionally(&[EmotionalPeak, NewLocation, CharactersAlone, ArcActive])
                .min_conditions(2)
                .intensity(IntensityTier::Moderate)
                .cooldown(6),
            Recipe::new(MomentType::RevelationStorm, "A ripe secret breaks open under pressure")
                .requires(&[ThreadRipe, TensionHigh])
                .optionally(&[StormyWeather, EmotionalPeak, ReaderSurprised])
                .min_conditions(3)
                .intensity(IntensityTier::Profound)
                .cooldown(12),
            Recipe::new(MomentType::BreakingPoint, "Held-back feeling finally spills over")
                .requires(&[CatharsisOwed])
                .optionally(&[TensionPeak, TensionHigh, RelationshipStrained, MilestonePending])
                .min_conditions(3)
                .intensity(IntensityTier::Strong)
                .cooldown(10),
            Recipe::new(MomentType::StolenLaughter, "A small shared joke in a quiet stretch")
                .requires(&[TensionLow])
                .optionally(&[CharactersAlone, RelationshipHigh, BreathActive])
                .min_conditions(2)
                .intensity(IntensityTier::Subtle)
                .cooldown(4),
            Recipe::new(MomentType::FirstImpression, "Someone new sizes the reader up")
                .requires(&[FirstMeeting])
                .optionally(&[NewLocation, ReaderSurprised, NightTime])
                .min_conditions(1)
                .intensity(IntensityTier::Moderate)
                .cooldown(3),
            Recipe::new(MomentType::TestedUnderFire, "A trusted bond is put to the test in danger")
                .requires(&[TensionHigh, RelationshipHigh])
                .optionally(&[TensionPeak, ArcActive, MilestonePending])
                .min_conditions(3)
                .intensity(IntensityTier::Strong)
                .cooldown(8),
            Recipe::new(MomentType::SilentCompanionship, "Nobody speaks and nobody needs to")
                .requires(&[CharactersAlone, ReaderSilent])
                .optionally(&[NightTime, BreathActive, TensionLow])
                .min_conditions(3)
                .intensity(IntensityTier::Subtle)
                .cooldown(6),
            Recipe::new(MomentType::TwistOfFate, "The world turns in a way no one planned")
                .requires(&[ReaderSurprised])
                .optionally(&[ThreadRipe, SceneTransition, StormyWeather, TensionModerate])
                .min_conditions(3)
                .intensity(IntensityTier::Strong)
                .cooldown(10),
            Recipe::new(MomentType::RuptureAndRepair, "A strained bond breaks, then starts to mend")
                .requires(&[RelationshipStrained])
                .optionally(&[CharactersAlone, CatharsisOwed, EmotionalPeak, ArcActive])
                .min_conditions(3)
                .intensity(IntensityTier::Profound)
                .cooldown(12),
        ]
    }
}
