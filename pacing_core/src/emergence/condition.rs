//! Story conditions that recipes are matched against.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A fact about the current moment of the story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Condition {
    TensionLow,
    TensionModerate,
    TensionHigh,
    TensionPeak,
    EmotionalPeak,
    CharactersAlone,
    CallbackAvailable,
    ThreadRipe,
    ReaderSurprised,
    ReaderSilent,
    BreathActive,
    CatharsisOwed,
    SceneTransition,
    NightTime,
    StormyWeather,
    MilestonePending,
    RelationshipHigh,
    RelationshipStrained,
    FirstMeeting,
    ArcActive,
    NewLocation,
}

impl Condition {
    pub const ALL: [Condition; 21] = [
        Condition::TensionLow,
        Condition::TensionModerate,
        Condition::TensionHigh,
        Condition::TensionPeak,
        Condition::EmotionalPeak,
        Condition::CharactersAlone,
        Condition::CallbackAvailable,
        Condition::ThreadRipe,
        Condition::ReaderSurprised,
        Condition::ReaderSilent,
        Condition::BreathActive,
        Condition::CatharsisOwed,
        Condition::SceneTransition,
        Condition::NightTime,
        Condition::StormyWeather,
        Condition::MilestonePending,
        Condition::RelationshipHigh,
        Condition::RelationshipStrained,
        Condition::FirstMeeting,
        Condition::ArcActive,
        Condition::NewLocation,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Condition::TensionLow => "tension-low",
            Condition::TensionModerate => "tension-moderate",
            Condition::TensionHigh => "tension-high",
            Condition::TensionPeak => "tension-peak",
            Condition::EmotionalPeak => "emotional-peak",
            Condition::CharactersAlone => "characters-alone",
            Condition::CallbackAvailable => "callback-available",
            Condition::ThreadRipe => "thread-ripe",
            Condition::ReaderSurprised => "reader-surprised",
            Condition::ReaderSilent => "reader-silent",
            Condition::BreathActive => "breath-active",
            Condition::CatharsisOwed => "catharsis-owed",
            Condition::SceneTransition => "scene-transition",
            Condition::NightTime => "night-time",
            Condition::StormyWeather => "stormy-weather",
            Condition::MilestonePending => "milestone-pending",
            Condition::RelationshipHigh => "relationship-high",
            Condition::RelationshipStrained => "relationship-strained",
            Condition::FirstMeeting => "first-meeting",
            Condition::ArcActive => "arc-active",
            Condition::NewLocation => "new-location",
        }
    }

    /// Parse a condition key. Underscores and spaces are accepted as separators.
    pub fn from_key(key: &str) -> Option<Condition> {
        let normalized = key.trim().to_lowercase().replace(['_', ' '], "-");
        Condition::ALL.into_iter().find(|c| c.key() == normalized)
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// The set of conditions active this turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionSet(BTreeSet<Condition>);

impl ConditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, condition: Condition) -> bool {
        self.0.insert(condition)
    }

    /// Insert when `active` holds. Keeps derivation code flat.
    pub fn set(&mut self, condition: Condition, active: bool) {
        if active {
            self.0.insert(condition);
        }
    }

    pub fn remove(&mut self, condition: Condition) -> bool {
        self.0.remove(&condition)
    }

    pub fn contains(&self, condition: Condition) -> bool {
        self.0.contains(&condition)
    }

    /// Whether every condition in `required` is active.
    pub fn contains_all(&self, required: &[Condition]) -> bool {
        required.iter().all(|c| self.0.contains(c))
    }

    /// How many of `conditions` are active.
    pub fn count_of(&self, conditions: &[Condition]) -> usize {
        conditions.iter().filter(|c| self.0.contains(c)).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = Condition> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.iter().map(|c| c.key()).collect()
    }
}

impl FromIterator<Condition> for ConditionSet {
    fn from_iter<I: IntoIterator<Item = Condition>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
