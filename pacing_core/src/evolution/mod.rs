//! Character Evolution Tracker - growth along personal dimensions, the
//! milestones it passes and the arc it adds up to.

mod dimension;

pub use dimension::*;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use story_state::{BoundedLog, CharacterId};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub default_level: f32,
    /// Resistance is kept within `1.0..=5.0`.
    pub default_resistance: f32,
    /// Growth events inspected for arc detection.
    pub arc_window: usize,
    /// Minimum confidence for an arc to become active.
    pub arc_confidence: u32,
    /// Net movement that counts as a full signal.
    pub arc_signal_strength: f32,
    pub history_limit: usize,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            default_level: 50.0,
            default_resistance: 1.0,
            arc_window: 15,
            arc_confidence: 40,
            arc_signal_strength: 15.0,
            history_limit: 30,
        }
    }
}

/// A change to feed into the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthEvent {
    pub dimension: GrowthDimension,
    pub magnitude: f32,
    pub catalyst: String,
}

impl GrowthEvent {
    pub fn new(dimension: GrowthDimension, magnitude: f32, catalyst: impl Into<String>) -> Self {
        Self {
            dimension,
            magnitude,
            catalyst: catalyst.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthRecord {
    pub dimension: GrowthDimension,
    pub magnitude: f32,
    pub actual_change: f32,
    pub catalyst: String,
    pub turn: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionState {
    pub level: f32,
    pub resistance: f32,
    /// Moving average of applied change.
    pub velocity: f32,
    pub reached: BTreeSet<Milestone>,
}

impl DimensionState {
    fn new(level: f32, resistance: f32) -> Self {
        Self {
            level: level.clamp(0.0, 100.0),
            resistance: resistance.clamp(1.0, 5.0),
            velocity: 0.0,
            reached: BTreeSet::new(),
        }
    }

    /// Resistant characters grow slowly but regress easily.
    pub fn actual_change(&self, magnitude: f32) -> f32 {
        if magnitude >= 0.0 {
            magnitude / self.resistance
        } else {
            magnitude * (1.0 + 0.1 * self.resistance)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneEvent {
    pub dimension: GrowthDimension,
    pub milestone: Milestone,
    pub turn: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveArc {
    pub pattern: ArcPattern,
    pub confidence: u32,
}

/// Result of recording a growth event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthOutcome {
    pub actual_change: f32,
    pub level: f32,
    pub milestones: Vec<Milestone>,
    /// Set when this event changed the active arc.
    pub new_arc: Option<ActiveArc>,
}

/// Growth state of one character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterEvolution {
    dimensions: BTreeMap<GrowthDimension, DimensionState>,
    history: BoundedLog<GrowthRecord>,
    pending_milestones: Vec<MilestoneEvent>,
    active_arc: Option<ActiveArc>,
}

impl CharacterEvolution {
    fn new(history_limit: usize) -> Self {
        Self {
            dimensions: BTreeMap::new(),
            history: BoundedLog::new(history_limit),
            pending_milestones: Vec::new(),
            active_arc: None,
        }
    }

    pub fn dimension(&self, dimension: GrowthDimension) -> Option<&DimensionState> {
        self.dimensions.get(&dimension)
    }

    pub fn history(&self) -> &BoundedLog<GrowthRecord> {
        &self.history
    }

    pub fn pending_milestones(&self) -> &[MilestoneEvent] {
        &self.pending_milestones
    }

    pub fn active_arc(&self) -> Option<ActiveArc> {
        self.active_arc
    }

    /// Dimension with the largest positive velocity.
    pub fn strongest_growth(&self) -> Option<GrowthDimension> {
        self.dimensions
            .iter()
            .filter(|(_, state)| state.velocity > 0.0)
            .max_by(|a, b| a.1.velocity.total_cmp(&b.1.velocity))
            .map(|(dimension, _)| *dimension)
    }
}

/// Per-character summary for the orchestrator and the context bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionSummary {
    pub character: CharacterId,
    pub active_arc: Option<ArcPattern>,
    pub arc_confidence: u32,
    pub strongest_growth: Option<GrowthDimension>,
    pub pending_milestones: Vec<String>,
}

/// Growth tracking for every character in a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvolutionTracker {
    characters: BTreeMap<CharacterId, CharacterEvolution>,
    #[serde(skip)]
    config: EvolutionConfig,
}

impl EvolutionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EvolutionConfig) -> Self {
        Self {
            characters: BTreeMap::new(),
            config,
        }
    }

    pub fn set_config(&mut self, config: EvolutionConfig) {
        for character in self.characters.values_mut() {
            character.history.set_capacity(config.history_limit);
        }
        self.config = config;
    }

    pub fn character(&self, id: &CharacterId) -> Option<&CharacterEvolution> {
        self.characters.get(id)
    }

    fn entry(&mut self, id: &CharacterId) -> &mut CharacterEvolution {
        let limit = self.config.history_limit;
        self.characters
            .entry(id.clone())
            .or_insert_with(|| CharacterEvolution::new(limit))
    }

    /// Set a starting level and resistance for a dimension.
    pub fn set_baseline(&mut self, id: &CharacterId, dimension: GrowthDimension, level: f32, resistance: f32) {
        if !level.is_finite() || !resistance.is_finite() {
            debug!(character = %id, dimension = %dimension, "Ignoring non-finite baseline");
            return;
        }
        self.entry(id)
            .dimensions
            .insert(dimension, DimensionState::new(level, resistance));
    }

    pub fn level(&self, id: &CharacterId, dimension: GrowthDimension) -> f32 {
        self.characters
            .get(id)
            .and_then(|c| c.dimension(dimension))
            .map(|d| d.level)
            .unwrap_or(self.config.default_level)
    }

    pub fn record_growth(&mut self, id: &CharacterId, event: GrowthEvent, turn: u64) -> GrowthOutcome {
        if !event.magnitude.is_finite() {
            debug!(character = %id, dimension = %event.dimension, "Ignoring non-finite growth magnitude");
            return GrowthOutcome {
                actual_change: 0.0,
                level: self.level(id, event.dimension),
                milestones: Vec::new(),
                new_arc: None,
            };
        }
        let config = self.config.clone();
        let character = self.entry(id);
        let state = character
            .dimensions
            .entry(event.dimension)
            .or_insert_with(|| DimensionState::new(config.default_level, config.default_resistance));

        let actual_change = state.actual_change(event.magnitude);
        let previous = state.level;
        state.level = (previous + actual_change).clamp(0.0, 100.0);
        state.velocity = 0.7 * state.velocity + 0.3 * actual_change;
        let level = state.level;

        let mut milestones = Vec::new();
        for milestone in Milestone::ALL {
            if !state.reached.contains(&milestone) && milestone.crossed(previous, level) {
                state.reached.insert(milestone);
                milestones.push(milestone);
            }
        }
        for milestone in &milestones {
            info!(character = %id, dimension = %event.dimension, milestone = milestone.key(), "Milestone reached");
            character.pending_milestones.push(MilestoneEvent {
                dimension: event.dimension,
                milestone: *milestone,
                turn,
            });
        }

        debug!(
            character = %id,
            dimension = %event.dimension,
            magnitude = event.magnitude,
            actual_change,
            level,
            "Growth recorded"
        );
        character.history.push(GrowthRecord {
            dimension: event.dimension,
            magnitude: event.magnitude,
            actual_change,
            catalyst: event.catalyst,
            turn,
        });

        let detected = detect_arc(character.history.iter(), &config);
        let new_arc = match (detected, character.active_arc) {
            (Some(arc), Some(active)) if arc.pattern == active.pattern => {
                character.active_arc = Some(arc);
                None
            }
            (Some(arc), _) => {
                info!(character = %id, arc = arc.pattern.key(), confidence = arc.confidence, "Arc detected");
                character.active_arc = Some(arc);
                Some(arc)
            }
            (None, _) => None,
        };

        GrowthOutcome {
            actual_change,
            level,
            milestones,
            new_arc,
        }
    }

    /// Detect the arc for a character without recording anything.
    pub fn detect_arc(&self, id: &CharacterId) -> Option<ActiveArc> {
        let character = self.characters.get(id)?;
        detect_arc(character.history.iter(), &self.config)
    }

    pub fn active_arc(&self, id: &CharacterId) -> Option<ActiveArc> {
        self.characters.get(id).and_then(|c| c.active_arc)
    }

    /// Every unacknowledged milestone, by character.
    pub fn pending_milestones(&self) -> Vec<(CharacterId, MilestoneEvent)> {
        self.characters
            .iter()
            .flat_map(|(id, c)| c.pending_milestones.iter().map(move |m| (id.clone(), m.clone())))
            .collect()
    }

    pub fn has_pending_milestones(&self) -> bool {
        self.characters.values().any(|c| !c.pending_milestones.is_empty())
    }

    /// Clear a character's pending milestones once the story has marked them.
    pub fn acknowledge_milestones(&mut self, id: &CharacterId) -> usize {
        match self.characters.get_mut(id) {
            Some(character) => std::mem::take(&mut character.pending_milestones).len(),
            None => 0,
        }
    }

    pub fn any_active_arc(&self) -> bool {
        self.characters.values().any(|c| c.active_arc.is_some())
    }

    pub fn summary(&self, id: &CharacterId) -> Option<EvolutionSummary> {
        let character = self.characters.get(id)?;
        Some(EvolutionSummary {
            character: id.clone(),
            active_arc: character.active_arc.map(|a| a.pattern),
            arc_confidence: character.active_arc.map(|a| a.confidence).unwrap_or(0),
            strongest_growth: character.strongest_growth(),
            pending_milestones: character
                .pending_milestones
                .iter()
                .map(|m| format!("{} ({})", m.milestone.key(), m.dimension))
                .collect(),
        })
    }

    pub fn summaries(&self) -> Vec<EvolutionSummary> {
        self.characters.keys().filter_map(|id| self.summary(id)).collect()
    }
}

/// Best arc over the newest growth records, if any clears the confidence bar.
fn detect_arc<'a>(
    history: impl DoubleEndedIterator<Item = &'a GrowthRecord>,
    config: &EvolutionConfig,
) -> Option<ActiveArc> {
    let mut net: BTreeMap<GrowthDimension, f32> = BTreeMap::new();
    for record in history.rev().take(config.arc_window) {
        *net.entry(record.dimension).or_default() += record.actual_change;
    }

    let mut best: Option<ActiveArc> = None;
    for pattern in ArcPattern::ALL {
        let confidence = arc_confidence(pattern, &net, config.arc_signal_strength);
        if confidence >= config.arc_confidence && best.map(|b| confidence > b.confidence).unwrap_or(true) {
            best = Some(ActiveArc { pattern, confidence });
        }
    }
    best
}

fn arc_confidence(pattern: ArcPattern, net: &BTreeMap<GrowthDimension, f32>, strength: f32) -> u32 {
    if pattern == ArcPattern::Fall {
        let falling = net.values().filter(|change| **change < 0.0).count();
        if falling < 2 {
            return 0;
        }
        return (falling.min(4) * 25) as u32;
    }

    let signals = pattern.signals();
    let total: f32 = signals
        .iter()
        .map(|(dimension, trend)| {
            let change = net.get(dimension).copied().unwrap_or(0.0);
            let directed = match trend {
                Trend::Rising => change,
                Trend::Falling => -change,
            };
            (directed / strength).clamp(0.0, 1.0)
        })
        .sum();
    (total / signals.len() as f32 * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kael() -> CharacterId {
        CharacterId::new("kael")
    }

    fn lyra() -> CharacterId {
        CharacterId::new("lyra")
    }

    #[test]
    fn test_resistance_asymmetry() {
        let mut tracker = EvolutionTracker::new();
        tracker.set_baseline(&kael(), GrowthDimension::Trust, 50.0, 1.0);
        tracker.set_baseline(&lyra(), GrowthDimension::Trust, 50.0, 5.0);

        let easy = tracker.record_growth(&kael(), GrowthEvent::new(GrowthDimension::Trust, 10.0, "rescue"), 1);
        let hard = tracker.record_growth(&lyra(), GrowthEvent::new(GrowthDimension::Trust, 10.0, "rescue"), 1);
        assert!(hard.actual_change < easy.actual_change);
        assert_eq!(easy.actual_change, 10.0);
        assert_eq!(hard.actual_change, 2.0);

        let setback = tracker.record_growth(&lyra(), GrowthEvent::new(GrowthDimension::Trust, -10.0, "lie"), 2);
        assert_eq!(setback.actual_change, -15.0);
    }

    #[test]
    fn test_non_finite_growth_is_ignored() {
        let mut tracker = EvolutionTracker::new();
        tracker.record_growth(&kael(), GrowthEvent::new(GrowthDimension::Trust, 4.0, "shared bread"), 1);

        for magnitude in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let outcome = tracker.record_growth(&kael(), GrowthEvent::new(GrowthDimension::Trust, magnitude, "glitch"), 2);
            assert_eq!(outcome.actual_change, 0.0);
            assert_eq!(outcome.level, 54.0);
            assert!(outcome.milestones.is_empty());
        }
        tracker.set_baseline(&kael(), GrowthDimension::Trust, f32::NAN, 1.0);

        assert_eq!(tracker.level(&kael(), GrowthDimension::Trust), 54.0);
        assert_eq!(tracker.character(&kael()).unwrap().history().len(), 1);
        let next = tracker.record_growth(&kael(), GrowthEvent::new(GrowthDimension::Trust, 2.0, "kept watch"), 3);
        assert_eq!(next.level, 56.0);
    }

    #[test]
    fn test_velocity_moving_average() {
        let mut tracker = EvolutionTracker::new();
        tracker.record_growth(&kael(), GrowthEvent::new(GrowthDimension::Courage, 10.0, "stood firm"), 1);
        tracker.record_growth(&kael(), GrowthEvent::new(GrowthDimension::Courage, 10.0, "stood firm"), 2);
        let state = tracker.character(&kael()).unwrap().dimension(GrowthDimension::Courage).unwrap();
        // 0.7 * 3.0 + 0.3 * 10.0
        assert!((state.velocity - 5.1).abs() < 1e-4);
    }

    #[test]
    fn test_milestones_fire_once() {
        let mut tracker = EvolutionTracker::new();
        let outcome = tracker.record_growth(&kael(), GrowthEvent::new(GrowthDimension::Hope, 6.0, "sunrise"), 1);
        assert_eq!(outcome.milestones, vec![Milestone::FirstGrowth]);

        tracker.record_growth(&kael(), GrowthEvent::new(GrowthDimension::Hope, -10.0, "loss"), 2);
        let again = tracker.record_growth(&kael(), GrowthEvent::new(GrowthDimension::Hope, 10.0, "letter"), 3);
        assert!(again.milestones.is_empty());
        assert_eq!(tracker.pending_milestones().len(), 1);

        assert_eq!(tracker.acknowledge_milestones(&kael()), 1);
        assert!(!tracker.has_pending_milestones());
    }

    #[test]
    fn test_downward_milestones() {
        let mut tracker = EvolutionTracker::new();
        tracker.set_baseline(&kael(), GrowthDimension::SelfWorth, 35.0, 1.0);
        let outcome = tracker.record_growth(&kael(), GrowthEvent::new(GrowthDimension::SelfWorth, -25.0, "exile"), 1);
        // -25 * 1.1 lands at 7.5, through both thresholds.
        assert_eq!(outcome.milestones, vec![Milestone::CrisisPoint, Milestone::RockBottom]);
    }

    #[test]
    fn test_healing_arc_detected() {
        let mut tracker = EvolutionTracker::new();
        tracker.record_growth(&kael(), GrowthEvent::new(GrowthDimension::Trust, 8.0, "kept word"), 1);
        assert!(tracker.active_arc(&kael()).is_none());
        tracker.record_growth(&kael(), GrowthEvent::new(GrowthDimension::Vulnerability, 8.0, "wept"), 2);
        let outcome = tracker.record_growth(&kael(), GrowthEvent::new(GrowthDimension::Openness, 8.0, "told story"), 3);

        let arc = outcome.new_arc.unwrap();
        assert_eq!(arc.pattern, ArcPattern::Healing);
        assert!(arc.confidence >= 40);
        assert_eq!(tracker.active_arc(&kael()).map(|a| a.pattern), Some(ArcPattern::Healing));
    }

    #[test]
    fn test_fall_arc_needs_two_falling_dimensions() {
        let mut tracker = EvolutionTracker::new();
        tracker.record_growth(&kael(), GrowthEvent::new(GrowthDimension::Hope, -5.0, "storm"), 1);
        assert!(tracker.detect_arc(&kael()).is_none());
        tracker.record_growth(&kael(), GrowthEvent::new(GrowthDimension::Courage, -5.0, "fled"), 2);
        assert_eq!(tracker.detect_arc(&kael()).map(|a| a.pattern), Some(ArcPattern::Fall));
    }

    #[test]
    fn test_summary() {
        let mut tracker = EvolutionTracker::new();
        tracker.record_growth(&kael(), GrowthEvent::new(GrowthDimension::Courage, 6.0, "fought"), 1);
        let summary = tracker.summary(&kael()).unwrap();
        assert_eq!(summary.strongest_growth, Some(GrowthDimension::Courage));
        assert_eq!(summary.pending_milestones, vec!["first-growth (courage)".to_string()]);
        assert!(tracker.summary(&lyra()).is_none());
    }
}
