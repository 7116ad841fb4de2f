//! Emotional Resonance Tracker - current tone and intensity, plus the
//! catharsis debt that accumulates until the story releases it.

mod buildup;
mod tone;

pub use buildup::*;
pub use tone::*;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use story_state::BoundedLog;
use tracing::debug;

use crate::urgency::Urgency;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionConfig {
    /// Debt at which a release is proposed.
    pub release_threshold: u8,
    /// Moments inspected for variety and intensity checks.
    pub window: usize,
    /// A window with this many distinct tones or fewer is monotonous.
    pub variety_max_distinct: usize,
    /// Average window intensity that calls for a breather.
    pub high_intensity_average: f32,
    /// Intensity at or above which a moment counts as a peak.
    pub peak_intensity: u8,
    pub history_limit: usize,
    /// Open buildups kept at once; starting another drops the oldest.
    pub max_buildups: usize,
}

impl Default for EmotionConfig {
    fn default() -> Self {
        Self {
            release_threshold: 60,
            window: 5,
            variety_max_distinct: 2,
            high_intensity_average: 7.0,
            peak_intensity: 8,
            history_limit: 20,
            max_buildups: 8,
        }
    }
}

/// A recorded emotional moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalMoment {
    pub sequence: u64,
    pub tone: EmotionalTone,
    /// `1..=10`.
    pub intensity: u8,
    pub technique: Option<Technique>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    Release,
    Variety,
    Breathe,
}

/// A proposed emotional direction for the next beats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionSuggestion {
    pub direction: Direction,
    pub reason: String,
    pub suggested_tones: Vec<EmotionalTone>,
    pub urgency: Urgency,
    /// Technique that has been leaned on too much lately.
    pub avoid_technique: Option<Technique>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionSummary {
    pub tone: EmotionalTone,
    pub intensity: u8,
    pub catharsis_debt: u8,
    pub debt_label: String,
    pub at_peak: bool,
    pub suggestions: Vec<DirectionSuggestion>,
    pub pending_payoffs: Vec<EmotionalTone>,
}

/// Tracks the emotional temperature of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionalResonance {
    tone: EmotionalTone,
    intensity: u8,
    catharsis_debt: u8,
    moments: BoundedLog<EmotionalMoment>,
    buildups: Vec<Buildup>,
    next_buildup: u64,
    recorded: u64,
    #[serde(skip)]
    config: EmotionConfig,
}

impl Default for EmotionalResonance {
    fn default() -> Self {
        Self::new(EmotionConfig::default())
    }
}

impl EmotionalResonance {
    pub fn new(config: EmotionConfig) -> Self {
        Self {
            tone: EmotionalTone::Anticipation,
            intensity: 3,
            catharsis_debt: 0,
            moments: BoundedLog::new(config.history_limit),
            buildups: Vec::new(),
            next_buildup: 1,
            recorded: 0,
            config,
        }
    }

    pub fn set_config(&mut self, config: EmotionConfig) {
        self.moments.set_capacity(config.history_limit);
        self.config = config;
        self.trim_buildups();
    }

    pub fn tone(&self) -> EmotionalTone {
        self.tone
    }

    pub fn intensity(&self) -> u8 {
        self.intensity
    }

    pub fn catharsis_debt(&self) -> u8 {
        self.catharsis_debt
    }

    pub fn moments(&self) -> &BoundedLog<EmotionalMoment> {
        &self.moments
    }

    /// The latest moment hit peak intensity.
    pub fn at_peak(&self) -> bool {
        self.moments
            .last()
            .map(|m| m.intensity >= self.config.peak_intensity)
            .unwrap_or(false)
    }

    /// Record a moment. Intensity is clamped to `1..=10`.
    pub fn record_moment(&mut self, tone: EmotionalTone, intensity: u8, technique: Option<Technique>) {
        let intensity = intensity.clamp(1, 10);
        self.recorded += 1;
        self.tone = tone;
        self.intensity = intensity;
        self.moments.push(EmotionalMoment {
            sequence: self.recorded,
            tone,
            intensity,
            technique,
        });
        self.update_debt(tone, intensity);
    }

    fn update_debt(&mut self, tone: EmotionalTone, intensity: u8) {
        let debt = self.catharsis_debt as f32;
        let next = if tone == EmotionalTone::Catharsis {
            0.0
        } else {
            match tone.valence() {
                ToneValence::Burdening => debt + intensity as f32 * 2.0 * tone.debt_weight(),
                ToneValence::Releasing => debt - intensity as f32 * 3.0,
                ToneValence::Neutral => debt,
            }
        };
        self.catharsis_debt = next.round().clamp(0.0, 100.0) as u8;
        debug!(tone = %tone, intensity, debt = self.catharsis_debt, "catharsis debt updated");
    }

    pub fn suggest_direction(&self) -> Vec<DirectionSuggestion> {
        let mut suggestions = Vec::new();

        if self.catharsis_debt >= self.config.release_threshold {
            let urgency = if self.catharsis_debt >= 80 {
                Urgency::High
            } else {
                Urgency::Medium
            };
            suggestions.push(DirectionSuggestion {
                direction: Direction::Release,
                reason: format!("catharsis debt is {}", self.catharsis_debt),
                suggested_tones: vec![
                    EmotionalTone::Catharsis,
                    EmotionalTone::Relief,
                    EmotionalTone::Warmth,
                    EmotionalTone::Hope,
                ],
                urgency,
                avoid_technique: None,
            });
        }

        let window: Vec<&EmotionalMoment> = self.moments.recent(self.config.window).collect();

        if window.len() >= self.config.window {
            let distinct: BTreeSet<EmotionalTone> = window.iter().map(|m| m.tone).collect();
            if distinct.len() <= self.config.variety_max_distinct {
                let burdened = window
                    .iter()
                    .filter(|m| m.tone.valence() == ToneValence::Burdening)
                    .count();
                let palette: &[EmotionalTone] = if burdened * 2 >= window.len() {
                    &[EmotionalTone::Humor, EmotionalTone::Warmth, EmotionalTone::Wonder]
                } else {
                    &[
                        EmotionalTone::Curiosity,
                        EmotionalTone::Anticipation,
                        EmotionalTone::Melancholy,
                    ]
                };
                suggestions.push(DirectionSuggestion {
                    direction: Direction::Variety,
                    reason: format!(
                        "the last {} moments used only {} tone(s)",
                        window.len(),
                        distinct.len()
                    ),
                    suggested_tones: palette
                        .iter()
                        .copied()
                        .filter(|t| !distinct.contains(t))
                        .collect(),
                    urgency: Urgency::Low,
                    avoid_technique: most_used_technique(&window),
                });
            }
        }

        if window.len() >= 3 {
            let average =
                window.iter().map(|m| m.intensity as f32).sum::<f32>() / window.len() as f32;
            if average >= self.config.high_intensity_average {
                suggestions.push(DirectionSuggestion {
                    direction: Direction::Breathe,
                    reason: format!("average recent intensity is {:.1}", average),
                    suggested_tones: vec![
                        EmotionalTone::Peace,
                        EmotionalTone::Melancholy,
                        EmotionalTone::Nostalgia,
                    ],
                    urgency: Urgency::Medium,
                    avoid_technique: None,
                });
            }
        }

        suggestions
    }

    /// Start a buildup toward `payoff`, requiring each phase in order.
    pub fn start_buildup(&mut self, payoff: EmotionalTone, phases: Vec<String>) -> BuildupId {
        let id = BuildupId(self.next_buildup);
        self.next_buildup += 1;
        self.buildups.push(Buildup::new(id, payoff, phases));
        self.trim_buildups();
        id
    }

    fn trim_buildups(&mut self) {
        let max = self.config.max_buildups.max(1);
        if self.buildups.len() > max {
            let excess = self.buildups.len() - max;
            let dropped: Vec<BuildupId> = self.buildups.drain(..excess).map(|b| b.id).collect();
            debug!(?dropped, "Dropped stale buildups");
        }
    }

    pub fn advance_buildup(&mut self, id: BuildupId) -> Option<BuildupProgress> {
        self.buildups.iter_mut().find(|b| b.id == id)?.advance()
    }

    pub fn is_payoff_ready(&self, id: BuildupId) -> bool {
        self.buildup(id).map(Buildup::is_ready).unwrap_or(false)
    }

    /// Fire the payoff if every phase has landed, recording it as a moment.
    pub fn trigger_payoff(&mut self, id: BuildupId, intensity: u8) -> Option<EmotionalTone> {
        let index = self
            .buildups
            .iter()
            .position(|b| b.id == id && b.is_ready())?;
        let buildup = self.buildups.remove(index);
        self.record_moment(buildup.payoff, intensity, Some(Technique::Payoff));
        Some(buildup.payoff)
    }

    pub fn buildup(&self, id: BuildupId) -> Option<&Buildup> {
        self.buildups.iter().find(|b| b.id == id)
    }

    pub fn buildups(&self) -> &[Buildup] {
        &self.buildups
    }

    pub fn debt_label(&self) -> &'static str {
        match self.catharsis_debt {
            0..=19 => "settled",
            20..=39 => "simmering",
            40..=59 => "heavy",
            60..=79 => "aching",
            _ => "overdue",
        }
    }

    pub fn summary(&self) -> EmotionSummary {
        EmotionSummary {
            tone: self.tone,
            intensity: self.intensity,
            catharsis_debt: self.catharsis_debt,
            debt_label: self.debt_label().to_string(),
            at_peak: self.at_peak(),
            suggestions: self.suggest_direction(),
            pending_payoffs: self
                .buildups
                .iter()
                .filter(|b| b.is_ready())
                .map(|b| b.payoff)
                .collect(),
        }
    }
}

fn most_used_technique(window: &[&EmotionalMoment]) -> Option<Technique> {
    let mut counts: BTreeMap<Technique, usize> = BTreeMap::new();
    for technique in window.iter().filter_map(|m| m.technique) {
        *counts.entry(technique).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count >= 2)
        .max_by_key(|(_, count)| *count)
        .map(|(technique, _)| technique)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burdening_tones_accrue_debt() {
        let mut tracker = EmotionalResonance::default();
        tracker.record_moment(EmotionalTone::Fear, 5, None);
        assert_eq!(tracker.catharsis_debt(), 10);
        assert_eq!(tracker.tone(), EmotionalTone::Fear);
        assert_eq!(tracker.intensity(), 5);
    }

    #[test]
    fn test_releasing_tones_pay_debt_down() {
        let mut tracker = EmotionalResonance::default();
        tracker.record_moment(EmotionalTone::Dread, 10, None);
        tracker.record_moment(EmotionalTone::Humor, 4, None);
        assert_eq!(tracker.catharsis_debt(), 8);

        tracker.record_moment(EmotionalTone::Joy, 10, None);
        assert_eq!(tracker.catharsis_debt(), 0);
    }

    #[test]
    fn test_betrayals_then_catharsis_resets_debt() {
        let mut tracker = EmotionalResonance::default();
        for _ in 0..3 {
            tracker.record_moment(EmotionalTone::Betrayal, 10, None);
        }
        assert_eq!(tracker.catharsis_debt(), 75);

        tracker.record_moment(EmotionalTone::Catharsis, 1, None);
        assert_eq!(tracker.catharsis_debt(), 0);
    }

    #[test]
    fn test_debt_stays_in_range() {
        let mut tracker = EmotionalResonance::default();
        for _ in 0..20 {
            tracker.record_moment(EmotionalTone::Despair, 10, None);
            assert!(tracker.catharsis_debt() <= 100);
        }
        assert_eq!(tracker.catharsis_debt(), 100);
    }

    #[test]
    fn test_intensity_is_clamped() {
        let mut tracker = EmotionalResonance::default();
        tracker.record_moment(EmotionalTone::Anger, 40, None);
        assert_eq!(tracker.intensity(), 10);
        tracker.record_moment(EmotionalTone::Curiosity, 0, None);
        assert_eq!(tracker.intensity(), 1);
    }

    #[test]
    fn test_suggests_release_when_debt_high() {
        let mut tracker = EmotionalResonance::default();
        for _ in 0..3 {
            tracker.record_moment(EmotionalTone::Grief, 9, None);
        }
        let suggestions = tracker.suggest_direction();
        let release = suggestions
            .iter()
            .find(|s| s.direction == Direction::Release)
            .unwrap();
        assert_eq!(release.urgency, Urgency::Medium);
        assert!(release.suggested_tones.contains(&EmotionalTone::Catharsis));
    }

    #[test]
    fn test_suggests_variety_for_monotony() {
        let mut tracker = EmotionalResonance::default();
        for _ in 0..5 {
            tracker.record_moment(EmotionalTone::Fear, 3, Some(Technique::Understatement));
        }
        let suggestions = tracker.suggest_direction();
        let variety = suggestions
            .iter()
            .find(|s| s.direction == Direction::Variety)
            .unwrap();
        assert!(variety.suggested_tones.contains(&EmotionalTone::Humor));
        assert_eq!(variety.avoid_technique, Some(Technique::Understatement));
        assert!(!suggestions.iter().any(|s| s.direction == Direction::Breathe));
    }

    #[test]
    fn test_suggests_breathe_for_sustained_intensity() {
        let mut tracker = EmotionalResonance::default();
        tracker.record_moment(EmotionalTone::Wonder, 8, None);
        tracker.record_moment(EmotionalTone::Joy, 9, None);
        tracker.record_moment(EmotionalTone::Hope, 8, None);

        let suggestions = tracker.suggest_direction();
        assert!(suggestions.iter().any(|s| s.direction == Direction::Breathe));
        assert!(!suggestions.iter().any(|s| s.direction == Direction::Variety));
    }

    #[test]
    fn test_buildup_payoff_requires_every_phase() {
        let mut tracker = EmotionalResonance::default();
        let id = tracker.start_buildup(
            EmotionalTone::Joy,
            vec!["first glimpse".into(), "almost lost".into(), "return".into()],
        );

        assert!(!tracker.is_payoff_ready(id));
        assert_eq!(tracker.trigger_payoff(id, 9), None);

        tracker.advance_buildup(id);
        tracker.advance_buildup(id);
        assert!(!tracker.is_payoff_ready(id));
        assert_eq!(tracker.trigger_payoff(id, 9), None);

        let progress = tracker.advance_buildup(id).unwrap();
        assert!(progress.is_complete());
        assert!(tracker.is_payoff_ready(id));
        assert_eq!(tracker.summary().pending_payoffs, vec![EmotionalTone::Joy]);

        assert_eq!(tracker.trigger_payoff(id, 9), Some(EmotionalTone::Joy));
        assert_eq!(tracker.tone(), EmotionalTone::Joy);
        assert!(tracker.buildup(id).is_none());
        assert_eq!(
            tracker.moments().last().unwrap().technique,
            Some(Technique::Payoff)
        );
    }

    #[test]
    fn test_abandoned_buildups_are_capped() {
        let mut tracker = EmotionalResonance::new(EmotionConfig {
            max_buildups: 3,
            ..EmotionConfig::default()
        });
        let ids: Vec<BuildupId> = (0..10)
            .map(|_| tracker.start_buildup(EmotionalTone::Hope, vec!["setup".into()]))
            .collect();

        assert_eq!(tracker.buildups().len(), 3);
        assert!(tracker.buildup(ids[6]).is_none());
        assert!(tracker.buildup(ids[9]).is_some());

        tracker.set_config(EmotionConfig {
            max_buildups: 1,
            ..EmotionConfig::default()
        });
        assert_eq!(tracker.buildups().len(), 1);
        assert!(tracker.buildup(ids[9]).is_some());
    }

    #[test]
    fn test_unknown_buildup_is_ignored() {
        let mut tracker = EmotionalResonance::default();
        assert!(tracker.advance_buildup(BuildupId(99)).is_none());
        assert!(!tracker.is_payoff_ready(BuildupId(99)));
    }

    #[test]
    fn test_peak_detection_and_labels() {
        let mut tracker = EmotionalResonance::default();
        assert!(!tracker.at_peak());
        tracker.record_moment(EmotionalTone::Anger, 9, None);
        assert!(tracker.at_peak());
        assert_eq!(tracker.debt_label(), "settled");
    }
}
