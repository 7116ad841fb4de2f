//! Tension Controller - keeps the 0-100 pacing value, the genre's target
//! range and detects when the reader is owed a breath.

mod event;
mod genre;

pub use event::*;
pub use genre::*;

use serde::{Deserialize, Serialize};
use story_state::BoundedLog;
use tracing::debug;

use crate::preferences::ReaderProfile;
use crate::urgency::Urgency;

/// Tunables for the tension controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TensionConfig {
    /// Tension at or above which an exchange counts toward sustained-high.
    pub high_threshold: u8,
    /// Consecutive high exchanges before a breath is forced.
    pub sustained_high_limit: u32,
    /// Distance from target that counts as drifting.
    pub drift_tolerance: u8,
    pub history_limit: usize,
    pub event_history_limit: usize,
}

impl Default for TensionConfig {
    fn default() -> Self {
        Self {
            high_threshold: 70,
            sustained_high_limit: 5,
            drift_tolerance: 10,
            history_limit: 50,
            event_history_limit: 30,
        }
    }
}

/// Pacing mode, derived from the most recent tension delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PacingMode {
    Breath,
    Building,
    #[default]
    Sustaining,
    Releasing,
    Spiking,
    Crashing,
}

impl PacingMode {
    pub fn from_delta(delta: i32) -> Self {
        match delta {
            d if d >= 20 => PacingMode::Spiking,
            d if d > 0 => PacingMode::Building,
            0 => PacingMode::Sustaining,
            d if d <= -20 => PacingMode::Crashing,
            _ => PacingMode::Releasing,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PacingMode::Breath => "breath",
            PacingMode::Building => "building",
            PacingMode::Sustaining => "sustaining",
            PacingMode::Releasing => "releasing",
            PacingMode::Spiking => "spiking",
            PacingMode::Crashing => "crashing",
        }
    }
}

/// Coarse tension band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TensionTier {
    Calm,
    Low,
    Moderate,
    High,
    Peak,
}

impl TensionTier {
    pub fn of(tension: u8) -> Self {
        match tension {
            0..=20 => TensionTier::Calm,
            21..=40 => TensionTier::Low,
            41..=60 => TensionTier::Moderate,
            61..=80 => TensionTier::High,
            _ => TensionTier::Peak,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TensionTier::Calm => "calm",
            TensionTier::Low => "low",
            TensionTier::Moderate => "moderate",
            TensionTier::High => "high",
            TensionTier::Peak => "peak",
        }
    }
}

/// Result of applying a tension event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensionChange {
    pub previous: u8,
    pub new: u8,
    pub delta: i32,
    pub mode: PacingMode,
    pub event: Option<TensionEvent>,
}

/// A per-exchange tension reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TensionSample {
    pub exchange: u64,
    pub tension: u8,
}

/// Whether the story is owed a breath, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BreathNeed {
    pub needed: bool,
    pub urgency: Urgency,
    pub reasons: Vec<String>,
}

/// What the pacing should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PacingAction {
    Breath,
    IncreaseTension,
    DecreaseTension,
    Sustain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacingRecommendation {
    pub action: PacingAction,
    pub urgency: Urgency,
    pub reason: String,
    pub suggested_event: Option<TensionEvent>,
}

/// Compact view for the orchestrator and the context bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensionSummary {
    pub value: u8,
    pub tier: TensionTier,
    pub mode: PacingMode,
    pub target: u8,
    pub preferred_range: (u8, u8),
    pub label: String,
    pub breath: BreathNeed,
    pub pacing: PacingRecommendation,
}

/// Tracks tension, pacing mode and breath cadence for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TensionManager {
    tension: u8,
    mode: PacingMode,
    genre: Genre,
    profile: GenreProfile,
    history: BoundedLog<TensionSample>,
    events: BoundedLog<TensionChange>,
    exchanges: u64,
    exchanges_since_breath: u32,
    exchanges_since_peak: u32,
    sustained_high_count: u32,
    /// Learned scalar on the breath cadence, `0.5..=1.5`.
    reader_tolerance: f32,
    #[serde(skip)]
    config: TensionConfig,
}

impl Default for TensionManager {
    fn default() -> Self {
        Self::new(Genre::default())
    }
}

impl TensionManager {
    pub fn new(genre: Genre) -> Self {
        Self::with_config(genre, TensionConfig::default())
    }

    pub fn with_config(genre: Genre, config: TensionConfig) -> Self {
        let profile = genre.profile();
        Self {
            tension: 20,
            mode: PacingMode::Sustaining,
            genre,
            profile,
            history: BoundedLog::new(config.history_limit),
            events: BoundedLog::new(config.event_history_limit),
            exchanges: 0,
            exchanges_since_breath: 0,
            exchanges_since_peak: 0,
            sustained_high_count: 0,
            reader_tolerance: 1.0,
            config,
        }
    }

    /// Re-attach configuration after deserialization.
    pub fn set_config(&mut self, config: TensionConfig) {
        self.history.set_capacity(config.history_limit);
        self.events.set_capacity(config.event_history_limit);
        self.config = config;
    }

    pub fn tension(&self) -> u8 {
        self.tension
    }

    pub fn mode(&self) -> PacingMode {
        self.mode
    }

    pub fn tier(&self) -> TensionTier {
        TensionTier::of(self.tension)
    }

    pub fn profile(&self) -> &GenreProfile {
        &self.profile
    }

    pub fn genre(&self) -> Genre {
        self.genre
    }

    pub fn exchanges_since_breath(&self) -> u32 {
        self.exchanges_since_breath
    }

    pub fn exchanges_since_peak(&self) -> u32 {
        self.exchanges_since_peak
    }

    pub fn sustained_high_count(&self) -> u32 {
        self.sustained_high_count
    }

    pub fn reader_tolerance(&self) -> f32 {
        self.reader_tolerance
    }

    pub fn history(&self) -> &BoundedLog<TensionSample> {
        &self.history
    }

    pub fn recent_changes(&self) -> &BoundedLog<TensionChange> {
        &self.events
    }

    /// Switch genre, dropping any reader bias.
    pub fn set_genre(&mut self, genre: Genre) {
        self.genre = genre;
        self.profile = genre.profile();
    }

    /// Rebuild the working profile from the genre, biased by the reader if known.
    pub fn apply_reader_profile(&mut self, reader: Option<&ReaderProfile>) {
        let base = self.genre.profile();
        self.profile = match reader {
            Some(reader) => base.biased_by(reader),
            None => base,
        };
    }

    /// Force tension to a value (clamped). Used when syncing from state.
    pub fn set_tension(&mut self, tension: i32) {
        self.tension = tension.clamp(0, 100) as u8;
    }

    /// Apply a named event.
    pub fn apply_event(&mut self, event: TensionEvent) -> TensionChange {
        self.apply_delta(event.delta(), Some(event))
    }

    /// Apply an event by key. Unknown keys change nothing.
    pub fn apply_event_key(&mut self, key: &str) -> TensionChange {
        match TensionEvent::from_key(key) {
            Some(event) => self.apply_event(event),
            None => {
                debug!(key, "unknown tension event, ignoring");
                TensionChange {
                    previous: self.tension,
                    new: self.tension,
                    delta: 0,
                    mode: self.mode,
                    event: None,
                }
            }
        }
    }

    /// Apply a raw signed delta.
    pub fn apply_delta(&mut self, delta: i32, event: Option<TensionEvent>) -> TensionChange {
        let previous = self.tension;
        self.tension = (previous as i32 + delta).clamp(0, 100) as u8;
        let applied = self.tension as i32 - previous as i32;
        self.mode = PacingMode::from_delta(delta);

        if self.tier() == TensionTier::Peak {
            self.exchanges_since_peak = 0;
        }

        let change = TensionChange {
            previous,
            new: self.tension,
            delta: applied,
            mode: self.mode,
            event,
        };
        self.events.push(change.clone());
        change
    }

    /// Advance the per-exchange counters. Call once per turn.
    pub fn record_exchange(&mut self) {
        self.exchanges += 1;
        self.exchanges_since_breath += 1;
        self.exchanges_since_peak += 1;
        if self.tension >= self.config.high_threshold {
            self.sustained_high_count += 1;
        } else {
            self.sustained_high_count = 0;
        }
        self.history.push(TensionSample {
            exchange: self.exchanges,
            tension: self.tension,
        });
    }

    /// A breath moment was delivered.
    pub fn record_breath(&mut self) {
        self.exchanges_since_breath = 0;
        self.sustained_high_count = 0;
        self.mode = PacingMode::Breath;
    }

    /// Nudge the learned tolerance from reader engagement.
    pub fn observe_reader_engagement(&mut self, engaged: bool) {
        let step = if engaged { 0.05 } else { -0.05 };
        self.reader_tolerance = (self.reader_tolerance + step).clamp(0.5, 1.5);
    }

    /// Breath cadence after the reader-tolerance scalar.
    pub fn effective_cadence(&self) -> u32 {
        ((self.profile.breath_cadence as f32 * self.reader_tolerance).round() as u32).max(2)
    }

    pub fn needs_breath(&self) -> BreathNeed {
        let mut need = BreathNeed::default();
        let cadence = self.effective_cadence();

        if self.exchanges_since_breath >= cadence {
            let urgency = if self.exchanges_since_breath >= cadence + cadence / 2 {
                Urgency::High
            } else {
                Urgency::Medium
            };
            need.raise(
                urgency,
                format!(
                    "{} exchanges since the last breath (cadence {})",
                    self.exchanges_since_breath, cadence
                ),
            );
        }

        if self.sustained_high_count >= self.config.sustained_high_limit
            && !self.profile.allows_sustained_high
        {
            need.raise(
                Urgency::High,
                format!(
                    "tension has stayed high for {} exchanges",
                    self.sustained_high_count
                ),
            );
        }

        if self.tier() == TensionTier::Peak {
            need.raise(Urgency::High, format!("tension is at peak ({})", self.tension));
        }

        need
    }

    pub fn recommend_pacing(&self) -> PacingRecommendation {
        let breath = self.needs_breath();
        let (min, max) = self.profile.preferred_range;
        let target = self.profile.target_tension;

        if breath.needed && breath.urgency == Urgency::High {
            return PacingRecommendation {
                action: PacingAction::Breath,
                urgency: Urgency::High,
                reason: breath.reasons.join("; "),
                suggested_event: Some(TensionEvent::Rest),
            };
        }

        if self.tension > max {
            return PacingRecommendation {
                action: PacingAction::DecreaseTension,
                urgency: Urgency::Medium,
                reason: format!("tension {} is above the preferred range ({}-{})", self.tension, min, max),
                suggested_event: Some(TensionEvent::Comfort),
            };
        }

        if self.tension < min {
            let suggested = if min - self.tension >= 15 {
                TensionEvent::ThreatIntroduced
            } else {
                TensionEvent::MysteryDeepens
            };
            return PacingRecommendation {
                action: PacingAction::IncreaseTension,
                urgency: Urgency::Medium,
                reason: format!("tension {} is below the preferred range ({}-{})", self.tension, min, max),
                suggested_event: Some(suggested),
            };
        }

        let drift = self.tension as i32 - target as i32;
        if drift.unsigned_abs() > self.config.drift_tolerance as u32 {
            let (action, suggested) = if drift < 0 {
                (PacingAction::IncreaseTension, TensionEvent::Discovery)
            } else {
                (PacingAction::DecreaseTension, TensionEvent::ComicRelief)
            };
            return PacingRecommendation {
                action,
                urgency: Urgency::Low,
                reason: format!("tension {} is drifting from the target {}", self.tension, target),
                suggested_event: Some(suggested),
            };
        }

        if breath.needed {
            return PacingRecommendation {
                action: PacingAction::Breath,
                urgency: breath.urgency,
                reason: breath.reasons.join("; "),
                suggested_event: None,
            };
        }

        PacingRecommendation {
            action: PacingAction::Sustain,
            urgency: Urgency::None,
            reason: "tension is on target".to_string(),
            suggested_event: None,
        }
    }

    /// Human-readable label such as `"building (62/100, high)"`.
    pub fn label(&self) -> String {
        format!("{} ({}/100, {})", self.mode.label(), self.tension, self.tier().label())
    }

    pub fn summary(&self) -> TensionSummary {
        TensionSummary {
            value: self.tension,
            tier: self.tier(),
            mode: self.mode,
            target: self.profile.target_tension,
            preferred_range: self.profile.preferred_range,
            label: self.label(),
            breath: self.needs_breath(),
            pacing: self.recommend_pacing(),
        }
    }
}

impl BreathNeed {
    fn raise(&mut self, urgency: Urgency, reason: String) {
        self.needed = true;
        self.urgency = self.urgency.max(urgency);
        self.reasons.push(reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_event_reports_change() {
        let mut manager = TensionManager::new(Genre::Adventure);
        let change = manager.apply_event(TensionEvent::ThreatIntroduced);

        assert_eq!(change.previous, 20);
        assert_eq!(change.new, 35);
        assert_eq!(change.delta, 15);
        assert_eq!(change.mode, PacingMode::Building);
        assert_eq!(manager.recent_changes().len(), 1);
    }

    #[test]
    fn test_tension_stays_in_range() {
        let mut manager = TensionManager::default();
        for _ in 0..10 {
            manager.apply_event(TensionEvent::Ambush);
            assert!(manager.tension() <= 100);
        }
        assert_eq!(manager.tension(), 100);

        for _ in 0..10 {
            manager.apply_event(TensionEvent::Resolution);
        }
        assert_eq!(manager.tension(), 0);
    }

    #[test]
    fn test_mode_follows_delta() {
        assert_eq!(PacingMode::from_delta(25), PacingMode::Spiking);
        assert_eq!(PacingMode::from_delta(20), PacingMode::Spiking);
        assert_eq!(PacingMode::from_delta(5), PacingMode::Building);
        assert_eq!(PacingMode::from_delta(0), PacingMode::Sustaining);
        assert_eq!(PacingMode::from_delta(-10), PacingMode::Releasing);
        assert_eq!(PacingMode::from_delta(-20), PacingMode::Crashing);
    }

    #[test]
    fn test_unknown_event_is_a_no_op() {
        let mut manager = TensionManager::default();
        manager.apply_event(TensionEvent::Chase);
        let before = manager.tension();

        let change = manager.apply_event_key("dragon-sneezes");
        assert_eq!(change.delta, 0);
        assert_eq!(manager.tension(), before);
        assert_eq!(manager.mode(), PacingMode::Building);
        assert_eq!(manager.recent_changes().len(), 1);
    }

    #[test]
    fn test_sustained_high_forces_breath() {
        let mut manager = TensionManager::new(Genre::Adventure);
        manager.set_tension(85);
        for _ in 0..6 {
            manager.record_exchange();
        }

        let need = manager.needs_breath();
        assert!(need.needed);
        assert_eq!(need.urgency, Urgency::High);
        assert_eq!(manager.recommend_pacing().action, PacingAction::Breath);
    }

    #[test]
    fn test_sustained_high_allowed_in_horror() {
        let mut manager = TensionManager::new(Genre::Horror);
        manager.set_tension(75);
        for _ in 0..6 {
            manager.record_exchange();
        }
        let need = manager.needs_breath();
        assert!(!need.needed, "{:?}", need.reasons);
    }

    #[test]
    fn test_cadence_breath_is_medium_then_high() {
        let mut manager = TensionManager::new(Genre::Adventure);
        manager.set_tension(55);
        for _ in 0..8 {
            manager.record_exchange();
        }
        assert_eq!(manager.needs_breath().urgency, Urgency::Medium);
        assert_eq!(manager.recommend_pacing().action, PacingAction::Breath);

        for _ in 0..4 {
            manager.record_exchange();
        }
        assert_eq!(manager.needs_breath().urgency, Urgency::High);

        manager.record_breath();
        assert!(!manager.needs_breath().needed);
        assert_eq!(manager.mode(), PacingMode::Breath);
    }

    #[test]
    fn test_recommend_pulls_back_into_range() {
        let mut manager = TensionManager::new(Genre::Romance);
        manager.set_tension(70);
        let rec = manager.recommend_pacing();
        assert_eq!(rec.action, PacingAction::DecreaseTension);
        assert_eq!(rec.urgency, Urgency::Medium);

        manager.set_tension(5);
        let rec = manager.recommend_pacing();
        assert_eq!(rec.action, PacingAction::IncreaseTension);
        assert_eq!(rec.suggested_event, Some(TensionEvent::MysteryDeepens));
    }

    #[test]
    fn test_recommend_drifts_toward_target() {
        let mut manager = TensionManager::new(Genre::Adventure);
        manager.set_tension(40);
        let rec = manager.recommend_pacing();
        assert_eq!(rec.action, PacingAction::IncreaseTension);
        assert_eq!(rec.urgency, Urgency::Low);

        manager.set_tension(55);
        assert_eq!(manager.recommend_pacing().action, PacingAction::Sustain);
    }

    #[test]
    fn test_reader_tolerance_scales_cadence() {
        let mut manager = TensionManager::new(Genre::Adventure);
        assert_eq!(manager.effective_cadence(), 8);
        for _ in 0..20 {
            manager.observe_reader_engagement(true);
        }
        assert!((manager.reader_tolerance() - 1.5).abs() < 0.001);
        assert_eq!(manager.effective_cadence(), 12);
    }

    #[test]
    fn test_reader_profile_bias() {
        let mut manager = TensionManager::new(Genre::Thriller);
        let reader = ReaderProfile::default().with_tension_band(20, 50);
        manager.apply_reader_profile(Some(&reader));
        assert_eq!(manager.profile().target_tension, 52);

        manager.apply_reader_profile(None);
        assert_eq!(manager.profile().target_tension, 70);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut manager = TensionManager::default();
        for _ in 0..200 {
            manager.apply_event(TensionEvent::Discovery);
            manager.record_exchange();
        }
        assert_eq!(manager.history().len(), TensionConfig::default().history_limit);
        assert_eq!(manager.recent_changes().len(), TensionConfig::default().event_history_limit);
    }
}
