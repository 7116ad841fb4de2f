//! Breath Scheduler - decides when the story should pause, what kind of
//! pause it should be and which sense it should rest on.

mod moment;

pub use moment::*;

use serde::{Deserialize, Serialize};
use story_state::{BoundedLog, EmotionalBeat};
use tracing::debug;

use crate::urgency::Urgency;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreathConfig {
    /// Exchanges without a breath before one is overdue.
    pub max_exchanges: u32,
    /// Emotional intensity that counts as a peak.
    pub peak_threshold: u8,
    /// Exchanges after a peak before recovery is suggested.
    pub recovery_after: u32,
    /// Minimum exchanges between breaths for an intimacy pause.
    pub min_spacing: u32,
    /// Tension at or below which an intimate pause fits.
    pub intimate_tension: u8,
    /// Recently used channels avoided when choosing a new one.
    pub channel_memory: usize,
    pub history_limit: usize,
}

impl Default for BreathConfig {
    fn default() -> Self {
        Self {
            max_exchanges: 12,
            peak_threshold: 8,
            recovery_after: 2,
            min_spacing: 4,
            intimate_tension: 40,
            channel_memory: 3,
            history_limit: 20,
        }
    }
}

/// What the scheduler needs to know about the current turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreathContext {
    pub tension: u8,
    pub last_beat: EmotionalBeat,
    pub scene_transition: bool,
    pub characters_alone: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BreathRecommendation {
    pub needed: bool,
    pub urgency: Urgency,
    pub suggested_type: Option<BreathType>,
    pub suggested_duration: Option<BreathDuration>,
    pub reason: String,
}

impl BreathRecommendation {
    fn suggest(urgency: Urgency, breath_type: BreathType, reason: impl Into<String>) -> Self {
        Self {
            needed: true,
            urgency,
            suggested_type: Some(breath_type),
            suggested_duration: Some(breath_type.default_duration()),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreathSummary {
    pub exchanges_since_breath: u32,
    pub active: bool,
    pub last_type: Option<BreathType>,
    pub recommendation: BreathRecommendation,
}

/// Tracks exchanges and peaks since the last pause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreathScheduler {
    exchanges_since_breath: u32,
    /// Highest intensity seen since the last breath, if it reached a peak.
    recent_peak: Option<u8>,
    exchanges_since_peak: u32,
    history: BoundedLog<BreathMoment>,
    #[serde(skip)]
    config: BreathConfig,
}

impl Default for BreathScheduler {
    fn default() -> Self {
        Self::with_config(BreathConfig::default())
    }
}

impl BreathScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BreathConfig) -> Self {
        Self {
            exchanges_since_breath: 0,
            recent_peak: None,
            exchanges_since_peak: 0,
            history: BoundedLog::new(config.history_limit),
            config,
        }
    }

    pub fn set_config(&mut self, config: BreathConfig) {
        self.history.set_capacity(config.history_limit);
        self.config = config;
    }

    pub fn exchanges_since_breath(&self) -> u32 {
        self.exchanges_since_breath
    }

    pub fn recent_peak(&self) -> Option<u8> {
        self.recent_peak
    }

    pub fn history(&self) -> &BoundedLog<BreathMoment> {
        &self.history
    }

    /// A breath was taken and nothing has happened since.
    pub fn is_active(&self) -> bool {
        self.exchanges_since_breath == 0 && !self.history.is_empty()
    }

    /// Advance one exchange, noting its emotional intensity.
    pub fn record_exchange(&mut self, intensity: Option<u8>) {
        self.exchanges_since_breath += 1;
        match intensity {
            Some(level) if level >= self.config.peak_threshold => {
                self.recent_peak = Some(self.recent_peak.map_or(level, |peak| peak.max(level)));
                self.exchanges_since_peak = 0;
            }
            _ => self.exchanges_since_peak += 1,
        }
    }

    /// Whether a pause is needed now, checked from most to least pressing.
    pub fn needs_breath(&self, context: &BreathContext) -> BreathRecommendation {
        let config = &self.config;

        if context.last_beat.needs_landing() {
            return BreathRecommendation::suggest(
                Urgency::High,
                BreathType::Landing,
                "the last beat needs room to land",
            );
        }
        if self.exchanges_since_breath >= config.max_exchanges {
            return BreathRecommendation::suggest(
                Urgency::High,
                BreathType::Reflective,
                format!("{} exchanges without a pause", self.exchanges_since_breath),
            );
        }
        if let Some(peak) = self.recent_peak {
            if self.exchanges_since_peak >= config.recovery_after {
                return BreathRecommendation::suggest(
                    Urgency::Medium,
                    BreathType::Recovery,
                    format!("recovering from an intensity {} peak", peak),
                );
            }
        }
        if context.scene_transition {
            return BreathRecommendation::suggest(Urgency::Medium, BreathType::Transition, "the scene is changing");
        }
        if context.characters_alone
            && context.tension <= config.intimate_tension
            && self.exchanges_since_breath >= config.min_spacing
        {
            return BreathRecommendation::suggest(
                Urgency::Low,
                BreathType::Intimate,
                "a quiet moment alone together",
            );
        }

        BreathRecommendation::default()
    }

    /// The channels used by the most recent breaths, newest first.
    pub fn recent_channels(&self) -> Vec<SensoryChannel> {
        self.history
            .recent(self.config.channel_memory)
            .map(|m| m.channel)
            .collect()
    }

    /// Pick a channel for a breath type, avoiding recently used ones.
    pub fn choose_channel(&self, breath_type: BreathType) -> SensoryChannel {
        let recent = self.recent_channels();
        let preferred = breath_type.preferred_channels();
        preferred
            .iter()
            .chain(SensoryChannel::ALL.iter())
            .copied()
            .find(|channel| !recent.contains(channel))
            .unwrap_or(preferred[0])
    }

    pub fn create_moment(&self, breath_type: BreathType, options: BreathOptions, turn: u64) -> BreathMoment {
        BreathMoment {
            breath_type,
            duration: options.duration.unwrap_or_else(|| breath_type.default_duration()),
            channel: options.channel.unwrap_or_else(|| self.choose_channel(breath_type)),
            focus: options.focus,
            turn,
        }
    }

    /// Register a delivered breath. Resets the exchange and peak tracking.
    pub fn record_moment(&mut self, moment: BreathMoment) {
        debug!(
            kind = moment.breath_type.key(),
            channel = moment.channel.key(),
            after = self.exchanges_since_breath,
            "Breath taken"
        );
        self.exchanges_since_breath = 0;
        self.recent_peak = None;
        self.exchanges_since_peak = 0;
        self.history.push(moment);
    }

    pub fn summary(&self, context: &BreathContext) -> BreathSummary {
        BreathSummary {
            exchanges_since_breath: self.exchanges_since_breath,
            active: self.is_active(),
            last_type: self.history.last().map(|m| m.breath_type),
            recommendation: self.needs_breath(context),
        }
    }
}
