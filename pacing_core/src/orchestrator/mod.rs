//! Orchestrator - turns every tracker's summary into one ranked list of
//! recommendations and settles the conflicts between them.

mod action;
mod priority;

pub use action::*;
pub use priority::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use story_state::{BoundedLog, CharacterId};
use tracing::{debug, info};

use crate::breath::{BreathDuration, BreathRecommendation, BreathType};
use crate::crosstalk::{CrossTalkDecision, CrossTalkType, ParticipantPair};
use crate::emergence::{IntensityTier, MomentCandidate};
use crate::evolution::MilestoneEvent;
use crate::memory::MemoryId;
use crate::preferences::ReaderProfile;
use crate::tension::{BreathNeed, PacingAction, PacingRecommendation};
use crate::threads::ThreadId;
use crate::urgency::Urgency;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Catharsis debt that forces a release.
    pub critical_debt: u8,
    /// Catharsis debt at which a release is suggested.
    pub release_debt: u8,
    /// Bond levels worth nudging a relationship across.
    pub bond_thresholds: Vec<u8>,
    /// How close below a threshold counts as near.
    pub bond_margin: u8,
    pub cooldowns: ActionCooldowns,
    pub history_limit: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            critical_debt: 70,
            release_debt: 60,
            bond_thresholds: vec![25, 50, 75],
            bond_margin: 5,
            cooldowns: ActionCooldowns::default(),
            history_limit: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevealCandidate {
    pub thread: ThreadId,
    pub title: String,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackBrief {
    pub character: CharacterId,
    pub memory: MemoryId,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondBrief {
    pub character: CharacterId,
    pub name: String,
    pub bond: u8,
    pub label: String,
}

/// What every tracker reported this turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerSummaries {
    pub tension: u8,
    pub catharsis_debt: u8,
    pub pacing: Option<PacingRecommendation>,
    pub tension_breath: BreathNeed,
    pub breath: BreathRecommendation,
    pub milestones: Vec<(CharacterId, MilestoneEvent)>,
    pub reveal: Option<RevealCandidate>,
    pub moments: Vec<MomentCandidate>,
    pub cross_talk: CrossTalkDecision,
    pub cross_talk_pair: Option<ParticipantPair>,
    pub callback: Option<CallbackBrief>,
    pub bonds: Vec<BondBrief>,
}

/// One proposal for what the story should do next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: OrchestratorAction,
    pub priority: Priority,
    pub reason: String,
    pub payload: Option<ActionPayload>,
}

impl Recommendation {
    pub fn new(action: OrchestratorAction, priority: Priority, reason: impl Into<String>) -> Self {
        Self {
            action,
            priority,
            reason: reason.into(),
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: ActionPayload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// The fallback when nothing else is recommended.
    pub fn proceed() -> Self {
        Self::new(
            OrchestratorAction::Continue,
            Priority::new(PriorityTier::Low, ActionUrgency::Gradual, 0),
            "nothing pressing, let the story continue",
        )
    }

    pub fn urgency(&self) -> ActionUrgency {
        self.priority.urgency
    }

    pub fn score(&self) -> u32 {
        self.priority.score()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutedAction {
    pub action: OrchestratorAction,
    pub turn: u64,
}

/// Resolves competing tracker goals into a single recommended action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Orchestrator {
    summaries: TrackerSummaries,
    /// Remaining cooldown turns per action.
    cooldowns: BTreeMap<OrchestratorAction, u32>,
    history: BoundedLog<ExecutedAction>,
    turn: u64,
    #[serde(skip)]
    config: OrchestratorConfig,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::with_config(OrchestratorConfig::default())
    }
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: OrchestratorConfig) -> Self {
        Self {
            summaries: TrackerSummaries::default(),
            cooldowns: BTreeMap::new(),
            history: BoundedLog::new(config.history_limit),
            turn: 0,
            config,
        }
    }

    pub fn set_config(&mut self, config: OrchestratorConfig) {
        self.history.set_capacity(config.history_limit);
        self.config = config;
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn summaries(&self) -> &TrackerSummaries {
        &self.summaries
    }

    pub fn history(&self) -> &BoundedLog<ExecutedAction> {
        &self.history
    }

    pub fn update_states(&mut self, summaries: TrackerSummaries) {
        self.summaries = summaries;
    }

    pub fn cooldown_remaining(&self, action: OrchestratorAction) -> u32 {
        self.cooldowns.get(&action).copied().unwrap_or(0)
    }

    /// The ranked list for the current summaries.
    pub fn generate_recommendations(&self, reader: Option<&ReaderProfile>) -> Vec<Recommendation> {
        let mut recommendations: Vec<Recommendation> = self
            .raw_recommendations()
            .into_iter()
            .filter(|r| self.cooldown_remaining(r.action) == 0)
            .collect();

        if let Some(reader) = reader {
            for recommendation in &mut recommendations {
                apply_reader_bias(recommendation, reader);
            }
        }

        Self::resolve_conflicts(recommendations)
    }

    /// The head of the ranked list, or `continue`.
    pub fn recommend(&self, reader: Option<&ReaderProfile>) -> Recommendation {
        self.generate_recommendations(reader)
            .into_iter()
            .next()
            .unwrap_or_else(Recommendation::proceed)
    }

    /// Settle competing recommendations. Pure and deterministic.
    ///
    /// Opposite tension moves keep only the more urgent one. An immediate
    /// breath removes action-oriented recommendations. Duplicated actions keep
    /// their highest priority, and the result is sorted most important first.
    pub fn resolve_conflicts(recommendations: Vec<Recommendation>) -> Vec<Recommendation> {
        let mut recommendations = recommendations;

        let strongest = |list: &[Recommendation], action: OrchestratorAction| {
            list.iter().filter(|r| r.action == action).map(|r| r.priority).max()
        };
        if let (Some(up), Some(down)) = (
            strongest(&recommendations, OrchestratorAction::IncreaseTension),
            strongest(&recommendations, OrchestratorAction::DecreaseTension),
        ) {
            let loser = if (up.urgency, up) > (down.urgency, down) {
                OrchestratorAction::DecreaseTension
            } else {
                OrchestratorAction::IncreaseTension
            };
            recommendations.retain(|r| r.action != loser);
        }

        let immediate_breath = recommendations
            .iter()
            .any(|r| r.action == OrchestratorAction::TakeBreath && r.urgency() == ActionUrgency::Immediate);
        if immediate_breath {
            recommendations.retain(|r| !r.action.is_action_oriented());
        }

        let mut best: BTreeMap<OrchestratorAction, Recommendation> = BTreeMap::new();
        for recommendation in recommendations {
            match best.get(&recommendation.action) {
                Some(existing) if existing.priority >= recommendation.priority => {}
                _ => {
                    best.insert(recommendation.action, recommendation);
                }
            }
        }

        let mut ranked: Vec<Recommendation> = best.into_values().collect();
        ranked.sort_by(|a, b| b.priority.cmp(&a.priority));
        ranked
    }

    /// The story carried out an action. Starts its cooldown.
    pub fn record_executed(&mut self, action: OrchestratorAction) {
        let cooldown = self.config.cooldowns.get(action);
        if cooldown > 0 {
            self.cooldowns.insert(action, cooldown);
        }
        self.history.push(ExecutedAction {
            action,
            turn: self.turn,
        });
        info!(action = action.key(), turn = self.turn, cooldown, "Action executed");
    }

    /// Count cooldowns down by one turn. Call once per turn.
    pub fn tick(&mut self) {
        self.turn += 1;
        for remaining in self.cooldowns.values_mut() {
            *remaining = remaining.saturating_sub(1);
        }
        self.cooldowns.retain(|_, remaining| *remaining > 0);
    }

    fn raw_recommendations(&self) -> Vec<Recommendation> {
        let summaries = &self.summaries;
        let config = &self.config;
        let mut out = Vec::new();
        let mut sequence = 0;
        let mut next = || {
            sequence += 1;
            sequence
        };

        // Critical
        if summaries.catharsis_debt >= config.critical_debt {
            out.push(Recommendation::new(
                OrchestratorAction::ReleaseCatharsis,
                Priority::new(PriorityTier::Critical, ActionUrgency::Immediate, next()),
                format!("catharsis debt at {}, release is overdue", summaries.catharsis_debt),
            ));
        } else if summaries.catharsis_debt >= config.release_debt {
            out.push(Recommendation::new(
                OrchestratorAction::ReleaseCatharsis,
                Priority::new(PriorityTier::Medium, ActionUrgency::Soon, next()),
                format!("catharsis debt at {}", summaries.catharsis_debt),
            ));
        }

        // High
        if let Some(recommendation) = breath_recommendation(summaries, next()) {
            out.push(recommendation);
        }
        if let Some((character, event)) = summaries.milestones.first() {
            out.push(
                Recommendation::new(
                    OrchestratorAction::MarkMilestone,
                    Priority::new(PriorityTier::High, ActionUrgency::Soon, next()),
                    format!("{} reached {} in {}", character, event.milestone.key(), event.dimension),
                )
                .with_payload(ActionPayload::Milestone {
                    character: character.clone(),
                    dimension: event.dimension,
                    milestone: event.milestone,
                }),
            );
        }

        // Medium
        if let Some(reveal) = &summaries.reveal {
            out.push(
                Recommendation::new(
                    OrchestratorAction::RevealThread,
                    Priority::new(PriorityTier::Medium, ActionUrgency::Soon, next()),
                    format!("'{}' is ripe (timing score {})", reveal.title, reveal.score),
                )
                .with_payload(ActionPayload::Thread {
                    thread: reveal.thread,
                    title: reveal.title.clone(),
                    score: reveal.score,
                }),
            );
        }
        if let Some(moment) = summaries.moments.first() {
            let urgency = if moment.intensity >= IntensityTier::Strong {
                ActionUrgency::Soon
            } else {
                ActionUrgency::WhenAppropriate
            };
            out.push(
                Recommendation::new(
                    OrchestratorAction::TriggerEmergentMoment,
                    Priority::new(PriorityTier::Medium, urgency, next()),
                    format!("conditions align for {}", moment.moment),
                )
                .with_payload(ActionPayload::Moment {
                    moment: moment.moment,
                    description: moment.description.clone(),
                }),
            );
        }
        if summaries.cross_talk.should {
            if let Some(pair) = &summaries.cross_talk_pair {
                let talk_type = summaries.cross_talk.suggested_type.unwrap_or(CrossTalkType::Banter);
                out.push(
                    Recommendation::new(
                        OrchestratorAction::CrossTalk,
                        Priority::new(PriorityTier::Medium, ActionUrgency::WhenAppropriate, next()),
                        format!("{} and {} could talk ({})", pair.a, pair.b, talk_type.key()),
                    )
                    .with_payload(ActionPayload::CrossTalk {
                        a: pair.a.clone(),
                        b: pair.b.clone(),
                        talk_type,
                    }),
                );
            }
        }

        // Low
        if let Some(callback) = &summaries.callback {
            out.push(
                Recommendation::new(
                    OrchestratorAction::UseCallback,
                    Priority::new(PriorityTier::Low, ActionUrgency::WhenAppropriate, next()),
                    format!("{} could call back a memory", callback.character),
                )
                .with_payload(ActionPayload::Callback {
                    character: callback.character.clone(),
                    memory: callback.memory,
                    content: callback.content.clone(),
                }),
            );
        }
        if let Some(pacing) = &summaries.pacing {
            let action = match pacing.action {
                PacingAction::IncreaseTension => Some(OrchestratorAction::IncreaseTension),
                PacingAction::DecreaseTension => Some(OrchestratorAction::DecreaseTension),
                PacingAction::Breath | PacingAction::Sustain => None,
            };
            if let Some(action) = action {
                let urgency = match pacing.urgency {
                    Urgency::High => ActionUrgency::Immediate,
                    Urgency::Medium => ActionUrgency::Soon,
                    Urgency::Low => ActionUrgency::WhenAppropriate,
                    Urgency::None => ActionUrgency::Gradual,
                };
                out.push(
                    Recommendation::new(action, Priority::new(PriorityTier::Low, urgency, next()), pacing.reason.clone())
                        .with_payload(ActionPayload::Tension {
                            event: pacing.suggested_event,
                        }),
                );
            }
        }
        if let Some((brief, threshold)) = nearest_bond_threshold(&summaries.bonds, config) {
            out.push(
                Recommendation::new(
                    OrchestratorAction::DeepenBond,
                    Priority::new(PriorityTier::Low, ActionUrgency::Gradual, next()),
                    format!("bond with {} is close to {}", brief.name, threshold),
                )
                .with_payload(ActionPayload::Bond {
                    character: brief.character.clone(),
                    bond: brief.bond,
                    threshold,
                }),
            );
        }

        debug!(count = out.len(), "Generated recommendations");
        out
    }
}

/// Merge the tension controller's and breath scheduler's views of a pause.
fn breath_recommendation(summaries: &TrackerSummaries, sequence: u32) -> Option<Recommendation> {
    let from_tension = if summaries.tension_breath.needed {
        summaries.tension_breath.urgency
    } else {
        Urgency::None
    };
    let from_scheduler = if summaries.breath.needed {
        summaries.breath.urgency
    } else {
        Urgency::None
    };
    let urgency = from_tension.max(from_scheduler);

    let (tier, action_urgency) = match urgency {
        Urgency::High => (PriorityTier::High, ActionUrgency::Immediate),
        Urgency::Medium => (PriorityTier::Medium, ActionUrgency::Soon),
        Urgency::Low => (PriorityTier::Low, ActionUrgency::WhenAppropriate),
        Urgency::None => return None,
    };

    let reason = if from_scheduler >= from_tension && !summaries.breath.reason.is_empty() {
        summaries.breath.reason.clone()
    } else {
        summaries.tension_breath.reasons.join("; ")
    };
    let breath_type = summaries.breath.suggested_type.unwrap_or(BreathType::Reflective);
    let duration = summaries
        .breath
        .suggested_duration
        .unwrap_or(BreathDuration::Short);

    Some(
        Recommendation::new(
            OrchestratorAction::TakeBreath,
            Priority::new(tier, action_urgency, sequence),
            reason,
        )
        .with_payload(ActionPayload::Breath { breath_type, duration }),
    )
}

/// The relationship sitting closest below one of the bond thresholds.
fn nearest_bond_threshold<'a>(bonds: &'a [BondBrief], config: &OrchestratorConfig) -> Option<(&'a BondBrief, u8)> {
    bonds
        .iter()
        .filter_map(|brief| {
            config
                .bond_thresholds
                .iter()
                .copied()
                .filter(|t| *t > brief.bond && t - brief.bond <= config.bond_margin)
                .min()
                .map(|t| (brief, t))
        })
        .min_by_key(|(brief, t)| t - brief.bond)
}

fn apply_reader_bias(recommendation: &mut Recommendation, reader: &ReaderProfile) {
    let tags = recommendation.action.content_tags();
    if tags.iter().any(|tag| reader.enjoys(tag)) {
        recommendation.priority.urgency = recommendation.priority.urgency.raised();
    } else if tags.iter().any(|tag| reader.avoids(tag)) {
        recommendation.priority.urgency = recommendation.priority.urgency.lowered();
    }
}
