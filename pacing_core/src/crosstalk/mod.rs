//! Cross-Talk Scheduler - lets two characters talk to each other while the
//! reader is quiet, and picks the pair with the most to say.

mod pair;

pub use pair::*;

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use story_state::CharacterId;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrossTalkType {
    Banter,
    Argument,
    Comfort,
    Speculation,
    Reminiscence,
    Greeting,
    Scheming,
}

impl CrossTalkType {
    /// (bond, tension) shift on the pair.
    pub fn relationship_effect(&self) -> (i32, i32) {
        match self {
            CrossTalkType::Banter => (3, 0),
            CrossTalkType::Argument => (-2, 10),
            CrossTalkType::Comfort => (5, -8),
            CrossTalkType::Speculation => (0, 0),
            CrossTalkType::Reminiscence => (2, -2),
            CrossTalkType::Greeting => (1, 0),
            CrossTalkType::Scheming => (1, 2),
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            CrossTalkType::Banter => "banter",
            CrossTalkType::Argument => "argument",
            CrossTalkType::Comfort => "comfort",
            CrossTalkType::Speculation => "speculation",
            CrossTalkType::Reminiscence => "reminiscence",
            CrossTalkType::Greeting => "greeting",
            CrossTalkType::Scheming => "scheming",
        }
    }
}

/// Why cross-talk fits right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrossTalkTrigger {
    ReaderSilent,
    NaturalPause,
    TensionDropped,
    SceneTransition,
    NewInformation,
    CharacterArrival,
    ReaderObserving,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossTalkConfig {
    /// Exchanges required since the last cross-talk.
    pub min_exchanges: u32,
    /// Turns of reader silence that count as a trigger.
    pub reader_silent_turns: u32,
    /// Pair tension at or above which the pair scores for conflict.
    pub conflict_tension: u8,
    /// Pair tension at or below which the pair scores for comfort.
    pub comfort_tension: u8,
}

impl Default for CrossTalkConfig {
    fn default() -> Self {
        Self {
            min_exchanges: 4,
            reader_silent_turns: 2,
            conflict_tension: 60,
            comfort_tension: 15,
        }
    }
}

/// The current turn, as seen by the scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossTalkContext {
    pub present_characters: usize,
    pub reader_silent_turns: u32,
    pub natural_pause: bool,
    pub tension_dropped: bool,
    pub scene_transition: bool,
    pub new_information: bool,
    pub character_arrived: bool,
    pub reader_observing: bool,
    pub tension: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CrossTalkDecision {
    pub should: bool,
    pub triggers: Vec<CrossTalkTrigger>,
    pub suggested_type: Option<CrossTalkType>,
}

/// The winning pair and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantPair {
    pub a: CharacterId,
    pub b: CharacterId,
    pub score: u32,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrossTalkScheduler {
    exchanges_since: u32,
    pairs: Vec<PairRelationship>,
    total: u32,
    #[serde(skip)]
    config: CrossTalkConfig,
}

impl CrossTalkScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CrossTalkConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn set_config(&mut self, config: CrossTalkConfig) {
        for pair in &mut self.pairs {
            pair.history.set_capacity(pair::PAIR_HISTORY_LIMIT);
        }
        self.config = config;
    }

    pub fn exchanges_since(&self) -> u32 {
        self.exchanges_since
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn pair(&self, x: &CharacterId, y: &CharacterId) -> Option<&PairRelationship> {
        self.pairs.iter().find(|p| p.involves(x, y))
    }

    fn pair_mut(&mut self, x: &CharacterId, y: &CharacterId) -> &mut PairRelationship {
        let index = match self.pairs.iter().position(|p| p.involves(x, y)) {
            Some(index) => index,
            None => {
                self.pairs.push(PairRelationship::new(x.clone(), y.clone()));
                self.pairs.len() - 1
            }
        };
        &mut self.pairs[index]
    }

    /// Register or update what two characters are to each other.
    pub fn register_pair(&mut self, x: &CharacterId, y: &CharacterId, bond: u8, tension: u8, dynamic: PairDynamic) {
        if x == y {
            return;
        }
        let pair = self.pair_mut(x, y);
        pair.bond = bond.min(100);
        pair.tension = tension.min(100);
        pair.dynamic = dynamic;
    }

    pub fn record_exchange(&mut self) {
        self.exchanges_since += 1;
    }

    pub fn active_triggers(&self, context: &CrossTalkContext) -> Vec<CrossTalkTrigger> {
        let mut triggers = Vec::new();
        if context.reader_silent_turns >= self.config.reader_silent_turns {
            triggers.push(CrossTalkTrigger::ReaderSilent);
        }
        let flags = [
            (context.natural_pause, CrossTalkTrigger::NaturalPause),
            (context.tension_dropped, CrossTalkTrigger::TensionDropped),
            (context.scene_transition, CrossTalkTrigger::SceneTransition),
            (context.new_information, CrossTalkTrigger::NewInformation),
            (context.character_arrived, CrossTalkTrigger::CharacterArrival),
            (context.reader_observing, CrossTalkTrigger::ReaderObserving),
        ];
        triggers.extend(flags.into_iter().filter(|(on, _)| *on).map(|(_, trigger)| trigger));
        triggers
    }

    /// Whether two characters should talk among themselves this turn.
    pub fn should_cross_talk(&self, context: &CrossTalkContext) -> CrossTalkDecision {
        let triggers = self.active_triggers(context);
        let should = context.present_characters >= 2
            && self.exchanges_since >= self.config.min_exchanges
            && !triggers.is_empty();

        let suggested_type = should.then(|| suggest_type(&triggers, context.tension));
        CrossTalkDecision {
            should,
            triggers,
            suggested_type,
        }
    }

    /// Score every unordered pair and return the best one.
    pub fn select_participants(&self, characters: &[CharacterId]) -> Option<ParticipantPair> {
        let mut candidates = Vec::new();
        for (i, x) in characters.iter().enumerate() {
            for y in characters.iter().skip(i + 1) {
                if x == y {
                    continue;
                }
                let (score, reasons) = self.score_pair(x, y);
                let (a, b) = ordered(x.clone(), y.clone());
                candidates.push(ParticipantPair { a, b, score, reasons });
            }
        }

        candidates
            .into_iter()
            .enumerate()
            .max_by_key(|(index, pair)| (pair.score, Reverse(*index)))
            .map(|(_, pair)| pair)
    }

    fn score_pair(&self, x: &CharacterId, y: &CharacterId) -> (u32, Vec<String>) {
        let mut score = 0;
        let mut reasons = Vec::new();

        match self.pair(x, y) {
            Some(pair) => {
                score += 10 + u32::from(pair.bond) / 10;
                reasons.push("existing relationship".to_string());

                if pair.tension >= self.config.conflict_tension {
                    score += 15;
                    reasons.push("unresolved tension".to_string());
                } else if pair.tension <= self.config.comfort_tension {
                    score += 10;
                    reasons.push("easy comfort".to_string());
                }
                if pair.dynamic.is_interesting() {
                    score += 12;
                    reasons.push(format!("{:?} dynamic", pair.dynamic).to_lowercase());
                }
                if pair.conversations == 0 {
                    score += 8;
                    reasons.push("never talked alone".to_string());
                }
            }
            None => {
                score += 8;
                reasons.push("never talked alone".to_string());
            }
        }
        (score, reasons)
    }

    /// A cross-talk happened. Updates the pair and restarts the cooldown.
    pub fn record_cross_talk(&mut self, x: &CharacterId, y: &CharacterId, talk_type: CrossTalkType, turn: u64) {
        if x == y {
            return;
        }
        self.pair_mut(x, y).absorb(talk_type, turn);
        self.exchanges_since = 0;
        self.total += 1;
        debug!(a = %x, b = %y, kind = talk_type.key(), turn, "Cross-talk recorded");
    }
}

fn suggest_type(triggers: &[CrossTalkTrigger], tension: u8) -> CrossTalkType {
    if triggers.contains(&CrossTalkTrigger::CharacterArrival) {
        CrossTalkType::Greeting
    } else if triggers.contains(&CrossTalkTrigger::NewInformation) {
        CrossTalkType::Speculation
    } else if triggers.contains(&CrossTalkTrigger::TensionDropped) {
        CrossTalkType::Comfort
    } else if tension >= 65 {
        CrossTalkType::Argument
    } else if tension <= 30 {
        CrossTalkType::Reminiscence
    } else {
        CrossTalkType::Banter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> CharacterId {
        CharacterId::new(name)
    }

    fn quiet_reader() -> CrossTalkContext {
        CrossTalkContext {
            present_characters: 2,
            reader_silent_turns: 2,
            tension: 45,
            ..CrossTalkContext::default()
        }
    }

    #[test]
    fn test_requires_spacing_and_trigger() {
        let mut scheduler = CrossTalkScheduler::new();
        for _ in 0..3 {
            scheduler.record_exchange();
        }
        assert!(!scheduler.should_cross_talk(&quiet_reader()).should);

        scheduler.record_exchange();
        let decision = scheduler.should_cross_talk(&quiet_reader());
        assert!(decision.should);
        assert_eq!(decision.triggers, vec![CrossTalkTrigger::ReaderSilent]);
        assert_eq!(decision.suggested_type, Some(CrossTalkType::Banter));

        let engaged = CrossTalkContext {
            reader_silent_turns: 1,
            ..quiet_reader()
        };
        assert!(!scheduler.should_cross_talk(&engaged).should);
    }

    #[test]
    fn test_needs_two_characters() {
        let mut scheduler = CrossTalkScheduler::new();
        for _ in 0..5 {
            scheduler.record_exchange();
        }
        let alone = CrossTalkContext {
            present_characters: 1,
            ..quiet_reader()
        };
        assert!(!scheduler.should_cross_talk(&alone).should);
    }

    #[test]
    fn test_suggested_type_follows_trigger() {
        let mut scheduler = CrossTalkScheduler::new();
        for _ in 0..4 {
            scheduler.record_exchange();
        }
        let arrival = CrossTalkContext {
            character_arrived: true,
            ..quiet_reader()
        };
        assert_eq!(scheduler.should_cross_talk(&arrival).suggested_type, Some(CrossTalkType::Greeting));
    }

    #[test]
    fn test_select_prefers_charged_pair() {
        let mut scheduler = CrossTalkScheduler::new();
        scheduler.register_pair(&id("ana"), &id("bo"), 50, 30, PairDynamic::Neutral);
        scheduler.register_pair(&id("ana"), &id("cy"), 40, 75, PairDynamic::Rivals);

        let pair = scheduler
            .select_participants(&[id("ana"), id("bo"), id("cy")])
            .unwrap();
        assert_eq!((pair.a.as_str(), pair.b.as_str()), ("ana", "cy"));
        // 10 + 4 relationship, 15 tension, 12 dynamic, 8 novelty
        assert_eq!(pair.score, 49);
    }

    #[test]
    fn test_select_needs_two() {
        let scheduler = CrossTalkScheduler::new();
        assert!(scheduler.select_participants(&[id("ana")]).is_none());
        let pair = scheduler.select_participants(&[id("bo"), id("ana")]).unwrap();
        assert_eq!(pair.score, 8);
    }

    #[test]
    fn test_record_resets_and_updates_pair() {
        let mut scheduler = CrossTalkScheduler::new();
        for _ in 0..6 {
            scheduler.record_exchange();
        }
        scheduler.record_cross_talk(&id("ana"), &id("bo"), CrossTalkType::Comfort, 6);
        assert_eq!(scheduler.exchanges_since(), 0);

        let pair = scheduler.pair(&id("bo"), &id("ana")).unwrap();
        assert_eq!(pair.bond, 55);
        assert_eq!(pair.tension, 2);
        assert_eq!(pair.conversations, 1);
    }
}
