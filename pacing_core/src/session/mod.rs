//! Session context - one story session's state and trackers, and the turn
//! loop that advances them together.
//!
//! A turn never mutates the context it runs on. `process_turn` works on a
//! clone and hands the result back; the caller decides whether to keep it,
//! so an aborted generation call leaves the session exactly as it was.

mod registry;
mod snapshot;
mod turn;

pub use registry::*;
pub use snapshot::SessionSnapshot;
pub use turn::*;

use std::collections::BTreeSet;
use story_state::{
    AdventureState, CharacterId, EmotionalBeat, Scene, SessionId, Speaker, StoryTime, Weather,
};
use tracing::{debug, info};

use self::snapshot::SessionMeta;
use crate::breath::{BreathContext, BreathOptions, BreathScheduler, BreathType};
use crate::config::EngineConfig;
use crate::context_assembler::{BundleInputs, ContextAssembler, MemoryBrief};
use crate::crosstalk::{CrossTalkContext, CrossTalkScheduler};
use crate::emergence::{Condition, ConditionSet, EmergenceMatcher};
use crate::emotion::{EmotionSummary, EmotionalResonance, EmotionalTone, Technique, ToneValence};
use crate::error::Result;
use crate::evolution::{EvolutionTracker, GrowthDimension, GrowthEvent};
use crate::memory::{MemoryRecord, MemoryStore, RecallContext};
use crate::orchestrator::{
    ActionPayload, BondBrief, CallbackBrief, Orchestrator, OrchestratorAction, Recommendation, RevealCandidate,
    TrackerSummaries,
};
use crate::preferences::ReaderProfile;
use crate::tension::{PacingMode, TensionManager, TensionSummary, TensionTier};
use crate::threads::{NarrativeThread, RevelationContext, RevelationStyle, ThreadMention, ThreadTracker};

/// A drop in tension this large within one turn counts as a release.
const TENSION_DROP: u8 = 10;
/// Bond at which a relationship counts as close.
const CLOSE_BOND: u8 = 75;
/// Relationship tension at which it counts as strained.
const STRAINED_TENSION: u8 = 70;

/// Everything one story session owns. Sessions share nothing.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub state: AdventureState,
    pub tension: TensionManager,
    pub emotion: EmotionalResonance,
    pub memory: MemoryStore,
    pub threads: ThreadTracker,
    pub emergence: EmergenceMatcher,
    pub evolution: EvolutionTracker,
    pub breath: BreathScheduler,
    pub cross_talk: CrossTalkScheduler,
    pub orchestrator: Orchestrator,
    reader: Option<ReaderProfile>,
    config: EngineConfig,
    visited_locations: BTreeSet<String>,
    reader_silent_turns: u32,
    last_recommendation: Option<Recommendation>,
}

/// Side effects of applying an interpretation that the rest of the turn needs.
#[derive(Debug, Default)]
struct Applied {
    breathed: bool,
    new_information: bool,
    intensity: Option<u8>,
}

/// Scene changes and reader signals gathered while a turn is applied.
#[derive(Debug, Default)]
struct TurnSignals {
    transition: bool,
    new_location: bool,
    arrived: bool,
    first_meeting: bool,
    surprised: bool,
    observing: bool,
    new_information: bool,
}

impl SessionContext {
    pub fn new(scene: Scene, config: EngineConfig) -> Self {
        Self::new_with_state(AdventureState::new(scene), config)
    }

    /// Wrap an existing state in fresh trackers.
    pub fn new_with_state(state: AdventureState, config: EngineConfig) -> Self {
        let mut tension = TensionManager::with_config(config.genre, config.tension.clone());
        tension.set_tension(state.tension() as i32);
        let mut visited_locations = BTreeSet::new();
        visited_locations.insert(state.scene.location.clone());

        Self {
            state,
            tension,
            emotion: EmotionalResonance::new(config.emotion.clone()),
            memory: MemoryStore::with_config(config.memory.clone()),
            threads: ThreadTracker::with_config(config.threads.clone()),
            emergence: EmergenceMatcher::with_config(config.emergence.clone()),
            evolution: EvolutionTracker::with_config(config.evolution.clone()),
            breath: BreathScheduler::with_config(config.breath.clone()),
            cross_talk: CrossTalkScheduler::with_config(config.cross_talk.clone()),
            orchestrator: Orchestrator::with_config(config.orchestrator.clone()),
            reader: None,
            config,
            visited_locations,
            reader_silent_turns: 0,
            last_recommendation: None,
        }
    }

    pub fn with_reader(mut self, reader: Option<ReaderProfile>) -> Self {
        self.set_reader(reader);
        self
    }

    pub fn id(&self) -> SessionId {
        self.state.session_id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn reader(&self) -> Option<&ReaderProfile> {
        self.reader.as_ref()
    }

    /// The recommendation handed out by the previous turn.
    pub fn last_recommendation(&self) -> Option<&Recommendation> {
        self.last_recommendation.as_ref()
    }

    pub fn reader_silent_turns(&self) -> u32 {
        self.reader_silent_turns
    }

    /// Attach or drop the reader profile. Absent means genre defaults.
    pub fn set_reader(&mut self, reader: Option<ReaderProfile>) {
        self.tension.apply_reader_profile(reader.as_ref());
        self.reader = reader;
    }

    /// Push configuration into every tracker.
    pub fn set_config(&mut self, config: EngineConfig) {
        self.tension.set_config(config.tension.clone());
        self.emotion.set_config(config.emotion.clone());
        self.memory.set_config(config.memory.clone());
        self.threads.set_config(config.threads.clone());
        self.emergence.set_config(config.emergence.clone());
        self.evolution.set_config(config.evolution.clone());
        self.breath.set_config(config.breath.clone());
        self.cross_talk.set_config(config.cross_talk.clone());
        self.orchestrator.set_config(config.orchestrator.clone());
        self.config = config;
    }

    pub fn snapshot(&self) -> Result<SessionSnapshot> {
        SessionSnapshot::capture(self)
    }

    /// Rebuild a session from a snapshot. Unreadable parts start fresh.
    pub fn restore(snapshot: &SessionSnapshot, config: EngineConfig, reader: Option<ReaderProfile>) -> Self {
        snapshot.restore(config, reader)
    }

    pub(crate) fn meta(&self) -> SessionMeta {
        SessionMeta {
            visited_locations: self.visited_locations.clone(),
            reader_silent_turns: self.reader_silent_turns,
            last_recommendation: self.last_recommendation.clone(),
        }
    }

    pub(crate) fn set_meta(&mut self, meta: SessionMeta) {
        self.visited_locations = meta.visited_locations;
        self.visited_locations.insert(self.state.scene.location.clone());
        self.reader_silent_turns = meta.reader_silent_turns;
        self.last_recommendation = meta.last_recommendation;
    }

    /// Run one reader turn and return the next context alongside the
    /// recommendation and context bundle for the generation step.
    pub fn process_turn(&self, input: TurnInput) -> TurnOutcome {
        let mut next = self.clone();
        let now = input.now;
        let turn = now.turn;

        next.state.clock = now;
        next.orchestrator.tick();
        next.emergence.tick();
        let previous_tension = next.tension.tension();

        let mut signals = TurnSignals {
            surprised: input.reader_surprised,
            observing: input.reader_observing,
            ..TurnSignals::default()
        };
        if let Some(scene) = input.scene.clone() {
            signals.transition = next.state.change_scene(scene);
            signals.new_location = next.visited_locations.insert(next.state.scene.location.clone());
        }
        for id in &input.departures {
            next.state.remove_character(id);
        }
        for character in input.arrivals.iter().cloned() {
            let met_before = next.state.relationship(&character.id).is_some();
            if next.state.add_character(character) {
                signals.arrived = true;
                signals.first_meeting |= !met_before;
            }
        }

        if input.is_silent() {
            next.reader_silent_turns += 1;
        } else {
            next.reader_silent_turns = 0;
            next.state.record_line(Speaker::Reader, input.text.trim());
        }
        if let Some(engaged) = input.reader_engaged {
            next.tension.observe_reader_engagement(engaged);
        }

        let mut topics = Vec::new();
        let mut breathed = false;
        if let Some(interpretation) = &input.interpretation {
            let applied = next.apply_interpretation(interpretation, now);
            breathed = applied.breathed;
            signals.new_information = applied.new_information;
            topics = interpretation.topics.clone();
            if !breathed {
                next.breath.record_exchange(applied.intensity);
            }
        } else {
            next.breath.record_exchange(None);
        }

        next.tension.record_exchange();
        next.cross_talk.record_exchange();
        let ripened = next.threads.advance_turn(turn);
        let decay = next.memory.decay(now);
        next.state.set_tension(next.tension.tension() as i32);
        debug!(turn, ripened = ripened.len(), decayed = decay.decayed, evicted = decay.evicted, breathed, "Trackers advanced");

        let tension = next.tension.summary();
        let emotion = next.emotion.summary();
        let beat = next.state.emotional_beat;
        let breath = next.breath.needs_breath(&BreathContext {
            tension: tension.value,
            last_beat: beat,
            scene_transition: signals.transition,
            characters_alone: next.state.characters_alone(),
        });
        let revelation = RevelationContext {
            turn,
            tension: tension.value,
            emotional_peak: emotion.at_peak || beat.is_peak(),
            climax: beat == EmotionalBeat::Climax,
            breath_active: next.breath.is_active(),
        };
        let threads = next.threads.summary(&revelation);

        let present = next.state.present_ids();
        let mut recall = RecallContext::new().at(next.state.scene.location.clone());
        for id in &present {
            recall = recall.with_present(id.clone());
        }
        for topic in topics {
            recall = recall.with_topic(topic);
        }
        if !input.is_silent() {
            recall = recall.with_text(input.text.clone());
        }

        let callback = present.iter().find_map(|id| {
            next.memory
                .get_callback_opportunity(id, &recall, now)
                .map(|memory| CallbackBrief {
                    character: id.clone(),
                    memory: memory.id,
                    content: memory.content.clone(),
                })
        });
        let mut memories = Vec::new();
        for id in &present {
            for memory in next.memory.get_relevant(id, &recall, now) {
                memories.push(MemoryBrief {
                    character: id.clone(),
                    memory_type: memory.memory_type,
                    content: memory.content,
                    salience: memory.current_salience,
                });
            }
        }

        let bonds: Vec<BondBrief> = next
            .state
            .present_characters
            .iter()
            .filter_map(|c| {
                next.state.relationship(&c.id).map(|r| BondBrief {
                    character: c.id.clone(),
                    name: c.name.clone(),
                    bond: r.bond(),
                    label: r.label().to_string(),
                })
            })
            .collect();

        let conditions = next.derive_conditions(&signals, &tension, &emotion, callback.is_some(), !threads.ripe.is_empty());
        next.emergence.set_conditions(conditions);
        let moments = next.emergence.check_for_moments();

        let cross_talk = next.cross_talk.should_cross_talk(&CrossTalkContext {
            present_characters: present.len(),
            reader_silent_turns: next.reader_silent_turns,
            natural_pause: matches!(
                tension.mode,
                PacingMode::Sustaining | PacingMode::Releasing | PacingMode::Breath
            ) && !revelation.emotional_peak,
            tension_dropped: previous_tension.saturating_sub(tension.value) >= TENSION_DROP,
            scene_transition: signals.transition,
            new_information: signals.new_information,
            character_arrived: signals.arrived,
            reader_observing: signals.observing,
            tension: tension.value,
        });
        let cross_talk_pair = if cross_talk.should {
            next.cross_talk.select_participants(&present)
        } else {
            None
        };

        let reveal = threads.reveal_candidate.and_then(|(id, score)| {
            next.threads.thread(id).map(|t| RevealCandidate {
                thread: id,
                title: t.title.clone(),
                score,
            })
        });

        next.orchestrator.update_states(TrackerSummaries {
            tension: tension.value,
            catharsis_debt: emotion.catharsis_debt,
            pacing: Some(tension.pacing.clone()),
            tension_breath: tension.breath.clone(),
            breath: breath.clone(),
            milestones: next.evolution.pending_milestones(),
            reveal,
            moments: moments.clone(),
            cross_talk,
            cross_talk_pair,
            callback: callback.clone(),
            bonds,
        });
        let ranked = next.orchestrator.generate_recommendations(next.reader.as_ref());
        let recommendation = ranked.first().cloned().unwrap_or_else(Recommendation::proceed);

        let inputs = BundleInputs {
            tension,
            emotion,
            breath,
            threads,
            moments: moments.clone(),
            callback,
            memories,
        };
        let bundle = ContextAssembler::with_defaults().assemble(&next.state, &next.evolution, &inputs, &recommendation);

        info!(
            session = %next.id(),
            turn,
            action = recommendation.action.key(),
            urgency = recommendation.urgency().label(),
            "Turn processed"
        );
        next.last_recommendation = Some(recommendation.clone());

        TurnOutcome {
            next,
            recommendation,
            ranked,
            moments,
            bundle,
        }
    }

    fn apply_interpretation(&mut self, interpretation: &TurnInterpretation, now: StoryTime) -> Applied {
        let turn = now.turn;
        let mut applied = Applied::default();

        if let Some(key) = &interpretation.action {
            match OrchestratorAction::from_key(key) {
                Some(action) => {
                    self.apply_executed(action, interpretation, now, &mut applied);
                    self.orchestrator.record_executed(action);
                }
                None => debug!(key = key.as_str(), "Unknown action key, ignoring"),
            }
        }
        if let Some(key) = &interpretation.moment {
            self.emergence.trigger_key(key);
        }

        for key in &interpretation.tension_events {
            let change = self.tension.apply_event_key(key);
            if change.event.is_some() {
                self.state
                    .record_event(key.as_str(), format!("tension {} -> {}", change.previous, change.new));
            }
        }

        if let Some(key) = &interpretation.tone {
            match EmotionalTone::from_key(key) {
                Some(tone) => {
                    let intensity = interpretation.intensity.unwrap_or(5).clamp(1, 10);
                    self.emotion.record_moment(tone, intensity, interpretation.technique);
                    applied.intensity = Some(intensity);
                }
                None => debug!(key = key.as_str(), "Unknown tone key, ignoring"),
            }
        }
        if let Some(beat) = interpretation.beat {
            self.state.emotional_beat = beat;
        }

        if let Some(name) = &interpretation.target {
            let target = resolve_character(&self.state, name);
            self.state.set_speaker(target);
        }
        if !interpretation.text.trim().is_empty() {
            self.state.record_line(Speaker::Narrator, interpretation.text.trim());
        }

        for note in &interpretation.new_threads {
            let mut thread = NarrativeThread::new(note.thread_type, note.title.clone()).created_at(turn);
            if let Some(description) = &note.description {
                thread = thread.with_description(description.clone());
            }
            if let Some(significance) = note.significance {
                thread = thread.with_significance(significance);
            }
            for element in &note.elements {
                thread = thread.with_element(element.clone());
            }
            self.threads.add(thread);
            self.state.note_pending_thread(note.title.clone());
            applied.new_information = true;
        }

        for mention in &interpretation.thread_mentions {
            let Some(id) = self.threads.find_by_title(&mention.title).map(|t| t.id) else {
                debug!(title = mention.title.as_str(), "Mention of unknown thread, ignoring");
                continue;
            };
            let mention = if mention.significant {
                ThreadMention::significant(turn)
            } else {
                ThreadMention::passing(turn)
            };
            self.threads.touch(id, mention);
        }

        for note in &interpretation.growth {
            let character = resolve_character(&self.state, &note.character);
            let dimension = GrowthDimension::from_key(&note.dimension);
            match (character, dimension) {
                (Some(id), Some(dimension)) => {
                    self.evolution.record_growth(
                        &id,
                        GrowthEvent::new(dimension, note.magnitude, note.catalyst.clone()),
                        turn,
                    );
                }
                _ => debug!(
                    character = note.character.as_str(),
                    dimension = note.dimension.as_str(),
                    "Unresolvable growth note, ignoring"
                ),
            }
        }

        for note in &interpretation.memories {
            self.store_memory(note, now);
        }

        for note in &interpretation.relationships {
            match resolve_character(&self.state, &note.character) {
                Some(id) => self.state.adjust_relationship(&id, note.delta.clone()),
                None => debug!(character = note.character.as_str(), "Relationship note for unknown character"),
            }
        }

        for secret in &interpretation.secrets {
            if self.state.unlock_secret(secret.clone()) {
                applied.new_information = true;
            }
        }
        for hint in &interpretation.foreshadowing {
            self.state.note_foreshadowing(hint.clone());
        }

        applied
    }

    /// Carry out the tracker side of an action the story just performed.
    fn apply_executed(
        &mut self,
        action: OrchestratorAction,
        interpretation: &TurnInterpretation,
        now: StoryTime,
        applied: &mut Applied,
    ) {
        let turn = now.turn;
        let payload = self
            .last_recommendation
            .as_ref()
            .filter(|r| r.action == action)
            .and_then(|r| r.payload.clone());

        match (action, payload) {
            (OrchestratorAction::TakeBreath, payload) => {
                let (breath_type, duration) = match payload {
                    Some(ActionPayload::Breath { breath_type, duration }) => (breath_type, Some(duration)),
                    _ => (BreathType::Reflective, None),
                };
                let options = BreathOptions {
                    duration,
                    channel: None,
                    focus: interpretation.breath_focus.clone(),
                };
                let moment = self.breath.create_moment(breath_type, options, turn);
                self.breath.record_moment(moment);
                self.tension.record_breath();
                self.state.emotional_beat = EmotionalBeat::Breath;
                applied.breathed = true;
            }
            (OrchestratorAction::ReleaseCatharsis, _) => {
                let tone_releases = interpretation
                    .tone
                    .as_deref()
                    .and_then(EmotionalTone::from_key)
                    .map(|tone| tone.valence() == ToneValence::Releasing)
                    .unwrap_or(false);
                if !tone_releases {
                    let intensity = interpretation.intensity.unwrap_or(7);
                    self.emotion
                        .record_moment(EmotionalTone::Catharsis, intensity, Some(Technique::Payoff));
                }
            }
            (OrchestratorAction::RevealThread, Some(ActionPayload::Thread { thread, title, .. })) => {
                if self.threads.reveal(thread, RevelationStyle::Dramatic, turn) {
                    self.state.clear_pending_thread(&title);
                    applied.new_information = true;
                }
            }
            (OrchestratorAction::TriggerEmergentMoment, Some(ActionPayload::Moment { moment, .. })) => {
                self.emergence.trigger(moment);
            }
            (OrchestratorAction::CrossTalk, Some(ActionPayload::CrossTalk { a, b, talk_type })) => {
                self.cross_talk.record_cross_talk(&a, &b, talk_type, turn);
            }
            (OrchestratorAction::UseCallback, Some(ActionPayload::Callback { character, memory, .. })) => {
                self.memory.use_callback(&character, memory, now);
            }
            (OrchestratorAction::MarkMilestone, Some(ActionPayload::Milestone { character, .. })) => {
                self.evolution.acknowledge_milestones(&character);
            }
            _ => {}
        }
    }

    fn store_memory(&mut self, note: &MemoryNote, now: StoryTime) {
        let witnesses: Vec<CharacterId> = note
            .characters
            .iter()
            .filter_map(|name| resolve_character(&self.state, name))
            .collect();

        let mut record = MemoryRecord::new(note.memory_type, note.content.clone(), now)
            .with_salience(note.salience)
            .with_valence(note.valence)
            .at_location(self.state.scene.location.clone());
        for topic in &note.topics {
            record = record.with_topic(topic.clone());
        }

        match witnesses.as_slice() {
            [] => debug!(content = note.content.as_str(), "Memory without a known witness, ignoring"),
            [single] => {
                self.memory.store(single, record);
            }
            many => {
                self.memory.store_shared(record, many);
            }
        }
    }

    fn derive_conditions(
        &self,
        signals: &TurnSignals,
        tension: &TensionSummary,
        emotion: &EmotionSummary,
        callback_available: bool,
        thread_ripe: bool,
    ) -> ConditionSet {
        let scene = &self.state.scene;
        let relationships: Vec<_> = self
            .state
            .present_characters
            .iter()
            .filter_map(|c| self.state.relationship(&c.id))
            .collect();

        let mut conditions = ConditionSet::new();
        conditions.insert(match tension.tier {
            TensionTier::Calm | TensionTier::Low => Condition::TensionLow,
            TensionTier::Moderate => Condition::TensionModerate,
            TensionTier::High => Condition::TensionHigh,
            TensionTier::Peak => Condition::TensionPeak,
        });
        conditions.set(
            Condition::EmotionalPeak,
            emotion.at_peak || self.state.emotional_beat.is_peak(),
        );
        conditions.set(Condition::CharactersAlone, self.state.characters_alone());
        conditions.set(Condition::CallbackAvailable, callback_available);
        conditions.set(Condition::ThreadRipe, thread_ripe);
        conditions.set(Condition::ReaderSurprised, signals.surprised);
        conditions.set(Condition::ReaderSilent, self.reader_silent_turns > 0);
        conditions.set(Condition::BreathActive, self.breath.is_active());
        conditions.set(
            Condition::CatharsisOwed,
            emotion.catharsis_debt >= self.config.emotion.release_threshold,
        );
        conditions.set(Condition::SceneTransition, signals.transition);
        conditions.set(Condition::NightTime, scene.time_of_day.is_night());
        conditions.set(Condition::StormyWeather, scene.weather == Weather::Stormy);
        conditions.set(Condition::MilestonePending, self.evolution.has_pending_milestones());
        conditions.set(Condition::RelationshipHigh, relationships.iter().any(|r| r.bond() >= CLOSE_BOND));
        conditions.set(Condition::RelationshipStrained, relationships.iter().any(|r| r.tension >= STRAINED_TENSION));
        conditions.set(Condition::FirstMeeting, signals.first_meeting);
        conditions.set(Condition::ArcActive, self.evolution.any_active_arc());
        conditions.set(Condition::NewLocation, signals.transition && signals.new_location);
        conditions
    }
}

/// Resolve a character named by the generation collaborator, on stage or not.
fn resolve_character(state: &AdventureState, name: &str) -> Option<CharacterId> {
    if let Some(character) = state.find_character(name) {
        return Some(character.id.clone());
    }
    state.relationships.keys().find(|id| id.matches_name(name)).cloned()
}
