//! Adventure state - the central structure describing where the story stands.

mod clock;
mod log;

pub use clock::*;
pub use log::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::beats::{EmotionalBeat, SceneType, TimeOfDay, Weather};
use crate::entities::{
    CharacterId, Relationship, RelationshipDelta, Speaker, StoryCharacter, RELATIONSHIP_HISTORY_LIMIT,
};

/// Maximum number of recent events kept in the state.
pub const RECENT_EVENTS_LIMIT: usize = 10;

/// Maximum number of conversation lines kept in the state.
pub const CONVERSATION_LIMIT: usize = 20;

/// Unique identifier for a story session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn nil() -> Self {
        Self(Uuid::nil())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The physical and atmospheric setting of the current scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub location: String,
    pub time_of_day: TimeOfDay,
    pub weather: Weather,
    pub ambiance: Option<String>,
    pub scene_type: SceneType,
}

impl Scene {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            time_of_day: TimeOfDay::default(),
            weather: Weather::default(),
            ambiance: None,
            scene_type: SceneType::default(),
        }
    }

    pub fn with_time(mut self, time_of_day: TimeOfDay) -> Self {
        self.time_of_day = time_of_day;
        self
    }

    pub fn with_weather(mut self, weather: Weather) -> Self {
        self.weather = weather;
        self
    }

    pub fn with_ambiance(mut self, ambiance: impl Into<String>) -> Self {
        self.ambiance = Some(ambiance.into());
        self
    }

    pub fn with_type(mut self, scene_type: SceneType) -> Self {
        self.scene_type = scene_type;
        self
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new("Unknown")
    }
}

/// A notable thing that happened in the story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryEvent {
    pub turn: u64,
    /// Machine-readable kind, e.g. "threat-introduced".
    pub kind: String,
    pub description: String,
}

/// One line of the conversation window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationLine {
    pub turn: u64,
    pub speaker: Speaker,
    pub text: String,
}

/// The complete state of a story session at any point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdventureState {
    pub session_id: SessionId,

    /// Current story clock reading.
    pub clock: StoryTime,

    pub scene: Scene,

    /// Characters currently on stage (the reader is implicit).
    pub present_characters: Vec<StoryCharacter>,

    /// Who is currently speaking, if anyone besides the reader.
    pub speaking: Option<CharacterId>,

    /// Narrative tension, always in `0..=100`.
    tension: u8,

    pub emotional_beat: EmotionalBeat,
    pub chapter: u32,
    pub scene_number: u32,

    pub recent_events: BoundedLog<StoryEvent>,
    pub conversation: BoundedLog<ConversationLine>,

    /// Reader relationship per character, including characters no longer present.
    pub relationships: BTreeMap<CharacterId, Relationship>,

    pub pending_threads: Vec<String>,
    pub foreshadowing: Vec<String>,
    pub secrets_unlocked: Vec<String>,
}

impl Default for AdventureState {
    fn default() -> Self {
        Self::new(Scene::default())
    }
}

impl AdventureState {
    /// Create the state for a fresh session opening on `scene`.
    pub fn new(scene: Scene) -> Self {
        Self {
            session_id: SessionId::new(),
            clock: StoryTime::default(),
            scene,
            present_characters: Vec::new(),
            speaking: None,
            tension: 20,
            emotional_beat: EmotionalBeat::Calm,
            chapter: 1,
            scene_number: 1,
            recent_events: BoundedLog::new(RECENT_EVENTS_LIMIT),
            conversation: BoundedLog::new(CONVERSATION_LIMIT),
            relationships: BTreeMap::new(),
            pending_threads: Vec::new(),
            foreshadowing: Vec::new(),
            secrets_unlocked: Vec::new(),
        }
    }

    pub fn tension(&self) -> u8 {
        self.tension
    }

    /// Set tension, clamped into range.
    pub fn set_tension(&mut self, tension: i32) {
        self.tension = tension.clamp(0, 100) as u8;
    }

    pub fn current_turn(&self) -> u64 {
        self.clock.turn
    }

    /// Bring a character on stage. Returns `false` if already present.
    ///
    /// The first appearance stamps `first_met_turn` and opens a relationship.
    pub fn add_character(&mut self, mut character: StoryCharacter) -> bool {
        if self.is_present(&character.id) {
            return false;
        }
        if character.first_met_turn.is_none() {
            character.first_met_turn = Some(self.clock.turn);
        }
        self.relationships.entry(character.id.clone()).or_default();
        self.present_characters.push(character);
        true
    }

    /// Take a character off stage. Their relationship is kept.
    pub fn remove_character(&mut self, id: &CharacterId) -> Option<StoryCharacter> {
        let index = self.present_characters.iter().position(|c| &c.id == id)?;
        if self.speaking.as_ref() == Some(id) {
            self.speaking = None;
        }
        Some(self.present_characters.remove(index))
    }

    pub fn is_present(&self, id: &CharacterId) -> bool {
        self.present_characters.iter().any(|c| &c.id == id)
    }

    pub fn character(&self, id: &CharacterId) -> Option<&StoryCharacter> {
        self.present_characters.iter().find(|c| &c.id == id)
    }

    /// Find a present character by id or display name.
    pub fn find_character(&self, name: &str) -> Option<&StoryCharacter> {
        self.present_characters
            .iter()
            .find(|c| c.id.matches_name(name) || c.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn present_ids(&self) -> Vec<CharacterId> {
        self.present_characters.iter().map(|c| c.id.clone()).collect()
    }

    /// Set the current speaker; ignored for characters not on stage.
    pub fn set_speaker(&mut self, id: Option<CharacterId>) {
        self.speaking = id.filter(|id| self.is_present(id));
    }

    /// The reader is alone with exactly one character.
    pub fn characters_alone(&self) -> bool {
        self.present_characters.len() == 1
    }

    pub fn record_event(&mut self, kind: impl Into<String>, description: impl Into<String>) {
        self.recent_events.push(StoryEvent {
            turn: self.clock.turn,
            kind: kind.into(),
            description: description.into(),
        });
    }

    pub fn record_line(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.conversation.push(ConversationLine {
            turn: self.clock.turn,
            speaker,
            text: text.into(),
        });
    }

    /// Replace the scene. Returns `true` if the location changed.
    pub fn change_scene(&mut self, scene: Scene) -> bool {
        let moved = scene.location != self.scene.location;
        self.scene = scene;
        self.scene_number += 1;
        moved
    }

    pub fn advance_chapter(&mut self) {
        self.chapter += 1;
        self.scene_number = 1;
    }

    pub fn relationship(&self, id: &CharacterId) -> Option<&Relationship> {
        self.relationships.get(id)
    }

    /// Adjust the reader's relationship with a character, creating it if needed.
    pub fn adjust_relationship(&mut self, id: &CharacterId, delta: RelationshipDelta) {
        let turn = self.clock.turn;
        self.relationships
            .entry(id.clone())
            .or_default()
            .apply(delta, turn);
    }

    /// Track a pending thread summary once.
    pub fn note_pending_thread(&mut self, summary: impl Into<String>) {
        push_unique(&mut self.pending_threads, summary.into());
    }

    pub fn clear_pending_thread(&mut self, summary: &str) {
        self.pending_threads.retain(|s| s != summary);
    }

    pub fn note_foreshadowing(&mut self, hint: impl Into<String>) {
        push_unique(&mut self.foreshadowing, hint.into());
    }

    /// Unlock a secret. Returns `false` if it was already known.
    pub fn unlock_secret(&mut self, secret: impl Into<String>) -> bool {
        push_unique(&mut self.secrets_unlocked, secret.into())
    }

    /// Serialize to the opaque JSON blob handed to persistence.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut state: AdventureState = serde_json::from_str(json)?;
        state.enforce_limits();
        Ok(state)
    }

    /// Re-impose the fixed history capacities and the tension range on a
    /// state that came from a blob.
    pub fn enforce_limits(&mut self) {
        self.tension = self.tension.min(100);
        self.recent_events.set_capacity(RECENT_EVENTS_LIMIT);
        self.conversation.set_capacity(CONVERSATION_LIMIT);
        for relationship in self.relationships.values_mut() {
            relationship.history.set_capacity(RELATIONSHIP_HISTORY_LIMIT);
        }
    }
}

fn push_unique(list: &mut Vec<String>, value: String) -> bool {
    if list.contains(&value) {
        false
    } else {
        list.push(value);
        true
    }
}
