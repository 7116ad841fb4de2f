//! Memory records - what a character remembers about the story so far.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use story_state::{CharacterId, StoryTime};

use super::{MemoryTrigger, RecallContext};

/// Identifier for a memory, sequential within a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MemoryId(pub u64);

impl std::fmt::Display for MemoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "memory-{}", self.0)
    }
}

/// Kinds of memory a character can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MemoryType {
    Conversation,
    #[default]
    Event,
    /// Something the reader or a character promised.
    Promise,
    Secret,
    /// A first: first meeting, first kiss, first fight.
    First,
    EmotionalPeak,
    Conflict,
    Kindness,
    /// Experienced together by several characters.
    Shared,
}

impl MemoryType {
    /// Weight added to callback scoring.
    pub fn callback_weight(&self) -> u32 {
        match self {
            MemoryType::Promise => 15,
            MemoryType::First | MemoryType::EmotionalPeak => 12,
            MemoryType::Secret => 10,
            MemoryType::Shared => 8,
            MemoryType::Kindness | MemoryType::Conflict => 6,
            MemoryType::Event => 5,
            MemoryType::Conversation => 3,
        }
    }

    /// Types that always belong in the callback queue.
    pub fn is_callback_worthy(&self) -> bool {
        matches!(
            self,
            MemoryType::Promise | MemoryType::First | MemoryType::EmotionalPeak | MemoryType::Secret
        )
    }

    pub fn key(&self) -> &'static str {
        match self {
            MemoryType::Conversation => "conversation",
            MemoryType::Event => "event",
            MemoryType::Promise => "promise",
            MemoryType::Secret => "secret",
            MemoryType::First => "first",
            MemoryType::EmotionalPeak => "emotional-peak",
            MemoryType::Conflict => "conflict",
            MemoryType::Kindness => "kindness",
            MemoryType::Shared => "shared",
        }
    }
}

/// How a memory feels to the one holding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EmotionalValence {
    VeryNegative,
    Negative,
    #[default]
    Neutral,
    Positive,
    VeryPositive,
    /// Bittersweet.
    Mixed,
}

impl EmotionalValence {
    /// Bonus for emotionally charged memories when picking callbacks.
    pub fn charge_bonus(&self) -> u32 {
        match self {
            EmotionalValence::VeryNegative | EmotionalValence::VeryPositive => 8,
            EmotionalValence::Mixed => 6,
            EmotionalValence::Negative | EmotionalValence::Positive => 4,
            EmotionalValence::Neutral => 0,
        }
    }
}

/// Ordinal memorability, 1 to 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Salience {
    Forgettable = 1,
    Minor = 2,
    #[default]
    Notable = 3,
    Significant = 4,
    Unforgettable = 5,
}

impl Salience {
    pub fn level(&self) -> u8 {
        *self as u8
    }

    /// Nearest salience for a raw level. Zero and below map to forgettable.
    pub fn from_level(level: u8) -> Salience {
        match level {
            0 | 1 => Salience::Forgettable,
            2 => Salience::Minor,
            3 => Salience::Notable,
            4 => Salience::Significant,
            _ => Salience::Unforgettable,
        }
    }
}

/// A single remembered moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: MemoryId,
    pub memory_type: MemoryType,
    pub content: String,
    pub valence: EmotionalValence,

    /// Salience at the time the memory was formed.
    pub salience: Salience,

    /// Salience after decay and reinforcement, 0 to 5. Zero means faded.
    pub current_salience: u8,

    pub participants: BTreeSet<CharacterId>,
    pub triggers: Vec<MemoryTrigger>,
    pub location: Option<String>,
    pub topics: Vec<String>,

    pub created_at: StoryTime,
    pub last_accessed: StoryTime,
    /// Last time the memory was formed, reinforced or used as a callback.
    pub last_touched: StoryTime,
    pub access_count: u32,
    pub reinforcement_count: u32,

    /// Set on mirrors of a shared memory.
    pub shared_id: Option<MemoryId>,
    pub witnesses: Vec<CharacterId>,
}

impl MemoryRecord {
    /// Create a memory formed at `now`. The id is assigned when stored.
    pub fn new(memory_type: MemoryType, content: impl Into<String>, now: StoryTime) -> Self {
        let salience = Salience::default();
        Self {
            id: MemoryId(0),
            memory_type,
            content: content.into(),
            valence: EmotionalValence::Neutral,
            salience,
            current_salience: salience.level(),
            participants: BTreeSet::new(),
            triggers: Vec::new(),
            location: None,
            topics: Vec::new(),
            created_at: now,
            last_accessed: now,
            last_touched: now,
            access_count: 0,
            reinforcement_count: 0,
            shared_id: None,
            witnesses: Vec::new(),
        }
    }

    pub fn with_salience(mut self, salience: Salience) -> Self {
        self.salience = salience;
        self.current_salience = salience.level();
        self
    }

    pub fn with_valence(mut self, valence: EmotionalValence) -> Self {
        self.valence = valence;
        self
    }

    /// Add a participant. Participants are also recall triggers.
    pub fn with_participant(mut self, id: impl Into<CharacterId>) -> Self {
        let id = id.into();
        self.triggers.push(MemoryTrigger::Participant(id.clone()));
        self.participants.insert(id);
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        let topic = topic.into();
        self.triggers.push(MemoryTrigger::Topic(topic.clone()));
        self.topics.push(topic);
        self
    }

    pub fn at_location(mut self, location: impl Into<String>) -> Self {
        let location = location.into();
        self.triggers.push(MemoryTrigger::Location(location.clone()));
        self.location = Some(location);
        self
    }

    pub fn with_trigger(mut self, trigger: MemoryTrigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    /// Whether any trigger fires in the context.
    pub fn matches(&self, context: &RecallContext) -> bool {
        self.triggers.iter().any(|t| t.matches(context))
    }

    pub fn involves(&self, id: &CharacterId) -> bool {
        self.participants.contains(id)
    }

    pub fn current(&self) -> Salience {
        Salience::from_level(self.current_salience)
    }

    pub fn is_faded(&self) -> bool {
        self.current_salience == 0
    }

    /// Reinforced and unforgettable memories never decay or get evicted.
    pub fn is_permanent(&self) -> bool {
        self.reinforcement_count > 0 || self.salience == Salience::Unforgettable
    }

    /// Strengthen the memory by one step.
    pub fn reinforce(&mut self, now: StoryTime) {
        self.reinforcement_count += 1;
        self.current_salience = (self.current_salience + 1).min(Salience::Unforgettable.level());
        self.last_touched = now;
    }

    pub fn touch_access(&mut self, now: StoryTime) {
        self.access_count += 1;
        self.last_accessed = now;
    }

    /// Lose one salience step. Returns true if anything changed.
    pub fn decay_step(&mut self) -> bool {
        if self.is_permanent() || self.current_salience == 0 {
            return false;
        }
        self.current_salience -= 1;
        true
    }

    /// Salience + type weighting + emotional charge.
    pub fn callback_score(&self) -> u32 {
        u32::from(self.current_salience) * 10
            + self.memory_type.callback_weight()
            + self.valence.charge_bonus()
    }

    /// Whether the memory belongs in the callback queue.
    pub fn is_callback_candidate(&self) -> bool {
        self.memory_type.is_callback_worthy() || self.salience >= Salience::Notable
    }

    /// One-line brief for the context bundle.
    pub fn brief(&self) -> String {
        format!("[{}] {}", self.memory_type.key(), self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(minutes: u64) -> StoryTime {
        StoryTime::at_minutes(0, minutes)
    }

    #[test]
    fn test_builder_registers_triggers() {
        let memory = MemoryRecord::new(MemoryType::Promise, "Swore to find her sister", at(0))
            .with_participant("mira")
            .with_topic("sister")
            .at_location("Harbour");

        assert_eq!(memory.triggers.len(), 3);
        assert!(memory.involves(&CharacterId::new("mira")));
        assert!(memory.matches(&RecallContext::new().at("harbour")));
        assert!(memory.matches(&RecallContext::new().with_text("what about your sister")));
    }

    #[test]
    fn test_decay_and_reinforce() {
        let mut memory = MemoryRecord::new(MemoryType::Event, "Rain on the road", at(0))
            .with_salience(Salience::Minor);
        assert!(memory.decay_step());
        assert_eq!(memory.current_salience, 1);
        assert!(memory.decay_step());
        assert!(memory.is_faded());
        assert!(!memory.decay_step());

        memory.reinforce(at(5));
        assert!(memory.is_permanent());
        assert_eq!(memory.current_salience, 1);
        assert!(!memory.decay_step());
    }

    #[test]
    fn test_unforgettable_is_permanent() {
        let mut memory = MemoryRecord::new(MemoryType::First, "First meeting", at(0))
            .with_salience(Salience::Unforgettable);
        assert!(memory.is_permanent());
        assert!(!memory.decay_step());
        memory.reinforce(at(1));
        assert_eq!(memory.current_salience, 5);
    }

    #[test]
    fn test_callback_score() {
        let promise = MemoryRecord::new(MemoryType::Promise, "promise", at(0))
            .with_salience(Salience::Significant)
            .with_valence(EmotionalValence::VeryPositive);
        // 4 * 10 + 15 + 8
        assert_eq!(promise.callback_score(), 63);

        let chat = MemoryRecord::new(MemoryType::Conversation, "chat", at(0))
            .with_salience(Salience::Minor);
        assert_eq!(chat.callback_score(), 23);
        assert!(!chat.is_callback_candidate());
        assert!(promise.is_callback_candidate());
    }

    #[test]
    fn test_salience_from_level() {
        assert_eq!(Salience::from_level(0), Salience::Forgettable);
        assert_eq!(Salience::from_level(4), Salience::Significant);
        assert_eq!(Salience::from_level(9), Salience::Unforgettable);
    }
}
