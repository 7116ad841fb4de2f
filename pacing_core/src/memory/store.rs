//! Memory store - per-character memories with decay, eviction and callbacks.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use story_state::{CharacterId, StoryTime};
use tracing::debug;

use super::{MemoryId, MemoryRecord, RecallContext, Salience};

const MILLIS_PER_MINUTE: u64 = 60_000;
const MILLIS_PER_HOUR: u64 = 60 * MILLIS_PER_MINUTE;

/// Tunables for the memory store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Eviction starts once a character holds more than this many memories.
    pub max_per_character: usize,
    /// Cap on `get_relevant` results.
    pub relevant_limit: usize,
    /// How many of the newest high-salience memories are always offered.
    pub recent_high_salience: usize,
    pub high_salience_level: u8,
    /// A memory must go this long without being touched before it decays.
    pub untouched_hours: u64,
    /// ...and this long without being accessed.
    pub unaccessed_hours: u64,
    /// Faded memories younger than this are never evicted.
    pub eviction_min_age_minutes: u64,
    pub callback_min_age_minutes: u64,
    pub callback_max_age_minutes: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_per_character: 100,
            relevant_limit: 5,
            recent_high_salience: 3,
            high_salience_level: Salience::Significant.level(),
            untouched_hours: 24,
            unaccessed_hours: 12,
            eviction_min_age_minutes: 60,
            callback_min_age_minutes: 5,
            callback_max_age_minutes: 60,
        }
    }
}

/// Everything one character remembers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterMemories {
    memories: Vec<MemoryRecord>,
    /// Memories waiting to be called back, in insertion order.
    callback_queue: Vec<MemoryId>,
}

impl CharacterMemories {
    pub fn memories(&self) -> &[MemoryRecord] {
        &self.memories
    }

    pub fn callback_queue(&self) -> &[MemoryId] {
        &self.callback_queue
    }

    fn get(&self, id: MemoryId) -> Option<&MemoryRecord> {
        self.memories.iter().find(|m| m.id == id)
    }

    fn get_mut(&mut self, id: MemoryId) -> Option<&mut MemoryRecord> {
        self.memories.iter_mut().find(|m| m.id == id)
    }
}

/// Outcome of a decay pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecayReport {
    pub decayed: usize,
    pub evicted: usize,
}

/// Salience-weighted memory for every character in a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStore {
    characters: BTreeMap<CharacterId, CharacterMemories>,

    /// Canonical records of shared memories. Each witness holds a mirror.
    shared: Vec<MemoryRecord>,

    next_id: u64,

    #[serde(skip)]
    config: MemoryConfig,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MemoryConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Re-attach tunables after a restore.
    pub fn set_config(&mut self, config: MemoryConfig) {
        self.config = config;
    }

    fn allocate_id(&mut self) -> MemoryId {
        self.next_id += 1;
        MemoryId(self.next_id)
    }

    /// Store a memory for a character and return its id.
    pub fn store(&mut self, character: &CharacterId, mut memory: MemoryRecord) -> MemoryId {
        let id = self.allocate_id();
        memory.id = id;
        let now = memory.created_at;

        debug!(
            character = %character,
            memory = %id,
            kind = memory.memory_type.key(),
            salience = memory.current_salience,
            "Stored memory"
        );

        let entry = self.characters.entry(character.clone()).or_default();
        if memory.is_callback_candidate() {
            entry.callback_queue.push(id);
        }
        entry.memories.push(memory);

        self.evict(character, now);
        id
    }

    /// Store a memory experienced by several characters.
    ///
    /// The canonical record keeps the witness list; every witness receives a
    /// mirror linked back to it. Returns the canonical id.
    pub fn store_shared(&mut self, mut memory: MemoryRecord, witnesses: &[CharacterId]) -> MemoryId {
        let shared_id = self.allocate_id();
        memory.id = shared_id;
        memory.witnesses = witnesses.to_vec();
        for witness in witnesses {
            memory.participants.insert(witness.clone());
        }

        for witness in witnesses {
            let mut mirror = memory.clone();
            mirror.shared_id = Some(shared_id);
            self.store(witness, mirror);
        }

        self.shared.push(memory);
        shared_id
    }

    pub fn memories_for(&self, character: &CharacterId) -> &[MemoryRecord] {
        self.characters
            .get(character)
            .map(|c| c.memories())
            .unwrap_or(&[])
    }

    pub fn memory(&self, character: &CharacterId, id: MemoryId) -> Option<&MemoryRecord> {
        self.characters.get(character).and_then(|c| c.get(id))
    }

    pub fn shared_memory(&self, id: MemoryId) -> Option<&MemoryRecord> {
        self.shared.iter().find(|m| m.id == id)
    }

    pub fn shared_memories(&self) -> &[MemoryRecord] {
        &self.shared
    }

    pub fn callback_queue(&self, character: &CharacterId) -> &[MemoryId] {
        self.characters
            .get(character)
            .map(|c| c.callback_queue())
            .unwrap_or(&[])
    }

    pub fn memory_count(&self, character: &CharacterId) -> usize {
        self.memories_for(character).len()
    }

    pub fn total_memories(&self) -> usize {
        self.characters.values().map(|c| c.memories.len()).sum()
    }

    pub fn characters(&self) -> impl Iterator<Item = &CharacterId> {
        self.characters.keys()
    }

    /// Memories a character should have in mind right now.
    ///
    /// Trigger matches come first (strongest, then newest), followed by the
    /// newest high-salience memories. Every returned memory is marked accessed.
    pub fn get_relevant(
        &mut self,
        character: &CharacterId,
        context: &RecallContext,
        now: StoryTime,
    ) -> Vec<MemoryRecord> {
        let config = self.config.clone();
        let Some(entry) = self.characters.get_mut(character) else {
            return Vec::new();
        };

        let mut matched: Vec<&MemoryRecord> = entry
            .memories
            .iter()
            .filter(|m| !m.is_faded() && m.matches(context))
            .collect();
        matched.sort_by_key(|m| (Reverse(m.current_salience), Reverse(m.created_at), m.id));

        let mut recent: Vec<&MemoryRecord> = entry
            .memories
            .iter()
            .filter(|m| m.current_salience >= config.high_salience_level)
            .collect();
        recent.sort_by_key(|m| (Reverse(m.created_at), Reverse(m.id)));
        recent.truncate(config.recent_high_salience);

        let mut chosen: Vec<MemoryId> = Vec::new();
        for memory in matched.into_iter().chain(recent) {
            if chosen.len() >= config.relevant_limit {
                break;
            }
            if !chosen.contains(&memory.id) {
                chosen.push(memory.id);
            }
        }

        chosen
            .into_iter()
            .filter_map(|id| {
                let memory = entry.get_mut(id)?;
                memory.touch_access(now);
                Some(memory.clone())
            })
            .collect()
    }

    /// The best memory for a character to call back right now, if any.
    ///
    /// Queued memories younger than the minimum callback age are skipped.
    /// A memory matching the context inside the callback window wins;
    /// otherwise the highest callback score does.
    pub fn get_callback_opportunity(
        &self,
        character: &CharacterId,
        context: &RecallContext,
        now: StoryTime,
    ) -> Option<&MemoryRecord> {
        let entry = self.characters.get(character)?;
        let min_age = self.config.callback_min_age_minutes * MILLIS_PER_MINUTE;
        let max_age = self.config.callback_max_age_minutes * MILLIS_PER_MINUTE;

        let candidates: Vec<&MemoryRecord> = entry
            .callback_queue
            .iter()
            .filter_map(|id| entry.get(*id))
            .filter(|m| !m.is_faded() && now.millis_since(m.created_at) >= min_age)
            .collect();

        let contextual = candidates
            .iter()
            .copied()
            .filter(|m| now.millis_since(m.created_at) <= max_age && m.matches(context));

        best_callback(contextual).or_else(|| best_callback(candidates.iter().copied()))
    }

    /// Mark a callback as used: reinforce it and drop it from the queue.
    pub fn use_callback(&mut self, character: &CharacterId, id: MemoryId, now: StoryTime) -> bool {
        let Some(entry) = self.characters.get_mut(character) else {
            return false;
        };
        let Some(memory) = entry.get_mut(id) else {
            return false;
        };
        memory.reinforce(now);
        let shared_id = memory.shared_id;
        entry.callback_queue.retain(|queued| *queued != id);

        if let Some(shared_id) = shared_id {
            if let Some(shared) = self.shared.iter_mut().find(|m| m.id == shared_id) {
                shared.reinforce(now);
            }
        }
        debug!(character = %character, memory = %id, "Callback used");
        true
    }

    /// Reinforce a memory without consuming it as a callback.
    pub fn reinforce(&mut self, character: &CharacterId, id: MemoryId, now: StoryTime) -> bool {
        let Some(memory) = self.characters.get_mut(character).and_then(|c| c.get_mut(id)) else {
            return false;
        };
        memory.reinforce(now);
        if let Some(shared_id) = memory.shared_id {
            if let Some(shared) = self.shared.iter_mut().find(|m| m.id == shared_id) {
                shared.reinforce(now);
            }
        }
        true
    }

    /// Decay neglected memories, then evict faded ones from over-full stores.
    ///
    /// A memory loses one step per untouched window: the window restarts when
    /// it is touched or when it last decayed.
    pub fn decay(&mut self, now: StoryTime) -> DecayReport {
        let untouched = self.config.untouched_hours * MILLIS_PER_HOUR;
        let unaccessed = self.config.unaccessed_hours * MILLIS_PER_HOUR;
        let mut report = DecayReport::default();

        let records = self
            .characters
            .values_mut()
            .flat_map(|c| c.memories.iter_mut())
            .chain(self.shared.iter_mut());
        for memory in records {
            let neglected = now.millis_since(memory.last_touched) > untouched
                && now.millis_since(memory.last_accessed) > unaccessed;
            if neglected && memory.decay_step() {
                // Restart the window so each neglected day costs one step.
                memory.last_touched = now;
                report.decayed += 1;
            }
        }

        let characters: Vec<CharacterId> = self.characters.keys().cloned().collect();
        for character in &characters {
            report.evicted += self.evict(character, now);
        }

        if report.decayed > 0 || report.evicted > 0 {
            debug!(decayed = report.decayed, evicted = report.evicted, "Memory decay pass");
        }
        report
    }

    /// Evict faded, non-permanent memories older than the minimum age,
    /// oldest first, until the character is back under the cap.
    pub fn evict(&mut self, character: &CharacterId, now: StoryTime) -> usize {
        let max = self.config.max_per_character;
        let min_age = self.config.eviction_min_age_minutes * MILLIS_PER_MINUTE;
        let Some(entry) = self.characters.get_mut(character) else {
            return 0;
        };
        if entry.memories.len() <= max {
            return 0;
        }

        let mut evictable: Vec<(StoryTime, MemoryId)> = entry
            .memories
            .iter()
            .filter(|m| m.is_faded() && !m.is_permanent() && now.millis_since(m.created_at) > min_age)
            .map(|m| (m.created_at, m.id))
            .collect();
        evictable.sort();

        let excess = entry.memories.len() - max;
        let doomed: Vec<MemoryId> = evictable.into_iter().take(excess).map(|(_, id)| id).collect();
        entry.memories.retain(|m| !doomed.contains(&m.id));
        entry.callback_queue.retain(|id| !doomed.contains(id));
        if !doomed.is_empty() {
            self.drop_orphaned_shared();
        }
        doomed.len()
    }

    /// Forget canonical shared records no witness still mirrors.
    fn drop_orphaned_shared(&mut self) {
        let characters = &self.characters;
        let before = self.shared.len();
        self.shared.retain(|shared| {
            characters
                .values()
                .flat_map(|c| c.memories.iter())
                .any(|m| m.shared_id == Some(shared.id))
        });
        let dropped = before - self.shared.len();
        if dropped > 0 {
            debug!(dropped, "Dropped orphaned shared memories");
        }
    }
}

/// Highest callback score, earliest id on ties.
fn best_callback<'a>(pool: impl Iterator<Item = &'a MemoryRecord>) -> Option<&'a MemoryRecord> {
    pool.max_by_key(|m| (m.callback_score(), Reverse(m.id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{EmotionalValence, MemoryType};

    fn mira() -> CharacterId {
        CharacterId::new("mira")
    }

    #[test]
    fn test_store_assigns_sequential_ids() {
        let mut store = MemoryStore::new();
        let a = store.store(&mira(), MemoryRecord::new(MemoryType::Event, "a", StoryTime::default()));
        let b = store.store(&mira(), MemoryRecord::new(MemoryType::Event, "b", StoryTime::default()));
        assert_eq!(a, MemoryId(1));
        assert_eq!(b, MemoryId(2));
        assert_eq!(store.memory_count(&mira()), 2);
    }

    #[test]
    fn test_callback_queue_membership() {
        let mut store = MemoryStore::new();
        let now = StoryTime::default();
        let promise = store.store(&mira(), MemoryRecord::new(MemoryType::Promise, "p", now).with_salience(Salience::Minor));
        store.store(&mira(), MemoryRecord::new(MemoryType::Conversation, "c", now).with_salience(Salience::Minor));
        assert_eq!(store.callback_queue(&mira()), &[promise]);
    }

    #[test]
    fn test_relevant_memories_capped_and_accessed() {
        let mut store = MemoryStore::new();
        for i in 0..8 {
            store.store(
                &mira(),
                MemoryRecord::new(MemoryType::Conversation, format!("talk {}", i), StoryTime::at_minutes(i, i))
                    .with_participant("tom"),
            );
        }
        let context = RecallContext::new().with_present("tom");
        let now = StoryTime::at_minutes(10, 10);
        let relevant = store.get_relevant(&mira(), &context, now);

        assert_eq!(relevant.len(), 5);
        // Equal salience, so newest first.
        assert_eq!(relevant[0].content, "talk 7");
        assert!(relevant.iter().all(|m| m.access_count == 1 && m.last_accessed == now));
        let untouched = store.memories_for(&mira()).iter().filter(|m| m.access_count == 0).count();
        assert_eq!(untouched, 3);
    }

    #[test]
    fn test_relevant_includes_recent_high_salience() {
        let mut store = MemoryStore::new();
        store.store(
            &mira(),
            MemoryRecord::new(MemoryType::EmotionalPeak, "the fire", StoryTime::default())
                .with_salience(Salience::Significant),
        );
        store.store(
            &mira(),
            MemoryRecord::new(MemoryType::Event, "market day", StoryTime::default()).with_topic("market"),
        );

        let relevant = store.get_relevant(&mira(), &RecallContext::new().with_topic("market"), StoryTime::default());
        let contents: Vec<&str> = relevant.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["market day", "the fire"]);
    }

    #[test]
    fn test_callback_window() {
        let mut store = MemoryStore::new();
        let start = StoryTime::at_minutes(0, 0);
        store.store(
            &mira(),
            MemoryRecord::new(MemoryType::Promise, "Meet at the lighthouse", start).with_topic("lighthouse"),
        );
        store.store(
            &mira(),
            MemoryRecord::new(MemoryType::Secret, "She stole the map", start)
                .with_salience(Salience::Unforgettable),
        );
        let context = RecallContext::new().with_topic("lighthouse");

        assert!(store.get_callback_opportunity(&mira(), &context, StoryTime::at_minutes(1, 3)).is_none());

        let early = store.get_callback_opportunity(&mira(), &context, StoryTime::at_minutes(2, 10));
        assert_eq!(early.map(|m| m.content.as_str()), Some("Meet at the lighthouse"));

        let late = store.get_callback_opportunity(&mira(), &context, StoryTime::at_minutes(3, 90));
        assert_eq!(late.map(|m| m.content.as_str()), Some("She stole the map"));
    }

    #[test]
    fn test_use_callback_reinforces_and_dequeues() {
        let mut store = MemoryStore::new();
        let id = store.store(&mira(), MemoryRecord::new(MemoryType::First, "first", StoryTime::default()));
        assert!(store.use_callback(&mira(), id, StoryTime::at_minutes(1, 10)));
        assert!(store.callback_queue(&mira()).is_empty());
        let memory = store.memory(&mira(), id).unwrap();
        assert_eq!(memory.reinforcement_count, 1);
        assert_eq!(memory.current_salience, 4);
        assert!(!store.use_callback(&mira(), MemoryId(99), StoryTime::default()));
    }

    #[test]
    fn test_shared_memory_mirrors() {
        let mut store = MemoryStore::new();
        let witnesses = vec![mira(), CharacterId::new("tom")];
        let shared = store.store_shared(
            MemoryRecord::new(MemoryType::Shared, "Survived the storm", StoryTime::default())
                .with_valence(EmotionalValence::Mixed),
            &witnesses,
        );

        assert_eq!(store.memory_count(&mira()), 1);
        assert_eq!(store.memory_count(&CharacterId::new("tom")), 1);
        let mirror = &store.memories_for(&mira())[0];
        assert_eq!(mirror.shared_id, Some(shared));
        assert_eq!(store.shared_memory(shared).unwrap().witnesses.len(), 2);

        let mirror_id = mirror.id;
        store.reinforce(&mira(), mirror_id, StoryTime::default());
        assert_eq!(store.shared_memory(shared).unwrap().reinforcement_count, 1);
    }

    #[test]
    fn test_decay_is_monotonic() {
        let mut store = MemoryStore::new();
        let id = store.store(&mira(), MemoryRecord::new(MemoryType::Event, "e", StoryTime::at_hours(0, 0)));

        let mut previous = store.memory(&mira(), id).unwrap().current_salience;
        for hour in [6, 13, 25, 26, 40, 50, 75, 100, 130] {
            store.decay(StoryTime::at_hours(hour, hour));
            let current = store.memory(&mira(), id).unwrap().current_salience;
            assert!(current <= previous);
            previous = current;
        }
        assert_eq!(store.memory(&mira(), id).unwrap().current_salience, 0);
    }

    #[test]
    fn test_decay_waits_for_both_windows() {
        let mut store = MemoryStore::new();
        let id = store.store(
            &mira(),
            MemoryRecord::new(MemoryType::Event, "e", StoryTime::at_hours(0, 0)).with_participant("tom"),
        );
        store.get_relevant(&mira(), &RecallContext::new().with_present("tom"), StoryTime::at_hours(1, 20));
        // Fresh access at hour 20 blocks decay at hour 25.
        let report = store.decay(StoryTime::at_hours(2, 25));
        assert_eq!(report.decayed, 0);
        assert_eq!(store.memory(&mira(), id).unwrap().current_salience, 3);
    }

    #[test]
    fn test_eviction_spares_permanent_memories() {
        let mut store = MemoryStore::with_config(MemoryConfig {
            max_per_character: 3,
            ..MemoryConfig::default()
        });
        let start = StoryTime::at_hours(0, 0);
        for i in 0..3 {
            store.store(
                &mira(),
                MemoryRecord::new(MemoryType::Conversation, format!("small talk {}", i), start)
                    .with_salience(Salience::Forgettable),
            );
        }
        let vivid = store.store(
            &mira(),
            MemoryRecord::new(MemoryType::Event, "the wreck", start).with_salience(Salience::Unforgettable),
        );
        let mut held = MemoryRecord::new(MemoryType::Conversation, "a kept word", start)
            .with_salience(Salience::Forgettable);
        held.reinforce(start);
        let reinforced = store.store(&mira(), held);
        assert_eq!(store.memory_count(&mira()), 5);

        let report = store.decay(StoryTime::at_hours(1, 25));
        assert_eq!(report.decayed, 3);
        assert_eq!(report.evicted, 2);
        assert_eq!(store.memory_count(&mira()), 3);
        assert!(store.memory(&mira(), vivid).is_some());
        assert!(store.memory(&mira(), reinforced).is_some());
    }

    #[test]
    fn test_eviction_drops_orphaned_shared_records() {
        let mut store = MemoryStore::with_config(MemoryConfig {
            max_per_character: 3,
            ..MemoryConfig::default()
        });
        let witnesses = vec![mira(), CharacterId::new("tom")];
        let start = StoryTime::at_hours(0, 0);
        for i in 0..5 {
            store.store_shared(
                MemoryRecord::new(MemoryType::Conversation, format!("chatter {}", i), start)
                    .with_salience(Salience::Forgettable),
                &witnesses,
            );
        }
        assert_eq!(store.shared_memories().len(), 5);

        store.decay(StoryTime::at_hours(1, 25));
        assert_eq!(store.memory_count(&mira()), 3);
        assert_eq!(store.memory_count(&CharacterId::new("tom")), 3);
        assert_eq!(store.shared_memories().len(), 3);
        // The survivors are the newest three, and each still has its mirrors.
        for shared in store.shared_memories() {
            assert!(store.memories_for(&mira()).iter().any(|m| m.shared_id == Some(shared.id)));
        }
    }

    #[test]
    fn test_shared_records_stay_bounded_over_a_long_session() {
        let mut store = MemoryStore::new();
        let witnesses = vec![mira(), CharacterId::new("tom")];
        for turn in 0..300u64 {
            store.store_shared(
                MemoryRecord::new(MemoryType::Conversation, format!("line {}", turn), StoryTime::at_hours(turn, turn))
                    .with_salience(Salience::Forgettable),
                &witnesses,
            );
            store.decay(StoryTime::at_hours(turn, turn));
        }
        let cap = MemoryConfig::default().max_per_character;
        assert!(store.memory_count(&mira()) <= cap);
        assert!(store.shared_memories().len() <= cap);
    }

    #[test]
    fn test_serde_skips_config() {
        let mut store = MemoryStore::with_config(MemoryConfig {
            relevant_limit: 2,
            ..MemoryConfig::default()
        });
        store.store(&mira(), MemoryRecord::new(MemoryType::Event, "e", StoryTime::default()));
        let json = serde_json::to_string(&store).unwrap();
        let restored: MemoryStore = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.memory_count(&mira()), 1);
        assert_eq!(restored.config().relevant_limit, 5);
    }
}
