//! Thread Tracker - foreshadowing, mysteries and planted elements that ripen
//! over time, plus the timing score that decides when one may be revealed.

mod ledger;
mod thread;

pub use ledger::*;
pub use thread::*;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Tunables for the thread tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadConfig {
    pub significant_touch: u8,
    pub passing_touch: u8,
    /// Progress at which an active thread starts building.
    pub building_threshold: u8,
    pub connection_boost: u8,
    /// Turns a chekhov element may stay unused before it is overdue.
    pub max_unused_age: u64,
    /// Revelation score that authorizes a reveal.
    pub revelation_threshold: u32,
    /// Tension at or above which a reveal lands harder.
    pub high_tension: u8,
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self {
            significant_touch: 25,
            passing_touch: 10,
            building_threshold: 30,
            connection_boost: 10,
            max_unused_age: 30,
            revelation_threshold: 70,
            high_tension: 70,
        }
    }
}

/// Scene conditions that bear on revelation timing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevelationContext {
    pub turn: u64,
    pub tension: u8,
    pub emotional_peak: bool,
    pub climax: bool,
    pub breath_active: bool,
}

/// Snapshot of open threads for the orchestrator and the context bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub open: usize,
    pub building: usize,
    pub ripe: Vec<String>,
    /// Best revelation candidate and its score, if it clears the threshold.
    pub reveal_candidate: Option<(ThreadId, u32)>,
    pub unused_elements: Vec<String>,
    pub overdue_elements: Vec<String>,
}

/// All narrative threads of a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreadTracker {
    threads: Vec<NarrativeThread>,
    ledger: ElementLedger,
    next_id: u64,
    #[serde(skip)]
    config: ThreadConfig,
}

impl ThreadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ThreadConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &ThreadConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ThreadConfig) {
        self.config = config;
    }

    /// Start tracking a thread. Chekhov elements enter the ledger.
    pub fn add(&mut self, mut thread: NarrativeThread) -> ThreadId {
        self.next_id += 1;
        let id = ThreadId(self.next_id);
        thread.id = id;

        if thread.thread_type == ThreadType::Chekhov {
            for element in &thread.elements {
                self.ledger.register(element.clone(), id, thread.created_turn);
            }
        }

        debug!(thread = %id, kind = thread.thread_type.key(), title = %thread.title, "Thread added");
        self.threads.push(thread);
        id
    }

    pub fn thread(&self, id: ThreadId) -> Option<&NarrativeThread> {
        self.threads.iter().find(|t| t.id == id)
    }

    fn thread_mut(&mut self, id: ThreadId) -> Option<&mut NarrativeThread> {
        self.threads.iter_mut().find(|t| t.id == id)
    }

    pub fn threads(&self) -> &[NarrativeThread] {
        &self.threads
    }

    /// Find an open thread by title, case-insensitively.
    pub fn find_by_title(&self, title: &str) -> Option<&NarrativeThread> {
        let title = title.trim();
        self.threads
            .iter()
            .find(|t| t.state.is_open() && t.title.eq_ignore_ascii_case(title))
    }

    pub fn ledger(&self) -> &ElementLedger {
        &self.ledger
    }

    /// Record a mention of a thread.
    ///
    /// Returns the state after the mention, or `None` if the thread is
    /// unknown or no longer open.
    pub fn touch(&mut self, id: ThreadId, mention: ThreadMention) -> Option<ThreadState> {
        let amount = if mention.significant {
            self.config.significant_touch
        } else {
            self.config.passing_touch
        };
        let building_threshold = self.config.building_threshold;
        let thread = self.thread_mut(id)?;
        if !thread.state.is_open() {
            return None;
        }

        thread.mention_count += 1;
        thread.last_touched_turn = mention.turn;
        thread.add_progress(amount);
        if thread.state == ThreadState::Dormant {
            thread.state = ThreadState::Active;
        }
        if thread.promote(mention.turn, building_threshold) {
            info!(thread = %id, title = %thread.title, "Thread ripened");
        }
        Some(thread.state)
    }

    /// Promote building threads whose patience has run out.
    pub fn advance_turn(&mut self, turn: u64) -> Vec<ThreadId> {
        let building_threshold = self.config.building_threshold;
        let mut ripened = Vec::new();
        for thread in self.threads.iter_mut().filter(|t| t.state == ThreadState::Building) {
            if thread.promote(turn, building_threshold) {
                info!(thread = %thread.id, title = %thread.title, "Thread ripened");
                ripened.push(thread.id);
            }
        }
        ripened
    }

    /// Reveal an open thread. Chekhov elements count as used.
    pub fn reveal(&mut self, id: ThreadId, style: RevelationStyle, turn: u64) -> bool {
        let Some(thread) = self.thread_mut(id) else {
            return false;
        };
        if !thread.state.is_open() {
            return false;
        }
        thread.state = ThreadState::Revealed;
        thread.revelation = Some(style);
        thread.last_touched_turn = turn;
        self.ledger.mark_thread_used(id, turn);
        info!(thread = %id, style = ?style, "Thread revealed");
        true
    }

    /// Close a thread with a resolution. Works on open and revealed threads.
    pub fn resolve(&mut self, id: ThreadId, resolution: impl Into<String>) -> bool {
        let Some(thread) = self.thread_mut(id) else {
            return false;
        };
        if thread.state.is_closed() {
            return false;
        }
        thread.state = ThreadState::Resolved;
        thread.resolution = Some(resolution.into());
        true
    }

    /// Drop a thread the story no longer intends to pay off.
    pub fn abandon(&mut self, id: ThreadId) -> bool {
        let Some(thread) = self.thread_mut(id) else {
            return false;
        };
        if thread.state.is_closed() {
            return false;
        }
        thread.state = ThreadState::Abandoned;
        debug!(thread = %id, "Thread abandoned");
        true
    }

    /// Link two threads. Both gain progress.
    pub fn connect(&mut self, a: ThreadId, b: ThreadId, kind: ConnectionKind, turn: u64) -> bool {
        if a == b || self.thread(a).is_none() || self.thread(b).is_none() {
            return false;
        }
        if self.thread(a).map(|t| t.is_connected_to(b)).unwrap_or(false) {
            return false;
        }

        let boost = self.config.connection_boost;
        let building_threshold = self.config.building_threshold;
        for (this, other) in [(a, b), (b, a)] {
            if let Some(thread) = self.thread_mut(this) {
                thread.connections.push(ThreadConnection { other, kind });
                if thread.state.is_open() {
                    thread.add_progress(boost);
                    thread.promote(turn, building_threshold);
                }
            }
        }
        true
    }

    /// Mark a planted element as paid off.
    pub fn mark_element_used(&mut self, name: &str, turn: u64) -> bool {
        self.ledger.mark_used(name, turn)
    }

    /// Elements introduced but never used.
    pub fn get_unused_elements(&self) -> Vec<&ChekhovElement> {
        self.ledger.unused()
    }

    /// Unused elements older than the configured maximum age.
    pub fn overdue_elements(&self, turn: u64) -> Vec<&ChekhovElement> {
        self.ledger.overdue(turn, self.config.max_unused_age)
    }

    pub fn get_ripe_threads(&self) -> Vec<&NarrativeThread> {
        self.threads
            .iter()
            .filter(|t| t.state == ThreadState::Ripe)
            .collect()
    }

    pub fn open_threads(&self) -> impl Iterator<Item = &NarrativeThread> {
        self.threads.iter().filter(|t| t.state.is_open())
    }

    /// How well-timed a reveal of this thread would be, 0-100.
    pub fn revelation_score(&self, id: ThreadId, context: &RevelationContext) -> Option<u32> {
        let thread = self.thread(id)?;
        if !thread.state.is_open() {
            return None;
        }

        let mut score: i32 = 0;
        if thread.state == ThreadState::Ripe {
            score += 30;
        } else if thread.state == ThreadState::Building && thread.build_progress >= 100 {
            score += 15;
        }
        score += thread.significance as i32 / 5;
        score += thread.build_progress as i32 * 3 / 20;
        score += thread.age(context.turn).min(20) as i32;

        if context.tension >= self.config.high_tension {
            score += 10;
        }
        if context.emotional_peak {
            score += 10;
        }
        if context.climax {
            score += 15;
        }
        if context.breath_active {
            score -= 20;
        }

        Some(score.clamp(0, 100) as u32)
    }

    pub fn should_reveal(&self, id: ThreadId, context: &RevelationContext) -> bool {
        self.revelation_score(id, context)
            .map(|score| score >= self.config.revelation_threshold)
            .unwrap_or(false)
    }

    /// The ripe thread best placed for revelation, if any clears the threshold.
    pub fn best_revelation(&self, context: &RevelationContext) -> Option<(ThreadId, u32)> {
        self.get_ripe_threads()
            .into_iter()
            .filter_map(|t| self.revelation_score(t.id, context).map(|score| (t.id, score)))
            .filter(|(_, score)| *score >= self.config.revelation_threshold)
            .max_by_key(|(id, score)| (*score, std::cmp::Reverse(*id)))
    }

    pub fn summary(&self, context: &RevelationContext) -> ThreadSummary {
        ThreadSummary {
            open: self.open_threads().count(),
            building: self
                .threads
                .iter()
                .filter(|t| t.state == ThreadState::Building)
                .count(),
            ripe: self.get_ripe_threads().iter().map(|t| t.title.clone()).collect(),
            reveal_candidate: self.best_revelation(context),
            unused_elements: self.get_unused_elements().iter().map(|e| e.name.clone()).collect(),
            overdue_elements: self
                .overdue_elements(context.turn)
                .iter()
                .map(|e| e.name.clone())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pistol() -> NarrativeThread {
        NarrativeThread::new(ThreadType::Chekhov, "The pistol on the wall")
            .with_patience(5)
            .with_significance(80)
            .with_element("pistol")
    }

    #[test]
    fn test_chekhov_ripens_on_sixth_touch() {
        let mut tracker = ThreadTracker::new();
        let id = tracker.add(pistol());

        assert_eq!(tracker.touch(id, ThreadMention::passing(1)), Some(ThreadState::Active));
        assert_eq!(tracker.touch(id, ThreadMention::passing(2)), Some(ThreadState::Active));
        assert_eq!(tracker.touch(id, ThreadMention::significant(3)), Some(ThreadState::Building));
        tracker.touch(id, ThreadMention::significant(4));
        tracker.touch(id, ThreadMention::significant(5));
        assert_eq!(tracker.thread(id).unwrap().build_progress, 95);
        assert_eq!(tracker.touch(id, ThreadMention::significant(6)), Some(ThreadState::Ripe));

        let thread = tracker.thread(id).unwrap();
        assert_eq!(thread.build_progress, 100);
        assert_eq!(thread.mention_count, 6);
        assert_eq!(tracker.get_ripe_threads().len(), 1);
    }

    #[test]
    fn test_full_progress_waits_for_patience() {
        let mut tracker = ThreadTracker::new();
        let id = tracker.add(pistol().with_patience(10));
        for turn in 1..=4 {
            tracker.touch(id, ThreadMention::significant(turn));
        }
        assert_eq!(tracker.thread(id).unwrap().state, ThreadState::Building);
        assert!(tracker.advance_turn(9).is_empty());
        assert_eq!(tracker.advance_turn(10), vec![id]);
        assert_eq!(tracker.thread(id).unwrap().state, ThreadState::Ripe);
    }

    #[test]
    fn test_lifecycle_never_regresses() {
        let mut tracker = ThreadTracker::new();
        let id = tracker.add(pistol());
        let mut last_rank = tracker.thread(id).unwrap().state.rank();
        for turn in 1..=10 {
            tracker.touch(id, ThreadMention::passing(turn));
            tracker.advance_turn(turn);
            let rank = tracker.thread(id).unwrap().state.rank();
            assert!(rank >= last_rank);
            last_rank = rank;
        }
        assert!(tracker.reveal(id, RevelationStyle::Dramatic, 11));
        assert_eq!(tracker.touch(id, ThreadMention::significant(12)), None);
        assert!(!tracker.reveal(id, RevelationStyle::Subtle, 12));
        assert!(tracker.resolve(id, "It was fired in act three"));
        assert!(!tracker.abandon(id));
    }

    #[test]
    fn test_abandon_from_open_state() {
        let mut tracker = ThreadTracker::new();
        let id = tracker.add(NarrativeThread::new(ThreadType::Rivalry, "Old grudge"));
        tracker.touch(id, ThreadMention::passing(1));
        assert!(tracker.abandon(id));
        assert_eq!(tracker.thread(id).unwrap().state, ThreadState::Abandoned);
        assert!(tracker.open_threads().next().is_none());
    }

    #[test]
    fn test_connect_boosts_both() {
        let mut tracker = ThreadTracker::new();
        let a = tracker.add(NarrativeThread::new(ThreadType::Mystery, "The missing bell"));
        let b = tracker.add(NarrativeThread::new(ThreadType::Secret, "The keeper's debt"));
        tracker.touch(a, ThreadMention::passing(1));

        assert!(tracker.connect(a, b, ConnectionKind::Causal, 2));
        assert!(!tracker.connect(b, a, ConnectionKind::Echoes, 2));
        assert!(!tracker.connect(a, a, ConnectionKind::Parallel, 2));

        assert_eq!(tracker.thread(a).unwrap().build_progress, 20);
        assert_eq!(tracker.thread(b).unwrap().build_progress, 10);
        assert!(tracker.thread(b).unwrap().is_connected_to(a));
    }

    #[test]
    fn test_reveal_marks_elements_used() {
        let mut tracker = ThreadTracker::new();
        let id = tracker.add(pistol());
        assert_eq!(tracker.get_unused_elements().len(), 1);
        assert_eq!(tracker.overdue_elements(31).len(), 1);

        tracker.reveal(id, RevelationStyle::Discovery, 31);
        assert!(tracker.get_unused_elements().is_empty());
        assert!(tracker.overdue_elements(40).is_empty());
    }

    #[test]
    fn test_revelation_score() {
        let mut tracker = ThreadTracker::new();
        let id = tracker.add(pistol());
        for turn in 1..=4 {
            tracker.touch(id, ThreadMention::significant(turn));
        }
        tracker.advance_turn(20);
        assert_eq!(tracker.thread(id).unwrap().state, ThreadState::Ripe);

        let calm = RevelationContext {
            turn: 20,
            ..RevelationContext::default()
        };
        // 30 ripe + 16 significance + 15 progress + 20 age
        assert_eq!(tracker.revelation_score(id, &calm), Some(81));
        assert!(tracker.should_reveal(id, &calm));

        let breather = RevelationContext {
            breath_active: true,
            ..calm
        };
        assert_eq!(tracker.revelation_score(id, &breather), Some(61));
        assert!(!tracker.should_reveal(id, &breather));

        let climax = RevelationContext {
            tension: 85,
            climax: true,
            emotional_peak: true,
            ..calm
        };
        assert_eq!(tracker.revelation_score(id, &climax), Some(100));
        assert_eq!(tracker.best_revelation(&calm), Some((id, 81)));
    }

    #[test]
    fn test_find_by_title() {
        let mut tracker = ThreadTracker::new();
        let id = tracker.add(pistol());
        assert_eq!(tracker.find_by_title("the pistol on the WALL").map(|t| t.id), Some(id));
        assert!(tracker.find_by_title("unknown").is_none());
    }
}
