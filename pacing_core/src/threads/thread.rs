//! Narrative threads - setups that ripen toward a revelation.

use serde::{Deserialize, Serialize};

/// Identifier for a thread, sequential within a tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ThreadId(pub u64);

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "thread-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ThreadType {
    #[default]
    Mystery,
    /// A planted object or detail that must pay off later.
    Chekhov,
    Foreshadowing,
    Promise,
    Secret,
    Prophecy,
    Rivalry,
}

impl ThreadType {
    /// Turns a thread of this type waits before it may ripen, unless overridden.
    pub fn default_patience(&self) -> u64 {
        match self {
            ThreadType::Chekhov => 5,
            ThreadType::Foreshadowing | ThreadType::Rivalry => 6,
            ThreadType::Mystery | ThreadType::Secret => 8,
            ThreadType::Promise => 10,
            ThreadType::Prophecy => 12,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            ThreadType::Mystery => "mystery",
            ThreadType::Chekhov => "chekhov",
            ThreadType::Foreshadowing => "foreshadowing",
            ThreadType::Promise => "promise",
            ThreadType::Secret => "secret",
            ThreadType::Prophecy => "prophecy",
            ThreadType::Rivalry => "rivalry",
        }
    }
}

/// Lifecycle of a thread.
///
/// States only move forward. The single exception is `Abandoned`, which can
/// be entered from any open state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ThreadState {
    #[default]
    Dormant,
    Active,
    Building,
    Ripe,
    Revealed,
    Resolved,
    Abandoned,
}

impl ThreadState {
    /// Position along the forward lifecycle. Abandoned sits outside it.
    pub fn rank(&self) -> Option<u8> {
        match self {
            ThreadState::Dormant => Some(0),
            ThreadState::Active => Some(1),
            ThreadState::Building => Some(2),
            ThreadState::Ripe => Some(3),
            ThreadState::Revealed => Some(4),
            ThreadState::Resolved => Some(5),
            ThreadState::Abandoned => None,
        }
    }

    /// Still waiting for its revelation.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            ThreadState::Dormant | ThreadState::Active | ThreadState::Building | ThreadState::Ripe
        )
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, ThreadState::Resolved | ThreadState::Abandoned)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ThreadState::Dormant => "dormant",
            ThreadState::Active => "active",
            ThreadState::Building => "building",
            ThreadState::Ripe => "ripe",
            ThreadState::Revealed => "revealed",
            ThreadState::Resolved => "resolved",
            ThreadState::Abandoned => "abandoned",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RevelationStyle {
    Dramatic,
    Subtle,
    Gradual,
    Twist,
    Confession,
    Discovery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectionKind {
    Parallel,
    Causal,
    Contradicts,
    Echoes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadConnection {
    pub other: ThreadId,
    pub kind: ConnectionKind,
}

/// A mention of a thread in the story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadMention {
    pub turn: u64,
    /// A mention that moves the thread meaningfully forward.
    pub significant: bool,
}

impl ThreadMention {
    pub fn passing(turn: u64) -> Self {
        Self { turn, significant: false }
    }

    pub fn significant(turn: u64) -> Self {
        Self { turn, significant: true }
    }
}

/// A narrative setup tracked toward its payoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeThread {
    pub id: ThreadId,
    pub thread_type: ThreadType,
    pub title: String,
    pub description: String,
    pub state: ThreadState,

    /// How much the thread matters to the story, 0-100.
    pub significance: u8,

    /// 0-100.
    pub build_progress: u8,

    /// Minimum turns between creation and ripening.
    pub patience: u64,

    pub created_turn: u64,
    pub last_touched_turn: u64,
    pub mention_count: u32,

    /// Named elements, registered in the ledger for chekhov threads.
    pub elements: Vec<String>,
    pub connections: Vec<ThreadConnection>,

    pub revelation: Option<RevelationStyle>,
    pub resolution: Option<String>,
}

impl NarrativeThread {
    pub fn new(thread_type: ThreadType, title: impl Into<String>) -> Self {
        Self {
            id: ThreadId(0),
            thread_type,
            title: title.into(),
            description: String::new(),
            state: ThreadState::Dormant,
            significance: 50,
            build_progress: 0,
            patience: thread_type.default_patience(),
            created_turn: 0,
            last_touched_turn: 0,
            mention_count: 0,
            elements: Vec::new(),
            connections: Vec::new(),
            revelation: None,
            resolution: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_significance(mut self, significance: u8) -> Self {
        self.significance = significance.min(100);
        self
    }

    pub fn with_patience(mut self, patience: u64) -> Self {
        self.patience = patience;
        self
    }

    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.elements.push(element.into());
        self
    }

    pub fn created_at(mut self, turn: u64) -> Self {
        self.created_turn = turn;
        self.last_touched_turn = turn;
        self
    }

    pub fn age(&self, turn: u64) -> u64 {
        turn.saturating_sub(self.created_turn)
    }

    pub fn is_connected_to(&self, other: ThreadId) -> bool {
        self.connections.iter().any(|c| c.other == other)
    }

    pub(crate) fn add_progress(&mut self, amount: u8) {
        self.build_progress = self.build_progress.saturating_add(amount).min(100);
    }

    /// Whether the ripening conditions hold at `turn`.
    pub fn can_ripen(&self, turn: u64) -> bool {
        self.build_progress >= 100 && self.age(turn) >= self.patience
    }

    /// Move forward through active/building/ripe as progress allows.
    /// Returns true if the thread just became ripe.
    pub(crate) fn promote(&mut self, turn: u64, building_threshold: u8) -> bool {
        if self.state == ThreadState::Active && self.build_progress >= building_threshold {
            self.state = ThreadState::Building;
        }
        if self.state == ThreadState::Building && self.can_ripen(turn) {
            self.state = ThreadState::Ripe;
            return true;
        }
        false
    }
}
