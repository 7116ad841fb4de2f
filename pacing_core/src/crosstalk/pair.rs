//! Character pairs and how they get on when the reader isn't talking.

use serde::{Deserialize, Serialize};
use story_state::{BoundedLog, CharacterId};

use super::CrossTalkType;

pub(super) const PAIR_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PairDynamic {
    #[default]
    Neutral,
    Friends,
    Rivals,
    Romantic,
    MentorStudent,
}

impl PairDynamic {
    /// Dynamics that make for good scenes on their own.
    pub fn is_interesting(&self) -> bool {
        matches!(self, PairDynamic::Rivals | PairDynamic::Romantic | PairDynamic::MentorStudent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairExchange {
    pub turn: u64,
    pub talk_type: CrossTalkType,
}

/// How two characters stand with each other. `a` always sorts before `b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairRelationship {
    pub a: CharacterId,
    pub b: CharacterId,
    pub bond: u8,
    pub tension: u8,
    pub dynamic: PairDynamic,
    pub conversations: u32,
    pub history: BoundedLog<PairExchange>,
}

impl PairRelationship {
    pub fn new(x: CharacterId, y: CharacterId) -> Self {
        let (a, b) = ordered(x, y);
        Self {
            a,
            b,
            bond: 50,
            tension: 10,
            dynamic: PairDynamic::Neutral,
            conversations: 0,
            history: BoundedLog::new(PAIR_HISTORY_LIMIT),
        }
    }

    pub fn involves(&self, x: &CharacterId, y: &CharacterId) -> bool {
        (&self.a == x && &self.b == y) || (&self.a == y && &self.b == x)
    }

    /// Shift bond and tension after a conversation of the given type.
    pub fn absorb(&mut self, talk_type: CrossTalkType, turn: u64) {
        let (bond, tension) = talk_type.relationship_effect();
        self.bond = (self.bond as i32 + bond).clamp(0, 100) as u8;
        self.tension = (self.tension as i32 + tension).clamp(0, 100) as u8;
        self.conversations += 1;
        self.history.push(PairExchange { turn, talk_type });
    }

    pub fn last_turn(&self) -> Option<u64> {
        self.history.last().map(|e| e.turn)
    }
}

pub(crate) fn ordered(x: CharacterId, y: CharacterId) -> (CharacterId, CharacterId) {
    if x <= y {
        (x, y)
    } else {
        (y, x)
    }
}
