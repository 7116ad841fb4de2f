//! Reader-to-character relationship tracking.

use serde::{Deserialize, Serialize};

use crate::adventure::BoundedLog;

/// How many relationship changes are remembered per character.
pub const RELATIONSHIP_HISTORY_LIMIT: usize = 10;

/// Relationship metrics between the reader and one character.
///
/// Every metric is kept in `0..=100`; mutations clamp at the point of change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub trust: u8,
    pub affection: u8,
    pub tension: u8,
    pub familiarity: u8,
    pub history: BoundedLog<RelationshipChange>,
}

impl Default for Relationship {
    fn default() -> Self {
        Self {
            trust: 50,
            affection: 50,
            tension: 10,
            familiarity: 0,
            history: BoundedLog::new(RELATIONSHIP_HISTORY_LIMIT),
        }
    }
}

/// Which relationship metric a change or threshold refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipMetric {
    Trust,
    Affection,
    Tension,
    Familiarity,
}

/// A signed adjustment to one or more relationship metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipDelta {
    pub trust: i32,
    pub affection: i32,
    pub tension: i32,
    pub familiarity: i32,
    pub reason: Option<String>,
}

impl RelationshipDelta {
    pub fn trust(amount: i32) -> Self {
        Self {
            trust: amount,
            ..Default::default()
        }
    }

    pub fn affection(amount: i32) -> Self {
        Self {
            affection: amount,
            ..Default::default()
        }
    }

    pub fn tension(amount: i32) -> Self {
        Self {
            tension: amount,
            ..Default::default()
        }
    }

    pub fn familiarity(amount: i32) -> Self {
        Self {
            familiarity: amount,
            ..Default::default()
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn is_zero(&self) -> bool {
        self.trust == 0 && self.affection == 0 && self.tension == 0 && self.familiarity == 0
    }
}

/// A recorded relationship change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipChange {
    pub turn: u64,
    pub delta: RelationshipDelta,
}

impl Relationship {
    /// Apply a delta, clamping every metric into range.
    pub fn apply(&mut self, delta: RelationshipDelta, turn: u64) {
        if delta.is_zero() {
            return;
        }
        self.trust = shift(self.trust, delta.trust);
        self.affection = shift(self.affection, delta.affection);
        self.tension = shift(self.tension, delta.tension);
        self.familiarity = shift(self.familiarity, delta.familiarity);
        self.history.push(RelationshipChange { turn, delta });
    }

    /// Get a single metric.
    pub fn metric(&self, metric: RelationshipMetric) -> u8 {
        match metric {
            RelationshipMetric::Trust => self.trust,
            RelationshipMetric::Affection => self.affection,
            RelationshipMetric::Tension => self.tension,
            RelationshipMetric::Familiarity => self.familiarity,
        }
    }

    /// Overall bond strength: mean of trust, affection and familiarity.
    pub fn bond(&self) -> u8 {
        ((self.trust as u32 + self.affection as u32 + self.familiarity as u32) / 3) as u8
    }

    /// Short label for prompt context.
    pub fn label(&self) -> &'static str {
        if self.tension >= 70 {
            "strained"
        } else if self.bond() >= 75 {
            "close"
        } else if self.bond() >= 50 {
            "warm"
        } else if self.familiarity < 15 {
            "new"
        } else {
            "distant"
        }
    }
}

fn shift(value: u8, delta: i32) -> u8 {
    (value as i32 + delta).clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_relationship() {
        let rel = Relationship::default();
        assert_eq!(rel.trust, 50);
        assert_eq!(rel.familiarity, 0);
        assert_eq!(rel.label(), "new");
    }

    #[test]
    fn test_apply_clamps() {
        let mut rel = Relationship::default();
        rel.apply(RelationshipDelta::trust(80), 1);
        rel.apply(RelationshipDelta::tension(-50), 2);

        assert_eq!(rel.trust, 100);
        assert_eq!(rel.tension, 0);
        assert_eq!(rel.history.len(), 2);
    }

    #[test]
    fn test_zero_delta_not_recorded() {
        let mut rel = Relationship::default();
        rel.apply(RelationshipDelta::default(), 1);
        assert!(rel.history.is_empty());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut rel = Relationship::default();
        for turn in 0..25 {
            rel.apply(RelationshipDelta::familiarity(1), turn);
        }
        assert_eq!(rel.history.len(), RELATIONSHIP_HISTORY_LIMIT);
        assert_eq!(rel.familiarity, 25);
    }

    #[test]
    fn test_bond_and_label() {
        let mut rel = Relationship::default();
        rel.apply(
            RelationshipDelta {
                trust: 40,
                affection: 40,
                familiarity: 80,
                ..Default::default()
            },
            1,
        );
        assert_eq!(rel.bond(), 86);
        assert_eq!(rel.label(), "close");

        rel.apply(RelationshipDelta::tension(70), 2);
        assert_eq!(rel.label(), "strained");
    }
}
