//! Comparable priorities for orchestrator recommendations.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::urgency::Urgency;

/// Coarse importance band. Ordered so that `Critical` is greatest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PriorityTier {
    Low,
    Medium,
    High,
    Critical,
}

impl PriorityTier {
    pub fn label(&self) -> &'static str {
        match self {
            PriorityTier::Low => "low",
            PriorityTier::Medium => "medium",
            PriorityTier::High => "high",
            PriorityTier::Critical => "critical",
        }
    }
}

/// How soon the story should act on a recommendation. `Immediate` is greatest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionUrgency {
    Gradual,
    WhenAppropriate,
    Soon,
    Immediate,
}

impl ActionUrgency {
    pub fn raised(self) -> Self {
        match self {
            ActionUrgency::Gradual => ActionUrgency::WhenAppropriate,
            ActionUrgency::WhenAppropriate => ActionUrgency::Soon,
            ActionUrgency::Soon | ActionUrgency::Immediate => ActionUrgency::Immediate,
        }
    }

    pub fn lowered(self) -> Self {
        match self {
            ActionUrgency::Immediate => ActionUrgency::Soon,
            ActionUrgency::Soon => ActionUrgency::WhenAppropriate,
            ActionUrgency::WhenAppropriate | ActionUrgency::Gradual => ActionUrgency::Gradual,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActionUrgency::Gradual => "gradual",
            ActionUrgency::WhenAppropriate => "when-appropriate",
            ActionUrgency::Soon => "soon",
            ActionUrgency::Immediate => "immediate",
        }
    }
}

impl From<Urgency> for ActionUrgency {
    fn from(urgency: Urgency) -> Self {
        match urgency {
            Urgency::High => ActionUrgency::Immediate,
            Urgency::Medium => ActionUrgency::Soon,
            Urgency::Low => ActionUrgency::WhenAppropriate,
            Urgency::None => ActionUrgency::Gradual,
        }
    }
}

/// Tier, then urgency, then generation order (earlier wins).
///
/// `Ord` is arranged so that the more important priority compares greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Priority {
    pub tier: PriorityTier,
    pub urgency: ActionUrgency,
    pub sequence: u32,
}

impl Priority {
    pub fn new(tier: PriorityTier, urgency: ActionUrgency, sequence: u32) -> Self {
        Self {
            tier,
            urgency,
            sequence,
        }
    }

    /// Numeric rendering for display only.
    pub fn score(&self) -> u32 {
        (self.tier as u32 + 1) * 100 + (self.urgency as u32 + 1) * 10
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tier
            .cmp(&other.tier)
            .then(self.urgency.cmp(&other.urgency))
            .then(other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_beats_urgency() {
        let critical = Priority::new(PriorityTier::Critical, ActionUrgency::Gradual, 5);
        let high = Priority::new(PriorityTier::High, ActionUrgency::Immediate, 0);
        assert!(critical > high);
    }

    #[test]
    fn test_earlier_sequence_wins_ties() {
        let first = Priority::new(PriorityTier::Medium, ActionUrgency::Soon, 1);
        let second = Priority::new(PriorityTier::Medium, ActionUrgency::Soon, 2);
        assert!(first > second);
    }

    #[test]
    fn test_urgency_steps() {
        assert_eq!(ActionUrgency::Gradual.raised(), ActionUrgency::WhenAppropriate);
        assert_eq!(ActionUrgency::Immediate.raised(), ActionUrgency::Immediate);
        assert_eq!(ActionUrgency::Gradual.lowered(), ActionUrgency::Gradual);
        assert_eq!(ActionUrgency::from(Urgency::High), ActionUrgency::Immediate);
    }

    #[test]
    fn test_score() {
        assert_eq!(Priority::new(PriorityTier::Critical, ActionUrgency::Immediate, 0).score(), 440);
        assert_eq!(Priority::new(PriorityTier::Low, ActionUrgency::Gradual, 0).score(), 110);
    }
}
