//! Multi-phase emotional buildups toward a payoff tone.

use serde::{Deserialize, Serialize};

use super::EmotionalTone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuildupId(pub u64);

impl std::fmt::Display for BuildupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "buildup-{}", self.0)
    }
}

/// A named step that must land before the payoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildupPhase {
    pub name: String,
    pub completed: bool,
}

/// An explicit setup toward a specific payoff tone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Buildup {
    pub id: BuildupId,
    pub payoff: EmotionalTone,
    pub phases: Vec<BuildupPhase>,
}

/// How far along a buildup is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildupProgress {
    pub completed: usize,
    pub total: usize,
}

impl BuildupProgress {
    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }
}

impl Buildup {
    pub fn new(id: BuildupId, payoff: EmotionalTone, phases: Vec<String>) -> Self {
        Self {
            id,
            payoff,
            phases: phases
                .into_iter()
                .map(|name| BuildupPhase {
                    name,
                    completed: false,
                })
                .collect(),
        }
    }

    /// Complete the next pending phase. Returns `None` once nothing is left.
    pub fn advance(&mut self) -> Option<BuildupProgress> {
        let next = self.phases.iter_mut().find(|p| !p.completed)?;
        next.completed = true;
        Some(self.progress())
    }

    pub fn progress(&self) -> BuildupProgress {
        BuildupProgress {
            completed: self.phases.iter().filter(|p| p.completed).count(),
            total: self.phases.len(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.phases.iter().all(|p| p.completed)
    }

    /// Name of the next phase to play.
    pub fn next_phase(&self) -> Option<&str> {
        self.phases
            .iter()
            .find(|p| !p.completed)
            .map(|p| p.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_through_phases() {
        let mut buildup = Buildup::new(
            BuildupId(1),
            EmotionalTone::Joy,
            vec!["hint".into(), "setback".into()],
        );
        assert!(!buildup.is_ready());
        assert_eq!(buildup.next_phase(), Some("hint"));

        let progress = buildup.advance().unwrap();
        assert_eq!(progress, BuildupProgress { completed: 1, total: 2 });
        assert!(!progress.is_complete());

        assert!(buildup.advance().unwrap().is_complete());
        assert!(buildup.is_ready());
        assert!(buildup.advance().is_none());
        assert_eq!(buildup.next_phase(), None);
    }
}
