//! Orchestrator actions, payloads and the cooldown table.

use serde::{Deserialize, Serialize};
use story_state::CharacterId;

use crate::breath::{BreathDuration, BreathType};
use crate::crosstalk::CrossTalkType;
use crate::emergence::MomentType;
use crate::evolution::{GrowthDimension, Milestone};
use crate::memory::MemoryId;
use crate::tension::TensionEvent;
use crate::threads::ThreadId;

/// The single thing the orchestrator asks the story to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrchestratorAction {
    ReleaseCatharsis,
    TakeBreath,
    IncreaseTension,
    DecreaseTension,
    MarkMilestone,
    RevealThread,
    TriggerEmergentMoment,
    CrossTalk,
    UseCallback,
    DeepenBond,
    Continue,
}

impl OrchestratorAction {
    pub const ALL: [OrchestratorAction; 11] = [
        OrchestratorAction::ReleaseCatharsis,
        OrchestratorAction::TakeBreath,
        OrchestratorAction::IncreaseTension,
        OrchestratorAction::DecreaseTension,
        OrchestratorAction::MarkMilestone,
        OrchestratorAction::RevealThread,
        OrchestratorAction::TriggerEmergentMoment,
        OrchestratorAction::CrossTalk,
        OrchestratorAction::UseCallback,
        OrchestratorAction::DeepenBond,
        OrchestratorAction::Continue,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            OrchestratorAction::ReleaseCatharsis => "release-catharsis",
            OrchestratorAction::TakeBreath => "take-breath",
            OrchestratorAction::IncreaseTension => "increase-tension",
            OrchestratorAction::DecreaseTension => "decrease-tension",
            OrchestratorAction::MarkMilestone => "mark-milestone",
            OrchestratorAction::RevealThread => "reveal-thread",
            OrchestratorAction::TriggerEmergentMoment => "trigger-emergent-moment",
            OrchestratorAction::CrossTalk => "cross-talk",
            OrchestratorAction::UseCallback => "use-callback",
            OrchestratorAction::DeepenBond => "deepen-bond",
            OrchestratorAction::Continue => "continue",
        }
    }

    pub fn from_key(key: &str) -> Option<OrchestratorAction> {
        let normalized = key.trim().to_lowercase().replace(['_', ' '], "-");
        OrchestratorAction::ALL.into_iter().find(|a| a.key() == normalized)
    }

    /// Actions that push the plot forward and yield to an immediate breath.
    pub fn is_action_oriented(&self) -> bool {
        matches!(
            self,
            OrchestratorAction::IncreaseTension
                | OrchestratorAction::TriggerEmergentMoment
                | OrchestratorAction::RevealThread
        )
    }

    /// Reader-profile content tags associated with the action.
    pub fn content_tags(&self) -> &'static [&'static str] {
        match self {
            OrchestratorAction::ReleaseCatharsis => &["catharsis", "emotional"],
            OrchestratorAction::TakeBreath => &["quiet", "slow-burn"],
            OrchestratorAction::IncreaseTension => &["action", "suspense"],
            OrchestratorAction::DecreaseTension => &["calm", "cozy"],
            OrchestratorAction::MarkMilestone => &["character-growth"],
            OrchestratorAction::RevealThread => &["mystery", "twists"],
            OrchestratorAction::TriggerEmergentMoment => &["surprise"],
            OrchestratorAction::CrossTalk => &["banter", "ensemble"],
            OrchestratorAction::UseCallback => &["callbacks", "nostalgia"],
            OrchestratorAction::DeepenBond => &["romance", "relationships"],
            OrchestratorAction::Continue => &[],
        }
    }
}

impl std::fmt::Display for OrchestratorAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Action-specific data handed to the generation collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ActionPayload {
    Breath {
        breath_type: BreathType,
        duration: BreathDuration,
    },
    Tension {
        event: Option<TensionEvent>,
    },
    Milestone {
        character: CharacterId,
        dimension: GrowthDimension,
        milestone: Milestone,
    },
    Thread {
        thread: ThreadId,
        title: String,
        score: u32,
    },
    Moment {
        moment: MomentType,
        description: String,
    },
    CrossTalk {
        a: CharacterId,
        b: CharacterId,
        talk_type: CrossTalkType,
    },
    Callback {
        character: CharacterId,
        memory: MemoryId,
        content: String,
    },
    Bond {
        character: CharacterId,
        bond: u8,
        threshold: u8,
    },
}

/// Turns an action stays off the table after it is executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionCooldowns {
    pub release_catharsis: u32,
    pub take_breath: u32,
    pub increase_tension: u32,
    pub decrease_tension: u32,
    pub mark_milestone: u32,
    pub reveal_thread: u32,
    pub trigger_emergent_moment: u32,
    pub cross_talk: u32,
    pub use_callback: u32,
    pub deepen_bond: u32,
}

impl Default for ActionCooldowns {
    fn default() -> Self {
        Self {
            release_catharsis: 5,
            take_breath: 3,
            increase_tension: 2,
            decrease_tension: 2,
            mark_milestone: 2,
            reveal_thread: 4,
            trigger_emergent_moment: 3,
            cross_talk: 4,
            use_callback: 5,
            deepen_bond: 3,
        }
    }
}

impl ActionCooldowns {
    pub fn get(&self, action: OrchestratorAction) -> u32 {
        match action {
            OrchestratorAction::ReleaseCatharsis => self.release_catharsis,
            OrchestratorAction::TakeBreath => self.take_breath,
            OrchestratorAction::IncreaseTension => self.increase_tension,
            OrchestratorAction::DecreaseTension => self.decrease_tension,
            OrchestratorAction::MarkMilestone => self.mark_milestone,
            OrchestratorAction::RevealThread => self.reveal_thread,
            OrchestratorAction::TriggerEmergentMoment => self.trigger_emergent_moment,
            OrchestratorAction::CrossTalk => self.cross_talk,
            OrchestratorAction::UseCallback => self.use_callback,
            OrchestratorAction::DeepenBond => self.deepen_bond,
            OrchestratorAction::Continue => 0,
        }
    }
}
