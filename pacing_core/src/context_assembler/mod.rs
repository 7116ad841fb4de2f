//! Context Assembler - gathers everything the generation step needs into one
//! flat, serializable bundle.
//!
//! The bundle carries labels and numbers only. Turning them into prose is the
//! job of whatever consumes `to_prompt_string`.

use serde::{Deserialize, Serialize};
use story_state::{
    AdventureState, CharacterId, CharacterRole, SceneType, Speaker, TimeOfDay, Weather,
};

use crate::breath::BreathRecommendation;
use crate::emergence::MomentCandidate;
use crate::emotion::{EmotionSummary, EmotionalTone};
use crate::evolution::{ArcPattern, EvolutionTracker, GrowthDimension};
use crate::memory::MemoryType;
use crate::orchestrator::{ActionUrgency, CallbackBrief, OrchestratorAction, Recommendation};
use crate::tension::TensionSummary;
use crate::threads::ThreadSummary;

/// Limits on how much of each section goes into a bundle.
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    pub recent_lines: usize,
    pub max_moments: usize,
    pub max_memories: usize,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            recent_lines: 5,
            max_moments: 3,
            max_memories: 6,
        }
    }
}

/// A memory a present character has in mind this turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryBrief {
    pub character: CharacterId,
    pub memory_type: MemoryType,
    pub content: String,
    pub salience: u8,
}

/// Per-turn tracker output the bundle is built from.
#[derive(Debug, Clone)]
pub struct BundleInputs {
    pub tension: TensionSummary,
    pub emotion: EmotionSummary,
    pub breath: BreathRecommendation,
    pub threads: ThreadSummary,
    pub moments: Vec<MomentCandidate>,
    pub callback: Option<CallbackBrief>,
    pub memories: Vec<MemoryBrief>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneBrief {
    pub location: String,
    pub time_of_day: TimeOfDay,
    pub weather: Weather,
    pub ambiance: Option<String>,
    pub scene_type: SceneType,
    pub chapter: u32,
    pub scene_number: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionBrief {
    pub tone: EmotionalTone,
    pub intensity: u8,
    pub catharsis_debt: u8,
    pub debt_label: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreadBrief {
    pub open: usize,
    pub building: usize,
    pub ripe: Vec<String>,
    pub overdue_elements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterBrief {
    pub id: CharacterId,
    pub name: String,
    pub role: CharacterRole,
    pub personality: Vec<String>,
    pub goal: Option<String>,
    pub bond: Option<u8>,
    pub bond_label: Option<String>,
    pub arc: Option<ArcPattern>,
    pub strongest_growth: Option<GrowthDimension>,
    pub pending_milestones: Vec<String>,
}

/// The flat context handed to the generation collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextBundle {
    pub scene: SceneBrief,
    pub tension: u8,
    pub tension_label: String,
    pub pacing_mode: String,
    pub pacing: String,
    pub emotion: EmotionBrief,
    pub breath: Option<String>,
    pub threads: ThreadBrief,
    pub moments: Vec<String>,
    pub characters: Vec<CharacterBrief>,
    pub callback: Option<String>,
    pub memories: Vec<MemoryBrief>,
    pub recent_lines: Vec<String>,
    pub action: OrchestratorAction,
    pub action_reason: String,
    pub urgency: ActionUrgency,
}

/// Builds context bundles from session state and tracker output.
pub struct ContextAssembler {
    config: AssemblerConfig,
}

impl ContextAssembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(AssemblerConfig::default())
    }

    pub fn assemble(
        &self,
        state: &AdventureState,
        evolution: &EvolutionTracker,
        inputs: &BundleInputs,
        recommendation: &Recommendation,
    ) -> ContextBundle {
        let breath = inputs
            .breath
            .needed
            .then(|| format!("{} ({})", inputs.breath.reason, inputs.breath.urgency.label()))
            .or_else(|| {
                inputs
                    .tension
                    .breath
                    .needed
                    .then(|| inputs.tension.breath.reasons.join("; "))
            });

        ContextBundle {
            scene: SceneBrief {
                location: state.scene.location.clone(),
                time_of_day: state.scene.time_of_day,
                weather: state.scene.weather,
                ambiance: state.scene.ambiance.clone(),
                scene_type: state.scene.scene_type,
                chapter: state.chapter,
                scene_number: state.scene_number,
            },
            tension: inputs.tension.value,
            tension_label: inputs.tension.label.clone(),
            pacing_mode: inputs.tension.mode.label().to_string(),
            pacing: inputs.tension.pacing.reason.clone(),
            emotion: EmotionBrief {
                tone: inputs.emotion.tone,
                intensity: inputs.emotion.intensity,
                catharsis_debt: inputs.emotion.catharsis_debt,
                debt_label: inputs.emotion.debt_label.clone(),
                suggestions: inputs.emotion.suggestions.iter().map(|s| s.reason.clone()).collect(),
            },
            breath,
            threads: ThreadBrief {
                open: inputs.threads.open,
                building: inputs.threads.building,
                ripe: inputs.threads.ripe.clone(),
                overdue_elements: inputs.threads.overdue_elements.clone(),
            },
            moments: inputs
                .moments
                .iter()
                .take(self.config.max_moments)
                .map(|m| format!("{}: {}", m.moment, m.description))
                .collect(),
            characters: self.character_briefs(state, evolution),
            callback: inputs
                .callback
                .as_ref()
                .map(|c| format!("{} remembers: {}", display_name(state, &c.character), c.content)),
            memories: inputs.memories.iter().take(self.config.max_memories).cloned().collect(),
            recent_lines: self.recent_lines(state),
            action: recommendation.action,
            action_reason: recommendation.reason.clone(),
            urgency: recommendation.urgency(),
        }
    }

    fn character_briefs(&self, state: &AdventureState, evolution: &EvolutionTracker) -> Vec<CharacterBrief> {
        state
            .present_characters
            .iter()
            .map(|c| {
                let relationship = state.relationship(&c.id);
                let growth = evolution.summary(&c.id);
                CharacterBrief {
                    id: c.id.clone(),
                    name: c.name.clone(),
                    role: c.role,
                    personality: c.personality_traits.clone(),
                    goal: c.current_goal.clone(),
                    bond: relationship.map(|r| r.bond()),
                    bond_label: relationship.map(|r| r.label().to_string()),
                    arc: growth.as_ref().and_then(|g| g.active_arc),
                    strongest_growth: growth.as_ref().and_then(|g| g.strongest_growth),
                    pending_milestones: growth.map(|g| g.pending_milestones).unwrap_or_default(),
                }
            })
            .collect()
    }

    fn recent_lines(&self, state: &AdventureState) -> Vec<String> {
        let mut lines: Vec<String> = state
            .conversation
            .recent(self.config.recent_lines)
            .map(|line| {
                let speaker = match &line.speaker {
                    Speaker::Reader => "Reader".to_string(),
                    Speaker::Narrator => "Narrator".to_string(),
                    Speaker::Character(id) => display_name(state, id),
                };
                format!("{}: {}", speaker, line.text)
            })
            .collect();
        lines.reverse();
        lines
    }
}

fn display_name(state: &AdventureState, id: &CharacterId) -> String {
    state
        .character(id)
        .map(|c| c.name.clone())
        .unwrap_or_else(|| id.to_string())
}

impl ContextBundle {
    /// Render the bundle as labelled sections for a generation prompt.
    pub fn to_prompt_string(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str("## Scene\n");
        prompt.push_str(&format!(
            "{} ({:?}, {:?}, {:?}) - chapter {}, scene {}\n",
            self.scene.location,
            self.scene.scene_type,
            self.scene.time_of_day,
            self.scene.weather,
            self.scene.chapter,
            self.scene.scene_number
        ));
        if let Some(ambiance) = &self.scene.ambiance {
            prompt.push_str(&format!("Ambiance: {}\n", ambiance));
        }
        prompt.push('\n');

        prompt.push_str("## Pacing\n");
        prompt.push_str(&format!("Tension: {}\n", self.tension_label));
        prompt.push_str(&format!("Pacing: {}\n", self.pacing));
        if let Some(breath) = &self.breath {
            prompt.push_str(&format!("Breath: {}\n", breath));
        }
        prompt.push('\n');

        prompt.push_str("## Emotion\n");
        prompt.push_str(&format!(
            "Tone: {} (intensity {}/10), catharsis debt {} ({})\n",
            self.emotion.tone, self.emotion.intensity, self.emotion.catharsis_debt, self.emotion.debt_label
        ));
        for suggestion in &self.emotion.suggestions {
            prompt.push_str(&format!("- {}\n", suggestion));
        }
        prompt.push('\n');

        if !self.characters.is_empty() {
            prompt.push_str("## Characters\n");
            for character in &self.characters {
                prompt.push_str(&format!("- {} ({:?})", character.name, character.role));
                if let (Some(bond), Some(label)) = (character.bond, &character.bond_label) {
                    prompt.push_str(&format!(", bond {} ({})", bond, label));
                }
                if let Some(arc) = character.arc {
                    prompt.push_str(&format!(", arc: {}", arc.key()));
                }
                if !character.personality.is_empty() {
                    prompt.push_str(&format!(", traits: {}", character.personality.join(", ")));
                }
                if !character.pending_milestones.is_empty() {
                    prompt.push_str(&format!(", milestones: {}", character.pending_milestones.join(", ")));
                }
                prompt.push('\n');
            }
            prompt.push('\n');
        }

        if self.threads.open > 0 || !self.threads.overdue_elements.is_empty() {
            prompt.push_str("## Threads\n");
            prompt.push_str(&format!(
                "{} open, {} building\n",
                self.threads.open, self.threads.building
            ));
            if !self.threads.ripe.is_empty() {
                prompt.push_str(&format!("Ripe: {}\n", self.threads.ripe.join(", ")));
            }
            if !self.threads.overdue_elements.is_empty() {
                prompt.push_str(&format!("Unused elements: {}\n", self.threads.overdue_elements.join(", ")));
            }
            prompt.push('\n');
        }

        if !self.moments.is_empty() {
            prompt.push_str("## Emergent Moments\n");
            for moment in &self.moments {
                prompt.push_str(&format!("- {}\n", moment));
            }
            prompt.push('\n');
        }

        if self.callback.is_some() || !self.memories.is_empty() {
            prompt.push_str("## Memories\n");
            if let Some(callback) = &self.callback {
                prompt.push_str(&format!("Callback: {}\n", callback));
            }
            for memory in &self.memories {
                prompt.push_str(&format!("- {}: {}\n", memory.character, memory.content));
            }
            prompt.push('\n');
        }

        if !self.recent_lines.is_empty() {
            prompt.push_str("## Recent Conversation\n");
            for line in &self.recent_lines {
                prompt.push_str(line);
                prompt.push('\n');
            }
            prompt.push('\n');
        }

        prompt.push_str("## Direction\n");
        prompt.push_str(&format!(
            "{} ({}): {}\n",
            self.action,
            self.urgency.label(),
            self.action_reason
        ));

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::EmotionalResonance;
    use crate::evolution::GrowthEvent;
    use crate::tension::TensionManager;
    use story_state::{RelationshipDelta, Scene, StoryCharacter};

    fn inputs() -> BundleInputs {
        BundleInputs {
            tension: TensionManager::default().summary(),
            emotion: EmotionalResonance::default().summary(),
            breath: BreathRecommendation::default(),
            threads: ThreadSummary::default(),
            moments: Vec::new(),
            callback: None,
            memories: Vec::new(),
        }
    }

    fn cellar() -> AdventureState {
        let mut state = AdventureState::new(
            Scene::new("Wine cellar")
                .with_time(TimeOfDay::Night)
                .with_ambiance("dripping water"),
        );
        state.add_character(StoryCharacter::new("Mira").with_trait("wry"));
        state.adjust_relationship(&CharacterId::new("mira"), RelationshipDelta::familiarity(30));
        state.record_line(Speaker::Reader, "Who's there?");
        state.record_line(Speaker::Character(CharacterId::new("mira")), "Just me.");
        state
    }

    #[test]
    fn test_bundle_carries_characters_and_lines() {
        let state = cellar();
        let bundle = ContextAssembler::with_defaults().assemble(
            &state,
            &EvolutionTracker::new(),
            &inputs(),
            &Recommendation::proceed(),
        );

        assert_eq!(bundle.scene.location, "Wine cellar");
        assert_eq!(bundle.characters.len(), 1);
        assert_eq!(bundle.characters[0].bond, Some(43));
        assert_eq!(bundle.recent_lines, vec!["Reader: Who's there?", "Mira: Just me."]);
        assert_eq!(bundle.action, OrchestratorAction::Continue);
        assert!(bundle.breath.is_none());
    }

    #[test]
    fn test_bundle_includes_growth() {
        let state = cellar();
        let mut evolution = EvolutionTracker::new();
        evolution.record_growth(
            &CharacterId::new("mira"),
            GrowthEvent::new(GrowthDimension::Courage, 10.0, "faced the dark"),
            1,
        );

        let bundle = ContextAssembler::with_defaults().assemble(&state, &evolution, &inputs(), &Recommendation::proceed());
        assert_eq!(bundle.characters[0].strongest_growth, Some(GrowthDimension::Courage));
        assert_eq!(bundle.characters[0].pending_milestones.len(), 1);
    }

    #[test]
    fn test_prompt_sections() {
        let state = cellar();
        let mut with_callback = inputs();
        with_callback.callback = Some(CallbackBrief {
            character: CharacterId::new("mira"),
            memory: crate::memory::MemoryId(1),
            content: "the broken lantern".into(),
        });
        let bundle = ContextAssembler::with_defaults().assemble(
            &state,
            &EvolutionTracker::new(),
            &with_callback,
            &Recommendation::proceed(),
        );

        let prompt = bundle.to_prompt_string();
        assert!(prompt.contains("## Scene\nWine cellar"));
        assert!(prompt.contains("Ambiance: dripping water"));
        assert!(prompt.contains("Mira (Companion), bond 43"));
        assert!(prompt.contains("Callback: Mira remembers: the broken lantern"));
        assert!(prompt.contains("## Direction\ncontinue (gradual)"));
        assert!(!prompt.contains("## Threads"));
    }

    #[test]
    fn test_bundle_serializes() {
        let bundle = ContextAssembler::with_defaults().assemble(
            &cellar(),
            &EvolutionTracker::new(),
            &inputs(),
            &Recommendation::proceed(),
        );
        let json = serde_json::to_string(&bundle).unwrap();
        assert!(json.contains("\"action\":\"continue\""));
    }
}
