//! What comes into a turn and what goes out of it.

use serde::{Deserialize, Serialize};
use story_state::{CharacterId, EmotionalBeat, RelationshipDelta, Scene, StoryCharacter, StoryTime};

use super::SessionContext;
use crate::context_assembler::ContextBundle;
use crate::emergence::MomentCandidate;
use crate::emotion::Technique;
use crate::memory::{EmotionalValence, MemoryType, Salience};
use crate::orchestrator::Recommendation;
use crate::threads::ThreadType;

/// A thread the generated text mentioned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadMentionNote {
    pub title: String,
    pub significant: bool,
}

/// A thread the generated text set up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadNote {
    pub thread_type: ThreadType,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub significance: Option<u8>,
    /// Chekhov elements planted alongside the thread.
    #[serde(default)]
    pub elements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthNote {
    /// Character name or id.
    pub character: String,
    /// Growth dimension key, e.g. `"self-worth"`.
    pub dimension: String,
    pub magnitude: f32,
    #[serde(default)]
    pub catalyst: String,
}

/// Something one or more characters should remember.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryNote {
    /// Names or ids of the characters who witnessed it.
    pub characters: Vec<String>,
    pub memory_type: MemoryType,
    pub content: String,
    pub salience: Salience,
    pub valence: EmotionalValence,
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipNote {
    pub character: String,
    pub delta: RelationshipDelta,
}

/// The generation collaborator's tags for the text it produced last turn.
///
/// Keys are free text; anything unrecognised is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnInterpretation {
    /// The generated text itself.
    pub text: String,
    pub tone: Option<String>,
    pub intensity: Option<u8>,
    pub technique: Option<Technique>,
    pub beat: Option<EmotionalBeat>,
    /// Key of the orchestrator action the text carried out.
    pub action: Option<String>,
    /// Character the text centred on, by name or id.
    pub target: Option<String>,
    pub tension_events: Vec<String>,
    pub thread_mentions: Vec<ThreadMentionNote>,
    pub new_threads: Vec<ThreadNote>,
    pub growth: Vec<GrowthNote>,
    pub memories: Vec<MemoryNote>,
    pub relationships: Vec<RelationshipNote>,
    pub secrets: Vec<String>,
    pub foreshadowing: Vec<String>,
    pub topics: Vec<String>,
    /// Emergent moment key played out, when not the recommended one.
    pub moment: Option<String>,
    /// What a delivered breath lingered on.
    pub breath_focus: Option<String>,
}

impl TurnInterpretation {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_tone(mut self, tone: impl Into<String>, intensity: u8) -> Self {
        self.tone = Some(tone.into());
        self.intensity = Some(intensity);
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_event(mut self, key: impl Into<String>) -> Self {
        self.tension_events.push(key.into());
        self
    }

    pub fn with_beat(mut self, beat: EmotionalBeat) -> Self {
        self.beat = Some(beat);
        self
    }

    pub fn targeting(mut self, character: impl Into<String>) -> Self {
        self.target = Some(character.into());
        self
    }

    pub fn mentioning(mut self, title: impl Into<String>, significant: bool) -> Self {
        self.thread_mentions.push(ThreadMentionNote {
            title: title.into(),
            significant,
        });
        self
    }

    pub fn with_thread(mut self, note: ThreadNote) -> Self {
        self.new_threads.push(note);
        self
    }

    pub fn with_growth(mut self, note: GrowthNote) -> Self {
        self.growth.push(note);
        self
    }

    pub fn with_memory(mut self, note: MemoryNote) -> Self {
        self.memories.push(note);
        self
    }

    pub fn with_relationship(mut self, character: impl Into<String>, delta: RelationshipDelta) -> Self {
        self.relationships.push(RelationshipNote {
            character: character.into(),
            delta,
        });
        self
    }
}

/// One reader turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnInput {
    pub text: String,
    pub now: StoryTime,
    pub reader_surprised: bool,
    pub reader_observing: bool,
    pub reader_engaged: Option<bool>,
    pub scene: Option<Scene>,
    pub arrivals: Vec<StoryCharacter>,
    pub departures: Vec<CharacterId>,
    pub interpretation: Option<TurnInterpretation>,
}

impl TurnInput {
    pub fn new(text: impl Into<String>, now: StoryTime) -> Self {
        Self {
            text: text.into(),
            now,
            ..Self::default()
        }
    }

    pub fn with_interpretation(mut self, interpretation: TurnInterpretation) -> Self {
        self.interpretation = Some(interpretation);
        self
    }

    pub fn arriving(mut self, character: StoryCharacter) -> Self {
        self.arrivals.push(character);
        self
    }

    pub fn leaving(mut self, id: impl Into<CharacterId>) -> Self {
        self.departures.push(id.into());
        self
    }

    pub fn moving_to(mut self, scene: Scene) -> Self {
        self.scene = Some(scene);
        self
    }

    pub fn surprised(mut self) -> Self {
        self.reader_surprised = true;
        self
    }

    pub fn observing(mut self) -> Self {
        self.reader_observing = true;
        self
    }

    pub fn is_silent(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// The result of processing a turn. Nothing is committed until the caller
/// keeps `next`.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub next: SessionContext,
    pub recommendation: Recommendation,
    pub ranked: Vec<Recommendation>,
    pub moments: Vec<MomentCandidate>,
    pub bundle: ContextBundle,
}
