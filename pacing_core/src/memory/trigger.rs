//! Memory triggers - the keys that bring a memory back to mind.

use serde::{Deserialize, Serialize};
use story_state::CharacterId;

/// A cue that makes a memory relevant when it shows up in the scene.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemoryTrigger {
    /// A specific character being present or named.
    Participant(CharacterId),

    /// A topic of conversation (e.g. "the lighthouse", "her brother").
    Topic(String),

    /// Being at a location.
    Location(String),

    /// A word or phrase appearing in the reader's input.
    Keyword(String),
}

impl MemoryTrigger {
    pub fn participant(id: impl Into<CharacterId>) -> Self {
        MemoryTrigger::Participant(id.into())
    }

    pub fn topic(name: impl Into<String>) -> Self {
        MemoryTrigger::Topic(name.into())
    }

    pub fn location(name: impl Into<String>) -> Self {
        MemoryTrigger::Location(name.into())
    }

    pub fn keyword(word: impl Into<String>) -> Self {
        MemoryTrigger::Keyword(word.into())
    }

    /// Convert the trigger to a string representation.
    pub fn as_string(&self) -> String {
        match self {
            MemoryTrigger::Participant(id) => format!("participant:{}", id),
            MemoryTrigger::Topic(s) => format!("topic:{}", s),
            MemoryTrigger::Location(s) => format!("location:{}", s),
            MemoryTrigger::Keyword(s) => format!("keyword:{}", s),
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            MemoryTrigger::Participant(_) => "participant",
            MemoryTrigger::Topic(_) => "topic",
            MemoryTrigger::Location(_) => "location",
            MemoryTrigger::Keyword(_) => "keyword",
        }
    }

    /// Whether this trigger fires in the given context.
    pub fn matches(&self, context: &RecallContext) -> bool {
        match self {
            MemoryTrigger::Participant(id) => {
                context.present.contains(id)
                    || context
                        .text
                        .as_deref()
                        .map(|text| contains_word(text, id.as_str()))
                        .unwrap_or(false)
            }
            MemoryTrigger::Topic(topic) => context.has_topic(topic),
            MemoryTrigger::Location(location) => context.at_location(location),
            MemoryTrigger::Keyword(word) => context
                .text
                .as_deref()
                .map(|text| contains_word(text, word))
                .unwrap_or(false),
        }
    }
}

impl std::fmt::Display for MemoryTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

/// What is in front of a character right now, for memory recall.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecallContext {
    pub present: Vec<CharacterId>,
    pub topics: Vec<String>,
    pub location: Option<String>,
    /// Raw reader input, scanned for keywords and names.
    pub text: Option<String>,
}

impl RecallContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_present(mut self, id: impl Into<CharacterId>) -> Self {
        self.present.push(id.into());
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topics.push(topic.into());
        self
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn has_topic(&self, topic: &str) -> bool {
        self.topics.iter().any(|t| t.eq_ignore_ascii_case(topic))
            || self
                .text
                .as_deref()
                .map(|text| contains_word(text, topic))
                .unwrap_or(false)
    }

    pub fn at_location(&self, location: &str) -> bool {
        self.location
            .as_deref()
            .map(|l| l.eq_ignore_ascii_case(location))
            .unwrap_or(false)
    }
}

/// Case-insensitive phrase search on word boundaries.
fn contains_word(haystack: &str, needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return false;
    }
    let haystack = haystack.to_lowercase();
    haystack.match_indices(&needle).any(|(start, _)| {
        let end = start + needle.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.map(char::is_alphanumeric).unwrap_or(false)
            && !after.map(char::is_alphanumeric).unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_as_string() {
        assert_eq!(MemoryTrigger::topic("the war").as_string(), "topic:the war");
        assert_eq!(MemoryTrigger::participant("mira").as_string(), "participant:mira");
        assert_eq!(MemoryTrigger::keyword("ring").category(), "keyword");
    }

    #[test]
    fn test_participant_trigger() {
        let trigger = MemoryTrigger::participant("tom");
        assert!(trigger.matches(&RecallContext::new().with_present("tom")));
        assert!(trigger.matches(&RecallContext::new().with_text("Have you seen Tom lately?")));
        assert!(!trigger.matches(&RecallContext::new().with_text("the tomb is sealed")));
    }

    #[test]
    fn test_topic_and_location_triggers() {
        let context = RecallContext::new()
            .with_topic("Lighthouse")
            .at("Harbour");
        assert!(MemoryTrigger::topic("lighthouse").matches(&context));
        assert!(MemoryTrigger::location("harbour").matches(&context));
        assert!(!MemoryTrigger::location("Tavern").matches(&context));
    }

    #[test]
    fn test_keyword_trigger_respects_word_boundaries() {
        let trigger = MemoryTrigger::keyword("ring");
        assert!(trigger.matches(&RecallContext::new().with_text("Where is the ring?")));
        assert!(!trigger.matches(&RecallContext::new().with_text("The bells are ringing")));
        assert!(!trigger.matches(&RecallContext::new()));
    }

    #[test]
    fn test_trigger_hash() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(MemoryTrigger::topic("war"));
        set.insert(MemoryTrigger::topic("war"));
        assert_eq!(set.len(), 1);
    }
}
