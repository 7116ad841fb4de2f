//! Character definitions.

use serde::{Deserialize, Serialize};

use super::CharacterId;

/// A non-reader character that can appear on stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryCharacter {
    pub id: CharacterId,
    pub name: String,
    pub role: CharacterRole,

    // Character-specific flavour handed through to the context bundle
    pub personality_traits: Vec<String>,
    pub current_goal: Option<String>,

    /// Turn on which the reader first met this character, if ever.
    pub first_met_turn: Option<u64>,
}

impl StoryCharacter {
    /// Create a new character; the id is derived from the name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: CharacterId::new(name.to_lowercase()),
            name,
            role: CharacterRole::Companion,
            personality_traits: Vec::new(),
            current_goal: None,
            first_met_turn: None,
        }
    }

    /// Use an explicit id instead of the derived one.
    pub fn with_id(mut self, id: impl Into<CharacterId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the narrative role.
    pub fn with_role(mut self, role: CharacterRole) -> Self {
        self.role = role;
        self
    }

    /// Add a personality trait.
    pub fn with_trait(mut self, personality_trait: impl Into<String>) -> Self {
        self.personality_traits.push(personality_trait.into());
        self
    }

    /// Whether the reader has not met this character yet.
    pub fn is_stranger(&self) -> bool {
        self.first_met_turn.is_none()
    }
}

/// Narrative role a character plays relative to the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CharacterRole {
    Companion,
    Mentor,
    Rival,
    LoveInterest,
    Antagonist,
    Bystander,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_character() {
        let character = StoryCharacter::new("Mira");
        assert_eq!(character.name, "Mira");
        assert_eq!(character.id.as_str(), "mira");
        assert!(character.is_stranger());
    }

    #[test]
    fn test_character_builder() {
        let character = StoryCharacter::new("Old Tom")
            .with_id("tom")
            .with_role(CharacterRole::Mentor)
            .with_trait("gruff");

        assert_eq!(character.id.as_str(), "tom");
        assert_eq!(character.role, CharacterRole::Mentor);
        assert_eq!(character.personality_traits, vec!["gruff".to_string()]);
    }
}
