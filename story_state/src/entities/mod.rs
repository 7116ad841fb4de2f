//! Cast definitions for a story session.

mod character;
mod relationship;

pub use character::*;
pub use relationship::*;

use serde::{Deserialize, Serialize};

/// Identifier for a non-reader character.
///
/// Characters are keyed by a stable slug rather than a random id because the
/// generation collaborator refers to them by name in its interpretation tags.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CharacterId(pub String);

impl CharacterId {
    /// Create a character id from a slug or name.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a free-text name.
    pub fn matches_name(&self, name: &str) -> bool {
        self.0.eq_ignore_ascii_case(name.trim())
    }
}

impl From<&str> for CharacterId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CharacterId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for CharacterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who produced a line in the conversation window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    Reader,
    Narrator,
    Character(CharacterId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_character_id_matches_name() {
        let id = CharacterId::new("Mira");
        assert!(id.matches_name("mira"));
        assert!(id.matches_name("  MIRA "));
        assert!(!id.matches_name("Mirabel"));
    }

    #[test]
    fn test_character_id_ordering() {
        let mut ids = vec![CharacterId::from("zed"), CharacterId::from("anya")];
        ids.sort();
        assert_eq!(ids[0].as_str(), "anya");
    }
}
