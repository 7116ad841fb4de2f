//! Urgency levels reported by individual trackers.

use serde::{Deserialize, Serialize};

/// How pressing a tracker considers its own signal.
///
/// Ordered so that `High > Medium > Low > None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Urgency {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl Urgency {
    pub fn is_some(&self) -> bool {
        *self != Urgency::None
    }

    pub fn label(&self) -> &'static str {
        match self {
            Urgency::None => "none",
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
        }
    }
}
