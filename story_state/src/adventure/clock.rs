//! Explicit story clock.

use serde::{Deserialize, Serialize};

const MILLIS_PER_MINUTE: u64 = 60_000;
const MILLIS_PER_HOUR: u64 = 60 * MILLIS_PER_MINUTE;

/// A reading of the story clock: the turn counter plus elapsed session time.
///
/// Nothing in the engine reads the system clock. Callers supply the reading,
/// which keeps decay and cooldown logic replayable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct StoryTime {
    pub turn: u64,
    /// Milliseconds since session start.
    pub millis: u64,
}

impl StoryTime {
    pub fn new(turn: u64, millis: u64) -> Self {
        Self { turn, millis }
    }

    /// Convenience constructor for tests and fixtures.
    pub fn at_minutes(turn: u64, minutes: u64) -> Self {
        Self::new(turn, minutes * MILLIS_PER_MINUTE)
    }

    pub fn at_hours(turn: u64, hours: u64) -> Self {
        Self::new(turn, hours * MILLIS_PER_HOUR)
    }

    /// Milliseconds elapsed since `earlier`, saturating at zero.
    pub fn millis_since(&self, earlier: StoryTime) -> u64 {
        self.millis.saturating_sub(earlier.millis)
    }

    pub fn minutes_since(&self, earlier: StoryTime) -> u64 {
        self.millis_since(earlier) / MILLIS_PER_MINUTE
    }

    pub fn hours_since(&self, earlier: StoryTime) -> u64 {
        self.millis_since(earlier) / MILLIS_PER_HOUR
    }

    pub fn turns_since(&self, earlier: StoryTime) -> u64 {
        self.turn.saturating_sub(earlier.turn)
    }

    /// The next turn at the given clock reading. Time never runs backwards.
    pub fn advance(&self, millis: u64) -> StoryTime {
        StoryTime {
            turn: self.turn + 1,
            millis: millis.max(self.millis),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_helpers() {
        let start = StoryTime::at_minutes(0, 0);
        let later = StoryTime::at_hours(10, 25);

        assert_eq!(later.hours_since(start), 25);
        assert_eq!(later.minutes_since(start), 25 * 60);
        assert_eq!(later.turns_since(start), 10);
        assert_eq!(start.minutes_since(later), 0);
    }

    #[test]
    fn test_advance_is_monotonic() {
        let now = StoryTime::new(3, 5_000);
        let next = now.advance(1_000);
        assert_eq!(next.turn, 4);
        assert_eq!(next.millis, 5_000);
    }
}
