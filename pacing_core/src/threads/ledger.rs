//! Ledger of planted story elements.

use serde::{Deserialize, Serialize};

use super::ThreadId;

/// A named element introduced by a chekhov thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChekhovElement {
    pub name: String,
    pub thread: ThreadId,
    pub introduced_turn: u64,
    pub used_turn: Option<u64>,
}

impl ChekhovElement {
    pub fn is_used(&self) -> bool {
        self.used_turn.is_some()
    }

    pub fn age(&self, turn: u64) -> u64 {
        turn.saturating_sub(self.introduced_turn)
    }
}

/// Every planted element across a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementLedger {
    elements: Vec<ChekhovElement>,
}

impl ElementLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an element. Names are unique, case-insensitively.
    pub fn register(&mut self, name: impl Into<String>, thread: ThreadId, turn: u64) -> bool {
        let name = name.into();
        if self.find(&name).is_some() {
            return false;
        }
        self.elements.push(ChekhovElement {
            name,
            thread,
            introduced_turn: turn,
            used_turn: None,
        });
        true
    }

    pub fn find(&self, name: &str) -> Option<&ChekhovElement> {
        self.elements.iter().find(|e| e.name.eq_ignore_ascii_case(name))
    }

    /// Mark an element as paid off. Returns false for unknown or already used elements.
    pub fn mark_used(&mut self, name: &str, turn: u64) -> bool {
        match self
            .elements
            .iter_mut()
            .find(|e| e.name.eq_ignore_ascii_case(name) && !e.is_used())
        {
            Some(element) => {
                element.used_turn = Some(turn);
                true
            }
            None => false,
        }
    }

    /// Mark every element of a thread as used.
    pub fn mark_thread_used(&mut self, thread: ThreadId, turn: u64) -> usize {
        let mut count = 0;
        for element in self.elements.iter_mut().filter(|e| e.thread == thread && !e.is_used()) {
            element.used_turn = Some(turn);
            count += 1;
        }
        count
    }

    pub fn unused(&self) -> Vec<&ChekhovElement> {
        self.elements.iter().filter(|e| !e.is_used()).collect()
    }

    /// Unused elements older than `max_age` turns.
    pub fn overdue(&self, turn: u64, max_age: u64) -> Vec<&ChekhovElement> {
        self.elements
            .iter()
            .filter(|e| !e.is_used() && e.age(turn) > max_age)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_use() {
        let mut ledger = ElementLedger::new();
        assert!(ledger.register("Silver locket", ThreadId(1), 2));
        assert!(!ledger.register("silver locket", ThreadId(2), 3));
        assert_eq!(ledger.unused().len(), 1);

        assert!(ledger.mark_used("SILVER LOCKET", 9));
        assert!(!ledger.mark_used("silver locket", 10));
        assert!(ledger.unused().is_empty());
    }

    #[test]
    fn test_overdue_elements() {
        let mut ledger = ElementLedger::new();
        ledger.register("rifle", ThreadId(1), 0);
        ledger.register("letter", ThreadId(1), 20);
        let overdue: Vec<&str> = ledger.overdue(35, 30).iter().map(|e| e.name.as_str()).collect();
        assert_eq!(overdue, vec!["rifle"]);
        assert_eq!(ledger.mark_thread_used(ThreadId(1), 36), 2);
        assert!(ledger.overdue(100, 30).is_empty());
    }
}
