//! Many isolated sessions, keyed by id.

use std::collections::HashMap;
use story_state::{Scene, SessionId};
use tracing::info;

use super::{SessionContext, SessionSnapshot, TurnInput, TurnOutcome};
use crate::config::EngineConfig;
use crate::error::{PacingError, Result};
use crate::preferences::ReaderProfile;

/// Owns every live session. Sessions share configuration, never state.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, SessionContext>,
    config: EngineConfig,
}

impl SessionRegistry {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Open a new session on `scene`.
    pub fn create(&mut self, scene: Scene, reader: Option<ReaderProfile>) -> SessionId {
        let session = SessionContext::new(scene, self.config.clone()).with_reader(reader);
        let id = session.id();
        info!(session = %id, "Session created");
        self.sessions.insert(id, session);
        id
    }

    pub fn get(&self, id: SessionId) -> Option<&SessionContext> {
        self.sessions.get(&id)
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut SessionContext> {
        self.sessions.get_mut(&id)
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Run a turn without committing it.
    pub fn process_turn(&self, id: SessionId, input: TurnInput) -> Result<TurnOutcome> {
        let session = self.sessions.get(&id).ok_or(PacingError::UnknownSession(id))?;
        Ok(session.process_turn(input))
    }

    /// Keep the result of a turn, replacing the session it came from.
    pub fn commit(&mut self, next: SessionContext) {
        self.sessions.insert(next.id(), next);
    }

    pub fn snapshot(&self, id: SessionId) -> Result<SessionSnapshot> {
        let session = self.sessions.get(&id).ok_or(PacingError::UnknownSession(id))?;
        SessionSnapshot::capture(session)
    }

    /// Bring a persisted session back. Returns its id.
    pub fn restore(&mut self, snapshot: &SessionSnapshot, reader: Option<ReaderProfile>) -> SessionId {
        let session = snapshot.restore(self.config.clone(), reader);
        let id = session.id();
        info!(session = %id, "Session restored");
        self.sessions.insert(id, session);
        id
    }

    /// Close a session, handing back its final context.
    pub fn end(&mut self, id: SessionId) -> Option<SessionContext> {
        let ended = self.sessions.remove(&id);
        if ended.is_some() {
            info!(session = %id, "Session ended");
        }
        ended
    }
}
