//! Persisted form of a session: the state blob plus one blob per tracker.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use story_state::{AdventureState, SessionId};
use tracing::warn;

use super::SessionContext;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::orchestrator::Recommendation;
use crate::preferences::ReaderProfile;

/// Session bookkeeping that belongs to no single tracker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct SessionMeta {
    pub visited_locations: BTreeSet<String>,
    pub reader_silent_turns: u32,
    pub last_recommendation: Option<Recommendation>,
}

/// Everything needed to resume a session. Any blob may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSnapshot {
    pub session_id: Option<SessionId>,
    pub state: Option<Value>,
    pub tension: Option<Value>,
    pub emotion: Option<Value>,
    pub memory: Option<Value>,
    pub threads: Option<Value>,
    pub emergence: Option<Value>,
    pub evolution: Option<Value>,
    pub breath: Option<Value>,
    pub cross_talk: Option<Value>,
    pub orchestrator: Option<Value>,
    pub meta: Option<Value>,
}

impl SessionSnapshot {
    pub fn capture(session: &SessionContext) -> Result<Self> {
        Ok(Self {
            session_id: Some(session.id()),
            state: Some(serde_json::to_value(&session.state)?),
            tension: Some(serde_json::to_value(&session.tension)?),
            emotion: Some(serde_json::to_value(&session.emotion)?),
            memory: Some(serde_json::to_value(&session.memory)?),
            threads: Some(serde_json::to_value(&session.threads)?),
            emergence: Some(serde_json::to_value(&session.emergence)?),
            evolution: Some(serde_json::to_value(&session.evolution)?),
            breath: Some(serde_json::to_value(&session.breath)?),
            cross_talk: Some(serde_json::to_value(&session.cross_talk)?),
            orchestrator: Some(serde_json::to_value(&session.orchestrator)?),
            meta: Some(serde_json::to_value(session.meta())?),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Rebuild a session. Never fails: a missing or unreadable blob resets
    /// only that part of the session to defaults.
    pub fn restore(&self, config: EngineConfig, reader: Option<ReaderProfile>) -> SessionContext {
        let mut state: AdventureState = restore_blob("state", self.state.as_ref()).unwrap_or_default();
        state.enforce_limits();
        if let Some(id) = self.session_id {
            state.session_id = id;
        }

        let mut session = SessionContext::new_with_state(state, config.clone());
        if let Some(tension) = restore_blob("tension", self.tension.as_ref()) {
            session.tension = tension;
        }
        if let Some(emotion) = restore_blob("emotion", self.emotion.as_ref()) {
            session.emotion = emotion;
        }
        if let Some(memory) = restore_blob("memory", self.memory.as_ref()) {
            session.memory = memory;
        }
        if let Some(threads) = restore_blob("threads", self.threads.as_ref()) {
            session.threads = threads;
        }
        if let Some(emergence) = restore_blob("emergence", self.emergence.as_ref()) {
            session.emergence = emergence;
        }
        if let Some(evolution) = restore_blob("evolution", self.evolution.as_ref()) {
            session.evolution = evolution;
        }
        if let Some(breath) = restore_blob("breath", self.breath.as_ref()) {
            session.breath = breath;
        }
        if let Some(cross_talk) = restore_blob("cross_talk", self.cross_talk.as_ref()) {
            session.cross_talk = cross_talk;
        }
        if let Some(orchestrator) = restore_blob("orchestrator", self.orchestrator.as_ref()) {
            session.orchestrator = orchestrator;
        }
        let meta: SessionMeta = restore_blob("meta", self.meta.as_ref()).unwrap_or_default();
        session.set_meta(meta);

        session.set_config(config);
        session.set_reader(reader);
        session
    }
}

fn restore_blob<T: DeserializeOwned>(name: &'static str, blob: Option<&Value>) -> Option<T> {
    let Some(value) = blob else {
        warn!(blob = name, "Snapshot blob missing, starting from defaults");
        return None;
    };
    match serde_json::from_value(value.clone()) {
        Ok(restored) => Some(restored),
        Err(err) => {
            warn!(blob = name, error = %err, "Snapshot blob unreadable, starting from defaults");
            None
        }
    }
}
