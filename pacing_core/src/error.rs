//! Error types for the pacing engine.
//!
//! Turn processing itself never fails: malformed pacing signals resolve to
//! no-ops and corrupt tracker blobs fall back to defaults. These errors cover
//! the edges where a caller genuinely needs to know something went wrong.

use story_state::SessionId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PacingError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("config IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown session: {0}")]
    UnknownSession(SessionId),
}

pub type Result<T> = std::result::Result<T, PacingError>;
