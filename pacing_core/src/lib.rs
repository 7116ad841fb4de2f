//! # Pacing Core
//!
//! The pacing brain of an interactive storytelling engine. Each session owns
//! a set of trackers that watch the story as it unfolds and, once per reader
//! turn, agree on what the story should do next.
//!
//! ## Core Components
//!
//! - **tension**: Tension level, pacing mode and genre-driven breath cadence
//! - **emotion**: Emotional moments, catharsis debt and buildup-to-payoff arcs
//! - **memory**: Salience-weighted character memory with decay and callbacks
//! - **threads**: Narrative threads, chekhov elements and revelation timing
//! - **emergence**: Condition recipes that surface unscripted moments
//! - **evolution**: Character growth, milestones and arc detection
//! - **breath**: When to pause, what kind of pause and which sense it rests on
//! - **crosstalk**: When companions should talk among themselves, and who
//! - **orchestrator**: Ranks every tracker's proposal into one recommendation
//! - **context_assembler**: Packs state and recommendation for generation
//! - **session**: Per-session context, turn processing and snapshots
//!
//! ## Design Philosophy
//!
//! - **Advisory**: The engine recommends; the generation collaborator decides
//! - **Isolated**: Sessions share configuration, never state
//! - **Transactional**: A turn produces the next context without touching the current one

pub mod breath;
pub mod config;
pub mod context_assembler;
pub mod crosstalk;
pub mod emergence;
pub mod emotion;
pub mod error;
pub mod evolution;
pub mod memory;
pub mod orchestrator;
pub mod preferences;
pub mod session;
pub mod tension;
pub mod threads;
pub mod urgency;

pub use config::EngineConfig;
pub use context_assembler::{ContextAssembler, ContextBundle};
pub use error::{PacingError, Result};
pub use orchestrator::{Orchestrator, OrchestratorAction, Recommendation};
pub use preferences::ReaderProfile;
pub use session::{SessionContext, SessionRegistry, SessionSnapshot, TurnInput, TurnInterpretation, TurnOutcome};
pub use tension::Genre;
pub use urgency::Urgency;
