//! # Story State
//!
//! The adventure state crate - the canonical, serializable snapshot of where a
//! story session currently stands. It holds the scene, the cast on stage,
//! reader relationships, the recent conversation window and the story clock.
//! This crate contains no pacing logic; trackers in `pacing_core` read it and
//! propose mutations to it.

pub mod adventure;
pub mod beats;
pub mod entities;

pub use adventure::*;
pub use beats::*;
pub use entities::*;
