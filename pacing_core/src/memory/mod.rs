//! Memory module - what each character remembers.
//!
//! - **Records**: salience-rated memories with triggers and an emotional charge
//! - **Triggers**: participants, topics, locations and keywords that recall a memory
//! - **Store**: per-character memories, shared mirrors, decay, eviction and callbacks

mod record;
mod store;
mod trigger;

pub use record::*;
pub use store::*;
pub use trigger::*;
