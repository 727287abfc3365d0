//! Pipeline orchestration module.
//!
//! Batch ingestion that coordinates:
//! - Concurrent file reads
//! - JSON decoding
//! - Shape detection
//! - Record unification
//! - Appending the batch to the store

pub mod context;
pub mod ingestion;

pub use context::*;
pub use ingestion::*;
