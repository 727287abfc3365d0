//! Storage module.
//!
//! The canonical record model and the store that accumulates uploaded
//! batches across sessions.

pub mod models;
pub mod store;

pub use models::*;
pub use store::*;
