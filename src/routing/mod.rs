//! Record filtering.
//!
//! Decides which canonical records are routed into the current view.

pub mod filter;

pub use filter::*;
