//! Structured logging with batch context.
//!
//! Every pipeline log line carries the batch_id (and the source file when
//! known) so one upload can be followed end to end.

pub mod structured;

pub use structured::*;
