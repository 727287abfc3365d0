//! Record unification.
//!
//! Maps detected export layouts onto the canonical telemetry record and
//! derives computed fields.

pub mod fields;
pub mod instant;
pub mod unifier;

pub use fields::*;
pub use instant::*;
pub use unifier::*;
