//! Input shape detection.
//!
//! Classifies each decoded JSON value as one of the known telemetry
//! export layouts before it is unified.

pub mod shape;

pub use shape::*;
