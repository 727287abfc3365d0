//! CSV export of the filtered view.

pub mod csv;

pub use csv::*;
