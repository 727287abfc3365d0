//! Dashboard views over the stored collection: the filtered table,
//! status badges and chart series.

pub mod charts;
pub mod view;

pub use charts::*;
pub use view::*;
