//! Telemetry Unifier - heterogeneous telemetry export pipeline
//!
//! This crate ingests JSON telemetry exports in either of two layouts,
//! unifies them into one canonical record, accumulates them in a store and
//! serves filtered views and CSV exports. The implementation prioritizes:
//!
//! 1. **All-or-nothing uploads** - A batch is stored only if every file in it
//!    decodes and every reading matches a known layout
//! 2. **Logging** - Every decision point logged with batch and file context
//! 3. **Lax values** - Bad instants and numbers become undefined values
//!    instead of failing an upload
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `pipeline` - Batch ingestion orchestrator
//! - `validation` - Layout (shape) detection
//! - `extraction` - Unification into the canonical record
//! - `storage` - Canonical record model and record stores
//! - `routing` - Filter engine for the dashboard view
//! - `export` - CSV export
//! - `report` - Table view, status badges and chart series
//! - `config` - Environment configuration
//! - `logging` - Structured logging with batch context

pub mod config;
pub mod error;
pub mod export;
pub mod extraction;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod routing;
pub mod storage;
pub mod validation;

pub use config::DashboardConfig;
pub use error::{Result, TelemetryError};
pub use extraction::{unify, Timestamp};
pub use pipeline::{ingest_files, process_files, BatchContext, BatchResult, RawFile};
pub use routing::{apply_filters, unique_statuses, FilterForm, FilterSpec};
pub use storage::{JsonFileStore, MemoryStore, TelemetryRecord, TelemetryStore};
pub use validation::{detect_shape, Detection, RawReading, ShapeKind};

/// Initialize the process-wide logger.
///
/// `level` is the default filter; `RUST_LOG` still overrides it. Safe to
/// call more than once.
pub fn init_logger(level: log::LevelFilter) {
    let _ = env_logger::builder()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_millis()
        .try_init();
}
