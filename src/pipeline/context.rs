//! Pipeline context management.
//!
//! Provides batch context for logging and state tracking.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::logging::structured::LogContext;

/// Context for one upload batch.
#[derive(Debug, Clone)]
pub struct BatchContext {
    pub batch_id: String,
    pub received_at: DateTime<Utc>,
}

impl BatchContext {
    pub fn new() -> Self {
        Self::with_received_at(Utc::now())
    }

    pub fn with_received_at(received_at: DateTime<Utc>) -> Self {
        let batch_id = format!("batch-{}", &Uuid::new_v4().simple().to_string()[..8]);
        Self {
            batch_id,
            received_at,
        }
    }

    pub fn log_context(&self) -> LogContext {
        LogContext::new(&self.batch_id)
    }

    /// Log context for one file within this batch.
    pub fn file_context(&self, file: &str) -> LogContext {
        self.log_context().for_file(file)
    }
}

impl Default for BatchContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_ids_are_prefixed_and_distinct() {
        let a = BatchContext::new();
        let b = BatchContext::new();
        assert!(a.batch_id.starts_with("batch-"));
        assert_eq!(a.batch_id.len(), "batch-".len() + 8);
        assert_ne!(a.batch_id, b.batch_id);
    }

    #[test]
    fn test_file_context() {
        let ctx = BatchContext::new();
        let file_ctx = ctx.file_context("pumps.json");
        assert_eq!(file_ctx.batch_id(), ctx.batch_id);
        assert_eq!(file_ctx.file(), Some("pumps.json"));
    }
}
