//! Error types shared across the pipeline.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to read file: {file}")]
    Read {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in file {file}: {source}")]
    Decode {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unrecognized telemetry format in file {file} (record {index})")]
    UnrecognizedFormat { file: String, index: usize },

    #[error("Failed to start a worker for file {file}: {source}")]
    Spawn {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Please select at least one JSON file")]
    NoFiles,

    #[error("Storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode stored telemetry: {0}")]
    StorageEncode(#[source] serde_json::Error),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("No data to export")]
    NothingToExport,
}

impl TelemetryError {
    /// True for failures that reject a whole upload batch.
    pub fn is_ingestion_failure(&self) -> bool {
        matches!(
            self,
            TelemetryError::Read { .. }
                | TelemetryError::Decode { .. }
                | TelemetryError::UnrecognizedFormat { .. }
                | TelemetryError::Spawn { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TelemetryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_file() {
        let err = TelemetryError::UnrecognizedFormat {
            file: "plant.json".to_string(),
            index: 3,
        };
        assert_eq!(
            err.to_string(),
            "Unrecognized telemetry format in file plant.json (record 3)"
        );
        assert!(err.is_ingestion_failure());
        assert!(!TelemetryError::NothingToExport.is_ingestion_failure());
    }

    #[test]
    fn test_spawn_failure_rejects_batch() {
        let err = TelemetryError::Spawn {
            file: "pumps.json".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::WouldBlock, "no threads"),
        };
        assert!(err.is_ingestion_failure());
        assert_eq!(
            err.to_string(),
            "Failed to start a worker for file pumps.json: no threads"
        );
    }
}
