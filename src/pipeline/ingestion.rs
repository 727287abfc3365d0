//! Batch ingestion pipeline.
//!
//! Coordinates one upload:
//! 1. Read every file concurrently (one scoped thread per file)
//! 2. Decode each file as JSON; a top-level array is a list of readings
//! 3. Detect the layout of every reading
//! 4. Unify readings into canonical records
//! 5. Flatten in file submission order
//! 6. Append to the store (only when every file succeeded)
//!
//! Any read, decode or layout failure rejects the whole batch.

use std::fs;
use std::path::PathBuf;
use std::thread;

use serde_json::Value;

use crate::error::{Result, TelemetryError};
use crate::extraction::unifier::unify;
use crate::storage::models::TelemetryRecord;
use crate::storage::store::TelemetryStore;
use crate::validation::shape::{detect_shape_logged, ShapeKind};

use super::context::BatchContext;

/// One uploaded file: a path on disk or named in-memory bytes.
#[derive(Debug, Clone)]
pub struct RawFile {
    name: String,
    source: FileSource,
}

#[derive(Debug, Clone)]
enum FileSource {
    Disk(PathBuf),
    Memory(Vec<u8>),
}

impl RawFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            source: FileSource::Disk(path),
        }
    }

    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            source: FileSource::Memory(bytes.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the file looks like a JSON export by name.
    pub fn has_json_extension(&self) -> bool {
        self.name.to_ascii_lowercase().ends_with(".json")
    }

    /// Full text content, decoded as lossy UTF-8 with any BOM removed.
    pub fn read_text(&self) -> Result<String> {
        let bytes = match &self.source {
            FileSource::Disk(path) => fs::read(path).map_err(|source| TelemetryError::Read {
                file: self.name.clone(),
                source,
            })?,
            FileSource::Memory(bytes) => bytes.clone(),
        };

        let text = String::from_utf8_lossy(&bytes);
        Ok(text.strip_prefix('\u{feff}').unwrap_or(&text).to_string())
    }
}

/// Per-file counts for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub name: String,
    pub records: usize,
    pub flat: usize,
    pub nested: usize,
}

/// Result of processing a batch.
#[derive(Debug)]
pub struct BatchResult {
    pub batch_id: String,
    pub files: Vec<FileSummary>,
    pub records: Vec<TelemetryRecord>,
}

impl BatchResult {
    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

/// Process one file into canonical records.
pub fn process_file(
    ctx: &BatchContext,
    file: &RawFile,
) -> Result<(FileSummary, Vec<TelemetryRecord>)> {
    let log_ctx = ctx.file_context(file.name());
    log::debug!("{} FILE_READ_START", log_ctx);

    let text = file.read_text().map_err(|e| {
        log::warn!("{} FILE_READ_FAILED error={}", log_ctx, e);
        e
    })?;

    let decoded: Value = serde_json::from_str(&text).map_err(|source| {
        log::warn!("{} FILE_DECODE_FAILED error={}", log_ctx, source);
        TelemetryError::Decode {
            file: file.name().to_string(),
            source,
        }
    })?;

    let items = match decoded {
        Value::Array(items) => items,
        single => vec![single],
    };

    log::debug!("{} FILE_DECODED readings={}", log_ctx, items.len());

    let mut summary = FileSummary {
        name: file.name().to_string(),
        records: 0,
        flat: 0,
        nested: 0,
    };
    let mut records = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let reading = detect_shape_logged(item, index, &log_ctx)
            .into_reading()
            .ok_or_else(|| TelemetryError::UnrecognizedFormat {
                file: file.name().to_string(),
                index,
            })?;

        match reading.kind() {
            ShapeKind::Flat => summary.flat += 1,
            ShapeKind::Nested => summary.nested += 1,
        }
        records.push(unify(&reading));
    }

    summary.records = records.len();
    log::info!(
        "{} FILE_COMPLETE records={} flat={} nested={}",
        log_ctx,
        summary.records,
        summary.flat,
        summary.nested
    );

    Ok((summary, records))
}

/// Upper bound on files processed at the same time.
pub const MAX_FILE_WORKERS: usize = 8;

type FileOutcome = Result<(FileSummary, Vec<TelemetryRecord>)>;

/// Process up to [`MAX_FILE_WORKERS`] files, one scoped thread each.
/// Outcomes are returned in submission order.
fn process_wave(ctx: &BatchContext, wave: &[RawFile], first_index: usize) -> Vec<FileOutcome> {
    thread::scope(|scope| {
        let handles: Vec<_> = wave
            .iter()
            .enumerate()
            .map(|(offset, file)| {
                let handle = thread::Builder::new()
                    .name(format!("ingest-{}", first_index + offset))
                    .spawn_scoped(scope, move || process_file(ctx, file));
                (file, handle)
            })
            .collect();

        handles
            .into_iter()
            .map(|(file, handle)| match handle {
                Ok(handle) => match handle.join() {
                    Ok(outcome) => outcome,
                    Err(panic) => std::panic::resume_unwind(panic),
                },
                Err(source) => {
                    log::error!(
                        "{} WORKER_SPAWN_FAILED error={}",
                        ctx.file_context(file.name()),
                        source
                    );
                    Err(TelemetryError::Spawn {
                        file: file.name().to_string(),
                        source,
                    })
                }
            })
            .collect()
    })
}

/// Process a batch of files concurrently, at most [`MAX_FILE_WORKERS`] at
/// a time.
///
/// Records keep file submission order, then element order within each
/// file. The first failing file (in submission order) rejects the batch;
/// later waves are not started once a wave has failed.
pub fn process_files(ctx: &BatchContext, files: &[RawFile]) -> Result<BatchResult> {
    let mut outcomes: Vec<FileOutcome> = Vec::with_capacity(files.len());
    for (wave_index, wave) in files.chunks(MAX_FILE_WORKERS).enumerate() {
        let results = process_wave(ctx, wave, wave_index * MAX_FILE_WORKERS);
        let failed = results.iter().any(|r| r.is_err());
        outcomes.extend(results);
        if failed {
            break;
        }
    }

    let mut summaries = Vec::with_capacity(files.len());
    let mut records = Vec::new();

    for outcome in outcomes {
        match outcome {
            Ok((summary, file_records)) => {
                summaries.push(summary);
                records.extend(file_records);
            }
            Err(e) => {
                log::warn!("{} BATCH_REJECTED error={}", ctx.log_context(), e);
                return Err(e);
            }
        }
    }

    log::info!(
        "{} BATCH_COMPLETE files={} records={}",
        ctx.log_context(),
        summaries.len(),
        records.len()
    );

    Ok(BatchResult {
        batch_id: ctx.batch_id.clone(),
        files: summaries,
        records,
    })
}

/// Upload entry point: process the files and append the batch to `store`.
///
/// Nothing is stored unless every file succeeds.
pub fn ingest_files<S>(store: &S, files: &[RawFile]) -> Result<BatchResult>
where
    S: TelemetryStore + ?Sized,
{
    if files.is_empty() {
        return Err(TelemetryError::NoFiles);
    }

    let ctx = BatchContext::new();
    log::info!(
        "{} BATCH_RECEIVED received_at={} files={:?}",
        ctx.log_context(),
        ctx.received_at.to_rfc3339(),
        files.iter().map(RawFile::name).collect::<Vec<_>>()
    );

    let result = process_files(&ctx, files)?;
    store.append(&result.records)?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::store::MemoryStore;

    const FLAT: &str = r#"{"deviceID":"D1","location":"L1","timestamp":1000,"startTime":0,"endTime":600000,"operationStatus":"Healthy","temp":50,"vibration":0.1,"deviceType":"pump"}"#;

    const NESTED_ARRAY: &str = r#"[
        {"device":{"id":"N1","type":"press"},"startTime":"2024-01-01T00:00:00Z","endTime":"2024-01-01T00:10:00Z","timestamp":"2024-01-01T00:05:00Z","country":"US","state":"CA","plant":"P1","block":"B1","data":{"status":"Warning","temperature":70,"vibration":0.3}},
        {"device":{"id":"N2","type":"press"},"startTime":"2024-01-01T00:00:00Z","endTime":"2024-01-01T00:20:00Z","timestamp":"2024-01-01T00:05:00Z","country":"US","state":"TX","plant":"P2","block":"B2","data":{"status":"Error","temperature":90,"vibration":0.9}}
    ]"#;

    #[test]
    fn test_single_object_and_array_files() {
        let ctx = BatchContext::new();
        let files = vec![
            RawFile::from_bytes("flat.json", FLAT),
            RawFile::from_bytes("nested.json", NESTED_ARRAY),
        ];

        let result = process_files(&ctx, &files).unwrap();
        let devices: Vec<_> = result.records.iter().map(|r| r.device_id.as_str()).collect();
        assert_eq!(devices, vec!["D1", "N1", "N2"]);
        assert_eq!(result.files[0].flat, 1);
        assert_eq!(result.files[1].nested, 2);
        assert_eq!(result.batch_id, ctx.batch_id);
    }

    #[test]
    fn test_invalid_json_rejects_batch() {
        let ctx = BatchContext::new();
        let files = vec![
            RawFile::from_bytes("good.json", FLAT),
            RawFile::from_bytes("broken.json", "invalid json{"),
        ];

        match process_files(&ctx, &files) {
            Err(TelemetryError::Decode { file, .. }) => assert_eq!(file, "broken.json"),
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_unrecognized_element_rejects_batch() {
        let ctx = BatchContext::new();
        let mixed = format!("[{}, {{\"deviceID\": \"D2\"}}]", FLAT);
        let files = vec![RawFile::from_bytes("mixed.json", mixed)];

        match process_files(&ctx, &files) {
            Err(TelemetryError::UnrecognizedFormat { file, index }) => {
                assert_eq!(file, "mixed.json");
                assert_eq!(index, 1);
            }
            other => panic!("expected unrecognized format, got {:?}", other),
        }
    }

    fn flat_file(i: usize) -> RawFile {
        RawFile::from_bytes(
            format!("flat-{}.json", i),
            FLAT.replace("\"D1\"", &format!("\"D{}\"", i)),
        )
    }

    #[test]
    fn test_files_beyond_worker_limit_keep_order() {
        let ctx = BatchContext::new();
        let files: Vec<RawFile> = (0..MAX_FILE_WORKERS * 2 + 3).map(flat_file).collect();

        let result = process_files(&ctx, &files).unwrap();
        let expected: Vec<String> = (0..files.len()).map(|i| format!("D{}", i)).collect();
        let devices: Vec<_> = result.records.iter().map(|r| r.device_id.clone()).collect();
        assert_eq!(devices, expected);
        assert_eq!(result.files.len(), files.len());
    }

    #[test]
    fn test_first_failure_across_waves_wins() {
        let ctx = BatchContext::new();
        let mut files: Vec<RawFile> = (0..MAX_FILE_WORKERS * 2).map(flat_file).collect();
        files[3] = RawFile::from_bytes("early.json", "[");
        files[MAX_FILE_WORKERS + 1] = RawFile::from_bytes("late.json", "[");

        match process_files(&ctx, &files) {
            Err(TelemetryError::Decode { file, .. }) => assert_eq!(file, "early.json"),
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let ctx = BatchContext::new();
        let files = vec![RawFile::from_path("/nonexistent/telemetry/export.json")];
        let err = process_files(&ctx, &files).unwrap_err();
        assert!(matches!(err, TelemetryError::Read { .. }));
    }

    #[test]
    fn test_ingest_appends_only_on_success() {
        let store = MemoryStore::new();

        ingest_files(&store, &[RawFile::from_bytes("flat.json", FLAT)]).unwrap();
        assert_eq!(store.len().unwrap(), 1);

        let failing = vec![
            RawFile::from_bytes("nested.json", NESTED_ARRAY),
            RawFile::from_bytes("broken.json", "{"),
        ];
        assert!(ingest_files(&store, &failing).is_err());
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_ingest_requires_files() {
        let store = MemoryStore::new();
        assert!(matches!(
            ingest_files(&store, &[]),
            Err(TelemetryError::NoFiles)
        ));
    }

    #[test]
    fn test_bom_is_stripped() {
        let file = RawFile::from_bytes("bom.json", format!("\u{feff}{}", FLAT));
        assert!(file.read_text().unwrap().starts_with('{'));
        assert!(file.has_json_extension());
    }
}
