//! Log line prefixes.
//!
//! A [`LogContext`] narrows from a batch to one of its files and then to a
//! single reading inside that file. Its `Display` form is the prefix of
//! every pipeline log line, e.g. `[batch=batch-1a2b3c4d] [file=pumps.json] [reading=3]`.

use std::fmt;

/// How far a log line is scoped within an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Scope {
    Batch,
    File(String),
    Reading { file: String, index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogContext {
    batch_id: String,
    scope: Scope,
}

impl LogContext {
    pub fn new(batch_id: impl Into<String>) -> Self {
        Self {
            batch_id: batch_id.into(),
            scope: Scope::Batch,
        }
    }

    /// Narrow to one source file, replacing any file or reading scope.
    pub fn for_file(&self, file: &str) -> Self {
        Self {
            batch_id: self.batch_id.clone(),
            scope: Scope::File(file.to_string()),
        }
    }

    /// Narrow to the reading at `index` of the current file. Without a file
    /// scope the index alone is not meaningful and the batch scope is kept.
    pub fn at_reading(&self, index: usize) -> Self {
        let scope = match &self.scope {
            Scope::File(file) | Scope::Reading { file, .. } => Scope::Reading {
                file: file.clone(),
                index,
            },
            Scope::Batch => Scope::Batch,
        };
        Self {
            batch_id: self.batch_id.clone(),
            scope,
        }
    }

    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }

    pub fn file(&self) -> Option<&str> {
        match &self.scope {
            Scope::Batch => None,
            Scope::File(file) | Scope::Reading { file, .. } => Some(file),
        }
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[batch={}]", self.batch_id)?;
        match &self.scope {
            Scope::Batch => Ok(()),
            Scope::File(file) => write!(f, " [file={}]", file),
            Scope::Reading { file, index } => write!(f, " [file={}] [reading={}]", file, index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scopes_render_as_prefix() {
        let batch = LogContext::new("batch-1a2b3c4d");
        assert_eq!(batch.to_string(), "[batch=batch-1a2b3c4d]");
        assert_eq!(batch.file(), None);

        let file = batch.for_file("pumps.json");
        assert_eq!(file.to_string(), "[batch=batch-1a2b3c4d] [file=pumps.json]");
        assert_eq!(file.file(), Some("pumps.json"));

        let reading = file.at_reading(3);
        assert_eq!(
            reading.to_string(),
            "[batch=batch-1a2b3c4d] [file=pumps.json] [reading=3]"
        );
        assert_eq!(reading.at_reading(4).to_string(), file.at_reading(4).to_string());
    }

    #[test]
    fn test_reading_needs_a_file() {
        let batch = LogContext::new("batch-1");
        assert_eq!(batch.at_reading(2), batch);
        assert_eq!(
            batch.at_reading(2).for_file("a.json").to_string(),
            "[batch=batch-1] [file=a.json]"
        );
        assert_eq!(batch.for_file("a.json").batch_id(), "batch-1");
    }
}
