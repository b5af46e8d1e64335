//! Append-only candidate logs.

use crate::error::GranskaError;
use crate::model::CandidateRecord;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Where candidate records are appended and read back from.
///
/// Records are never updated or removed; several runs for the same
/// document may coexist.
pub trait CandidateLog: Send + Sync {
    fn append(&self, records: &[CandidateRecord]) -> Result<(), GranskaError>;

    fn read_all(&self) -> Result<Vec<CandidateRecord>, GranskaError>;

    fn read_document(&self, document_id: &str) -> Result<Vec<CandidateRecord>, GranskaError> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|r| r.document_id == document_id)
            .collect())
    }
}

/// One JSON object per line, appended to a file.
#[derive(Debug)]
pub struct JsonlCandidateLog {
    path: PathBuf,
    skip_corrupt: bool,
    write_lock: Mutex<()>,
}

impl JsonlCandidateLog {
    /// A log at `path`. The file is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonlCandidateLog {
            path: path.into(),
            skip_corrupt: false,
            write_lock: Mutex::new(()),
        }
    }

    /// Skip undecodable lines (with a warning) instead of failing the read.
    pub fn lenient(mut self) -> Self {
        self.skip_corrupt = true;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CandidateLog for JsonlCandidateLog {
    fn append(&self, records: &[CandidateRecord]) -> Result<(), GranskaError> {
        let _guard = lock(&self.write_lock);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut out = BufWriter::new(file);
        for record in records {
            serde_json::to_writer(&mut out, record)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        tracing::debug!(path = %self.path.display(), count = records.len(), "appended candidates");
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<CandidateRecord>, GranskaError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<CandidateRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) if self.skip_corrupt => {
                    tracing::warn!(path = %self.path.display(), line = idx + 1, error = %e, "skipping corrupt log line");
                }
                Err(e) => {
                    return Err(GranskaError::CorruptLogLine {
                        path: self.path.clone(),
                        line: idx + 1,
                        reason: e.to_string(),
                    })
                }
            }
        }
        Ok(records)
    }
}

/// An in-process log.
#[derive(Debug, Default)]
pub struct MemoryCandidateLog {
    records: Mutex<Vec<CandidateRecord>>,
}

impl MemoryCandidateLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CandidateLog for MemoryCandidateLog {
    fn append(&self, records: &[CandidateRecord]) -> Result<(), GranskaError> {
        lock(&self.records).extend_from_slice(records);
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<CandidateRecord>, GranskaError> {
        Ok(lock(&self.records).clone())
    }
}

/// Poisoning is ignored; records are only ever appended whole.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
