//! JSON-lines journal backing the in-memory store.
//!
//! Every inserted record is appended as one line. On startup the file is
//! replayed into the store so records survive restarts. The journal is
//! append-only, matching the create-only lifecycle of log records.

use courier_core::error::CourierError;
use courier_core::log_record::LogRecord;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub struct Journal {
    path: PathBuf,
    file: Mutex<File>,
}

impl Journal {
    /// Open (or create) the journal for appending.
    pub fn open(path: &Path) -> Result<Self, CourierError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        terminate_torn_line(&mut file)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single line.
    pub fn append(&self, record: &LogRecord) -> Result<(), CourierError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        let mut file = self
            .file
            .lock()
            .map_err(|_| CourierError::Store("journal lock poisoned".to_string()))?;
        file.write_all(&line)?;
        Ok(())
    }
}

/// A crash mid-append leaves a final line without its newline. Close it off
/// so the next record starts on a line of its own.
fn terminate_torn_line(file: &mut File) -> Result<(), CourierError> {
    if file.metadata()?.len() == 0 {
        return Ok(());
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    if last[0] != b'\n' {
        tracing::warn!("journal: unterminated last line, starting a new one");
        file.write_all(b"\n")?;
    }
    Ok(())
}

/// Read every record from a journal file.
///
/// * If the file does not exist      → returns an empty list (first run).
/// * If a line is malformed          → logs a warning and skips it.
pub fn load_journal(path: &Path) -> Result<Vec<LogRecord>, CourierError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "journal: no file found, starting fresh");
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    let mut skipped = 0usize;
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<LogRecord>(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                skipped += 1;
                tracing::warn!(error = %e, line = lineno + 1, path = %path.display(), "journal: malformed line, skipping");
            }
        }
    }

    tracing::info!(
        records = records.len(),
        skipped,
        path = %path.display(),
        "journal: records restored"
    );
    Ok(records)
}
