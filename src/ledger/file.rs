//! Append-only file ledger
//!
//! Two plain-text files back the ledger:
//! - the success file holds one URL per line
//! - the failure file holds one `url,status_code` pair per line

use crate::ledger::traits::{Ledger, LedgerError, LedgerResult};
use crate::ledger::FailureRecord;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Ledger backed by two append-mode files
///
/// The handles stay open for the life of the value and are closed when it is
/// dropped or passed to [`FileLedger::close`].
pub struct FileLedger {
    succeeded: HashSet<String>,
    failed: HashSet<String>,
    success_file: File,
    failure_file: File,
    success_path: PathBuf,
    failure_path: PathBuf,
}

impl FileLedger {
    /// Loads both ledgers and opens them for appending
    ///
    /// Missing files are created empty so later runs always find them.
    /// Both handles are opened before anything is read.
    ///
    /// # Arguments
    ///
    /// * `success_path` - File of successfully crawled URLs
    /// * `failure_path` - File of `url,status_code` pairs
    pub fn open(success_path: &Path, failure_path: &Path) -> LedgerResult<Self> {
        let success_file = open_append(success_path)?;
        let failure_file = open_append(failure_path)?;

        let succeeded = read_lines(success_path)?
            .into_iter()
            .collect::<HashSet<_>>();

        let failed = read_lines(failure_path)?
            .iter()
            .map(|line| FailureRecord::parse(line).url)
            .collect::<HashSet<_>>();

        tracing::debug!(
            "Loaded ledgers: {} crawled, {} failed",
            succeeded.len(),
            failed.len()
        );

        Ok(Self {
            succeeded,
            failed,
            success_file,
            failure_file,
            success_path: success_path.to_path_buf(),
            failure_path: failure_path.to_path_buf(),
        })
    }

    pub fn success_path(&self) -> &Path {
        &self.success_path
    }

    pub fn failure_path(&self) -> &Path {
        &self.failure_path
    }

    /// Flushes and releases both ledger files
    pub fn close(mut self) -> LedgerResult<()> {
        sync(&mut self.success_file, &self.success_path)?;
        sync(&mut self.failure_file, &self.failure_path)?;
        tracing::info!("Closed the ledgers");
        Ok(())
    }
}

impl Ledger for FileLedger {
    fn contains(&self, url: &str) -> bool {
        self.succeeded.contains(url) || self.failed.contains(url)
    }

    fn record_success(&mut self, url: &str) -> LedgerResult<()> {
        check_entry(url)?;
        append_line(
            &mut self.success_file,
            &self.success_path,
            &format!("{}\n", url),
        )?;
        self.succeeded.insert(url.to_string());
        Ok(())
    }

    fn record_failure(&mut self, url: &str, status_code: u16) -> LedgerResult<()> {
        check_entry(url)?;
        let line = FailureRecord::new(url, Some(status_code)).to_line();
        append_line(
            &mut self.failure_file,
            &self.failure_path,
            &format!("{}\n", line),
        )?;
        self.failed.insert(url.to_string());
        Ok(())
    }

    fn success_count(&self) -> usize {
        self.succeeded.len()
    }

    fn failure_count(&self) -> usize {
        self.failed.len()
    }
}

/// Reads every non-blank trimmed line of a ledger
///
/// A missing file reads as empty.
pub(crate) fn read_lines(path: &Path) -> LedgerResult<Vec<String>> {
    let open_err = |source| LedgerError::Open {
        path: path.to_path_buf(),
        source,
    };

    if !path.is_file() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path).map_err(open_err)?);
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(open_err)?;
        let line = line.trim();
        if !line.is_empty() {
            lines.push(line.to_string());
        }
    }
    Ok(lines)
}

fn open_append(path: &Path) -> LedgerResult<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LedgerError::Open {
            path: path.to_path_buf(),
            source,
        })
}

fn append_line(file: &mut File, path: &Path, line: &str) -> LedgerResult<()> {
    file.write_all(line.as_bytes())
        .and_then(|_| file.flush())
        .and_then(|_| file.sync_data())
        .map_err(|source| LedgerError::Append {
            path: path.to_path_buf(),
            source,
        })
}

fn sync(file: &mut File, path: &Path) -> LedgerResult<()> {
    file.flush()
        .and_then(|_| file.sync_all())
        .map_err(|source| LedgerError::Append {
            path: path.to_path_buf(),
            source,
        })
}

// A URL with a line break would split into two ledger entries.
fn check_entry(url: &str) -> LedgerResult<()> {
    if url.contains('\n') || url.contains('\r') {
        return Err(LedgerError::InvalidEntry(url.to_string()));
    }
    Ok(())
}
