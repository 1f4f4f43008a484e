// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log Writer: one append-only `run.log` per app.
//!
//! Supervisor-authored lines get a bracketed UTC timestamp; raw child
//! stdout/stderr is written through unmodified via the handle from
//! `child_sink`. Reads are best-effort — no locking against concurrent
//! writers, so a torn last line is acceptable.

use ah_core::AppError;
use chrono::Utc;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<LogError> for AppError {
    fn from(err: LogError) -> Self {
        match err {
            LogError::Io(err) => AppError::Io(err),
        }
    }
}

pub const MIN_TAIL: usize = 50;
pub const MAX_TAIL: usize = 5000;

pub const LOG_FILE_NAME: &str = "run.log";

#[derive(Clone)]
pub struct LogWriter {
    data_dir: PathBuf,
}

impl LogWriter {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    fn log_path(&self, app_id: &str) -> PathBuf {
        self.data_dir.join("apps").join(app_id).join(LOG_FILE_NAME)
    }

    /// Append one supervisor-authored, timestamp-prefixed line.
    pub fn append_line(&self, app_id: &str, line: &str) -> Result<(), LogError> {
        let mut file = OpenOptions::new().create(true).append(true).open(self.log_path(app_id))?;
        writeln!(file, "[{}] {}", Utc::now().to_rfc3339(), line)?;
        Ok(())
    }

    /// A handle suitable for `Stdio::from(..)`, so the child process writes
    /// its own stdout/stderr straight into the log with no intermediary.
    pub fn child_sink(&self, app_id: &str) -> Result<File, LogError> {
        Ok(OpenOptions::new().create(true).append(true).open(self.log_path(app_id))?)
    }

    /// Last `n` newline-delimited lines, clamped to `[MIN_TAIL, MAX_TAIL]`.
    pub fn tail(&self, app_id: &str, n: usize) -> Result<String, LogError> {
        let n = n.clamp(MIN_TAIL, MAX_TAIL);
        let path = self.log_path(app_id);
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(String::new()),
            Err(err) => return Err(err.into()),
        };
        let reader = BufReader::new(file);
        let mut ring: std::collections::VecDeque<String> = std::collections::VecDeque::with_capacity(n);
        for line in reader.lines() {
            let line = line?;
            if ring.len() == n {
                ring.pop_front();
            }
            ring.push_back(line);
        }
        Ok(ring.into_iter().collect::<Vec<_>>().join("\n"))
    }
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
