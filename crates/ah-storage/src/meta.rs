// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Metadata Store: the only source of truth for app records.
//!
//! Encoding is JSON. `save` writes to a sibling temp file and renames it
//! into place, so a reader never observes a torn file. `list` skips
//! malformed records rather than failing the whole enumeration.

use ah_core::{AppError, AppRecord};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetaError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<MetaError> for AppError {
    fn from(err: MetaError) -> Self {
        match err {
            MetaError::Io(err) => AppError::Io(err),
            MetaError::Json(err) => AppError::Json(err),
        }
    }
}

pub const META_FILE_NAME: &str = "meta.json";

/// File-backed metadata store rooted at `<data_dir>/apps/<app_id>/meta.json`.
#[derive(Clone)]
pub struct MetaStore {
    data_dir: PathBuf,
}

impl MetaStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    pub fn apps_dir(&self) -> PathBuf {
        self.data_dir.join("apps")
    }

    pub fn app_dir(&self, app_id: &str) -> PathBuf {
        self.apps_dir().join(app_id)
    }

    fn meta_path(&self, app_id: &str) -> PathBuf {
        self.app_dir(app_id).join(META_FILE_NAME)
    }

    /// Create the app's directory. Fails with `AlreadyExists` if it is
    /// already there — callers translate this to `IdCollision`.
    pub fn create_app_dir(&self, app_id: &str) -> Result<PathBuf, MetaError> {
        let dir = self.app_dir(app_id);
        fs::create_dir(&dir)?;
        Ok(dir)
    }

    pub fn load(&self, app_id: &str) -> Result<AppRecord, MetaError> {
        let bytes = fs::read(self.meta_path(app_id))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Write the record atomically: serialize to a temp file in the app's
    /// own directory, then rename over `meta.json`. The rename is within a
    /// single filesystem so it is atomic on every platform this targets.
    pub fn save(&self, record: &AppRecord) -> Result<(), MetaError> {
        let dir = self.app_dir(record.app_id.as_str());
        fs::create_dir_all(&dir)?;
        let final_path = dir.join(META_FILE_NAME);
        let tmp_path = dir.join(format!(".{META_FILE_NAME}.tmp"));
        let bytes = serde_json::to_vec_pretty(record)?;
        fs::write(&tmp_path, bytes)?;
        fs::rename(&tmp_path, &final_path)?;
        Ok(())
    }

    /// Enumerate every app directory and load its record. A directory
    /// missing or failing to parse `meta.json` is skipped, not fatal.
    pub fn list(&self) -> Result<Vec<AppRecord>, MetaError> {
        let apps_dir = self.apps_dir();
        if !apps_dir.exists() {
            return Ok(Vec::new());
        }
        let mut records = Vec::new();
        for entry in fs::read_dir(&apps_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let app_id = entry.file_name().to_string_lossy().into_owned();
            match self.load(&app_id) {
                Ok(record) => records.push(record),
                Err(err) => {
                    tracing::warn!(app_id, error = %err, "skipping malformed app record");
                }
            }
        }
        Ok(records)
    }

    /// Remove the app's entire directory subtree. Idempotent: a missing
    /// directory is not an error.
    pub fn remove_app_dir(&self, app_id: &str) -> Result<(), MetaError> {
        match fs::remove_dir_all(self.app_dir(app_id)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn manifest_path(&self, app_id: &str) -> PathBuf {
        self.app_dir(app_id).join("requirements.txt")
    }

    pub fn entry_path(&self, app_id: &str) -> PathBuf {
        self.app_dir(app_id).join("app.py")
    }

    pub fn venv_dir(&self, app_id: &str) -> PathBuf {
        self.app_dir(app_id).join("venv")
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.data_dir.join("tmp")
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
#[path = "meta_tests.rs"]
mod tests;
