//! Local persistence of the state document.
//!
//! The local file is the source of truth. Loading never fails: a missing file
//! yields an empty document and an unreadable one is logged and replaced by an
//! empty in-memory document. Saving rewrites the whole file atomically.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use tracing::{debug, info, instrument, warn};

use crate::models::StateDocument;

pub trait StateStore: Send + Sync {
    fn load(&self) -> StateDocument;
    fn save(&self, doc: &StateDocument) -> Result<(), AppError>;
}

#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<StateDocument>, AppError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut doc: StateDocument = serde_json::from_slice(&raw)?;
        doc.normalize();
        Ok(Some(doc))
    }

    /// Writes the seeded default document unless one already exists.
    /// Returns whether a document was written.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn initialize(&self, now: DateTime<Utc>) -> Result<bool, AppError> {
        if self.path.exists() {
            debug!("State document already present");
            return Ok(false);
        }
        self.save(&StateDocument::seeded(now))?;
        info!("Seeded new state document");
        Ok(true)
    }

    /// Saves only if the file still holds the revision `doc` was loaded at,
    /// then bumps the revision.
    ///
    /// A file that exists but cannot be parsed is never overwritten here; the
    /// in-memory document is then an empty stand-in, not the user's data.
    #[instrument(skip(self, doc), fields(revision = doc.revision))]
    pub fn save_checked(&self, doc: &mut StateDocument) -> Result<(), AppError> {
        let on_disk = match self.read() {
            Ok(current) => current.map(|d| d.revision).unwrap_or(0),
            Err(e) => {
                warn!(error = %e, "Stored document unreadable, refusing to overwrite");
                return Err(AppError::StorageError(anyhow::anyhow!(
                    "state document at {} is unreadable ({e}), not overwriting it",
                    self.path.display()
                )));
            }
        };
        if on_disk != doc.revision {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "state document changed on disk (revision {on_disk}, expected {})",
                doc.revision
            )));
        }
        doc.revision += 1;
        if let Err(e) = self.save(doc) {
            doc.revision -= 1;
            return Err(e);
        }
        Ok(())
    }
}

impl StateStore for FileStateStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> StateDocument {
        match self.read() {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                debug!("No state document yet, starting empty");
                let mut doc = StateDocument::default();
                doc.normalize();
                doc
            }
            Err(e) => {
                warn!(error = %e, "State document unreadable, starting empty");
                let mut doc = StateDocument::default();
                doc.normalize();
                doc
            }
        }
    }

    #[instrument(skip(self, doc), fields(path = %self.path.display()))]
    fn save(&self, doc: &StateDocument) -> Result<(), AppError> {
        let body = serde_json::to_vec_pretty(doc)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut tmp_name = self.path.clone().into_os_string();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);

        let mut file = fs::File::create(&tmp)
            .with_context(|| format!("creating {}", tmp.display()))
            .map_err(AppError::StorageError)?;
        file.write_all(&body)?;
        file.sync_all()?;
        fs::rename(&tmp, &self.path)?;

        debug!(bytes = body.len(), "State document saved");
        Ok(())
    }
}
