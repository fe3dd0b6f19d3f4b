//! The authoritative on-disk knowledge store.
//!
//! A single JSON array file, rewritten wholesale on every mutation. Writes go
//! through a sibling tmp file and an atomic rename so a crash mid-write never
//! leaves a half-written store, and every destructive rewrite is preceded by
//! a timestamped backup copy.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{CoreError, CoreResult};
use crate::knowledge::loader;
use crate::knowledge::types::KnowledgeEntry;

/// In-memory handle to the authoritative store file.
#[derive(Debug)]
pub struct KnowledgeStore {
    path: PathBuf,
    entries: Vec<KnowledgeEntry>,
}

impl KnowledgeStore {
    /// Open the store at `path`. A missing file is an empty store; items are
    /// run through shape normalization so legacy files load cleanly.
    pub fn open(path: impl Into<PathBuf>) -> CoreResult<Self> {
        let path = path.into();
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self {
                    path,
                    entries: Vec::new(),
                });
            }
            Err(e) => return Err(CoreError::io(path.display().to_string(), e)),
        };

        let values = loader::parse_document(&raw)?;
        let (entries, skipped) = loader::normalize_values(values);
        if skipped > 0 {
            warn!(
                "store {}: skipped {skipped} unrecognized items on open",
                path.display()
            );
        }
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace the full entry array (the apply step's filtered result).
    pub fn set_entries(&mut self, entries: Vec<KnowledgeEntry>) {
        self.entries = entries;
    }

    pub fn append(&mut self, entry: KnowledgeEntry) {
        self.entries.push(entry);
    }

    /// Persist the current entries wholesale: serialize, write to a sibling
    /// tmp file, rename over the store path.
    pub fn persist(&self) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| CoreError::io(parent.display().to_string(), e))?;
            }
        }

        let json = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| CoreError::io(tmp.display().to_string(), e))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| CoreError::io(self.path.display().to_string(), e))?;
        Ok(())
    }

    /// Copy the current on-disk file to `<stem>.backup.<epoch-millis>.json`
    /// beside it. Returns the backup path, or `None` when there is no file
    /// to back up yet.
    pub fn write_backup(&self) -> CoreResult<Option<PathBuf>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "knowledge".to_string());
        let backup_name = format!("{stem}.backup.{}.json", chrono::Utc::now().timestamp_millis());
        let backup_path = self
            .path
            .parent()
            .map(|p| p.join(&backup_name))
            .unwrap_or_else(|| PathBuf::from(&backup_name));

        std::fs::copy(&self.path, &backup_path)
            .map_err(|e| CoreError::io(backup_path.display().to_string(), e))?;
        info!("wrote store backup {}", backup_path.display());
        Ok(Some(backup_path))
    }

    /// Count backup files sitting beside the store.
    pub fn backup_count(&self) -> usize {
        let stem = match self.path.file_stem() {
            Some(s) => format!("{}.backup.", s.to_string_lossy()),
            None => return 0,
        };
        let Some(parent) = self.path.parent() else {
            return 0;
        };
        let Ok(dir) = std::fs::read_dir(parent) else {
            return 0;
        };
        dir.filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(&stem))
            .count()
    }

    /// Size of the on-disk file in bytes (0 when it does not exist yet).
    pub fn file_size(&self) -> u64 {
        std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }
}
