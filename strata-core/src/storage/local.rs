/// Local filesystem storage for a single canvas document.
///
/// - Pretty JSON on disk
/// - Atomic writes (write to .tmp, fsync, rename)
/// - SHA-256 fingerprint of the last read/written content; saving an
///   identical document is skipped
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use sha2::{Digest, Sha256};

use super::{DocumentStorage, StorageError};
use crate::document::{export_json, import_json};
use crate::types::CanvasDocument;

pub struct LocalStorage {
    path: PathBuf,
    /// SHA-256 of the content last read from or written to `path`
    content_hash: Mutex<Option<String>>,
}

impl LocalStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            content_hash: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// SHA-256 of content with line endings normalized.
    pub fn content_hash(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.replace("\r\n", "\n").as_bytes());
        hex::encode(hasher.finalize())
    }

    fn remember_hash(&self, hash: String) {
        *self.content_hash.lock().unwrap_or_else(PoisonError::into_inner) = Some(hash);
    }

    fn last_hash(&self) -> Option<String> {
        self.content_hash
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Atomic write with fsync: write to .tmp, fsync, rename, fsync directory.
    /// Refuses to write empty content over a non-empty file.
    fn atomic_write(path: &Path, content: &str) -> Result<(), std::io::Error> {
        if content.trim().is_empty() {
            if let Ok(existing) = fs::read_to_string(path) {
                if !existing.trim().is_empty() {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "Refusing to overwrite non-empty file with empty content",
                    ));
                }
            }
        }

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let tmp_path = path.with_extension("strata.tmp");
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)?;

        if let Some(dir) = path.parent() {
            if let Ok(d) = fs::File::open(dir) {
                let _ = d.sync_all();
            }
        }
        Ok(())
    }
}

impl DocumentStorage for LocalStorage {
    fn load(&self) -> Result<Option<CanvasDocument>, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("[strata.storage.load] No document at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let document = import_json(&content).map_err(|source| {
            log::warn!(
                "[strata.storage.load] Corrupt document at {}: {}",
                self.path.display(),
                source
            );
            StorageError::Corrupt {
                path: self.path.display().to_string(),
                source,
            }
        })?;
        self.remember_hash(Self::content_hash(&content));
        Ok(Some(document))
    }

    fn save(&self, document: &CanvasDocument) -> Result<bool, StorageError> {
        let content = export_json(document).map_err(StorageError::Encode)?;
        let hash = Self::content_hash(&content);
        if self.last_hash().as_deref() == Some(hash.as_str()) && self.path.exists() {
            log::debug!("[strata.storage.save] Unchanged, skipping {}", self.path.display());
            return Ok(false);
        }

        Self::atomic_write(&self.path, &content)?;
        log::debug!(
            "[strata.storage.save] Wrote {} bytes to {}",
            content.len(),
            self.path.display()
        );
        self.remember_hash(hash);
        Ok(true)
    }
}
