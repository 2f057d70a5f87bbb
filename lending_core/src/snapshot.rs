//! Library snapshot persistence with file locking.
//!
//! The ledger itself never touches disk; this module keeps the CLI's state
//! between invocations by saving and loading the whole [`Library`] as JSON.
//! Writes are atomic (temp file + rename) and guarded by fs2 locks so
//! concurrent CLI invocations cannot interleave partial writes.

use crate::catalog::CatalogStore;
use crate::ledger::Ledger;
use crate::{Error, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// The complete in-memory library: catalog plus lending ledger
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Library {
    pub catalog: CatalogStore,
    pub ledger: Ledger,
}

impl Library {
    /// Load a library snapshot with shared locking.
    ///
    /// Returns a default (empty) library if the file doesn't exist.
    /// If the file is corrupted, logs a warning and returns the default.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No snapshot found, starting with an empty library");
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open snapshot {:?}: {}. Using defaults.", path, e);
                return Ok(Self::default());
            }
        };

        // Acquire shared lock for reading
        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock snapshot {:?}: {}. Using defaults.", path, e);
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!("Failed to read snapshot {:?}: {}. Using defaults.", path, e);
            return Ok(Self::default());
        }

        file.unlock()?;

        match serde_json::from_str::<Library>(&contents) {
            Ok(library) => {
                tracing::debug!("Loaded library snapshot from {:?}", path);
                Ok(library)
            }
            Err(e) => {
                tracing::warn!("Failed to parse snapshot {:?}: {}. Using defaults.", path, e);
                Ok(Self::default())
            }
        }
    }

    /// Save the library snapshot with exclusive locking.
    ///
    /// Atomically writes by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Unique temp file in the same directory for atomic rename
        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "snapshot path missing parent")
        })?)?;

        // Exclusive lock on the temp file to serialize concurrent writers
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved library snapshot to {:?}", path);
        Ok(())
    }

    /// Load the snapshot, modify it, and save it back atomically.
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut Library) -> Result<()>,
    {
        let mut library = Self::load(path)?;
        f(&mut library)?;
        library.save(path)?;
        Ok(library)
    }
}
