//! File-based key/value store for persistent storage.

use crate::backend::KeyValueStore;
use crate::error::{StorageError, StorageResult};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Extension used for stored blobs.
const BLOB_EXTENSION: &str = "json";

/// Extension used for in-progress writes.
const TEMP_EXTENSION: &str = "tmp";

/// A directory-backed key/value store.
///
/// Each key maps to one file `<key>.json` inside the store directory.
/// Data survives process restarts.
///
/// # Durability
///
/// `save` writes the blob to `<key>.tmp`, calls `File::sync_all()`, and
/// renames it over the final file, so a crash mid-save leaves either the
/// old blob or the new one, never a torn write.
///
/// # Keys
///
/// Keys may contain ASCII letters, digits, `-`, `_`, `.`, `%` and `:`. A
/// `:` is stored as `@` in the file name. Empty keys and keys starting with `.`
/// are rejected.
///
/// # Example
///
/// ```no_run
/// use offsync_storage::{FileStore, KeyValueStore};
/// use std::path::Path;
///
/// let store = FileStore::open(Path::new("offline-data")).unwrap();
/// store.save("offline-queue", "[]").unwrap();
/// ```
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: &Path) -> StorageResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            write_lock: Mutex::new(()),
        })
    }

    /// Returns the store directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file path that holds the blob for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidKey`] if the key cannot be mapped
    /// to a file name.
    pub fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        let stem = file_stem(key)?;
        Ok(self.dir.join(format!("{stem}.{BLOB_EXTENSION}")))
    }

    fn temp_path_for(&self, key: &str) -> StorageResult<PathBuf> {
        let stem = file_stem(key)?;
        Ok(self.dir.join(format!("{stem}.{TEMP_EXTENSION}")))
    }
}

fn file_stem(key: &str) -> StorageResult<String> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '%' | ':'));

    if !valid {
        return Err(StorageError::InvalidKey(key.to_string()));
    }

    Ok(key.replace(':', "@"))
}

impl KeyValueStore for FileStore {
    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key)?;

        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;

        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| StorageError::Corrupted {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    fn save(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        let temp_path = self.temp_path_for(key)?;
        let _guard = self.write_lock.lock();

        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }

        fs::rename(&temp_path, &path)?;
        tracing::trace!(key, bytes = value.len(), "saved blob");
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock();

        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
