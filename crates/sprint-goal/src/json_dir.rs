// json_dir.rs — One-JSON-file-per-document directory.
//
// Shared by the goal and profile stores: `<dir>/<key>.json`. Keys are
// restricted to ASCII alphanumerics, '-' and '_' so a caller-supplied id can
// never name a path outside the directory. Writes go to a temp file first and
// are renamed into place, so a reader never sees a half-written document.
//
// Read-check-write sequences take `lock()`, an exclusive advisory lock on
// `<dir>/.lock`. It is an OS lock on a file, so it also excludes other
// processes (and other handles in this process) working on the same
// directory.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::SprintError;

const LOCK_FILE: &str = ".lock";

pub(crate) struct JsonDir {
    dir: PathBuf,
}

/// Held while a store reads, checks and writes. Released on drop.
pub(crate) struct DirLock {
    file: File,
}

impl Drop for DirLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

impl JsonDir {
    /// Open (and create if needed) the backing directory.
    pub(crate) fn open(dir: impl AsRef<Path>) -> Result<Self, SprintError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| SprintError::io(dir.display(), source))?;
        Ok(Self { dir })
    }

    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }

    /// Block until the directory's write lock is held.
    pub(crate) fn lock(&self) -> Result<DirLock, SprintError> {
        let path = self.dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| SprintError::io(path.display(), source))?;
        FileExt::lock_exclusive(&file)
            .map_err(|source| SprintError::io(path.display(), source))?;
        Ok(DirLock { file })
    }

    fn file(&self, key: &str) -> Option<PathBuf> {
        let safe = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        safe.then(|| self.dir.join(format!("{}.json", key)))
    }

    pub(crate) fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, SprintError> {
        let Some(path) = self.file(key) else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        let json =
            fs::read_to_string(&path).map_err(|source| SprintError::io(path.display(), source))?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    pub(crate) fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), SprintError> {
        let path = self.file(key).ok_or_else(|| {
            SprintError::io(
                key,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "unsafe document key"),
            )
        })?;
        let json = serde_json::to_string_pretty(value)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|source| SprintError::io(tmp.display(), source))?;
        if let Err(source) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(SprintError::io(path.display(), source));
        }
        tracing::debug!(path = %path.display(), "wrote document");
        Ok(())
    }

    pub(crate) fn remove(&self, key: &str) -> Result<bool, SprintError> {
        let Some(path) = self.file(key) else {
            return Ok(false);
        };
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).map_err(|source| SprintError::io(path.display(), source))?;
        Ok(true)
    }

    /// Every parseable document in the directory. Unreadable files are
    /// skipped with a warning.
    pub(crate) fn list<T: DeserializeOwned>(&self) -> Result<Vec<T>, SprintError> {
        let entries =
            fs::read_dir(&self.dir).map_err(|source| SprintError::io(self.dir.display(), source))?;

        let mut docs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| SprintError::io(self.dir.display(), source))?;
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            let json = fs::read_to_string(&path)
                .map_err(|source| SprintError::io(path.display(), source))?;
            match serde_json::from_str::<T>(&json) {
                Ok(doc) => docs.push(doc),
                Err(e) => tracing::warn!(path = %path.display(), "skipping unreadable document: {}", e),
            }
        }
        Ok(docs)
    }
}
