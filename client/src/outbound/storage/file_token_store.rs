//! File-backed session storage.
//!
//! The session is a flat JSON object of string values, e.g.
//! `{"token":"...","role":"admin"}`, kept in one file. Every mutation
//! rewrites the file atomically.

use std::collections::BTreeMap;
use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use tracing::debug;

use super::atomic_io::replace_file;
use crate::domain::ports::{TokenStore, TokenStoreError};

type Entries = BTreeMap<String, String>;

/// [`TokenStore`] persisting the session to a JSON file.
#[derive(Debug)]
pub struct FileTokenStore {
    dir: Dir,
    file_name: Utf8PathBuf,
    display_path: Utf8PathBuf,
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    /// Open the store at `path`, creating its parent directory if needed.
    ///
    /// The file itself is created on the first write.
    ///
    /// # Errors
    ///
    /// Returns [`TokenStoreError::Unavailable`] when `path` has no file name
    /// or its directory cannot be opened.
    pub fn open(path: &Utf8Path) -> Result<Self, TokenStoreError> {
        let file_name = path.file_name().ok_or_else(|| {
            TokenStoreError::unavailable(format!("session path {path} has no file name"))
        })?;
        let parent = match path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent,
            _ => Utf8Path::new("."),
        };
        Dir::create_ambient_dir_all(parent, ambient_authority())
            .map_err(|error| unavailable(path, &error))?;
        let dir = Dir::open_ambient_dir(parent, ambient_authority())
            .map_err(|error| unavailable(path, &error))?;
        Ok(Self {
            dir,
            file_name: Utf8PathBuf::from(file_name),
            display_path: path.to_path_buf(),
            write_lock: Mutex::new(()),
        })
    }

    /// Location of the session file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.display_path
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn load(&self) -> Result<Entries, TokenStoreError> {
        let raw = match self.dir.read_to_string(&self.file_name) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(error) => return Err(unavailable(&self.display_path, &error)),
        };
        if raw.trim().is_empty() {
            return Ok(Entries::new());
        }
        serde_json::from_str(&raw).map_err(|error| {
            TokenStoreError::corrupt(format!("{}: {error}", self.display_path))
        })
    }

    fn save(&self, entries: &Entries) -> Result<(), TokenStoreError> {
        let encoded = serde_json::to_vec_pretty(entries).map_err(|error| {
            TokenStoreError::corrupt(format!("{}: {error}", self.display_path))
        })?;
        replace_file(&self.dir, &self.file_name, &encoded)
            .map_err(|error| unavailable(&self.display_path, &error))?;
        debug!(path = %self.display_path, keys = entries.len(), "session file written");
        Ok(())
    }

    fn update(&self, mutate: impl FnOnce(&mut Entries) -> bool) -> Result<(), TokenStoreError> {
        let _guard = self.lock();
        let mut entries = self.load()?;
        if mutate(&mut entries) {
            self.save(&entries)?;
        }
        Ok(())
    }
}

fn unavailable(path: &Utf8Path, error: &io::Error) -> TokenStoreError {
    TokenStoreError::unavailable(format!("{path}: {error}"))
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>, TokenStoreError> {
        let _guard = self.lock();
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), TokenStoreError> {
        self.update(|entries| {
            entries.insert(key.to_owned(), value.to_owned()).as_deref() != Some(value)
        })
    }

    fn remove(&self, key: &str) -> Result<(), TokenStoreError> {
        self.update(|entries| entries.remove(key).is_some())
    }
}
