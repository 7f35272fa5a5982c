// Edupanel
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Persisted key/value storage for session credentials
//!
//! The panel persists exactly two string keys, [`AUTH_TOKEN_KEY`] and
//! [`USER_DATA_KEY`], the way a browser host keeps them in local storage.

use crate::error::{AccessError, AccessResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Key holding the raw credential token
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// Key holding the JSON-serialized user record
pub const USER_DATA_KEY: &str = "userData";

/// String key/value store surviving application restarts
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> AccessResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> AccessResult<()>;

    fn remove(&self, key: &str) -> AccessResult<()>;
}

/// Process-local storage, used by tests and embedded hosts
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RwLock::new(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> AccessResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AccessResult<()> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> AccessResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// Storage backed by a JSON object on disk
///
/// The file is re-read on every access so that separate processes sharing it
/// see each other's writes. Writes go to a sibling temporary file first and
/// are renamed into place. Reads report a corrupt file as an error; writes
/// replace it.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: RwLock<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> AccessResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(None),
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn load(&self) -> AccessResult<BTreeMap<String, String>> {
        match self.read()? {
            Some(content) => serde_json::from_str(&content).map_err(|e| AccessError::Storage {
                message: format!("{} is not a valid storage file: {}", self.path.display(), e),
            }),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Entries to write back, and whether the file was unparseable
    fn load_for_write(&self) -> AccessResult<(BTreeMap<String, String>, bool)> {
        let Some(content) = self.read()? else {
            return Ok((BTreeMap::new(), false));
        };

        match serde_json::from_str(&content) {
            Ok(entries) => Ok((entries, false)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Replacing unparseable storage file");
                Ok((BTreeMap::new(), true))
            }
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> AccessResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_string_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), keys = entries.len(), "Storage file written");
        Ok(())
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> AccessResult<Option<String>> {
        let _guard = self.lock.read();
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> AccessResult<()> {
        let _guard = self.lock.write();
        let (mut entries, _) = self.load_for_write()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> AccessResult<()> {
        let _guard = self.lock.write();
        let (mut entries, corrupt) = self.load_for_write()?;
        if entries.remove(key).is_some() || corrupt {
            self.save(&entries)?;
        }
        Ok(())
    }
}
