//! Local key-value storage implementations.
//!
//! [`MemoryStorage`] keeps items in a map and can be switched to a failing
//! mode to exercise best-effort callers. [`FileStorage`] keeps every item in a
//! single JSON object on disk so values survive a restart.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::errors::AdapterError;
use crate::LocalStorage;

#[derive(Default)]
struct MemoryItems {
    items: HashMap<String, String>,
    unavailable: bool,
}

#[derive(Default)]
pub struct MemoryStorage {
    inner: Mutex<MemoryItems>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// While unavailable, every call fails like a full or blocked store.
    pub fn set_available(&self, available: bool) {
        self.lock().unavailable = !available;
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, MemoryItems> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn checked(&self) -> Result<MutexGuard<'_, MemoryItems>, AdapterError> {
        let guard = self.lock();
        if guard.unavailable {
            return Err(AdapterError::Storage("storage unavailable".to_owned()));
        }
        Ok(guard)
    }
}

impl LocalStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, AdapterError> {
        Ok(self.checked()?.items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), AdapterError> {
        self.checked()?
            .items
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), AdapterError> {
        self.checked()?.items.remove(key);
        Ok(())
    }
}

/// Storage backed by one JSON file holding a string-to-string object.
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles on the file.
    guard: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, AdapterError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn write_all(&self, items: &BTreeMap<String, String>) -> Result<(), AdapterError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(items)?)?;
        Ok(())
    }

    fn modify(
        &self,
        apply: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), AdapterError> {
        let _lock = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let mut items = self.read_all()?;
        apply(&mut items);
        self.write_all(&items)
    }
}

impl LocalStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, AdapterError> {
        let _lock = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_all()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), AdapterError> {
        self.modify(|items| {
            items.insert(key.to_owned(), value.to_owned());
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), AdapterError> {
        self.modify(|items| {
            items.remove(key);
        })
    }
}
