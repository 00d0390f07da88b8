//! Persistence ports for per-user client state.
//!
//! The engine never talks to a concrete storage API. Column layouts and filter presets go through
//! [`LayoutStorage`] / [`PresetStorage`]; [`JsonStorage`] implements both on top of any string
//! key/value store (browser `localStorage`, a file, or [`MemoryStorage`] in tests).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{StorageError, StorageResult};
use crate::{FilterPreset, StoredColumn};

/// A synchronous string key/value store.
pub trait KeyValueStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;
    fn remove_item(&self, key: &str) -> StorageResult<()>;
}

impl<T: KeyValueStorage + ?Sized> KeyValueStorage for &T {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        (**self).remove_item(key)
    }
}

impl<T: KeyValueStorage + ?Sized> KeyValueStorage for Rc<T> {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        (**self).remove_item(key)
    }
}

/// In-memory [`KeyValueStorage`].
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RefCell<HashMap<String, String>>,
    read_only: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes fail, e.g. to model a full or disabled `localStorage`.
    pub fn read_only() -> Self {
        Self {
            entries: RefCell::default(),
            read_only: true,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.borrow_mut().insert(key.into(), value.into());
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.raw(key))
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        if self.read_only {
            return Err(StorageError::Backend("storage is read-only".to_owned()));
        }
        self.insert_raw(key, value);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        if self.read_only {
            return Err(StorageError::Backend("storage is read-only".to_owned()));
        }
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Durable per-user column layout port.
pub trait LayoutStorage {
    fn load_column_layout(&self, user_key: &str) -> StorageResult<Option<Vec<StoredColumn>>>;
    fn save_column_layout(&self, user_key: &str, columns: &[StoredColumn]) -> StorageResult<()>;
    fn clear_column_layout(&self, user_key: &str) -> StorageResult<()>;
}

/// Durable per-user filter preset port.
pub trait PresetStorage {
    fn load_filter_presets(&self, user_key: &str) -> StorageResult<Option<Vec<FilterPreset>>>;
    fn save_filter_presets(&self, user_key: &str, presets: &[FilterPreset]) -> StorageResult<()>;
}

/// JSON encoding of the persistence ports over a [`KeyValueStorage`].
#[derive(Clone, Debug)]
pub struct JsonStorage<S> {
    backend: S,
    namespace: String,
}

impl<S> JsonStorage<S> {
    pub fn new(backend: S) -> Self {
        Self::with_namespace(backend, "invgrid")
    }

    pub fn with_namespace(backend: S, namespace: impl Into<String>) -> Self {
        Self {
            backend,
            namespace: namespace.into(),
        }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn layout_key(&self, user_key: &str) -> String {
        format!("{}:column-layout:{user_key}", self.namespace)
    }

    pub fn presets_key(&self, user_key: &str) -> String {
        format!("{}:filter-presets:{user_key}", self.namespace)
    }
}

impl<S: KeyValueStorage> JsonStorage<S> {
    fn read<T: serde::de::DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        let Some(raw) = self.backend.get_item(key)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn write<T: serde::Serialize + ?Sized>(&self, key: &str, value: &T) -> StorageResult<()> {
        let raw = serde_json::to_string(value)?;
        self.backend.set_item(key, &raw)
    }
}

impl<S: KeyValueStorage> LayoutStorage for JsonStorage<S> {
    fn load_column_layout(&self, user_key: &str) -> StorageResult<Option<Vec<StoredColumn>>> {
        self.read(&self.layout_key(user_key))
    }

    fn save_column_layout(&self, user_key: &str, columns: &[StoredColumn]) -> StorageResult<()> {
        self.write(&self.layout_key(user_key), columns)
    }

    fn clear_column_layout(&self, user_key: &str) -> StorageResult<()> {
        self.backend.remove_item(&self.layout_key(user_key))
    }
}

impl<S: KeyValueStorage> PresetStorage for JsonStorage<S> {
    fn load_filter_presets(&self, user_key: &str) -> StorageResult<Option<Vec<FilterPreset>>> {
        self.read(&self.presets_key(user_key))
    }

    fn save_filter_presets(&self, user_key: &str, presets: &[FilterPreset]) -> StorageResult<()> {
        self.write(&self.presets_key(user_key), presets)
    }
}
