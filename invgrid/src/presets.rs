use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageResult;
use crate::{FilterState, PresetStorage};

/// A named snapshot of a [`FilterState`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterPreset {
    pub name: String,
    pub filters: FilterState,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_default: bool,
}

/// A user's saved filter presets. At most one preset is marked default.
#[derive(Debug)]
pub struct PresetBook<S> {
    presets: Vec<FilterPreset>,
    storage: S,
    user_key: String,
}

impl<S: PresetStorage> PresetBook<S> {
    /// Loads the presets for `user_key`. Unreadable storage yields an empty book; extra default
    /// flags are cleared, keeping the first.
    pub fn load(storage: S, user_key: impl Into<String>) -> Self {
        let user_key = user_key.into();
        let mut presets = match storage.load_filter_presets(&user_key) {
            Ok(Some(presets)) => presets,
            Ok(None) => Vec::new(),
            Err(_err) => {
                gwarn!(user_key = %user_key, error = %_err, "filter presets unreadable; starting empty");
                Vec::new()
            }
        };

        let mut seen_default = false;
        for p in &mut presets {
            if p.is_default {
                if seen_default {
                    gwarn!(name = %p.name, "clearing extra default preset flag");
                    p.is_default = false;
                }
                seen_default = true;
            }
        }

        Self {
            presets,
            storage,
            user_key,
        }
    }

    pub fn list(&self) -> &[FilterPreset] {
        &self.presets
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&FilterPreset> {
        self.presets.iter().find(|p| p.name == name)
    }

    pub fn default_preset(&self) -> Option<&FilterPreset> {
        self.presets.iter().find(|p| p.is_default)
    }

    /// Saves `filters` under `name`, replacing an existing preset of that name (its default flag
    /// is kept). Blank names are ignored and return `Ok(false)`.
    pub fn save(
        &mut self,
        name: &str,
        filters: &FilterState,
        created_at: DateTime<Utc>,
    ) -> StorageResult<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(false);
        }
        match self.presets.iter_mut().find(|p| p.name == name) {
            Some(p) => {
                p.filters = filters.clone();
                p.created_at = created_at;
            }
            None => self.presets.push(FilterPreset {
                name: name.to_owned(),
                filters: filters.clone(),
                created_at,
                is_default: false,
            }),
        }
        self.persist()?;
        Ok(true)
    }

    pub fn delete(&mut self, name: &str) -> StorageResult<bool> {
        let before = self.presets.len();
        self.presets.retain(|p| p.name != name);
        if self.presets.len() == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// Marks `name` as the default preset, clearing the flag everywhere else.
    pub fn set_default(&mut self, name: &str) -> StorageResult<bool> {
        if self.get(name).is_none() {
            return Ok(false);
        }
        for p in &mut self.presets {
            p.is_default = p.name == name;
        }
        self.persist()?;
        Ok(true)
    }

    pub fn clear_default(&mut self) -> StorageResult<()> {
        if self.default_preset().is_none() {
            return Ok(());
        }
        for p in &mut self.presets {
            p.is_default = false;
        }
        self.persist()
    }

    fn persist(&self) -> StorageResult<()> {
        self.storage
            .save_filter_presets(&self.user_key, &self.presets)
    }
}
