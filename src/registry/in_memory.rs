use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{ConfigRegistry, RegistryEntry, RegistryError, Versioned};

/// In-memory registry backed by `Arc<RwLock<HashMap>>`.
///
/// Clone-friendly: clones share the same storage, so the build step and
/// any number of sessions can hold one each.
#[derive(Clone, Default)]
pub struct InMemoryRegistry {
    entries: Arc<RwLock<HashMap<String, Versioned<RegistryEntry>>>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish entries from a JSON object keyed by repository name, the shape
    /// [`InMemoryRegistry::to_json`] produces.
    pub fn publish_json(&self, json: &str) -> Result<usize, RegistryError> {
        let entries: HashMap<String, RegistryEntry> = serde_json::from_str(json)?;
        let count = entries.len();
        for (_, entry) in entries {
            self.publish(entry)?;
        }
        Ok(count)
    }

    /// Export every entry as a JSON object keyed by repository name.
    pub fn to_json(&self) -> Result<String, RegistryError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| RegistryError::LockPoisoned("read"))?;
        let plain: HashMap<&str, &RegistryEntry> = entries
            .iter()
            .map(|(name, versioned)| (name.as_str(), &versioned.data))
            .collect();
        Ok(serde_json::to_string(&plain)?)
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ConfigRegistry for InMemoryRegistry {
    fn lookup(&self, repository: &str) -> Result<Option<Versioned<RegistryEntry>>, RegistryError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| RegistryError::LockPoisoned("read"))?;
        Ok(entries.get(repository).cloned())
    }

    fn publish(&self, entry: RegistryEntry) -> Result<Versioned<RegistryEntry>, RegistryError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| RegistryError::LockPoisoned("write"))?;

        let key = entry.repository_name().to_string();
        let version = entries.get(&key).map(|v| v.version + 1).unwrap_or(1);
        let versioned = Versioned {
            data: entry,
            version,
        };
        entries.insert(key, versioned.clone());
        Ok(versioned)
    }
}
