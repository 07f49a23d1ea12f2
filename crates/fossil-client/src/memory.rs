use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use fossil_core::types::{BackupInfo, CollectionKey, KeyQuery, VersionedValue};

use crate::{KeyValueStore, StoreError};

type Versions = BTreeMap<u64, Vec<u8>>;
type Collections = BTreeMap<String, BTreeMap<String, Versions>>;

/// In-process store with FossilDB's listing and versioning rules.
///
/// Failures are reported the way the server reports them: as rejected replies.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    data: Collections,
    backups: Vec<(BackupInfo, Collections)>,
    unhealthy: Option<String>,
    get_calls: u64,
}

fn rejected(rpc: &'static str, message: impl Into<String>) -> StoreError {
    StoreError::Rejected {
        rpc,
        message: message.into(),
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, collection: &str, key: &str, version: u64, value: impl Into<Vec<u8>>) {
        self.data
            .entry(collection.to_string())
            .or_default()
            .entry(key.to_string())
            .or_default()
            .insert(version, value.into());
    }

    /// Makes `health` fail with `message` until cleared with `None`.
    pub fn set_unhealthy(&mut self, message: Option<&str>) {
        self.unhealthy = message.map(str::to_string);
    }

    /// Number of `get` calls served so far.
    pub fn get_calls(&self) -> u64 {
        self.get_calls
    }

    fn versions(&self, key: &CollectionKey) -> Option<&Versions> {
        self.data.get(&key.collection)?.get(&key.key)
    }

    fn size_bytes(&self) -> u64 {
        self.data
            .values()
            .flat_map(BTreeMap::values)
            .flat_map(BTreeMap::values)
            .map(|v| v.len() as u64)
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    async fn health(&mut self) -> Result<(), StoreError> {
        match &self.unhealthy {
            Some(message) => Err(rejected("Health", message.clone())),
            None => Ok(()),
        }
    }

    async fn list_keys(&mut self, query: &KeyQuery) -> Result<Vec<String>, StoreError> {
        query.validate()?;
        let Some(keys) = self.data.get(&query.collection) else {
            return Ok(Vec::new());
        };
        Ok(keys
            .keys()
            .filter(|k| query.matches(k))
            .take(query.limit as usize)
            .cloned()
            .collect())
    }

    async fn list_versions(&mut self, key: &CollectionKey) -> Result<Vec<u64>, StoreError> {
        key.validate()?;
        Ok(self
            .versions(key)
            .map(|v| v.keys().rev().copied().collect())
            .unwrap_or_default())
    }

    async fn get(
        &mut self,
        key: &CollectionKey,
        version: Option<u64>,
    ) -> Result<VersionedValue, StoreError> {
        key.validate()?;
        self.get_calls += 1;
        let versions = self
            .versions(key)
            .ok_or_else(|| rejected("Get", format!("no entry for {}", key.key)))?;
        let found = match version {
            Some(v) => versions.get_key_value(&v),
            None => versions.last_key_value(),
        };
        let (version, value) = found.ok_or_else(|| {
            rejected("Get", format!("no version {version:?} for {}", key.key))
        })?;
        Ok(VersionedValue {
            version: *version,
            value: value.clone(),
        })
    }

    async fn delete_version(
        &mut self,
        key: &CollectionKey,
        version: u64,
    ) -> Result<(), StoreError> {
        key.validate()?;
        let Some(keys) = self.data.get_mut(&key.collection) else {
            return Ok(());
        };
        if let Some(versions) = keys.get_mut(&key.key) {
            versions.remove(&version);
            if versions.is_empty() {
                keys.remove(&key.key);
            }
        }
        Ok(())
    }

    async fn backup(&mut self) -> Result<BackupInfo, StoreError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis()
            .min(u64::MAX as u128) as u64;
        let info = BackupInfo {
            id: self.backups.len() as u64,
            timestamp,
            size_bytes: self.size_bytes(),
        };
        self.backups.push((info, self.data.clone()));
        Ok(info)
    }

    async fn restore_from_backup(&mut self) -> Result<(), StoreError> {
        let (_, data) = self
            .backups
            .last()
            .ok_or_else(|| rejected("RestoreFromBackup", "no backup available"))?;
        self.data = data.clone();
        Ok(())
    }
}
