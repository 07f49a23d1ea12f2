use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default page size for key listings.
pub const DEFAULT_KEY_PAGE_SIZE: u32 = 20;

/// Collection the interactive client opens when none is given.
pub const DEFAULT_COLLECTION: &str = "volumeData";

/// Addresses one key inside one collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionKey {
    pub collection: String,
    pub key: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("collection must be non-empty")]
    EmptyCollection,
    #[error("key must be non-empty")]
    EmptyKey,
    #[error("limit must be > 0")]
    ZeroLimit,
}

impl CollectionKey {
    pub fn new(collection: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            key: key.into(),
        }
    }

    pub fn validate(&self) -> Result<(), KeyError> {
        if self.collection.trim().is_empty() {
            return Err(KeyError::EmptyCollection);
        }
        if self.key.trim().is_empty() {
            return Err(KeyError::EmptyKey);
        }
        Ok(())
    }

    /// File name used when a version of this key is saved locally.
    pub fn version_file_name(&self, version: u64) -> String {
        format!("{}_{}_{}.bin", self.collection, self.key, version)
    }
}

/// One stored value together with the version the server answered with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedValue {
    pub version: u64,
    pub value: Vec<u8>,
}

/// One page of a key listing.
///
/// `start_after` is exclusive; an empty string means "from the beginning".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyQuery {
    pub collection: String,
    pub start_after: Option<String>,
    pub prefix: Option<String>,
    pub limit: u32,
}

impl KeyQuery {
    pub fn first_page(collection: impl Into<String>, limit: u32) -> Self {
        Self {
            collection: collection.into(),
            start_after: None,
            prefix: None,
            limit,
        }
    }

    /// The query for the page that follows a page ending in `last_key`.
    pub fn next_page(&self, last_key: &str) -> Self {
        Self {
            start_after: Some(last_key.to_string()),
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), KeyError> {
        if self.collection.trim().is_empty() {
            return Err(KeyError::EmptyCollection);
        }
        if self.limit == 0 {
            return Err(KeyError::ZeroLimit);
        }
        Ok(())
    }

    /// Whether `key` belongs to this page, ignoring `limit`.
    pub fn matches(&self, key: &str) -> bool {
        let after = self
            .start_after
            .as_deref()
            .filter(|s| !s.is_empty())
            .is_none_or(|start| key > start);
        let prefixed = self
            .prefix
            .as_deref()
            .is_none_or(|prefix| key.starts_with(prefix));
        after && prefixed
    }
}

/// Metadata of a server-side backup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupInfo {
    pub id: u64,
    /// Backup creation time in Unix milliseconds.
    pub timestamp: u64,
    pub size_bytes: u64,
}
