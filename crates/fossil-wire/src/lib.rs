#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::expect_used, clippy::unwrap_used))]

use fossil_core::types as core;
use fossil_proto::v1 as wire;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("{field} must be non-empty")]
    EmptyField { field: &'static str },
    #[error("{field} is required")]
    MissingField { field: &'static str },
    /// The server answered with `success = false`.
    #[error("server reported failure: {message}")]
    Rejected { message: String },
}

fn non_empty(field: &'static str, value: &str) -> Result<(), ConvertError> {
    if value.trim().is_empty() {
        return Err(ConvertError::EmptyField { field });
    }
    Ok(())
}

/// Every FossilDB reply starts with `success` and an optional `errorMessage`.
pub trait Reply {
    fn success(&self) -> bool;
    fn error_message(&self) -> Option<&str>;

    fn check(&self) -> Result<(), ConvertError> {
        if self.success() {
            return Ok(());
        }
        Err(ConvertError::Rejected {
            message: self
                .error_message()
                .filter(|m| !m.is_empty())
                .unwrap_or("no error message")
                .to_string(),
        })
    }
}

macro_rules! impl_reply {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Reply for $ty {
                fn success(&self) -> bool {
                    self.success
                }

                fn error_message(&self) -> Option<&str> {
                    self.error_message.as_deref()
                }
            }
        )*
    };
}

impl_reply!(
    wire::HealthReply,
    wire::GetReply,
    wire::DeleteReply,
    wire::ListKeysReply,
    wire::ListVersionsReply,
    wire::BackupReply,
    wire::RestoreFromBackupReply,
);

pub trait TryToWire<T> {
    type Error;
    fn try_to_wire(&self) -> Result<T, Self::Error>;
}

pub trait TryToCore<T> {
    type Error;
    fn try_to_core(&self) -> Result<T, Self::Error>;
}

impl TryToWire<wire::ListKeysRequest> for core::KeyQuery {
    type Error = ConvertError;

    fn try_to_wire(&self) -> Result<wire::ListKeysRequest, ConvertError> {
        non_empty("collection", &self.collection)?;
        Ok(wire::ListKeysRequest {
            collection: self.collection.clone(),
            limit: Some(self.limit),
            start_after_key: self.start_after.clone().filter(|k| !k.is_empty()),
            prefix: self.prefix.clone().filter(|p| !p.is_empty()),
        })
    }
}

impl TryToWire<wire::ListVersionsRequest> for core::CollectionKey {
    type Error = ConvertError;

    fn try_to_wire(&self) -> Result<wire::ListVersionsRequest, ConvertError> {
        non_empty("collection", &self.collection)?;
        non_empty("key", &self.key)?;
        Ok(wire::ListVersionsRequest {
            collection: self.collection.clone(),
            key: self.key.clone(),
            limit: None,
            offset: None,
        })
    }
}

/// A key plus an optional version; `None` asks for the latest.
impl TryToWire<wire::GetRequest> for (&core::CollectionKey, Option<u64>) {
    type Error = ConvertError;

    fn try_to_wire(&self) -> Result<wire::GetRequest, ConvertError> {
        let (ck, version) = self;
        non_empty("collection", &ck.collection)?;
        non_empty("key", &ck.key)?;
        Ok(wire::GetRequest {
            collection: ck.collection.clone(),
            key: ck.key.clone(),
            version: *version,
            may_be_empty: None,
        })
    }
}

impl TryToWire<wire::DeleteRequest> for (&core::CollectionKey, u64) {
    type Error = ConvertError;

    fn try_to_wire(&self) -> Result<wire::DeleteRequest, ConvertError> {
        let (ck, version) = self;
        non_empty("collection", &ck.collection)?;
        non_empty("key", &ck.key)?;
        Ok(wire::DeleteRequest {
            collection: ck.collection.clone(),
            key: ck.key.clone(),
            version: *version,
        })
    }
}

impl TryToCore<core::VersionedValue> for wire::GetReply {
    type Error = ConvertError;

    fn try_to_core(&self) -> Result<core::VersionedValue, ConvertError> {
        self.check()?;
        Ok(core::VersionedValue {
            version: self.actual_version,
            value: self.value.clone(),
        })
    }
}

impl TryToCore<Vec<String>> for wire::ListKeysReply {
    type Error = ConvertError;

    fn try_to_core(&self) -> Result<Vec<String>, ConvertError> {
        self.check()?;
        Ok(self.keys.clone())
    }
}

/// Versions come back in server order; callers sort if they need to.
impl TryToCore<Vec<u64>> for wire::ListVersionsReply {
    type Error = ConvertError;

    fn try_to_core(&self) -> Result<Vec<u64>, ConvertError> {
        self.check()?;
        Ok(self.versions.clone())
    }
}

impl TryToCore<core::BackupInfo> for wire::BackupReply {
    type Error = ConvertError;

    fn try_to_core(&self) -> Result<core::BackupInfo, ConvertError> {
        self.check()?;
        let info = self
            .backup_info
            .as_ref()
            .ok_or(ConvertError::MissingField {
                field: "backup_info",
            })?;
        Ok(core::BackupInfo {
            id: info.id,
            timestamp: info.timestamp,
            size_bytes: info.size,
        })
    }
}
