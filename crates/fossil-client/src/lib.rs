#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::expect_used, clippy::unwrap_used))]

pub mod grpc;
pub mod memory;

use fossil_core::types::{BackupInfo, CollectionKey, KeyQuery, KeyError, VersionedValue};
use fossil_wire::ConvertError;
use thiserror::Error;

pub use grpc::{GrpcStore, GrpcStoreConfig};
pub use memory::MemoryStore;

/// Matches the original tooling, which raised gRPC limits to 1 GiB.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 1 << 30;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] KeyError),
    #[error("{rpc} rejected: {message}")]
    Rejected { rpc: &'static str, message: String },
    #[error("{rpc} reply incomplete: {source}")]
    Malformed {
        rpc: &'static str,
        source: ConvertError,
    },
    #[error("{rpc} failed: {source}")]
    Rpc {
        rpc: &'static str,
        source: tonic::Status,
    },
    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl StoreError {
    pub(crate) fn from_convert(rpc: &'static str, err: ConvertError) -> Self {
        match err {
            ConvertError::Rejected { message } => StoreError::Rejected { rpc, message },
            other => StoreError::Malformed { rpc, source: other },
        }
    }
}

/// Operations the operator tools need from a FossilDB server.
///
/// Implementations are driven from one UI task, so methods take `&mut self`
/// and futures are not required to be `Send`.
#[allow(async_fn_in_trait)]
pub trait KeyValueStore {
    async fn health(&mut self) -> Result<(), StoreError>;

    /// One page of keys, in server order.
    async fn list_keys(&mut self, query: &KeyQuery) -> Result<Vec<String>, StoreError>;

    async fn list_versions(&mut self, key: &CollectionKey) -> Result<Vec<u64>, StoreError>;

    /// The value at `version`, or the latest value when `version` is `None`.
    async fn get(
        &mut self,
        key: &CollectionKey,
        version: Option<u64>,
    ) -> Result<VersionedValue, StoreError>;

    async fn delete_version(&mut self, key: &CollectionKey, version: u64)
        -> Result<(), StoreError>;

    async fn backup(&mut self) -> Result<BackupInfo, StoreError>;

    async fn restore_from_backup(&mut self) -> Result<(), StoreError>;
}

/// Versions of `key` sorted ascending with duplicates removed.
pub async fn sorted_versions<S: KeyValueStore>(
    store: &mut S,
    key: &CollectionKey,
) -> Result<Vec<u64>, StoreError> {
    let mut versions = store.list_versions(key).await?;
    versions.sort_unstable();
    versions.dedup();
    Ok(versions)
}
