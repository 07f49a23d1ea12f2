use std::sync::Arc;

use fossil_core::types::{BackupInfo, CollectionKey, KeyQuery, VersionedValue};
use fossil_observe::metrics::RpcStats;
use fossil_proto::v1::fossil_db_client::FossilDbClient;
use fossil_proto::v1::{BackupRequest, HealthRequest, RestoreFromBackupRequest};
use fossil_wire::{Reply, TryToCore, TryToWire};
use tonic::transport::Channel;
use tracing::{debug, warn};

use crate::{KeyValueStore, StoreError, DEFAULT_MAX_MESSAGE_BYTES};

#[derive(Debug, Clone)]
pub struct GrpcStoreConfig {
    /// e.g. `http://localhost:7155`
    pub url: String,
    pub max_message_bytes: usize,
}

impl GrpcStoreConfig {
    pub fn from_host_port(address: &str, port: u16) -> Self {
        let url = if address.contains("://") {
            format!("{address}:{port}")
        } else {
            format!("http://{address}:{port}")
        };
        Self {
            url,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GrpcStore {
    client: FossilDbClient,
    stats: Arc<RpcStats>,
}

impl GrpcStore {
    pub async fn connect(cfg: &GrpcStoreConfig) -> Result<Self, StoreError> {
        let channel = Channel::from_shared(cfg.url.clone())
            .map_err(|e| StoreError::InvalidEndpoint(format!("{}: {e}", cfg.url)))?
            .connect()
            .await?;
        Ok(Self::from_channel(channel, cfg.max_message_bytes))
    }

    pub fn from_channel(channel: Channel, max_message_bytes: usize) -> Self {
        let client = FossilDbClient::new(channel)
            .max_decoding_message_size(max_message_bytes)
            .max_encoding_message_size(max_message_bytes);
        Self {
            client,
            stats: Arc::new(RpcStats::default()),
        }
    }

    /// Shared with whoever displays them; updated on every call.
    pub fn stats(&self) -> Arc<RpcStats> {
        self.stats.clone()
    }
}

fn logged<T>(rpc: &'static str, res: Result<T, StoreError>) -> Result<T, StoreError> {
    match &res {
        Ok(_) => debug!(rpc, "rpc ok"),
        Err(err) => warn!(rpc, error = %err, "rpc failed"),
    }
    res
}

fn status(rpc: &'static str) -> impl FnOnce(tonic::Status) -> StoreError {
    move |source| StoreError::Rpc { rpc, source }
}

fn convert(rpc: &'static str) -> impl FnOnce(fossil_wire::ConvertError) -> StoreError {
    move |err| StoreError::from_convert(rpc, err)
}

impl KeyValueStore for GrpcStore {
    async fn health(&mut self) -> Result<(), StoreError> {
        const RPC: &str = "Health";
        let timer = self.stats.start();
        let res = self
            .client
            .health(HealthRequest {})
            .await
            .map_err(status(RPC))
            .and_then(|reply| reply.into_inner().check().map_err(convert(RPC)));
        timer.finish(res.is_ok());
        logged(RPC, res)
    }

    async fn list_keys(&mut self, query: &KeyQuery) -> Result<Vec<String>, StoreError> {
        const RPC: &str = "ListKeys";
        query.validate()?;
        let req = query.try_to_wire().map_err(convert(RPC))?;
        let timer = self.stats.start();
        let res = self
            .client
            .list_keys(req)
            .await
            .map_err(status(RPC))
            .and_then(|reply| reply.into_inner().try_to_core().map_err(convert(RPC)));
        timer.finish(res.is_ok());
        logged(RPC, res)
    }

    async fn list_versions(&mut self, key: &CollectionKey) -> Result<Vec<u64>, StoreError> {
        const RPC: &str = "ListVersions";
        key.validate()?;
        let req = key.try_to_wire().map_err(convert(RPC))?;
        let timer = self.stats.start();
        let res = self
            .client
            .list_versions(req)
            .await
            .map_err(status(RPC))
            .and_then(|reply| reply.into_inner().try_to_core().map_err(convert(RPC)));
        timer.finish(res.is_ok());
        logged(RPC, res)
    }

    async fn get(
        &mut self,
        key: &CollectionKey,
        version: Option<u64>,
    ) -> Result<VersionedValue, StoreError> {
        const RPC: &str = "Get";
        key.validate()?;
        let req = (key, version).try_to_wire().map_err(convert(RPC))?;
        let timer = self.stats.start();
        let res = self
            .client
            .get(req)
            .await
            .map_err(status(RPC))
            .and_then(|reply| reply.into_inner().try_to_core().map_err(convert(RPC)));
        timer.finish(res.is_ok());
        logged(RPC, res)
    }

    async fn delete_version(
        &mut self,
        key: &CollectionKey,
        version: u64,
    ) -> Result<(), StoreError> {
        const RPC: &str = "Delete";
        key.validate()?;
        let req = (key, version).try_to_wire().map_err(convert(RPC))?;
        let timer = self.stats.start();
        let res = self
            .client
            .delete(req)
            .await
            .map_err(status(RPC))
            .and_then(|reply| reply.into_inner().check().map_err(convert(RPC)));
        timer.finish(res.is_ok());
        logged(RPC, res)
    }

    async fn backup(&mut self) -> Result<BackupInfo, StoreError> {
        const RPC: &str = "Backup";
        let timer = self.stats.start();
        let res = self
            .client
            .backup(BackupRequest {})
            .await
            .map_err(status(RPC))
            .and_then(|reply| reply.into_inner().try_to_core().map_err(convert(RPC)));
        timer.finish(res.is_ok());
        logged(RPC, res)
    }

    async fn restore_from_backup(&mut self) -> Result<(), StoreError> {
        const RPC: &str = "RestoreFromBackup";
        let timer = self.stats.start();
        let res = self
            .client
            .restore_from_backup(RestoreFromBackupRequest {})
            .await
            .map_err(status(RPC))
            .and_then(|reply| reply.into_inner().check().map_err(convert(RPC)));
        timer.finish(res.is_ok());
        logged(RPC, res)
    }
}
