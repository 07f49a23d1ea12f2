#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::expect_used, clippy::unwrap_used))]

//! Messages and client for the FossilDB gRPC service.
//!
//! Written against `proto/fossildbapi.proto` with prost derives so the crate
//! builds without `protoc`.

pub mod v1 {
    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct HealthRequest {}

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct HealthReply {
        #[prost(bool, required, tag = "1")]
        pub success: bool,
        #[prost(string, optional, tag = "2")]
        pub error_message: Option<String>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct GetRequest {
        #[prost(string, required, tag = "1")]
        pub collection: String,
        #[prost(string, required, tag = "2")]
        pub key: String,
        /// Latest version when absent.
        #[prost(uint64, optional, tag = "3")]
        pub version: Option<u64>,
        #[prost(bool, optional, tag = "4")]
        pub may_be_empty: Option<bool>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct GetReply {
        #[prost(bool, required, tag = "1")]
        pub success: bool,
        #[prost(string, optional, tag = "2")]
        pub error_message: Option<String>,
        #[prost(bytes = "vec", required, tag = "3")]
        pub value: Vec<u8>,
        #[prost(uint64, required, tag = "4")]
        pub actual_version: u64,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct DeleteRequest {
        #[prost(string, required, tag = "1")]
        pub collection: String,
        #[prost(string, required, tag = "2")]
        pub key: String,
        #[prost(uint64, required, tag = "3")]
        pub version: u64,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct DeleteReply {
        #[prost(bool, required, tag = "1")]
        pub success: bool,
        #[prost(string, optional, tag = "2")]
        pub error_message: Option<String>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ListKeysRequest {
        #[prost(string, required, tag = "1")]
        pub collection: String,
        #[prost(uint32, optional, tag = "2")]
        pub limit: Option<u32>,
        #[prost(string, optional, tag = "3")]
        pub start_after_key: Option<String>,
        #[prost(string, optional, tag = "4")]
        pub prefix: Option<String>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ListKeysReply {
        #[prost(bool, required, tag = "1")]
        pub success: bool,
        #[prost(string, optional, tag = "2")]
        pub error_message: Option<String>,
        #[prost(string, repeated, tag = "3")]
        pub keys: Vec<String>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ListVersionsRequest {
        #[prost(string, required, tag = "1")]
        pub collection: String,
        #[prost(string, required, tag = "2")]
        pub key: String,
        #[prost(uint32, optional, tag = "3")]
        pub limit: Option<u32>,
        #[prost(uint32, optional, tag = "4")]
        pub offset: Option<u32>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ListVersionsReply {
        #[prost(bool, required, tag = "1")]
        pub success: bool,
        #[prost(string, optional, tag = "2")]
        pub error_message: Option<String>,
        #[prost(uint64, repeated, packed = "false", tag = "3")]
        pub versions: Vec<u64>,
    }

    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct BackupRequest {}

    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct BackupInfo {
        #[prost(uint64, required, tag = "1")]
        pub id: u64,
        #[prost(uint64, required, tag = "2")]
        pub timestamp: u64,
        #[prost(uint64, required, tag = "3")]
        pub size: u64,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct BackupReply {
        #[prost(bool, required, tag = "1")]
        pub success: bool,
        #[prost(string, optional, tag = "2")]
        pub error_message: Option<String>,
        #[prost(message, optional, tag = "3")]
        pub backup_info: Option<BackupInfo>,
    }

    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct RestoreFromBackupRequest {}

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct RestoreFromBackupReply {
        #[prost(bool, required, tag = "1")]
        pub success: bool,
        #[prost(string, optional, tag = "2")]
        pub error_message: Option<String>,
    }

    pub mod fossil_db_client {
        use tonic::client::Grpc;
        use tonic::codec::ProstCodec;
        use tonic::codegen::http::uri::PathAndQuery;
        use tonic::transport::Channel;
        use tonic::{IntoRequest, Response, Status};

        use super::*;

        #[derive(Debug, Clone)]
        pub struct FossilDbClient {
            inner: Grpc<Channel>,
        }

        impl FossilDbClient {
            pub fn new(channel: Channel) -> Self {
                Self {
                    inner: Grpc::new(channel),
                }
            }

            pub fn max_decoding_message_size(mut self, limit: usize) -> Self {
                self.inner = self.inner.max_decoding_message_size(limit);
                self
            }

            pub fn max_encoding_message_size(mut self, limit: usize) -> Self {
                self.inner = self.inner.max_encoding_message_size(limit);
                self
            }

            async fn unary<Req, Rep>(
                &mut self,
                path: &'static str,
                request: impl IntoRequest<Req>,
            ) -> Result<Response<Rep>, Status>
            where
                Req: prost::Message + Send + Sync + 'static,
                Rep: prost::Message + Default + Send + Sync + 'static,
            {
                self.inner
                    .ready()
                    .await
                    .map_err(|e| Status::unknown(format!("Service was not ready: {e}")))?;
                let codec = ProstCodec::<Req, Rep>::default();
                self.inner
                    .unary(
                        request.into_request(),
                        PathAndQuery::from_static(path),
                        codec,
                    )
                    .await
            }

            pub async fn health(
                &mut self,
                request: impl IntoRequest<HealthRequest>,
            ) -> Result<Response<HealthReply>, Status> {
                self.unary("/com.scalableminds.fossildb.proto.FossilDB/Health", request)
                    .await
            }

            pub async fn get(
                &mut self,
                request: impl IntoRequest<GetRequest>,
            ) -> Result<Response<GetReply>, Status> {
                self.unary("/com.scalableminds.fossildb.proto.FossilDB/Get", request)
                    .await
            }

            pub async fn delete(
                &mut self,
                request: impl IntoRequest<DeleteRequest>,
            ) -> Result<Response<DeleteReply>, Status> {
                self.unary("/com.scalableminds.fossildb.proto.FossilDB/Delete", request)
                    .await
            }

            pub async fn list_keys(
                &mut self,
                request: impl IntoRequest<ListKeysRequest>,
            ) -> Result<Response<ListKeysReply>, Status> {
                self.unary("/com.scalableminds.fossildb.proto.FossilDB/ListKeys", request)
                    .await
            }

            pub async fn list_versions(
                &mut self,
                request: impl IntoRequest<ListVersionsRequest>,
            ) -> Result<Response<ListVersionsReply>, Status> {
                self.unary(
                    "/com.scalableminds.fossildb.proto.FossilDB/ListVersions",
                    request,
                )
                .await
            }

            pub async fn backup(
                &mut self,
                request: impl IntoRequest<BackupRequest>,
            ) -> Result<Response<BackupReply>, Status> {
                self.unary("/com.scalableminds.fossildb.proto.FossilDB/Backup", request)
                    .await
            }

            pub async fn restore_from_backup(
                &mut self,
                request: impl IntoRequest<RestoreFromBackupRequest>,
            ) -> Result<Response<RestoreFromBackupReply>, Status> {
                self.unary(
                    "/com.scalableminds.fossildb.proto.FossilDB/RestoreFromBackup",
                    request,
                )
                .await
            }
        }
    }
}
