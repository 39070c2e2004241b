//! gRPC client for the build service.

use async_trait::async_trait;
use tonic::codec::Streaming;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::transport::{Channel, Endpoint};

use crate::config::ClientConfig;
use crate::dispatch::{BuildService, MessageStream};
use crate::error::{BuildError, Result};
use crate::request::BuildRequest;

#[path = "proto/pb.rs"]
pub mod pb;

pub use pb::core_rpc_client::CoreRpcClient;

/// [`BuildService`] backed by the `CoreRPC.BuildImage` call.
pub struct GrpcBuildService {
    client: CoreRpcClient<Channel>,
    credentials: Option<(String, String)>,
}

impl GrpcBuildService {
    /// Connect to the endpoint in `config`.
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let channel = Endpoint::from_shared(config.endpoint.clone())?
            .connect_timeout(config.connect_timeout())
            .connect()
            .await?;

        tracing::debug!(endpoint = %config.endpoint, "Connected to build service");
        Ok(Self {
            client: CoreRpcClient::new(channel),
            credentials: config
                .credentials()
                .map(|(user, pass)| (user.to_string(), pass.to_string())),
        })
    }
}

#[async_trait]
impl BuildService for GrpcBuildService {
    type Source = MessageStream<Streaming<pb::BuildImageMessage>>;

    async fn submit(&mut self, request: BuildRequest) -> Result<Self::Source> {
        let mut req = tonic::Request::new(pb::BuildImageOptions::from(request));
        if let Some((user, pass)) = &self.credentials {
            let metadata = req.metadata_mut();
            metadata.insert("username", metadata_value(user)?);
            metadata.insert("password", metadata_value(pass)?);
        }

        let response = self.client.build_image(req).await?;
        Ok(MessageStream::new(response.into_inner()))
    }
}

fn metadata_value(value: &str) -> Result<MetadataValue<Ascii>> {
    value
        .parse()
        .map_err(|_| BuildError::Config("credentials must be ASCII".to_string()))
}
