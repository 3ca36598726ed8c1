//! High-level registry client
//!
//! [`RegistryClient`] binds one repository to a [`RegistryEndpointCaller`] and
//! exposes one async method per registry operation.

use crate::config::AppConfig;
use crate::error::{RegistryError, Result};
use crate::image::digest::{BlobDescriptor, DescriptorDigest};
use crate::image::manifest::ManifestPayload;
use crate::logging::Logger;
use crate::registry::auth::Authorization;
use crate::registry::blob_checker::BlobChecker;
use crate::registry::blob_puller::BlobPuller;
use crate::registry::blob_pusher::BlobPusher;
use crate::registry::caller::{DEFAULT_USER_AGENT, RegistryEndpointCaller};
use crate::registry::manifest_puller::{ManifestPuller, PulledManifest};
use crate::registry::manifest_pusher::ManifestPusher;
use crate::registry::properties::RegistryEndpointRequestProperties;
use crate::registry::transport::{HttpTransport, RegistryTransport};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

pub struct RegistryClientBuilder {
    address: String,
    image_name: String,
    authorization: Option<Authorization>,
    skip_tls: bool,
    timeout: Duration,
    user_agent: String,
    logger: Logger,
}

impl RegistryClientBuilder {
    /// `address` is the registry root with its scheme, e.g.
    /// `https://registry.example.com:5000`. A bare host means https.
    pub fn new(address: impl Into<String>, image_name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            image_name: image_name.into(),
            authorization: None,
            skip_tls: false,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            logger: Logger::default(),
        }
    }

    pub fn with_authorization(mut self, authorization: Option<Authorization>) -> Self {
        self.authorization = authorization;
        self
    }

    pub fn with_skip_tls(mut self, skip_tls: bool) -> Self {
        self.skip_tls = skip_tls;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn build(self) -> Result<RegistryClient> {
        let transport = HttpTransport::new(self.skip_tls, self.timeout)?;
        self.build_with_transport(Arc::new(transport))
    }

    /// Build on top of a caller-supplied transport
    pub fn build_with_transport(
        self,
        transport: Arc<dyn RegistryTransport>,
    ) -> Result<RegistryClient> {
        if self.image_name.trim_matches('/').is_empty() {
            return Err(RegistryError::Configuration(
                "Repository name cannot be empty".to_string(),
            ));
        }

        let (scheme, server_url) = match self.address.split_once("://") {
            Some((scheme, rest)) => (scheme, rest.trim_end_matches('/')),
            None => ("https", self.address.trim_end_matches('/')),
        };
        if server_url.is_empty() {
            return Err(RegistryError::Configuration(format!(
                "Invalid registry address: {}",
                self.address
            )));
        }

        let api_base = format!("{}://{}/v2/", scheme, server_url);
        let properties =
            RegistryEndpointRequestProperties::new(server_url, self.image_name.as_str());
        let caller = RegistryEndpointCaller::new(transport, api_base)
            .with_authorization(self.authorization)
            .with_user_agent(self.user_agent)
            .with_logger(self.logger.clone());

        Ok(RegistryClient {
            properties,
            caller,
            logger: self.logger,
        })
    }
}

pub struct RegistryClient {
    properties: RegistryEndpointRequestProperties,
    caller: RegistryEndpointCaller,
    logger: Logger,
}

impl RegistryClient {
    pub fn builder(
        address: impl Into<String>,
        image_name: impl Into<String>,
    ) -> RegistryClientBuilder {
        RegistryClientBuilder::new(address, image_name)
    }

    /// Client for the repository named in the application config
    pub fn from_config(config: &AppConfig, logger: Logger) -> Result<Self> {
        Self::builder(config.registry.url.as_str(), config.registry.repository.as_str())
            .with_authorization(Authorization::from_config(&config.auth))
            .with_skip_tls(config.registry.skip_tls)
            .with_timeout(Duration::from_secs(config.timeout))
            .with_logger(logger)
            .build()
    }

    pub fn properties(&self) -> &RegistryEndpointRequestProperties {
        &self.properties
    }

    pub fn caller(&self) -> &RegistryEndpointCaller {
        &self.caller
    }

    /// Push `manifest` under `tag`; returns the manifest digest
    pub async fn push_manifest(
        &self,
        manifest: &ManifestPayload,
        tag: &str,
    ) -> Result<DescriptorDigest> {
        let pusher = ManifestPusher::new(&self.properties, manifest, tag);
        self.caller.call(&pusher).await?;
        Ok(manifest.digest())
    }

    /// Pull the manifest at `reference` (tag or digest)
    pub async fn pull_manifest(&self, reference: &str) -> Result<PulledManifest> {
        self.caller
            .call(&ManifestPuller::new(&self.properties, reference))
            .await
    }

    /// `None` when the registry does not have the blob
    pub async fn check_blob(&self, digest: &DescriptorDigest) -> Result<Option<BlobDescriptor>> {
        self.caller.call(&BlobChecker::new(&self.properties, digest)).await
    }

    pub async fn pull_blob(&self, digest: &DescriptorDigest) -> Result<Bytes> {
        self.caller.call(&BlobPuller::new(&self.properties, digest)).await
    }

    /// Upload a blob, optionally mounting it from `mount_from` in the same
    /// registry. Returns `false` when the registry already had the blob or
    /// mounted it, `true` when the data was sent.
    pub async fn push_blob(
        &self,
        digest: &DescriptorDigest,
        blob: Bytes,
        mount_from: Option<&str>,
    ) -> Result<bool> {
        let size = blob.len() as u64;
        let mut pusher = BlobPusher::new(&self.properties, digest, blob);
        if let Some(source) = mount_from {
            pusher = pusher.with_mount_from(source);
        }

        let location = match self.caller.call(&pusher.initializer()).await? {
            Some(location) => location,
            None => {
                self.logger.detail(&format!("Blob {} already present, skipping upload", digest));
                return Ok(false);
            }
        };

        let location = self.caller.call(&pusher.writer(location)).await?;
        self.caller.call(&pusher.committer(location)).await?;
        self.logger.detail(&format!(
            "Uploaded blob {} ({})",
            digest,
            self.logger.format_size(size)
        ));
        Ok(true)
    }
}
