//! Docker Registry HTTP API v2 endpoints
//!
//! Each registry operation is a [`RegistryEndpointProvider`]: a pure
//! description of the request plus the rules for reading the reply. The
//! [`RegistryEndpointCaller`] performs the I/O, and [`RegistryClient`] wraps
//! the common operations for one repository.

pub mod auth;
pub mod blob_checker;
pub mod blob_puller;
pub mod blob_pusher;
pub mod caller;
pub mod client;
pub mod endpoint;
pub mod error_response;
pub mod manifest_puller;
pub mod manifest_pusher;
pub mod properties;
pub mod transport;

pub use auth::Authorization;
pub use blob_checker::BlobChecker;
pub use blob_puller::BlobPuller;
pub use blob_pusher::{BlobPusher, BlobUploadCommitter, BlobUploadInitializer, BlobUploadWriter};
pub use caller::RegistryEndpointCaller;
pub use client::{RegistryClient, RegistryClientBuilder};
pub use endpoint::{BlobHttpContent, HttpErrorOutcome, RegistryEndpointProvider, RegistryResponse};
pub use error_response::{
    EndpointErrorBuilder, ErrorCode, ErrorEntryTemplate, ErrorResponseTemplate,
};
pub use manifest_puller::{ManifestPuller, PulledManifest};
pub use manifest_pusher::ManifestPusher;
pub use properties::RegistryEndpointRequestProperties;
pub use transport::{HttpTransport, RegistryTransport, TransportRequest};
