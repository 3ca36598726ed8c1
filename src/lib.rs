//! Registry endpoints library
//!
//! Typed requests against the Docker Registry HTTP API v2: manifest push and
//! pull, blob existence checks, blob download and chunkless blob upload, plus
//! the CLI built on top of them.

pub mod cli;
pub mod config;
pub mod error;
pub mod image;
pub mod logging;
pub mod registry;

pub use config::{AppConfig, AuthConfig, RegistryConfig};
pub use error::{EndpointError, HttpResponseError, RegistryError, Result};
pub use logging::Logger;
