//! Target of a registry operation

use serde::{Deserialize, Serialize};

/// Which registry and repository an endpoint provider talks to.
///
/// Built once per target and borrowed by every provider for that target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistryEndpointRequestProperties {
    server_url: String,
    image_name: String,
}

impl RegistryEndpointRequestProperties {
    pub fn new(server_url: impl Into<String>, image_name: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            image_name: image_name.into(),
        }
    }

    /// Registry host, optionally with a port
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Repository path within the registry, e.g. `library/busybox`
    pub fn image_name(&self) -> &str {
        &self.image_name
    }

    /// `<server>/<image>`, as used in action descriptions
    pub fn repository_description(&self) -> String {
        format!("{}/{}", self.server_url, self.image_name)
    }
}
