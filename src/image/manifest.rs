//! Image manifest templates and serialized manifest payloads
//!
//! Supports Docker Image Manifest V2 Schema 1 and Schema 2 and the OCI image
//! manifest. Manifest lists and OCI indexes are not modelled.

use crate::error::{RegistryError, Result};
use crate::image::digest::DescriptorDigest;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Docker Image Manifest V2 Schema 1 (unsigned)
pub const V21_MANIFEST_MEDIA_TYPE: &str = "application/vnd.docker.distribution.manifest.v1+json";
/// Docker Image Manifest V2 Schema 2
pub const V22_MANIFEST_MEDIA_TYPE: &str = "application/vnd.docker.distribution.manifest.v2+json";
/// OCI image manifest
pub const OCI_MANIFEST_MEDIA_TYPE: &str = "application/vnd.oci.image.manifest.v1+json";
/// OCI image index; carried as an opaque payload only
pub const OCI_INDEX_MEDIA_TYPE: &str = "application/vnd.oci.image.index.v1+json";
/// Docker manifest list; carried as an opaque payload only
pub const V22_MANIFEST_LIST_MEDIA_TYPE: &str =
    "application/vnd.docker.distribution.manifest.list.v2+json";

pub const V22_CONTAINER_CONFIG_MEDIA_TYPE: &str = "application/vnd.docker.container.image.v1+json";
pub const V22_LAYER_MEDIA_TYPE: &str = "application/vnd.docker.image.rootfs.diff.tar.gzip";
pub const OCI_CONFIG_MEDIA_TYPE: &str = "application/vnd.oci.image.config.v1+json";
pub const OCI_LAYER_MEDIA_TYPE: &str = "application/vnd.oci.image.layer.v1.tar+gzip";

/// Reference to a blob from within a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDescriptor {
    pub media_type: String,
    pub size: u64,
    pub digest: DescriptorDigest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
}

impl ContentDescriptor {
    pub fn new(media_type: impl Into<String>, size: u64, digest: DescriptorDigest) -> Self {
        Self {
            media_type: media_type.into(),
            size,
            digest,
            urls: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct V22ManifestTemplate {
    pub schema_version: u32,
    pub media_type: String,
    pub config: ContentDescriptor,
    pub layers: Vec<ContentDescriptor>,
}

impl V22ManifestTemplate {
    pub fn new(config: ContentDescriptor, layers: Vec<ContentDescriptor>) -> Self {
        Self {
            schema_version: 2,
            media_type: V22_MANIFEST_MEDIA_TYPE.to_string(),
            config,
            layers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OciManifestTemplate {
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    pub config: ContentDescriptor,
    pub layers: Vec<ContentDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct V21FsLayer {
    pub blob_sum: DescriptorDigest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct V21History {
    pub v1_compatibility: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct V21ManifestTemplate {
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
    pub fs_layers: Vec<V21FsLayer>,
    #[serde(default)]
    pub history: Vec<V21History>,
}

/// A manifest in one of the supported formats
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestTemplate {
    V21(V21ManifestTemplate),
    V22(V22ManifestTemplate),
    Oci(OciManifestTemplate),
}

impl ManifestTemplate {
    /// Detect the manifest format and deserialize it.
    ///
    /// `content_type` is the `Content-Type` the registry served the manifest
    /// with; it stands in for a missing `mediaType` field.
    pub fn from_json(json: &[u8], content_type: Option<&str>) -> Result<Self> {
        let node: serde_json::Value = serde_json::from_slice(json)?;

        let schema_version = node.get("schemaVersion").ok_or_else(|| {
            RegistryError::UnknownManifestFormat(
                "Cannot find field 'schemaVersion' in manifest".to_string(),
            )
        })?;
        let schema_version = schema_version.as_i64().ok_or_else(|| {
            RegistryError::UnknownManifestFormat(
                "'schemaVersion' field is not an integer".to_string(),
            )
        })?;

        match schema_version {
            1 => Ok(Self::V21(serde_json::from_value(node)?)),
            2 => {
                let media_type = node
                    .get("mediaType")
                    .and_then(|m| m.as_str())
                    .or(content_type)
                    .map(|m| media_type_essence(m).to_string())
                    .ok_or_else(|| {
                        RegistryError::UnknownManifestFormat(
                            "'mediaType' field missing and no Content-Type given".to_string(),
                        )
                    })?;

                match media_type.as_str() {
                    OCI_MANIFEST_MEDIA_TYPE => Ok(Self::Oci(serde_json::from_value(node)?)),
                    V22_MANIFEST_MEDIA_TYPE => Ok(Self::V22(serde_json::from_value(node)?)),
                    other => Err(RegistryError::UnknownManifestFormat(format!(
                        "Unknown mediaType: {}",
                        other
                    ))),
                }
            }
            other => Err(RegistryError::UnknownManifestFormat(format!(
                "Unknown schemaVersion: {} - only 1 and 2 are supported",
                other
            ))),
        }
    }

    pub fn media_type(&self) -> &str {
        match self {
            Self::V21(_) => V21_MANIFEST_MEDIA_TYPE,
            Self::V22(_) => V22_MANIFEST_MEDIA_TYPE,
            Self::Oci(_) => OCI_MANIFEST_MEDIA_TYPE,
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        let json = match self {
            Self::V21(m) => serde_json::to_vec(m)?,
            Self::V22(m) => serde_json::to_vec(m)?,
            Self::Oci(m) => serde_json::to_vec(m)?,
        };
        Ok(json)
    }

    /// Digests of the layer blobs, base layer first
    pub fn layer_digests(&self) -> Vec<&DescriptorDigest> {
        match self {
            // Schema 1 lists layers top-most first.
            Self::V21(m) => m.fs_layers.iter().rev().map(|l| &l.blob_sum).collect(),
            Self::V22(m) => m.layers.iter().map(|l| &l.digest).collect(),
            Self::Oci(m) => m.layers.iter().map(|l| &l.digest).collect(),
        }
    }

    /// The container configuration blob; schema 1 manifests have none
    pub fn config(&self) -> Option<&ContentDescriptor> {
        match self {
            Self::V21(_) => None,
            Self::V22(m) => Some(&m.config),
            Self::Oci(m) => Some(&m.config),
        }
    }
}

/// Strips parameters such as `; charset=utf-8` from a Content-Type value
fn media_type_essence(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or(content_type).trim()
}

/// A serialized manifest together with its declared media type.
///
/// The bytes are kept exactly as given so that the pushed manifest (and its
/// digest) match the input byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestPayload {
    media_type: String,
    bytes: Bytes,
}

impl ManifestPayload {
    /// Wrap manifest bytes and their media type as given, without inspecting
    /// the content
    pub fn new(bytes: impl Into<Bytes>, media_type: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Validate raw manifest JSON and detect its media type
    pub fn parse(bytes: impl Into<Bytes>) -> Result<Self> {
        Self::parse_as(bytes, None)
    }

    /// Like [`ManifestPayload::parse`], falling back to `media_type` when the
    /// document has no `mediaType` field
    pub fn parse_as(bytes: impl Into<Bytes>, media_type: Option<&str>) -> Result<Self> {
        let bytes = bytes.into();
        let template = ManifestTemplate::from_json(&bytes, media_type)?;
        Ok(Self {
            media_type: template.media_type().to_string(),
            bytes,
        })
    }

    /// Serialize a manifest template
    pub fn from_template(template: &ManifestTemplate) -> Result<Self> {
        Ok(Self {
            media_type: template.media_type().to_string(),
            bytes: Bytes::from(template.to_json()?),
        })
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// The serialized manifest; cloning the returned `Bytes` shares the buffer
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Content digest a registry will assign to this manifest
    pub fn digest(&self) -> DescriptorDigest {
        DescriptorDigest::compute(&self.bytes)
    }
}
