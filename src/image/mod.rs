//! Image-side data carried by registry operations
//!
//! Manifests (typed templates and serialized payloads) and the content
//! digests that address blobs.

pub mod digest;
pub mod manifest;

pub use digest::{BlobDescriptor, DescriptorDigest};
pub use manifest::{ContentDescriptor, ManifestPayload, ManifestTemplate};
