//! SHA256 content digests as used by the distribution API
//!
//! Blobs and manifests are addressed by `sha256:<64 lowercase hex>` digests.
//! [`DescriptorDigest`] holds such a digest after validation, and
//! [`BlobDescriptor`] pairs it with the size the registry reports.

use crate::error::{RegistryError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

const SHA256_PREFIX: &str = "sha256:";

/// A validated `sha256:` content digest
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DescriptorDigest(String);

impl DescriptorDigest {
    /// Compute the digest of some content
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(format!("{}{}", SHA256_PREFIX, hex::encode(hasher.finalize())))
    }

    /// Build a digest from its 64-character hex part
    pub fn from_hash(hash: &str) -> Result<Self> {
        if hash.len() != 64 || !hash.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')) {
            return Err(RegistryError::InvalidDigest(format!(
                "expected 64 lowercase hex characters, got '{}'",
                hash
            )));
        }
        Ok(Self(format!("{}{}", SHA256_PREFIX, hash)))
    }

    /// The hex part, without the `sha256:` prefix
    pub fn hash(&self) -> &str {
        &self.0[SHA256_PREFIX.len()..]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check that `data` hashes to this digest
    pub fn verify(&self, data: &[u8]) -> Result<()> {
        let actual = Self::compute(data);
        if &actual != self {
            return Err(RegistryError::UnexpectedBlobDigest {
                expected: self.0.clone(),
                actual: actual.0,
            });
        }
        Ok(())
    }
}

impl FromStr for DescriptorDigest {
    type Err = RegistryError;

    fn from_str(digest: &str) -> Result<Self> {
        match digest.strip_prefix(SHA256_PREFIX) {
            Some(hash) => Self::from_hash(hash),
            None => Err(RegistryError::InvalidDigest(format!(
                "digest must start with '{}': {}",
                SHA256_PREFIX, digest
            ))),
        }
    }
}

impl fmt::Display for DescriptorDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for DescriptorDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DescriptorDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Size and digest of a blob stored in a registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobDescriptor {
    pub size: u64,
    pub digest: DescriptorDigest,
}

impl BlobDescriptor {
    pub fn new(size: u64, digest: DescriptorDigest) -> Self {
        Self { size, digest }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_SHA256: &str =
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_compute_empty_content() {
        let digest = DescriptorDigest::compute(b"");
        assert_eq!(digest.hash(), EMPTY_SHA256);
        assert_eq!(digest.to_string(), format!("sha256:{}", EMPTY_SHA256));
    }

    #[test]
    fn test_parse_rejects_malformed_digests() {
        assert!("sha256:abc".parse::<DescriptorDigest>().is_err());
        assert!(EMPTY_SHA256.parse::<DescriptorDigest>().is_err());
        assert!(
            format!("sha256:{}", EMPTY_SHA256.to_uppercase())
                .parse::<DescriptorDigest>()
                .is_err()
        );
        assert!(
            format!("sha256:{}", EMPTY_SHA256)
                .parse::<DescriptorDigest>()
                .is_ok()
        );
    }

    #[test]
    fn test_verify_reports_mismatch() {
        let digest = DescriptorDigest::compute(b"layer");
        assert!(digest.verify(b"layer").is_ok());
        match digest.verify(b"other") {
            Err(RegistryError::UnexpectedBlobDigest { expected, actual }) => {
                assert_eq!(expected, digest.to_string());
                assert_eq!(actual, DescriptorDigest::compute(b"other").to_string());
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_serde_as_plain_string() {
        let digest = DescriptorDigest::compute(b"config");
        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, format!("\"{}\"", digest));
        let back: DescriptorDigest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, digest);
        assert!(serde_json::from_str::<DescriptorDigest>("\"md5:1234\"").is_err());
    }
}
