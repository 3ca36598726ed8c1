//! Blob upload in three requests:
//!
//! 1. `POST /v2/<name>/blobs/uploads/` opens an upload session, or mounts the
//!    blob from another repository (`?mount=<digest>&from=<repository>`)
//! 2. `PATCH <location>` sends the blob
//! 3. `PUT <location>?digest=<digest>` commits it

use crate::error::{RegistryError, Result};
use crate::image::digest::DescriptorDigest;
use crate::registry::endpoint::{
    BlobHttpContent, RegistryEndpointProvider, RegistryResponse, build_route,
};
use crate::registry::error_response::EndpointErrorBuilder;
use crate::registry::properties::RegistryEndpointRequestProperties;
use bytes::Bytes;
use reqwest::{Method, StatusCode};
use url::Url;

const BLOB_MEDIA_TYPE: &str = "application/octet-stream";

/// Shared state of the three upload stages
pub struct BlobPusher<'a> {
    properties: &'a RegistryEndpointRequestProperties,
    blob_digest: &'a DescriptorDigest,
    blob: Bytes,
    source_repository: Option<&'a str>,
}

impl<'a> BlobPusher<'a> {
    pub fn new(
        properties: &'a RegistryEndpointRequestProperties,
        blob_digest: &'a DescriptorDigest,
        blob: Bytes,
    ) -> Self {
        Self {
            properties,
            blob_digest,
            blob,
            source_repository: None,
        }
    }

    /// Ask the registry to mount the blob from `repository` instead of
    /// receiving it again
    pub fn with_mount_from(mut self, repository: &'a str) -> Self {
        self.source_repository = Some(repository);
        self
    }

    pub fn initializer(&self) -> BlobUploadInitializer<'_, 'a> {
        BlobUploadInitializer { pusher: self }
    }

    pub fn writer(&self, location: Url) -> BlobUploadWriter<'_, 'a> {
        BlobUploadWriter {
            pusher: self,
            location,
        }
    }

    pub fn committer(&self, location: Url) -> BlobUploadCommitter<'_, 'a> {
        BlobUploadCommitter {
            pusher: self,
            location,
        }
    }

    fn action_description(&self) -> String {
        format!(
            "push BLOB for {} with digest {}",
            self.properties.repository_description(),
            self.blob_digest
        )
    }

    fn missing_location(&self) -> RegistryError {
        EndpointErrorBuilder::new(&self.action_description(), None)
            .add_reason("Expected a Location header in the upload response")
            .build()
            .into()
    }
}

/// Stage 1. Yields `None` when the registry already has (or mounted) the
/// blob, otherwise the upload location.
pub struct BlobUploadInitializer<'p, 'a> {
    pusher: &'p BlobPusher<'a>,
}

impl RegistryEndpointProvider for BlobUploadInitializer<'_, '_> {
    type Output = Option<Url>;

    fn http_method(&self) -> Method {
        Method::POST
    }

    fn api_route(&self, api_base: &str) -> Result<Url> {
        let mut url = build_route(api_base, self.pusher.properties, &["blobs", "uploads", ""])?;
        if let Some(source) = self.pusher.source_repository {
            url.query_pairs_mut()
                .append_pair("mount", self.pusher.blob_digest.as_str())
                .append_pair("from", source);
        }
        Ok(url)
    }

    fn action_description(&self) -> String {
        self.pusher.action_description()
    }

    fn handle_response(&self, response: &RegistryResponse) -> Result<Option<Url>> {
        match response.status() {
            StatusCode::CREATED => Ok(None),
            StatusCode::ACCEPTED => match response.location()? {
                Some(location) => Ok(Some(location)),
                None => Err(self.pusher.missing_location()),
            },
            other => Err(EndpointErrorBuilder::new(&self.action_description(), None)
                .add_reason(&format!("Received unrecognized status code {}", other.as_u16()))
                .build()
                .into()),
        }
    }
}

/// Stage 2. Sends the blob and yields the location to commit at.
pub struct BlobUploadWriter<'p, 'a> {
    pusher: &'p BlobPusher<'a>,
    location: Url,
}

impl RegistryEndpointProvider for BlobUploadWriter<'_, '_> {
    type Output = Url;

    fn http_method(&self) -> Method {
        Method::PATCH
    }

    fn api_route(&self, _api_base: &str) -> Result<Url> {
        Ok(self.location.clone())
    }

    fn content(&self) -> Option<BlobHttpContent> {
        Some(BlobHttpContent::new(self.pusher.blob.clone(), BLOB_MEDIA_TYPE))
    }

    fn action_description(&self) -> String {
        self.pusher.action_description()
    }

    fn handle_response(&self, response: &RegistryResponse) -> Result<Url> {
        response
            .location()?
            .ok_or_else(|| self.pusher.missing_location())
    }
}

/// Stage 3. Commits the upload under the blob's digest.
pub struct BlobUploadCommitter<'p, 'a> {
    pusher: &'p BlobPusher<'a>,
    location: Url,
}

impl RegistryEndpointProvider for BlobUploadCommitter<'_, '_> {
    type Output = ();

    fn http_method(&self) -> Method {
        Method::PUT
    }

    fn api_route(&self, _api_base: &str) -> Result<Url> {
        let mut url = self.location.clone();
        url.query_pairs_mut().append_pair("digest", self.pusher.blob_digest.as_str());
        Ok(url)
    }

    fn action_description(&self) -> String {
        self.pusher.action_description()
    }

    fn handle_response(&self, _response: &RegistryResponse) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HttpResponseError;
    use reqwest::header::{HeaderValue, LOCATION};

    const API_BASE: &str = "https://registry.local/v2/";

    fn fixture() -> (RegistryEndpointRequestProperties, DescriptorDigest) {
        (
            RegistryEndpointRequestProperties::new("registry.local", "team/app"),
            DescriptorDigest::compute(b"blob"),
        )
    }

    #[test]
    fn test_initializer_route_and_mount() {
        let (properties, digest) = fixture();
        let pusher = BlobPusher::new(&properties, &digest, Bytes::from_static(b"blob"));
        let initializer = pusher.initializer();

        assert_eq!(initializer.http_method(), Method::POST);
        assert!(initializer.content().is_none());
        assert_eq!(
            initializer.api_route(API_BASE).unwrap().as_str(),
            "https://registry.local/v2/team/app/blobs/uploads/"
        );
        assert_eq!(
            initializer.action_description(),
            format!("push BLOB for registry.local/team/app with digest {}", digest)
        );

        let pusher = pusher.with_mount_from("team/base");
        assert_eq!(
            pusher.initializer().api_route(API_BASE).unwrap().as_str(),
            format!(
                "https://registry.local/v2/team/app/blobs/uploads/?mount=sha256%3A{}&from=team%2Fbase",
                digest.hash()
            )
        );
    }

    #[test]
    fn test_initializer_handle_response() {
        let (properties, digest) = fixture();
        let pusher = BlobPusher::new(&properties, &digest, Bytes::from_static(b"blob"));
        let initializer = pusher.initializer();
        let url = initializer.api_route(API_BASE).unwrap();

        let created = RegistryResponse::new(StatusCode::CREATED, url.clone());
        assert_eq!(initializer.handle_response(&created).unwrap(), None);

        let accepted = RegistryResponse::new(StatusCode::ACCEPTED, url.clone()).with_header(
            LOCATION,
            HeaderValue::from_static("/v2/team/app/blobs/uploads/session-1"),
        );
        assert_eq!(
            initializer.handle_response(&accepted).unwrap().unwrap().as_str(),
            "https://registry.local/v2/team/app/blobs/uploads/session-1"
        );

        let no_location = RegistryResponse::new(StatusCode::ACCEPTED, url.clone());
        assert!(matches!(
            initializer.handle_response(&no_location),
            Err(RegistryError::Endpoint(_))
        ));

        let odd = RegistryResponse::new(StatusCode::OK, url);
        match initializer.handle_response(&odd) {
            Err(RegistryError::Endpoint(failure)) => {
                assert!(failure.message().ends_with("Received unrecognized status code 200"))
            }
            other => panic!("unexpected result: {:?}", other),
        }

        assert!(initializer
            .handle_http_response_error(HttpResponseError::new(404, None))
            .is_deferred());
    }

    #[test]
    fn test_writer_sends_blob_to_location() {
        let (properties, digest) = fixture();
        let pusher = BlobPusher::new(&properties, &digest, Bytes::from_static(b"blob"));
        let location =
            Url::parse("https://registry.local/v2/team/app/blobs/uploads/session-1").unwrap();
        let writer = pusher.writer(location.clone());

        assert_eq!(writer.http_method(), Method::PATCH);
        assert_eq!(writer.api_route("ignored").unwrap(), location);
        let content = writer.content().unwrap();
        assert_eq!(content.media_type(), "application/octet-stream");
        assert_eq!(content.data().as_ref(), b"blob");

        let response = RegistryResponse::new(StatusCode::ACCEPTED, location.clone())
            .with_header(LOCATION, HeaderValue::from_static("session-1?_state=abc"));
        assert_eq!(
            writer.handle_response(&response).unwrap().as_str(),
            "https://registry.local/v2/team/app/blobs/uploads/session-1?_state=abc"
        );
        assert!(writer
            .handle_response(&RegistryResponse::new(StatusCode::ACCEPTED, location))
            .is_err());
    }

    #[test]
    fn test_query_values_are_encoded() {
        let (properties, digest) = fixture();
        let pusher = BlobPusher::new(&properties, &digest, Bytes::from_static(b"blob"))
            .with_mount_from("team/base&from=evil");
        let url = pusher.initializer().api_route(API_BASE).unwrap();

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("mount".to_string(), digest.to_string()),
                ("from".to_string(), "team/base&from=evil".to_string()),
            ]
        );
    }

    #[test]
    fn test_committer_appends_digest() {
        let (properties, digest) = fixture();
        let pusher = BlobPusher::new(&properties, &digest, Bytes::from_static(b"blob"));

        let plain =
            Url::parse("https://registry.local/v2/team/app/blobs/uploads/session-1").unwrap();
        let committer = pusher.committer(plain);
        assert_eq!(committer.http_method(), Method::PUT);
        assert!(committer.content().is_none());
        assert_eq!(
            committer.api_route(API_BASE).unwrap().as_str(),
            format!(
                "https://registry.local/v2/team/app/blobs/uploads/session-1?digest=sha256%3A{}",
                digest.hash()
            )
        );

        let with_state =
            Url::parse("https://registry.local/v2/team/app/blobs/uploads/session-1?_state=abc")
                .unwrap();
        assert_eq!(
            pusher.committer(with_state).api_route(API_BASE).unwrap().as_str(),
            format!(
                "https://registry.local/v2/team/app/blobs/uploads/session-1?_state=abc&digest=sha256%3A{}",
                digest.hash()
            )
        );
    }
}
