//! Blob download: `GET /v2/<name>/blobs/<digest>`

use crate::error::{HttpResponseError, Result};
use crate::image::digest::DescriptorDigest;
use crate::registry::endpoint::{
    HttpErrorOutcome, RegistryEndpointProvider, RegistryResponse, build_route,
};
use crate::registry::error_response::{EndpointErrorBuilder, error_from_response};
use crate::registry::properties::RegistryEndpointRequestProperties;
use bytes::Bytes;
use reqwest::{Method, StatusCode};
use url::Url;

/// Pulls a blob and verifies it against its digest
pub struct BlobPuller<'a> {
    properties: &'a RegistryEndpointRequestProperties,
    blob_digest: &'a DescriptorDigest,
}

impl<'a> BlobPuller<'a> {
    pub fn new(
        properties: &'a RegistryEndpointRequestProperties,
        blob_digest: &'a DescriptorDigest,
    ) -> Self {
        Self {
            properties,
            blob_digest,
        }
    }
}

impl RegistryEndpointProvider for BlobPuller<'_> {
    type Output = Bytes;

    fn http_method(&self) -> Method {
        Method::GET
    }

    fn api_route(&self, api_base: &str) -> Result<Url> {
        build_route(api_base, self.properties, &["blobs", self.blob_digest.as_str()])
    }

    fn action_description(&self) -> String {
        format!(
            "pull BLOB for {} with digest {}",
            self.properties.repository_description(),
            self.blob_digest
        )
    }

    fn handle_response(&self, response: &RegistryResponse) -> Result<Bytes> {
        self.blob_digest.verify(response.body())?;
        Ok(response.body().clone())
    }

    fn handle_http_response_error(&self, error: HttpResponseError) -> HttpErrorOutcome<Bytes> {
        if error.status_code() != StatusCode::NOT_FOUND.as_u16() {
            return HttpErrorOutcome::Deferred(error);
        }

        let action = self.action_description();
        let has_body = error.content().is_some_and(|c| !c.trim().is_empty());
        let failure = if has_body {
            error_from_response(&action, error)
        } else {
            EndpointErrorBuilder::new(&action, Some(error))
                .add_reason("BLOB not found")
                .build()
        };
        HttpErrorOutcome::Failed(failure)
    }
}
