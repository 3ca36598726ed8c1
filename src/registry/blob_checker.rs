//! Blob existence check: `HEAD /v2/<name>/blobs/<digest>`

use crate::error::{HttpResponseError, Result};
use crate::image::digest::{BlobDescriptor, DescriptorDigest};
use crate::registry::endpoint::{
    HttpErrorOutcome, RegistryEndpointProvider, RegistryResponse, build_route,
};
use crate::registry::error_response::{EndpointErrorBuilder, ErrorCode, ErrorResponseTemplate};
use crate::registry::properties::RegistryEndpointRequestProperties;
use reqwest::{Method, StatusCode};
use url::Url;

/// Checks whether a blob exists. A missing blob is an answer (`None`), not
/// an error.
pub struct BlobChecker<'a> {
    properties: &'a RegistryEndpointRequestProperties,
    blob_digest: &'a DescriptorDigest,
}

impl<'a> BlobChecker<'a> {
    pub fn new(
        properties: &'a RegistryEndpointRequestProperties,
        blob_digest: &'a DescriptorDigest,
    ) -> Self {
        Self {
            properties,
            blob_digest,
        }
    }

    fn is_blob_unknown(content: &str) -> bool {
        match ErrorResponseTemplate::from_json(content) {
            Ok(response) => {
                response.errors().len() == 1
                    && response.errors()[0].error_code() == Some(ErrorCode::BlobUnknown)
            }
            Err(_) => false,
        }
    }
}

impl RegistryEndpointProvider for BlobChecker<'_> {
    type Output = Option<BlobDescriptor>;

    fn http_method(&self) -> Method {
        Method::HEAD
    }

    fn api_route(&self, api_base: &str) -> Result<Url> {
        build_route(api_base, self.properties, &["blobs", self.blob_digest.as_str()])
    }

    fn action_description(&self) -> String {
        format!(
            "check BLOB exists for {} with digest {}",
            self.properties.repository_description(),
            self.blob_digest
        )
    }

    fn handle_response(&self, response: &RegistryResponse) -> Result<Option<BlobDescriptor>> {
        let size = response.content_length().ok_or_else(|| {
            EndpointErrorBuilder::new(&self.action_description(), None)
                .add_reason("Did not receive Content-Length header")
                .build()
        })?;
        Ok(Some(BlobDescriptor::new(size, self.blob_digest.clone())))
    }

    fn handle_http_response_error(
        &self,
        error: HttpResponseError,
    ) -> HttpErrorOutcome<Option<BlobDescriptor>> {
        if error.status_code() != StatusCode::NOT_FOUND.as_u16() {
            return HttpErrorOutcome::Deferred(error);
        }

        // HEAD responses carry no body; a bare 404 means the blob is absent.
        let absent = match error.content() {
            None => true,
            Some(content) => content.trim().is_empty() || Self::is_blob_unknown(content),
        };
        if absent {
            HttpErrorOutcome::Recovered(None)
        } else {
            HttpErrorOutcome::Deferred(error)
        }
    }
}
