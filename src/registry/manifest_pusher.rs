//! Manifest upload: `PUT /v2/<name>/manifests/<reference>`

use crate::error::{HttpResponseError, Result};
use crate::image::manifest::ManifestPayload;
use crate::registry::endpoint::{
    BlobHttpContent, HttpErrorOutcome, RegistryEndpointProvider, RegistryResponse, build_route,
};
use crate::registry::error_response::error_from_response;
use crate::registry::properties::RegistryEndpointRequestProperties;
use reqwest::{Method, StatusCode};
use url::Url;

/// Pushes a serialized manifest under a tag or digest.
///
/// Registries answer a rejected manifest in different ways:
/// - docker registry 2.0/2.1: `400` with `TAG_INVALID`
/// - docker registry 2.2 and GCR: `400` with `MANIFEST_INVALID`
/// - quay.io: `415` with `MANIFEST_INVALID`
/// - ECR: `405`
/// - missing repository: `404`
///
/// Those are reported as failures of this push; anything else is left to the
/// caller.
pub struct ManifestPusher<'a> {
    properties: &'a RegistryEndpointRequestProperties,
    manifest: &'a ManifestPayload,
    image_tag: &'a str,
}

impl<'a> ManifestPusher<'a> {
    /// `415 Unsupported Media Type`, spelled out since not every status
    /// vocabulary carries it
    pub const STATUS_CODE_INVALID_MEDIA_TYPE: u16 = 415;

    pub fn new(
        properties: &'a RegistryEndpointRequestProperties,
        manifest: &'a ManifestPayload,
        image_tag: &'a str,
    ) -> Self {
        Self {
            properties,
            manifest,
            image_tag,
        }
    }

    fn understands(status_code: u16) -> bool {
        status_code == StatusCode::BAD_REQUEST.as_u16()
            || status_code == StatusCode::NOT_FOUND.as_u16()
            || status_code == StatusCode::METHOD_NOT_ALLOWED.as_u16()
            || status_code == Self::STATUS_CODE_INVALID_MEDIA_TYPE
    }
}

impl RegistryEndpointProvider for ManifestPusher<'_> {
    type Output = ();

    fn http_method(&self) -> Method {
        Method::PUT
    }

    fn api_route(&self, api_base: &str) -> Result<Url> {
        build_route(api_base, self.properties, &["manifests", self.image_tag])
    }

    fn content(&self) -> Option<BlobHttpContent> {
        Some(BlobHttpContent::new(
            self.manifest.bytes().clone(),
            self.manifest.media_type(),
        ))
    }

    fn action_description(&self) -> String {
        format!(
            "push image manifest for {}:{}",
            self.properties.repository_description(),
            self.image_tag
        )
    }

    fn handle_response(&self, _response: &RegistryResponse) -> Result<()> {
        Ok(())
    }

    fn handle_http_response_error(&self, error: HttpResponseError) -> HttpErrorOutcome<()> {
        if Self::understands(error.status_code()) {
            HttpErrorOutcome::Failed(error_from_response(&self.action_description(), error))
        } else {
            HttpErrorOutcome::Deferred(error)
        }
    }
}
