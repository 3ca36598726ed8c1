//! Manifest download: `GET /v2/<name>/manifests/<reference>`

use crate::error::{HttpResponseError, Result};
use crate::image::manifest::{
    ManifestPayload, ManifestTemplate, OCI_MANIFEST_MEDIA_TYPE, V21_MANIFEST_MEDIA_TYPE,
    V22_MANIFEST_MEDIA_TYPE,
};
use crate::registry::endpoint::{
    HttpErrorOutcome, RegistryEndpointProvider, RegistryResponse, build_route,
};
use crate::registry::error_response::error_from_response;
use crate::registry::properties::RegistryEndpointRequestProperties;
use reqwest::{Method, StatusCode};
use url::Url;

const ACCEPTED_MANIFEST_TYPES: &[&str] = &[
    OCI_MANIFEST_MEDIA_TYPE,
    V22_MANIFEST_MEDIA_TYPE,
    V21_MANIFEST_MEDIA_TYPE,
];

/// A pulled manifest: the bytes exactly as served, plus their typed reading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PulledManifest {
    payload: ManifestPayload,
    template: ManifestTemplate,
}

impl PulledManifest {
    /// Raw manifest bytes and media type; the digest of these bytes is the
    /// registry's manifest digest
    pub fn payload(&self) -> &ManifestPayload {
        &self.payload
    }

    pub fn template(&self) -> &ManifestTemplate {
        &self.template
    }

    pub fn into_parts(self) -> (ManifestPayload, ManifestTemplate) {
        (self.payload, self.template)
    }
}

/// Pulls a manifest and detects its format
pub struct ManifestPuller<'a> {
    properties: &'a RegistryEndpointRequestProperties,
    image_reference: &'a str,
}

impl<'a> ManifestPuller<'a> {
    pub fn new(
        properties: &'a RegistryEndpointRequestProperties,
        image_reference: &'a str,
    ) -> Self {
        Self {
            properties,
            image_reference,
        }
    }
}

impl RegistryEndpointProvider for ManifestPuller<'_> {
    type Output = PulledManifest;

    fn http_method(&self) -> Method {
        Method::GET
    }

    fn api_route(&self, api_base: &str) -> Result<Url> {
        build_route(api_base, self.properties, &["manifests", self.image_reference])
    }

    fn accept(&self) -> &'static [&'static str] {
        ACCEPTED_MANIFEST_TYPES
    }

    fn action_description(&self) -> String {
        format!(
            "pull image manifest for {}:{}",
            self.properties.repository_description(),
            self.image_reference
        )
    }

    fn handle_response(&self, response: &RegistryResponse) -> Result<PulledManifest> {
        let template = ManifestTemplate::from_json(response.body(), response.content_type())?;
        let payload = ManifestPayload::new(response.body().clone(), template.media_type());
        Ok(PulledManifest { payload, template })
    }

    fn handle_http_response_error(
        &self,
        error: HttpResponseError,
    ) -> HttpErrorOutcome<PulledManifest> {
        if error.status_code() == StatusCode::NOT_FOUND.as_u16() {
            HttpErrorOutcome::Failed(error_from_response(&self.action_description(), error))
        } else {
            HttpErrorOutcome::Deferred(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;
    use crate::image::digest::DescriptorDigest;
    use reqwest::header::{CONTENT_TYPE, HeaderValue};

    const V22_MANIFEST: &[u8] = include_bytes!("../../tests/resources/v22manifest.json");
    const OCI_MANIFEST: &[u8] = include_bytes!("../../tests/resources/ocimanifest.json");

    fn properties() -> RegistryEndpointRequestProperties {
        RegistryEndpointRequestProperties::new("someServerUrl", "someImageName")
    }

    fn response(body: &'static [u8]) -> RegistryResponse {
        let url = Url::parse("http://someApiBase/someImageName/manifests/test-image-tag").unwrap();
        RegistryResponse::new(StatusCode::OK, url).with_body(body)
    }

    #[test]
    fn test_declarations() {
        let properties = properties();
        let puller = ManifestPuller::new(&properties, "test-image-tag");

        assert_eq!(puller.http_method(), Method::GET);
        assert!(puller.content().is_none());
        assert_eq!(
            puller.accept(),
            &[
                "application/vnd.oci.image.manifest.v1+json",
                "application/vnd.docker.distribution.manifest.v2+json",
                "application/vnd.docker.distribution.manifest.v1+json",
            ]
        );
        assert_eq!(
            puller.action_description(),
            "pull image manifest for someServerUrl/someImageName:test-image-tag"
        );
        assert_eq!(
            puller.api_route("http://someApiBase/").unwrap().as_str(),
            "http://someapibase/someImageName/manifests/test-image-tag"
        );
    }

    #[test]
    fn test_handle_response_v22() {
        let properties = properties();
        let puller = ManifestPuller::new(&properties, "test-image-tag");
        let manifest = puller.handle_response(&response(V22_MANIFEST)).unwrap();
        assert!(matches!(manifest.template(), ManifestTemplate::V22(_)));
        assert_eq!(manifest.payload().media_type(), V22_MANIFEST_MEDIA_TYPE);
        assert_eq!(manifest.payload().bytes().as_ref(), V22_MANIFEST);
    }

    #[test]
    fn test_handle_response_keeps_unmodelled_fields() {
        let properties = properties();
        let puller = ManifestPuller::new(&properties, "test-image-tag");
        let body: &'static [u8] = br#"{"schemaVersion":2,"mediaType":"application/vnd.docker.distribution.manifest.v2+json","config":{"mediaType":"application/vnd.docker.container.image.v1+json","size":2,"digest":"sha256:44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a","annotations":{"org.example":"kept"}},"layers":[{"mediaType":"application/vnd.docker.image.rootfs.diff.tar.gzip","size":5,"digest":"sha256:44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a","platform":{"os":"linux"}}]}"#;

        let manifest = puller.handle_response(&response(body)).unwrap();
        assert_eq!(manifest.payload().bytes().as_ref(), body);
        assert_eq!(manifest.payload().digest(), DescriptorDigest::compute(body));
        assert_ne!(manifest.template().to_json().unwrap(), body);
    }

    #[test]
    fn test_handle_response_oci_uses_content_type() {
        let properties = properties();
        let puller = ManifestPuller::new(&properties, "test-image-tag");
        let response = response(OCI_MANIFEST)
            .with_header(CONTENT_TYPE, HeaderValue::from_static(OCI_MANIFEST_MEDIA_TYPE));
        let (payload, template) = puller.handle_response(&response).unwrap().into_parts();
        assert!(matches!(template, ManifestTemplate::Oci(_)));
        assert_eq!(payload.media_type(), OCI_MANIFEST_MEDIA_TYPE);
    }

    #[test]
    fn test_handle_response_unknown_format() {
        let properties = properties();
        let puller = ManifestPuller::new(&properties, "test-image-tag");
        let err = puller
            .handle_response(&response(br#"{"schemaVersion":4}"#))
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownManifestFormat(_)));
    }

    #[test]
    fn test_handle_http_response_error() {
        let properties = properties();
        let puller = ManifestPuller::new(&properties, "test-image-tag");

        let not_found = HttpResponseError::new(
            404,
            Some(r#"{"errors":[{"code":"MANIFEST_UNKNOWN","message":"manifest unknown"}]}"#.into()),
        );
        match puller.handle_http_response_error(not_found) {
            HttpErrorOutcome::Failed(failure) => assert_eq!(
                failure.message(),
                "Tried to pull image manifest for someServerUrl/someImageName:test-image-tag but failed because: manifest unknown"
            ),
            other => panic!("expected failure, got {:?}", other),
        }

        assert!(puller
            .handle_http_response_error(HttpResponseError::new(500, None))
            .is_deferred());
    }
}
