//! The endpoint provider abstraction
//!
//! A [`RegistryEndpointProvider`] describes one registry operation as a set of
//! answers (method, route, body, accepted media types) plus the rules for
//! reading the registry's reply. The [`crate::registry::RegistryEndpointCaller`]
//! does the I/O and hands responses back to the provider.

use crate::error::{EndpointError, HttpResponseError, RegistryError, Result};
use crate::registry::properties::RegistryEndpointRequestProperties;
use bytes::Bytes;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, LOCATION};
use reqwest::{Method, StatusCode};
use std::io::{self, Write};
use url::Url;

/// A request body together with its `Content-Type`.
///
/// The data is a shared `Bytes` handle: producing the content and sending it
/// never copies the underlying buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobHttpContent {
    data: Bytes,
    media_type: String,
}

impl BlobHttpContent {
    pub fn new(data: Bytes, media_type: impl Into<String>) -> Self {
        Self {
            data,
            media_type: media_type.into(),
        }
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Stream the body into `out`
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_all(&self.data)?;
        out.flush()
    }

    pub fn into_body(self) -> reqwest::Body {
        reqwest::Body::from(self.data)
    }
}

/// A fully buffered registry response
#[derive(Debug, Clone)]
pub struct RegistryResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    url: Url,
}

impl RegistryResponse {
    pub fn new(status: StatusCode, url: Url) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            url,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The URL the request was sent to
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn header(&self, name: HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE)
    }

    pub fn content_length(&self) -> Option<u64> {
        self.header(CONTENT_LENGTH)
            .and_then(|v| v.trim().parse().ok())
    }

    /// The `Location` header resolved against the request URL
    pub fn location(&self) -> Result<Option<Url>> {
        match self.header(LOCATION) {
            Some(location) => Ok(Some(self.url.join(location)?)),
            None => Ok(None),
        }
    }

    /// Body as an error-response payload; `None` when the body is empty
    pub(crate) fn error_content(&self) -> Option<String> {
        if self.body.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&self.body).into_owned())
        }
    }
}

/// What a provider makes of an HTTP error response
#[derive(Debug)]
pub enum HttpErrorOutcome<T> {
    /// The failure carries a usable answer, e.g. "blob does not exist"
    Recovered(T),
    /// No opinion; the caller applies its generic policy to the error
    Deferred(HttpResponseError),
    /// The failure is understood and terminates the operation
    Failed(EndpointError),
}

impl<T> HttpErrorOutcome<T> {
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }
}

/// One registry operation, described declaratively.
///
/// Implementations are immutable after construction; every method is a pure
/// query over the values captured at construction time.
pub trait RegistryEndpointProvider: Send + Sync {
    type Output: Send;

    fn http_method(&self) -> Method;

    /// Full URL for this operation under `api_base` (e.g. `https://gcr.io/v2/`)
    fn api_route(&self, api_base: &str) -> Result<Url>;

    /// Request body, if the operation sends one
    fn content(&self) -> Option<BlobHttpContent> {
        None
    }

    /// Media types for the `Accept` header, most preferred first
    fn accept(&self) -> &'static [&'static str] {
        &[]
    }

    /// Human-readable summary used in error messages and logs
    fn action_description(&self) -> String;

    /// Interpret a 2xx response
    fn handle_response(&self, response: &RegistryResponse) -> Result<Self::Output>;

    /// Interpret a 4xx/5xx response
    fn handle_http_response_error(
        &self,
        error: HttpResponseError,
    ) -> HttpErrorOutcome<Self::Output> {
        HttpErrorOutcome::Deferred(error)
    }
}

/// Joins `api_base`, the repository path and `segments` with single slashes
pub(crate) fn build_route(
    api_base: &str,
    properties: &RegistryEndpointRequestProperties,
    segments: &[&str],
) -> Result<Url> {
    let mut url = Url::parse(api_base)?;
    {
        let mut path = url.path_segments_mut().map_err(|_| {
            RegistryError::InvalidRoute(format!("{} cannot be used as an API base", api_base))
        })?;
        path.pop_if_empty()
            .extend(properties.image_name().split('/').filter(|s| !s.is_empty()))
            .extend(segments);
    }
    Ok(url)
}
