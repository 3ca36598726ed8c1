//! Error types for registry endpoint operations

pub mod handlers;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// A failure the endpoint provider understood and described
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
    /// An HTTP error response no provider had an opinion about
    #[error("Registry error: {0}")]
    Http(#[from] HttpResponseError),
    /// 401/403 responses left unhandled by the provider
    #[error("Unauthorized to {action}: {source}")]
    Unauthorized {
        action: String,
        #[source]
        source: HttpResponseError,
    },
    /// The API route could not be composed from the base URL
    #[error("Invalid API route: {0}")]
    InvalidRoute(String),
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Unknown manifest format: {0}")]
    UnknownManifestFormat(String),
    #[error("Invalid digest: {0}")]
    InvalidDigest(String),
    #[error("Unexpected blob digest: expected {expected} but received {actual}")]
    UnexpectedBlobDigest { expected: String, actual: String },
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        handlers::NetworkErrorHandler::handle_network_error(&err, "registry request")
    }
}

/// An HTTP error response (4xx/5xx) as seen by the endpoint caller.
///
/// `content` is the raw response body; it is `None` for responses without a
/// body, such as the reply to a `HEAD` request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("HTTP {status_code} {}{}", status_reason(.status_code), url_suffix(.url))]
pub struct HttpResponseError {
    status_code: u16,
    content: Option<String>,
    url: Option<String>,
}

impl HttpResponseError {
    pub fn new(status_code: u16, content: Option<String>) -> Self {
        Self {
            status_code,
            content,
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

fn status_reason(status_code: &u16) -> &'static str {
    reqwest::StatusCode::from_u16(*status_code)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("Unknown Status")
}

fn url_suffix(url: &Option<String>) -> String {
    url.as_deref()
        .map(|url| format!(" from {}", url))
        .unwrap_or_default()
}

/// Terminal, action-scoped failure raised by an endpoint provider.
///
/// The message reads `Tried to <action> but failed because: <reason>`.
/// When the failure came from an HTTP error response, that response is kept
/// as the error source.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct EndpointError {
    message: String,
    #[source]
    cause: Option<HttpResponseError>,
}

impl EndpointError {
    pub(crate) fn new(message: String, cause: Option<HttpResponseError>) -> Self {
        Self { message, cause }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The HTTP error response this failure was mapped from, if any
    pub fn http_cause(&self) -> Option<&HttpResponseError> {
        self.cause.as_ref()
    }
}
