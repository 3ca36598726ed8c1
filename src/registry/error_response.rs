//! Registry error model
//!
//! Registries describe failures with a JSON body of the form
//! `{"errors":[{"code":"MANIFEST_INVALID","message":"manifest invalid","detail":{}}]}`.
//! This module parses that body and turns it into an [`EndpointError`].

use crate::error::{EndpointError, HttpResponseError, Result};
use serde::Deserialize;

/// Error codes defined by the distribution API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    BlobUnknown,
    BlobUploadInvalid,
    BlobUploadUnknown,
    DigestInvalid,
    ManifestBlobUnknown,
    ManifestInvalid,
    ManifestUnknown,
    ManifestUnverified,
    NameInvalid,
    NameUnknown,
    SizeInvalid,
    TagInvalid,
    Unauthorized,
    Denied,
    Unsupported,
}

impl ErrorCode {
    pub fn from_code(code: &str) -> Option<Self> {
        let code = match code {
            "BLOB_UNKNOWN" => Self::BlobUnknown,
            "BLOB_UPLOAD_INVALID" => Self::BlobUploadInvalid,
            "BLOB_UPLOAD_UNKNOWN" => Self::BlobUploadUnknown,
            "DIGEST_INVALID" => Self::DigestInvalid,
            "MANIFEST_BLOB_UNKNOWN" => Self::ManifestBlobUnknown,
            "MANIFEST_INVALID" => Self::ManifestInvalid,
            "MANIFEST_UNKNOWN" => Self::ManifestUnknown,
            "MANIFEST_UNVERIFIED" => Self::ManifestUnverified,
            "NAME_INVALID" => Self::NameInvalid,
            "NAME_UNKNOWN" => Self::NameUnknown,
            "SIZE_INVALID" => Self::SizeInvalid,
            "TAG_INVALID" => Self::TagInvalid,
            "UNAUTHORIZED" => Self::Unauthorized,
            "DENIED" => Self::Denied,
            "UNSUPPORTED" => Self::Unsupported,
            _ => return None,
        };
        Some(code)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BlobUnknown => "BLOB_UNKNOWN",
            Self::BlobUploadInvalid => "BLOB_UPLOAD_INVALID",
            Self::BlobUploadUnknown => "BLOB_UPLOAD_UNKNOWN",
            Self::DigestInvalid => "DIGEST_INVALID",
            Self::ManifestBlobUnknown => "MANIFEST_BLOB_UNKNOWN",
            Self::ManifestInvalid => "MANIFEST_INVALID",
            Self::ManifestUnknown => "MANIFEST_UNKNOWN",
            Self::ManifestUnverified => "MANIFEST_UNVERIFIED",
            Self::NameInvalid => "NAME_INVALID",
            Self::NameUnknown => "NAME_UNKNOWN",
            Self::SizeInvalid => "SIZE_INVALID",
            Self::TagInvalid => "TAG_INVALID",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Denied => "DENIED",
            Self::Unsupported => "UNSUPPORTED",
        }
    }
}

/// One entry of the `errors` list. Extra fields such as `detail` are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorEntryTemplate {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorEntryTemplate {
    pub fn error_code(&self) -> Option<ErrorCode> {
        self.code.as_deref().and_then(ErrorCode::from_code)
    }

    /// Human-readable reason for this entry
    pub fn reason(&self) -> String {
        let Some(message) = self.message.as_deref() else {
            return "no details".to_string();
        };

        match self.error_code() {
            Some(ErrorCode::ManifestInvalid | ErrorCode::BlobUnknown) => {
                format!("{} (something went wrong)", message)
            }
            Some(
                ErrorCode::ManifestUnknown | ErrorCode::TagInvalid | ErrorCode::ManifestUnverified,
            ) => message.to_string(),
            Some(_) => format!("other: {}", message),
            None => format!("unknown: {}", message),
        }
    }
}

/// The whole error body; `errors` may be absent or `null`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorResponseTemplate {
    #[serde(default)]
    errors: Option<Vec<ErrorEntryTemplate>>,
}

impl ErrorResponseTemplate {
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn errors(&self) -> &[ErrorEntryTemplate] {
        self.errors.as_deref().unwrap_or_default()
    }

    pub fn first(&self) -> Option<&ErrorEntryTemplate> {
        self.errors().first()
    }
}

/// Assembles the `Tried to <action> but failed because: <reasons>` message
pub struct EndpointErrorBuilder {
    message: String,
    cause: Option<HttpResponseError>,
    has_reason: bool,
}

impl EndpointErrorBuilder {
    pub fn new(action: &str, cause: Option<HttpResponseError>) -> Self {
        Self {
            message: format!("Tried to {} but failed because: ", action),
            cause,
            has_reason: false,
        }
    }

    pub fn add_reason(mut self, reason: &str) -> Self {
        if self.has_reason {
            self.message.push_str(", ");
        }
        self.message.push_str(reason);
        self.has_reason = true;
        self
    }

    pub fn add_entry_reason(self, entry: &ErrorEntryTemplate) -> Self {
        let reason = entry.reason();
        self.add_reason(&reason)
    }

    pub fn build(self) -> EndpointError {
        EndpointError::new(self.message, self.cause)
    }
}

/// Reason taken from the first entry of an error body.
///
/// Bodies that are missing, not JSON, or shaped differently degrade to a
/// generic reason naming the status code.
pub fn error_body_reason(error: &HttpResponseError) -> String {
    let status = error.status_code();
    let parsed = error
        .content()
        .map(ErrorResponseTemplate::from_json);

    match parsed {
        Some(Ok(response)) => match response.first() {
            Some(entry) => entry.reason(),
            None => format!("registry returned HTTP {} without error details", status),
        },
        Some(Err(_)) | None => {
            format!("registry returned HTTP {} with an unreadable error body", status)
        }
    }
}

/// Maps an understood HTTP failure to an [`EndpointError`] whose source is
/// the original response
pub fn error_from_response(action: &str, error: HttpResponseError) -> EndpointError {
    let reason = error_body_reason(&error);
    EndpointErrorBuilder::new(action, Some(error))
        .add_reason(&reason)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(code: Option<&str>, message: Option<&str>) -> ErrorEntryTemplate {
        ErrorEntryTemplate {
            code: code.map(str::to_string),
            message: message.map(str::to_string),
        }
    }

    #[test]
    fn test_error_code_round_trip_names() {
        for code in ["BLOB_UNKNOWN", "MANIFEST_INVALID", "NAME_UNKNOWN", "DENIED"] {
            assert_eq!(ErrorCode::from_code(code).unwrap().as_str(), code);
        }
        assert_eq!(ErrorCode::from_code("TOOMANYREQUESTS"), None);
    }

    #[test]
    fn test_entry_reasons() {
        assert_eq!(
            entry(Some("MANIFEST_INVALID"), Some("manifest invalid")).reason(),
            "manifest invalid (something went wrong)"
        );
        assert_eq!(
            entry(Some("BLOB_UNKNOWN"), Some("blob unknown to registry")).reason(),
            "blob unknown to registry (something went wrong)"
        );
        assert_eq!(
            entry(Some("TAG_INVALID"), Some("manifest tag did not match URI")).reason(),
            "manifest tag did not match URI"
        );
        assert_eq!(
            entry(Some("DENIED"), Some("requested access to the resource is denied")).reason(),
            "other: requested access to the resource is denied"
        );
        assert_eq!(entry(Some("WHATEVER"), Some("odd")).reason(), "unknown: odd");
        assert_eq!(entry(None, Some("odd")).reason(), "unknown: odd");
        assert_eq!(entry(Some("MANIFEST_INVALID"), None).reason(), "no details");
    }

    #[test]
    fn test_parse_tolerates_missing_and_null_errors() {
        assert!(ErrorResponseTemplate::from_json("{}").unwrap().errors().is_empty());
        assert!(ErrorResponseTemplate::from_json(r#"{"errors":null}"#).unwrap().first().is_none());
        assert!(ErrorResponseTemplate::from_json(r#"{"errors":"nope"}"#).is_err());

        let response = ErrorResponseTemplate::from_json(
            r#"{"errors":[{"code":"MANIFEST_INVALID","detail":{"message":"schema"},"message":"manifest invalid"},{"code":"DENIED"}]}"#,
        )
        .unwrap();
        assert_eq!(response.errors().len(), 2);
        assert_eq!(response.first().unwrap().error_code(), Some(ErrorCode::ManifestInvalid));
    }

    #[test]
    fn test_error_body_reason_fallbacks() {
        let not_json = HttpResponseError::new(400, Some("<html>Bad Request</html>".into()));
        assert_eq!(
            error_body_reason(&not_json),
            "registry returned HTTP 400 with an unreadable error body"
        );

        let no_body = HttpResponseError::new(405, None);
        assert_eq!(
            error_body_reason(&no_body),
            "registry returned HTTP 405 with an unreadable error body"
        );

        let empty = HttpResponseError::new(404, Some(r#"{"errors":[]}"#.into()));
        assert_eq!(
            error_body_reason(&empty),
            "registry returned HTTP 404 without error details"
        );
    }

    #[test]
    fn test_builder_joins_reasons() {
        let err = EndpointErrorBuilder::new("pull BLOB for r/app with digest d", None)
            .add_reason("first")
            .add_entry_reason(&entry(Some("NAME_UNKNOWN"), Some("repository name not known")))
            .build();
        assert_eq!(
            err.message(),
            "Tried to pull BLOB for r/app with digest d but failed because: first, other: repository name not known"
        );
        assert!(err.http_cause().is_none());
    }

    #[test]
    fn test_error_from_response_keeps_cause() {
        let cause = HttpResponseError::new(
            400,
            Some(r#"{"errors":[{"code":"TAG_INVALID","message":"manifest tag did not match URI"}]}"#.into()),
        );
        let err = error_from_response("push image manifest for r/app:v1", cause.clone());
        assert_eq!(
            err.to_string(),
            "Tried to push image manifest for r/app:v1 but failed because: manifest tag did not match URI"
        );
        assert_eq!(err.http_cause(), Some(&cause));
    }
}
