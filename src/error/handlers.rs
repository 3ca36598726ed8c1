//! Standardized error mapping shared by the caller, config and CLI

use crate::error::{HttpResponseError, RegistryError, Result};

/// Maps HTTP error responses that no endpoint provider claimed
pub struct HttpErrorHandler;

impl HttpErrorHandler {
    /// Generic policy for a deferred HTTP error response
    pub fn handle_deferred(action: &str, error: HttpResponseError) -> RegistryError {
        match error.status_code() {
            401 | 403 => RegistryError::Unauthorized {
                action: action.to_string(),
                source: error,
            },
            _ => RegistryError::Http(error),
        }
    }
}

/// Network error categorization and handling
pub struct NetworkErrorHandler;

impl NetworkErrorHandler {
    /// Categorize and format network errors with helpful context
    pub fn handle_network_error(error: &reqwest::Error, context: &str) -> RegistryError {
        let text = error.to_string();
        if error.is_timeout() {
            RegistryError::Timeout(format!("{} timeout: {}", context, error))
        } else if error.is_connect() {
            RegistryError::Network(format!("Connection error during {}: {}", context, error))
        } else if text.contains("dns") {
            RegistryError::Network(format!("DNS resolution error for {}: {}", context, error))
        } else if text.contains("certificate") {
            RegistryError::Network(format!(
                "TLS certificate error during {}: {}",
                context, error
            ))
        } else {
            RegistryError::Network(format!("{} network error: {}", context, error))
        }
    }
}

/// Validation error utilities
pub struct ValidationErrorHandler;

impl ValidationErrorHandler {
    /// Standard URL validation
    pub fn validate_repository_url(url: &str) -> Result<()> {
        if url.is_empty() {
            return Err(RegistryError::Validation(
                "Repository URL cannot be empty".to_string(),
            ));
        }

        if !url.contains("://") {
            return Err(RegistryError::Validation(
                "Repository URL must include protocol (http:// or https://)".to_string(),
            ));
        }

        Ok(())
    }

    /// Username and password must be given together
    pub fn validate_credentials(
        username: &Option<String>,
        password: &Option<String>,
    ) -> Result<()> {
        match (username, password) {
            (Some(_), None) => Err(RegistryError::Validation(
                "Password is required when username is provided".to_string(),
            )),
            (None, Some(_)) => Err(RegistryError::Validation(
                "Username is required when password is provided".to_string(),
            )),
            _ => Ok(()),
        }
    }

    pub fn validate_timeout(timeout: u64) -> Result<()> {
        if timeout == 0 {
            return Err(RegistryError::Validation(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        if timeout > 86400 {
            return Err(RegistryError::Validation(
                "Timeout cannot exceed 24 hours (86400 seconds)".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deferred_auth_errors_become_unauthorized() {
        for status in [401, 403] {
            let err = HttpErrorHandler::handle_deferred(
                "pull BLOB for r/app with digest d",
                HttpResponseError::new(status, None),
            );
            match err {
                RegistryError::Unauthorized { action, source } => {
                    assert_eq!(action, "pull BLOB for r/app with digest d");
                    assert_eq!(source.status_code(), status);
                }
                other => panic!("unexpected error: {:?}", other),
            }
        }
    }

    #[test]
    fn test_deferred_other_errors_pass_through() {
        let err = HttpErrorHandler::handle_deferred("x", HttpResponseError::new(409, None));
        assert!(matches!(err, RegistryError::Http(e) if e.status_code() == 409));
    }

    #[test]
    fn test_validate_credentials() {
        assert!(ValidationErrorHandler::validate_credentials(&None, &None).is_ok());
        assert!(
            ValidationErrorHandler::validate_credentials(&Some("u".into()), &Some("p".into()))
                .is_ok()
        );
        assert!(ValidationErrorHandler::validate_credentials(&Some("u".into()), &None).is_err());
        assert!(ValidationErrorHandler::validate_credentials(&None, &Some("p".into())).is_err());
    }

    #[test]
    fn test_validate_repository_url_and_timeout() {
        assert!(ValidationErrorHandler::validate_repository_url("").is_err());
        assert!(ValidationErrorHandler::validate_repository_url("registry/app").is_err());
        assert!(ValidationErrorHandler::validate_repository_url("https://registry/app").is_ok());

        assert!(ValidationErrorHandler::validate_timeout(0).is_err());
        assert!(ValidationErrorHandler::validate_timeout(90000).is_err());
        assert!(ValidationErrorHandler::validate_timeout(300).is_ok());
    }
}
