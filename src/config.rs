//! Configuration module for managing application settings and URL parsing

use crate::error::{RegistryError, Result};
use serde::{Deserialize, Serialize};
use std::env;

pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Scheme and host, e.g. `https://registry.example.com:5000`
    pub url: String,
    pub repository: String,
    pub tag: String,
    pub skip_tls: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub registry: RegistryConfig,
    pub auth: AuthConfig,
    /// Request timeout in seconds
    pub timeout: u64,
    pub verbose: bool,
}

impl AppConfig {
    pub fn new(
        repository_url: &str,
        username: Option<String>,
        password: Option<String>,
        skip_tls: bool,
        timeout: u64,
        verbose: bool,
    ) -> Result<Self> {
        let registry = RegistryConfig::parse_url(repository_url, skip_tls)?;
        let auth = AuthConfig { username, password };

        Ok(AppConfig {
            registry,
            auth,
            timeout,
            verbose,
        })
    }

    /// Read `REGISTRY_ADDRESS`, `REGISTRY_USERNAME`, `REGISTRY_PASSWORD`,
    /// `SKIP_TLS` and `REGISTRY_TIMEOUT` from the environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with a custom variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let address = lookup("REGISTRY_ADDRESS").ok_or_else(|| {
            RegistryError::Configuration("REGISTRY_ADDRESS not set".to_string())
        })?;
        let skip_tls = lookup("SKIP_TLS").is_some_and(|v| v.eq_ignore_ascii_case("true"));
        let timeout = match lookup("REGISTRY_TIMEOUT") {
            Some(value) => value.trim().parse::<u64>().map_err(|_| {
                RegistryError::Configuration(format!("Invalid REGISTRY_TIMEOUT: {}", value))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Self::new(
            &address,
            lookup("REGISTRY_USERNAME"),
            lookup("REGISTRY_PASSWORD"),
            skip_tls,
            timeout,
            false,
        )
    }

    pub fn has_auth(&self) -> bool {
        self.auth.username.is_some() && self.auth.password.is_some()
    }
}

impl RegistryConfig {
    /// Split `https://host/repo/name:tag` into its parts; the tag defaults to
    /// `latest` and the scheme to https
    pub fn parse_url(url: &str, skip_tls: bool) -> Result<Self> {
        let (protocol, remaining) = match url.find("://") {
            Some(pos) => (&url[..pos + 3], &url[pos + 3..]),
            None => ("https://", url),
        };

        let (host, path) = match remaining.find('/') {
            Some(pos) => (&remaining[..pos], &remaining[pos + 1..]),
            None => {
                return Err(RegistryError::Configuration(
                    "Invalid repository URL format. Expected: https://registry/project/repo:tag"
                        .to_string(),
                ));
            }
        };

        if host.is_empty() {
            return Err(RegistryError::Configuration(
                "Registry host cannot be empty".to_string(),
            ));
        }

        // A colon before the last slash belongs to a host:port, not a tag.
        let last_slash = path.rfind('/').map_or(0, |p| p + 1);
        let (repository, tag) = match path[last_slash..].rfind(':') {
            Some(colon) => (&path[..last_slash + colon], &path[last_slash + colon + 1..]),
            None => (path, "latest"),
        };

        if repository.is_empty() {
            return Err(RegistryError::Configuration(
                "Repository name cannot be empty".to_string(),
            ));
        }
        if tag.is_empty() {
            return Err(RegistryError::Configuration("Tag cannot be empty".to_string()));
        }

        Ok(RegistryConfig {
            url: format!("{}{}", protocol, host),
            repository: repository.to_string(),
            tag: tag.to_string(),
            skip_tls,
        })
    }

    /// Host (and port) without the scheme
    pub fn host(&self) -> &str {
        self.url
            .split_once("://")
            .map_or(self.url.as_str(), |(_, host)| host)
    }

    /// Root of the v2 API, e.g. `https://registry.example.com/v2/`
    pub fn api_base(&self) -> String {
        format!("{}/v2/", self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_url_with_tag() {
        let config =
            RegistryConfig::parse_url("https://registry.example.com/project/app:v1.2", false)
                .unwrap();
        assert_eq!(config.url, "https://registry.example.com");
        assert_eq!(config.repository, "project/app");
        assert_eq!(config.tag, "v1.2");
        assert_eq!(config.host(), "registry.example.com");
        assert_eq!(config.api_base(), "https://registry.example.com/v2/");
    }

    #[test]
    fn test_parse_url_defaults() {
        let config = RegistryConfig::parse_url("localhost:5000/app", true).unwrap();
        assert_eq!(config.url, "https://localhost:5000");
        assert_eq!(config.repository, "app");
        assert_eq!(config.tag, "latest");
        assert!(config.skip_tls);
    }

    #[test]
    fn test_parse_url_rejects_malformed() {
        for url in [
            "https://registry.example.com",
            "https:///app",
            "https://host/:tag",
            "https://host/app:",
        ] {
            assert!(
                matches!(
                    RegistryConfig::parse_url(url, false),
                    Err(RegistryError::Configuration(_))
                ),
                "{} should be rejected",
                url
            );
        }
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("REGISTRY_ADDRESS", "http://localhost:5000/team/app:dev"),
            ("REGISTRY_USERNAME", "admin"),
            ("REGISTRY_PASSWORD", "secret"),
            ("SKIP_TLS", "TRUE"),
            ("REGISTRY_TIMEOUT", "60"),
        ]
        .into_iter()
        .collect();

        let config = AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.registry.url, "http://localhost:5000");
        assert_eq!(config.registry.repository, "team/app");
        assert_eq!(config.registry.tag, "dev");
        assert!(config.registry.skip_tls);
        assert_eq!(config.timeout, 60);
        assert!(config.has_auth());
    }

    #[test]
    fn test_from_lookup_errors_and_defaults() {
        assert!(matches!(
            AppConfig::from_lookup(|_| None),
            Err(RegistryError::Configuration(_))
        ));

        let config = AppConfig::from_lookup(|key| {
            (key == "REGISTRY_ADDRESS").then(|| "registry.local/app".to_string())
        })
        .unwrap();
        assert_eq!(config.timeout, DEFAULT_TIMEOUT_SECS);
        assert!(!config.registry.skip_tls);
        assert!(!config.has_auth());

        let bad_timeout = AppConfig::from_lookup(|key| match key {
            "REGISTRY_ADDRESS" => Some("registry.local/app".to_string()),
            "REGISTRY_TIMEOUT" => Some("soon".to_string()),
            _ => None,
        });
        assert!(matches!(bad_timeout, Err(RegistryError::Configuration(_))));
    }
}
