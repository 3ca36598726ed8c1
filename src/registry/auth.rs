//! `Authorization` header values attached to registry requests
//!
//! Credentials are supplied by the user; no token exchange happens here.

use crate::config::AuthConfig;
use crate::error::{RegistryError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::HeaderValue;
use std::fmt;

#[derive(Clone, PartialEq, Eq)]
pub enum Authorization {
    Basic { username: String, password: String },
    Bearer(String),
}

impl Authorization {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer(token.into())
    }

    /// Basic credentials from config, when both username and password are set
    pub fn from_config(auth: &AuthConfig) -> Option<Self> {
        match (&auth.username, &auth.password) {
            (Some(username), Some(password)) => Some(Self::basic(username, password)),
            _ => None,
        }
    }

    pub fn scheme(&self) -> &'static str {
        match self {
            Self::Basic { .. } => "Basic",
            Self::Bearer(_) => "Bearer",
        }
    }

    pub fn header_value(&self) -> Result<HeaderValue> {
        let value = match self {
            Self::Basic { username, password } => {
                format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
            }
            Self::Bearer(token) => format!("Bearer {}", token),
        };
        let mut header = HeaderValue::from_str(&value).map_err(|e| {
            RegistryError::Validation(format!("Invalid {} credentials: {}", self.scheme(), e))
        })?;
        header.set_sensitive(true);
        Ok(header)
    }
}

// Keeps secrets out of logs and panics.
impl fmt::Debug for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic { username, .. } => write!(f, "Basic({}, ****)", username),
            Self::Bearer(_) => write!(f, "Bearer(****)"),
        }
    }
}
