//! HTTP transport used by the endpoint caller
//!
//! The [`RegistryTransport`] trait is the only place requests leave the
//! process. [`HttpTransport`] implements it with reqwest; tests can swap in
//! their own implementation.

use crate::error::{RegistryError, Result};
use crate::error::handlers::NetworkErrorHandler;
use crate::registry::endpoint::{BlobHttpContent, RegistryResponse};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::{Client, Method};
use std::time::Duration;
use url::Url;

/// One outgoing registry request
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<BlobHttpContent>,
}

/// Sends a request and buffers the reply, whatever its status
#[async_trait]
pub trait RegistryTransport: Send + Sync {
    async fn execute(&self, request: TransportRequest) -> Result<RegistryResponse>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(skip_tls: bool, timeout: Duration) -> Result<Self> {
        let builder = Client::builder().timeout(timeout);
        let builder = if skip_tls {
            builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true)
        } else {
            builder
        };

        let client = builder.build().map_err(|e| {
            RegistryError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RegistryTransport for HttpTransport {
    async fn execute(&self, request: TransportRequest) -> Result<RegistryResponse> {
        let TransportRequest {
            method,
            url,
            headers,
            body,
        } = request;
        let context = format!("{} {}", method, url);

        let mut builder = self.client.request(method, url).headers(headers);
        if let Some(body) = body {
            builder = builder.header(CONTENT_TYPE, body.media_type());
            builder = builder.body(body.into_body());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(&e, &context))?;

        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(&e, &context))?;

        Ok(RegistryResponse::new(status, url)
            .with_headers(headers)
            .with_body(body))
    }
}
