//! Executes endpoint providers against a registry
//!
//! [`RegistryEndpointCaller`] turns a provider's answers into a request,
//! sends it, and routes the reply back through the provider: 2xx responses to
//! `handle_response`, 4xx/5xx to `handle_http_response_error`. Errors the
//! provider defers get the generic policy in
//! [`HttpErrorHandler::handle_deferred`].

use crate::error::handlers::HttpErrorHandler;
use crate::error::{HttpResponseError, RegistryError, Result};
use crate::logging::Logger;
use crate::registry::auth::Authorization;
use crate::registry::endpoint::{HttpErrorOutcome, RegistryEndpointProvider};
use crate::registry::transport::{RegistryTransport, TransportRequest};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use std::sync::Arc;
use std::time::Instant;

pub const DEFAULT_USER_AGENT: &str = concat!("registry-endpoints/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct RegistryEndpointCaller {
    transport: Arc<dyn RegistryTransport>,
    api_base: String,
    authorization: Option<Authorization>,
    user_agent: String,
    logger: Logger,
}

impl RegistryEndpointCaller {
    /// `api_base` is the registry's `/v2/` root, e.g. `https://gcr.io/v2/`
    pub fn new(transport: Arc<dyn RegistryTransport>, api_base: impl Into<String>) -> Self {
        Self {
            transport,
            api_base: api_base.into(),
            authorization: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            logger: Logger::default(),
        }
    }

    pub fn with_authorization(mut self, authorization: Option<Authorization>) -> Self {
        self.authorization = authorization;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn authorization(&self) -> Option<&Authorization> {
        self.authorization.as_ref()
    }

    /// Run one registry operation
    pub async fn call<P: RegistryEndpointProvider>(&self, provider: &P) -> Result<P::Output> {
        let request = self.build_request(provider)?;
        self.logger.request(&request.method, request.url.as_str());

        let started = Instant::now();
        let response = self.transport.execute(request).await?;
        self.logger.response(response.status(), started.elapsed());

        let status = response.status();
        if status.is_success() {
            return provider.handle_response(&response);
        }

        if !status.is_client_error() && !status.is_server_error() {
            return Err(RegistryError::UnexpectedResponse(format!(
                "Failed to {}: registry returned HTTP {}",
                provider.action_description(),
                status
            )));
        }

        let error = HttpResponseError::new(status.as_u16(), response.error_content())
            .with_url(response.url().as_str());
        match provider.handle_http_response_error(error) {
            HttpErrorOutcome::Recovered(output) => {
                self.logger.detail(&format!("{} handled by endpoint", status));
                Ok(output)
            }
            HttpErrorOutcome::Deferred(error) => {
                let action = provider.action_description();
                self.logger.warning(&format!("Failed to {}: {}", action, error));
                Err(HttpErrorHandler::handle_deferred(&action, error))
            }
            HttpErrorOutcome::Failed(failure) => {
                self.logger.warning(failure.message());
                Err(failure.into())
            }
        }
    }

    fn build_request<P: RegistryEndpointProvider>(&self, provider: &P) -> Result<TransportRequest> {
        let mut headers = HeaderMap::new();

        let accept = provider.accept();
        if !accept.is_empty() {
            let value = HeaderValue::from_str(&accept.join(", ")).map_err(|e| {
                RegistryError::Validation(format!("Invalid Accept header: {}", e))
            })?;
            headers.insert(ACCEPT, value);
        }

        let user_agent = HeaderValue::from_str(&self.user_agent)
            .map_err(|e| RegistryError::Validation(format!("Invalid User-Agent: {}", e)))?;
        headers.insert(USER_AGENT, user_agent);

        if let Some(authorization) = &self.authorization {
            headers.insert(AUTHORIZATION, authorization.header_value()?);
        }

        Ok(TransportRequest {
            method: provider.http_method(),
            url: provider.api_route(&self.api_base)?,
            headers,
            body: provider.content(),
        })
    }
}
