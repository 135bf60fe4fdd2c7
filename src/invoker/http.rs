//! HTTP invoker implementation
//!
//! The remote function is reached through two endpoints:
//! - the invoke endpoint runs one fetch per `POST {"url": ...}`
//! - the reset endpoint updates the function so its next run cold-starts on a
//!   fresh outbound address

use crate::config::InvokerConfig;
use crate::invoker::{InvokeError, Invoker, RawResponse};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::Instrument;

/// Header the executor sets when the function itself raised
const FUNCTION_ERROR_HEADER: &str = "x-function-error";

#[derive(Serialize)]
struct InvokeRequest<'a> {
    url: &'a str,
}

#[derive(Serialize)]
struct ResetRequest<'a> {
    function_name: &'a str,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<&'a str>,
}

/// Builds the HTTP client used for invocations
///
/// # Arguments
///
/// * `timeout` - Upper bound for a single invocation, including the remote fetch
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(concat!("relay-crawler/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .build()
}

/// Invoker that reaches the remote function over HTTP
pub struct HttpInvoker {
    client: Client,
    config: InvokerConfig,
    span: tracing::Span,
}

impl HttpInvoker {
    /// Creates an invoker for the configured function
    ///
    /// # Arguments
    ///
    /// * `config` - Endpoints, identity settings and timeouts
    /// * `span` - Span every invoker event is recorded under
    pub fn new(config: InvokerConfig, span: tracing::Span) -> Result<Self, InvokeError> {
        let client = build_http_client(config.timeout())?;
        Ok(Self {
            client,
            config,
            span,
        })
    }

    pub fn function_name(&self) -> &str {
        &self.config.function_name
    }
}

#[async_trait]
impl Invoker for HttpInvoker {
    async fn invoke(&self, url: &str) -> Result<RawResponse, InvokeError> {
        async {
            let response = self
                .client
                .post(&self.config.endpoint)
                .json(&InvokeRequest { url })
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        InvokeError::Timeout {
                            url: url.to_string(),
                        }
                    } else {
                        InvokeError::Http(e)
                    }
                })?;

            let status = response.status().as_u16();
            let function_error = response
                .headers()
                .get(FUNCTION_ERROR_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let payload = response.bytes().await?.to_vec();

            tracing::trace!("Invocation for {} returned {}", url, status);

            Ok::<_, InvokeError>(RawResponse {
                status,
                function_error,
                payload,
            })
        }
        .instrument(self.span.clone())
        .await
    }

    async fn reset_identity(&self) -> Result<(), InvokeError> {
        async {
            tracing::debug!("Resetting {}...", self.config.function_name);

            let request = ResetRequest {
                function_name: &self.config.function_name,
                description: format!("Crawler-{}", Utc::now().timestamp()),
                profile: self.config.profile.as_deref(),
                region: self.config.region.as_deref(),
            };

            let response = self
                .client
                .post(&self.config.reset_endpoint)
                .json(&request)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(InvokeError::ResetRejected {
                    status: status.as_u16(),
                    body,
                });
            }

            let settle = self.config.settle_delay();
            tracing::debug!("Waiting {:?} for the new identity to settle", settle);
            tokio::time::sleep(settle).await;

            Ok::<_, InvokeError>(())
        }
        .instrument(self.span.clone())
        .await
    }
}
