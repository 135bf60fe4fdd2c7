//! Invoker module: the boundary to the remote fetch executor
//!
//! The crawler never fetches pages itself. It hands each URL to a remote
//! function and receives a structured answer back. This module defines that
//! contract and an HTTP implementation of it.

mod http;

pub use http::{build_http_client, HttpInvoker};

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while talking to the remote executor
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invocation timed out for {url}")]
    Timeout { url: String },

    #[error("Identity reset rejected with status {status}: {body}")]
    ResetRejected { status: u16, body: String },
}

/// Raw answer of one invocation
///
/// `status` is the invocation-level status: 200 means the call reached the
/// function and `payload` holds whatever it returned, which may itself report
/// an application-level failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub function_error: Option<String>,
    pub payload: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            function_error: None,
            payload: payload.into(),
        }
    }

    pub fn is_invocation_success(&self) -> bool {
        self.status == 200
    }

    pub fn payload_text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// Capability to run the remote fetch function
#[async_trait]
pub trait Invoker: Send + Sync {
    /// Runs the remote function for one URL
    async fn invoke(&self, url: &str) -> Result<RawResponse, InvokeError>;

    /// Forces the remote function onto a new outbound address
    ///
    /// Must not return until the new address is expected to be in effect.
    /// Callers never invoke again before this returns.
    async fn reset_identity(&self) -> Result<(), InvokeError>;
}
