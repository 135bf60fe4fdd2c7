//! Attempt evaluation
//!
//! Turns the raw answer of one invocation into a [`CrawlOutcome`] and applies
//! the persistence rule that goes with it:
//!
//! | Answer | Outcome | Persisted |
//! |--------|---------|-----------|
//! | invoker error | TransportFailure | nothing |
//! | invocation status != 200 | TransportFailure | nothing |
//! | payload without `status_code` | TransportFailure | nothing |
//! | `status_code` 403 | Blocked | nothing |
//! | other `status_code` != 200 | PermanentFailure | failure ledger |
//! | `status_code` 200 | Success | artifact + success ledger |
//!
//! In test mode artifacts are still written but the ledgers are left alone.

use crate::invoker::{InvokeError, RawResponse};
use crate::ledger::Ledger;
use crate::output::ResultStore;
use crate::state::{CrawlOutcome, OutcomeKind, Payload, STATUS_BLOCKED, STATUS_OK};
use crate::CrawlError;
use serde_json::Value;

/// What the session needs to know about one evaluated attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub kind: OutcomeKind,
    pub status_code: Option<u16>,
}

/// Classifies invocation results and records final outcomes
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator {
    test_mode: bool,
}

impl Evaluator {
    pub fn new(test_mode: bool) -> Self {
        Self { test_mode }
    }

    /// Classifies one invocation result without side effects
    pub fn classify(result: Result<RawResponse, InvokeError>) -> CrawlOutcome {
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                return CrawlOutcome::TransportFailure {
                    status: None,
                    reason: e.to_string(),
                }
            }
        };

        if !response.is_invocation_success() {
            return CrawlOutcome::TransportFailure {
                status: Some(response.status),
                reason: response
                    .function_error
                    .clone()
                    .unwrap_or_else(|| format!("invocation returned {}", response.status)),
            };
        }

        let payload = match parse_payload(&response.payload) {
            Some(payload) => payload,
            None => {
                return CrawlOutcome::TransportFailure {
                    status: Some(response.status),
                    reason: format!("bad return payload: {}", response.payload_text()),
                }
            }
        };

        let status_code = match payload.get("status_code").and_then(status_code_of) {
            Some(code) => code,
            None => {
                return CrawlOutcome::TransportFailure {
                    status: Some(response.status),
                    reason: format!("bad return payload: {}", response.payload_text()),
                }
            }
        };

        match status_code {
            STATUS_OK => CrawlOutcome::Success(payload),
            STATUS_BLOCKED => CrawlOutcome::Blocked(status_code),
            code => CrawlOutcome::PermanentFailure(code),
        }
    }

    /// Classifies a result and persists it according to its outcome
    ///
    /// # Arguments
    ///
    /// * `url` - The URL that was invoked
    /// * `result` - What the invoker returned
    /// * `ledger` - Receives final outcomes (unless in test mode)
    /// * `store` - Receives artifacts of successful fetches
    ///
    /// # Returns
    ///
    /// * `Ok(Evaluation)` - The outcome kind and the status code to report
    /// * `Err(CrawlError)` - A ledger append failed
    pub fn evaluate(
        &self,
        url: &str,
        result: Result<RawResponse, InvokeError>,
        ledger: &mut dyn Ledger,
        store: &ResultStore,
    ) -> Result<Evaluation, CrawlError> {
        let outcome = match Self::classify(result) {
            CrawlOutcome::Success(payload) => self.persist_success(url, payload, ledger, store)?,

            CrawlOutcome::PermanentFailure(code) => {
                tracing::debug!("Failed on {} with status code: {}", url, code);
                if !self.test_mode {
                    ledger.record_failure(url, code)?;
                }
                CrawlOutcome::PermanentFailure(code)
            }

            CrawlOutcome::Blocked(code) => {
                tracing::debug!("Blocked on {} with status code: {}", url, code);
                CrawlOutcome::Blocked(code)
            }

            CrawlOutcome::TransportFailure { status, reason } => {
                match status {
                    Some(status) => {
                        tracing::debug!("Failed on {} ({}): {}", url, status, reason)
                    }
                    None => tracing::debug!("Failed on {}: {}", url, reason),
                }
                CrawlOutcome::TransportFailure { status, reason }
            }
        };

        Ok(Evaluation {
            kind: outcome.kind(),
            status_code: outcome.status_code(),
        })
    }

    fn persist_success(
        &self,
        url: &str,
        payload: Payload,
        ledger: &mut dyn Ledger,
        store: &ResultStore,
    ) -> Result<CrawlOutcome, CrawlError> {
        // Artifact first: a URL never reaches the success ledger without one.
        if let Err(e) = store.write(url, &payload) {
            tracing::warn!("Failed to save the result of {}: {}", url, e);
            return Ok(CrawlOutcome::TransportFailure {
                status: Some(STATUS_OK),
                reason: format!("artifact write failed: {}", e),
            });
        }

        if !self.test_mode {
            ledger.record_success(url)?;
        }

        Ok(CrawlOutcome::Success(payload))
    }
}

// Integral floats such as `404.0` count; codes outside u16 do not.
fn status_code_of(value: &Value) -> Option<u16> {
    let code = match value.as_u64() {
        Some(code) => code,
        None => {
            let code = value.as_f64()?;
            if code.fract() != 0.0 || code < 0.0 || code > f64::from(u16::MAX) {
                return None;
            }
            code as u64
        }
    };
    u16::try_from(code).ok()
}

fn parse_payload(bytes: &[u8]) -> Option<Payload> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
