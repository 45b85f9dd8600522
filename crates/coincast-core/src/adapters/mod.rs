//! Provider adapters.
//!
//! Each adapter normalizes one upstream's payload into the canonical
//! [`PriceSeries`](crate::PriceSeries) and shares the resilience path
//! below: circuit breaker gate, bounded timeout, at most one retry of
//! retryable failures.

mod coinbase;
mod yahoo;

pub use coinbase::CoinbaseAdapter;
pub use yahoo::YahooAdapter;

use std::sync::Arc;

use crate::circuit_breaker::CircuitBreaker;
use crate::data_source::{HealthState, SourceError};
use crate::http_client::{HttpClient, HttpRequest, HttpResponse};
use crate::retry::RetryPolicy;
use crate::CircuitState;

const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Execute one upstream call under the adapter resilience contract.
///
/// The breaker is consulted first; a transport error or retryable HTTP
/// status is retried once per the policy, and the final outcome is
/// recorded back into the breaker.
pub(crate) async fn execute_guarded(
    provider: &str,
    client: &Arc<dyn HttpClient>,
    breaker: &CircuitBreaker,
    retry: &RetryPolicy,
    request: HttpRequest,
) -> Result<HttpResponse, SourceError> {
    if !breaker.allow_request() {
        return Err(SourceError::unavailable(format!(
            "{provider} circuit breaker is open; skipping upstream call"
        )));
    }

    let mut attempt = 0;
    loop {
        let (retryable, failure) = match client.execute(request.clone()).await {
            Ok(response) if response.is_success() => {
                breaker.record_success();
                return Ok(response);
            }
            Ok(response) => (
                RETRYABLE_STATUSES.contains(&response.status),
                format!("{provider} upstream returned status {}", response.status),
            ),
            Err(error) => (
                error.retryable(),
                format!("{provider} transport error: {}", error.message()),
            ),
        };

        if retryable && attempt < retry.attempts() {
            attempt += 1;
            tokio::time::sleep(retry.delay()).await;
            continue;
        }

        breaker.record_failure();
        return Err(SourceError::unavailable(failure));
    }
}

pub(crate) fn health_from_breaker(breaker: &CircuitBreaker) -> HealthState {
    match breaker.state() {
        CircuitState::Closed => HealthState::Healthy,
        CircuitState::HalfOpen => HealthState::Degraded,
        CircuitState::Open => HealthState::Unhealthy,
    }
}

/// Stable per-symbol seed for deterministic offline fixtures.
pub(crate) fn symbol_seed(symbol: &crate::Symbol) -> u64 {
    symbol.as_str().bytes().fold(0_u64, |acc, byte| {
        acc.wrapping_mul(33).wrapping_add(byte as u64)
    })
}
