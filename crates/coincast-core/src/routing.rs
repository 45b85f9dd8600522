//! Source routing and fallback.
//!
//! The router owns the registered provider adapters and resolves which
//! one serves a history request. `Auto` walks the priority order
//! (yahoo, then coinbase) and falls back when a source fails with a
//! retryable error; `Strict` pins one provider and never falls back.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::adapters::{CoinbaseAdapter, YahooAdapter};
use crate::data_source::{DataSource, HealthState, HistoryRequest, SourceError};
use crate::envelope::EnvelopeError;
use crate::http_client::{HttpClient, NoopHttpClient, ReqwestHttpClient};
use crate::{PriceSeries, ProviderId};

/// Source selection strategy for routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStrategy {
    Auto,
    Strict(ProviderId),
}

/// Priority order used by `Auto`.
const AUTO_PRIORITY: [ProviderId; 2] = [ProviderId::Yahoo, ProviderId::Coinbase];

/// Successful routed call.
#[derive(Debug, Clone)]
pub struct RouteSuccess<T> {
    pub data: T,
    pub selected_source: ProviderId,
    pub source_chain: Vec<ProviderId>,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub latency_ms: u64,
}

/// Failed routed call after exhausting candidates.
#[derive(Debug, Clone)]
pub struct RouteFailure {
    pub source_chain: Vec<ProviderId>,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub latency_ms: u64,
}

impl RouteFailure {
    /// The most meaningful upstream error for request-boundary
    /// reporting: the last non-retryable one if present, else the last.
    pub fn primary_error(&self) -> Option<&EnvelopeError> {
        self.errors
            .iter()
            .rev()
            .find(|error| error.retryable == Some(false))
            .or_else(|| self.errors.last())
    }

    /// Human-readable summary of an exhausted fetch.
    pub fn summary(&self) -> String {
        match self.primary_error() {
            Some(error) => error.message.clone(),
            None => String::from("no data source could serve the request"),
        }
    }
}

pub type RouteResult<T> = Result<RouteSuccess<T>, RouteFailure>;

/// Source snapshot used by the `sources` CLI command.
#[derive(Debug, Clone, Copy)]
pub struct SourceSnapshot {
    pub id: ProviderId,
    pub health: HealthState,
}

impl SourceSnapshot {
    pub fn status_label(self) -> &'static str {
        match self.health {
            HealthState::Healthy => "healthy",
            HealthState::Degraded => "degraded",
            HealthState::Unhealthy => "unhealthy",
        }
    }
}

/// Adapter registry and routing engine.
pub struct SourceRouter {
    adapters: HashMap<ProviderId, Arc<dyn DataSource>>,
}

impl Default for SourceRouter {
    fn default() -> Self {
        Self::new(vec![
            Arc::new(YahooAdapter::default()),
            Arc::new(CoinbaseAdapter::default()),
        ])
    }
}

impl SourceRouter {
    pub fn new(adapters: Vec<Arc<dyn DataSource>>) -> Self {
        Self {
            adapters: adapters
                .into_iter()
                .map(|adapter| (adapter.id(), adapter))
                .collect(),
        }
    }

    /// Candidate providers for a strategy, in attempt order.
    pub fn source_chain_for_strategy(&self, strategy: &SourceStrategy) -> Vec<ProviderId> {
        match strategy {
            SourceStrategy::Auto => AUTO_PRIORITY
                .into_iter()
                .filter(|id| self.adapters.contains_key(id))
                .collect(),
            SourceStrategy::Strict(id) => vec![*id],
        }
    }

    /// Health snapshots for every registered provider, priority order.
    pub fn snapshots(&self) -> Vec<SourceSnapshot> {
        AUTO_PRIORITY
            .into_iter()
            .filter_map(|id| {
                self.adapters.get(&id).map(|adapter| SourceSnapshot {
                    id,
                    health: adapter.health(),
                })
            })
            .collect()
    }

    /// Route a history request, falling back across candidates on
    /// retryable failures.
    pub async fn route_history(
        &self,
        request: &HistoryRequest,
        strategy: SourceStrategy,
    ) -> RouteResult<PriceSeries> {
        let started = Instant::now();
        let candidates = self.source_chain_for_strategy(&strategy);
        let mut attempted = Vec::new();
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        for id in candidates {
            attempted.push(id);

            let Some(adapter) = self.adapters.get(&id) else {
                errors.push(envelope_error(
                    &SourceError::adapter_not_registered(id),
                    id,
                ));
                continue;
            };

            match adapter.history(request.clone()).await {
                Ok(series) => {
                    return Ok(RouteSuccess {
                        data: series,
                        selected_source: id,
                        source_chain: attempted,
                        warnings,
                        errors,
                        latency_ms: started.elapsed().as_millis() as u64,
                    });
                }
                Err(error) => {
                    let fall_through = error.retryable();
                    errors.push(envelope_error(&error, id));
                    if fall_through {
                        warnings.push(format!("source '{id}' unavailable, trying next candidate"));
                        continue;
                    }
                    // Terminal errors (NoData, bad request) are not
                    // recoverable by switching providers.
                    break;
                }
            }
        }

        Err(RouteFailure {
            source_chain: attempted,
            warnings,
            errors,
            latency_ms: started.elapsed().as_millis() as u64,
        })
    }
}

/// Builder for a router wired with either live or offline transports.
#[derive(Debug, Default)]
pub struct SourceRouterBuilder {
    offline: bool,
    timeout_ms: Option<u64>,
}

impl SourceRouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// All adapters serve deterministic offline fixtures.
    pub fn with_offline_mode(mut self) -> Self {
        self.offline = true;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn build(self) -> SourceRouter {
        let client: Arc<dyn HttpClient> = if self.offline {
            Arc::new(NoopHttpClient)
        } else {
            Arc::new(ReqwestHttpClient::new())
        };
        let timeout_ms = self.timeout_ms.unwrap_or(10_000);

        SourceRouter::new(vec![
            Arc::new(YahooAdapter::with_http_client(client.clone()).with_timeout_ms(timeout_ms)),
            Arc::new(CoinbaseAdapter::with_http_client(client).with_timeout_ms(timeout_ms)),
        ])
    }
}

fn envelope_error(error: &SourceError, source: ProviderId) -> EnvelopeError {
    EnvelopeError {
        code: error.code().to_owned(),
        message: error.message().to_owned(),
        retryable: Some(error.retryable()),
        source: Some(source),
    }
}
