//! History fetching with an explicit, injected response cache.
//!
//! The cache sits in front of the router and is keyed by
//! `(symbol, start, end)`. Stored values are the serialized series, so
//! a hit inside the staleness window reproduces the original fetch
//! exactly. Substituting [`CacheStore::disabled`] turns the layer into
//! a pass-through for tests.

use serde::{Deserialize, Serialize};

use crate::cache::{CacheMode, CacheStore};
use crate::data_source::HistoryRequest;
use crate::envelope::EnvelopeError;
use crate::routing::{RouteFailure, SourceRouter, SourceStrategy};
use crate::{PriceSeries, ProviderId};

/// A fetched series plus the metadata the envelope layer reports.
#[derive(Debug, Clone)]
pub struct HistoryOutcome {
    pub series: PriceSeries,
    pub selected_source: ProviderId,
    pub source_chain: Vec<ProviderId>,
    pub cache_hit: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub latency_ms: u64,
}

/// Payload stored in the cache: the series plus the provider that
/// produced it, so hits report an honest source chain.
#[derive(Debug, Serialize, Deserialize)]
struct CachePayload {
    source: ProviderId,
    series: PriceSeries,
}

/// Router + cache composition used by the pipeline and the CLI.
pub struct HistoryFetcher {
    router: SourceRouter,
    cache: CacheStore,
}

impl HistoryFetcher {
    pub fn new(router: SourceRouter, cache: CacheStore) -> Self {
        Self { router, cache }
    }

    pub fn router(&self) -> &SourceRouter {
        &self.router
    }

    pub async fn fetch(
        &self,
        request: &HistoryRequest,
        strategy: SourceStrategy,
        mode: CacheMode,
    ) -> Result<HistoryOutcome, RouteFailure> {
        let key = cache_key(request);

        if mode == CacheMode::Use {
            if let Some(body) = self.cache.get(&key).await {
                // An unreadable entry is treated as a miss; the network
                // result will overwrite it below.
                if let Ok(payload) = serde_json::from_str::<CachePayload>(&body) {
                    return Ok(HistoryOutcome {
                        series: payload.series,
                        selected_source: payload.source,
                        source_chain: vec![payload.source],
                        cache_hit: true,
                        warnings: Vec::new(),
                        errors: Vec::new(),
                        latency_ms: 0,
                    });
                }
            }
        }

        let success = self.router.route_history(request, strategy).await?;

        let mut warnings = success.warnings;
        if mode == CacheMode::Use {
            let payload = CachePayload {
                source: success.selected_source,
                series: success.data.clone(),
            };
            match serde_json::to_string(&payload) {
                Ok(body) => self.cache.put(key, body).await,
                Err(error) => warnings.push(format!("failed to cache fetched series: {error}")),
            }
        }

        Ok(HistoryOutcome {
            series: success.data,
            selected_source: success.selected_source,
            source_chain: success.source_chain,
            cache_hit: false,
            warnings,
            errors: success.errors,
            latency_ms: success.latency_ms,
        })
    }
}

fn cache_key(request: &HistoryRequest) -> String {
    format!(
        "{}:{}:{}",
        request.symbol,
        request.range.start(),
        request.range.end()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::SourceRouterBuilder;
    use crate::{DateRange, MarketDate, Symbol};

    fn request() -> HistoryRequest {
        HistoryRequest::new(
            Symbol::btc_usd(),
            DateRange::new(
                MarketDate::parse("2024-01-01").expect("start"),
                MarketDate::parse("2024-03-01").expect("end"),
                MarketDate::parse("2030-01-01").expect("today"),
            )
            .expect("valid range"),
        )
    }

    fn offline_fetcher(cache: CacheStore) -> HistoryFetcher {
        HistoryFetcher::new(SourceRouterBuilder::new().with_offline_mode().build(), cache)
    }

    #[tokio::test]
    async fn second_fetch_hits_cache_with_identical_series() {
        let fetcher = offline_fetcher(CacheStore::with_default_ttl());

        let first = fetcher
            .fetch(&request(), SourceStrategy::Auto, CacheMode::Use)
            .await
            .expect("first fetch succeeds");
        assert!(!first.cache_hit);

        let second = fetcher
            .fetch(&request(), SourceStrategy::Auto, CacheMode::Use)
            .await
            .expect("second fetch succeeds");
        assert!(second.cache_hit);
        assert_eq!(second.series, first.series);
        assert_eq!(second.selected_source, first.selected_source);
    }

    #[tokio::test]
    async fn disabled_cache_always_misses() {
        let fetcher = offline_fetcher(CacheStore::disabled());

        for _ in 0..2 {
            let outcome = fetcher
                .fetch(&request(), SourceStrategy::Auto, CacheMode::Use)
                .await
                .expect("fetch succeeds");
            assert!(!outcome.cache_hit);
        }
    }

    #[tokio::test]
    async fn bypass_mode_skips_read_and_write() {
        let cache = CacheStore::with_default_ttl();
        let fetcher = offline_fetcher(cache.clone());

        let outcome = fetcher
            .fetch(&request(), SourceStrategy::Auto, CacheMode::Bypass)
            .await
            .expect("fetch succeeds");
        assert!(!outcome.cache_hit);
        assert_eq!(cache.len().await, 0);
    }
}
