//! Behavior-driven tests for data provider behavior.
//!
//! These tests verify HOW the system handles provider scenarios:
//! normalization guarantees, fallback routing, caching, and the
//! circuit breaker, all against deterministic offline transports.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use coincast_core::{
    CacheMode, CacheStore, CoinbaseAdapter, DataSource, HistoryFetcher, HistoryRequest,
    HttpClient, HttpError, HttpRequest, HttpResponse, ProviderId, SourceErrorKind, SourceRouter,
    SourceRouterBuilder, SourceStrategy, Symbol, YahooAdapter,
};
use coincast_tests::{range, record, series};

fn btc_request(start: &str, end: &str) -> HistoryRequest {
    HistoryRequest::new(Symbol::btc_usd(), range(start, end))
}

// =============================================================================
// Data Provider: Normalization Guarantees
// =============================================================================

#[tokio::test]
async fn when_yahoo_serves_history_rows_are_sorted_and_unique() {
    // Given: the yahoo adapter with its offline transport
    let adapter = YahooAdapter::default();

    // When: a month of history is requested
    let result = adapter
        .history(btc_request("2024-01-01", "2024-02-01"))
        .await;

    // Then: rows are strictly ascending by date with no duplicates
    let series = result.expect("offline history should succeed");
    assert_eq!(series.len(), 31);
    for pair in series.records().windows(2) {
        assert!(pair[0].date < pair[1].date, "dates must strictly ascend");
    }
}

#[tokio::test]
async fn when_yahoo_serves_history_rows_respect_bar_invariants() {
    let adapter = YahooAdapter::default();
    let series = adapter
        .history(btc_request("2024-01-01", "2024-01-15"))
        .await
        .expect("offline history should succeed");

    for record in series.records() {
        assert!(record.high >= record.low);
        assert!(record.open >= record.low && record.open <= record.high);
        if let Some(close) = record.close {
            assert!(close >= record.low && close <= record.high);
        }
    }
}

#[tokio::test]
async fn when_any_provider_serves_history_rows_stay_inside_the_range() {
    // Given: both adapters in offline mode
    let providers: Vec<Arc<dyn DataSource>> = vec![
        Arc::new(YahooAdapter::default()),
        Arc::new(CoinbaseAdapter::default()),
    ];
    let request = btc_request("2024-03-10", "2024-03-20");

    for provider in providers {
        // When: history is fetched
        let series = provider
            .history(request.clone())
            .await
            .expect("offline history should succeed");

        // Then: every row satisfies start-inclusive, end-exclusive
        assert!(!series.is_empty());
        for record in series.records() {
            assert!(record.date >= request.range.start());
            assert!(record.date < request.range.end());
        }
    }
}

#[test]
fn when_upstream_rows_arrive_shuffled_series_construction_normalizes_them() {
    // Given: rows out of order with one duplicated date
    let shuffled = series(vec![
        record("2024-01-05", 105.0),
        record("2024-01-02", 102.0),
        record("2024-01-05", 999.0),
        record("2024-01-03", 103.0),
    ]);

    // Then: sorted ascending, duplicate dropped, first occurrence kept
    let dates: Vec<String> = shuffled
        .records()
        .iter()
        .map(|r| r.date.format_iso())
        .collect();
    assert_eq!(dates, ["2024-01-02", "2024-01-03", "2024-01-05"]);
    assert_eq!(shuffled.records()[2].close, Some(105.0));
}

// =============================================================================
// Data Provider: Routing and Fallback
// =============================================================================

struct BrokenSource {
    id: ProviderId,
}

impl DataSource for BrokenSource {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn history<'a>(
        &'a self,
        _req: HistoryRequest,
    ) -> Pin<
        Box<
            dyn Future<Output = Result<coincast_core::PriceSeries, coincast_core::SourceError>>
                + Send
                + 'a,
        >,
    > {
        Box::pin(async move { Err(coincast_core::SourceError::unavailable("upstream down")) })
    }

    fn health(&self) -> coincast_core::HealthState {
        coincast_core::HealthState::Unhealthy
    }
}

#[tokio::test]
async fn when_primary_source_is_down_router_falls_back_to_secondary() {
    // Given: a broken yahoo and a healthy offline coinbase
    let router = SourceRouter::new(vec![
        Arc::new(BrokenSource {
            id: ProviderId::Yahoo,
        }),
        Arc::new(CoinbaseAdapter::default()),
    ]);

    // When: routing under the auto strategy
    let success = router
        .route_history(&btc_request("2024-01-01", "2024-02-01"), SourceStrategy::Auto)
        .await
        .expect("fallback should succeed");

    // Then: coinbase served the data and the chain records both hops
    assert_eq!(success.selected_source, ProviderId::Coinbase);
    assert_eq!(
        success.source_chain,
        vec![ProviderId::Yahoo, ProviderId::Coinbase]
    );
    assert!(!success.errors.is_empty());
}

#[tokio::test]
async fn when_strategy_is_strict_router_reports_failure_without_fallback() {
    let router = SourceRouter::new(vec![
        Arc::new(BrokenSource {
            id: ProviderId::Yahoo,
        }),
        Arc::new(CoinbaseAdapter::default()),
    ]);

    let failure = router
        .route_history(
            &btc_request("2024-01-01", "2024-02-01"),
            SourceStrategy::Strict(ProviderId::Yahoo),
        )
        .await
        .expect_err("strict routing must not fall back");

    assert_eq!(failure.source_chain, vec![ProviderId::Yahoo]);
    let primary = failure.primary_error().expect("error recorded");
    assert_eq!(primary.source, Some(ProviderId::Yahoo));
}

// =============================================================================
// Data Provider: Caching
// =============================================================================

#[tokio::test]
async fn when_the_same_range_is_fetched_twice_cache_returns_identical_series() {
    // Given: a fetcher with the standard one-hour cache
    let fetcher = HistoryFetcher::new(
        SourceRouterBuilder::new().with_offline_mode().build(),
        CacheStore::with_default_ttl(),
    );
    let request = btc_request("2023-06-01", "2023-09-01");

    // When: the same key is fetched twice inside the window
    let first = fetcher
        .fetch(&request, SourceStrategy::Auto, CacheMode::Use)
        .await
        .expect("first fetch succeeds");
    let second = fetcher
        .fetch(&request, SourceStrategy::Auto, CacheMode::Use)
        .await
        .expect("second fetch succeeds");

    // Then: the hit reproduces the original fetch exactly
    assert!(!first.cache_hit);
    assert!(second.cache_hit);
    assert_eq!(second.series, first.series);

    let first_json = serde_json::to_string(&first.series).expect("series serializes");
    let second_json = serde_json::to_string(&second.series).expect("series serializes");
    assert_eq!(first_json, second_json);
}

#[tokio::test]
async fn when_ranges_differ_cache_keys_do_not_collide() {
    let fetcher = HistoryFetcher::new(
        SourceRouterBuilder::new().with_offline_mode().build(),
        CacheStore::with_default_ttl(),
    );

    let narrow = fetcher
        .fetch(
            &btc_request("2023-06-01", "2023-07-01"),
            SourceStrategy::Auto,
            CacheMode::Use,
        )
        .await
        .expect("narrow fetch succeeds");
    let wide = fetcher
        .fetch(
            &btc_request("2023-06-01", "2023-08-01"),
            SourceStrategy::Auto,
            CacheMode::Use,
        )
        .await
        .expect("wide fetch succeeds");

    assert!(!wide.cache_hit, "a different range must miss");
    assert!(wide.series.len() > narrow.series.len());
}

// =============================================================================
// Data Provider: Circuit Breaker and Retry
// =============================================================================

struct CountingFailClient {
    calls: Mutex<u32>,
}

impl HttpClient for CountingFailClient {
    fn execute<'a>(
        &'a self,
        _request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        *self.calls.lock().expect("call counter") += 1;
        Box::pin(async move { Err(HttpError::new("connection reset")) })
    }

    fn is_offline(&self) -> bool {
        true
    }
}

#[tokio::test]
async fn when_transport_keeps_failing_adapter_retries_once_then_gives_up() {
    // Given: a transport that always fails retryably
    let client = Arc::new(CountingFailClient {
        calls: Mutex::new(0),
    });
    let adapter = CoinbaseAdapter::with_http_client(client.clone());

    // When: one history call is made
    let error = adapter
        .history(btc_request("2024-01-01", "2024-02-01"))
        .await
        .expect_err("must fail");

    // Then: exactly one retry happened (two transport calls total)
    assert_eq!(error.kind(), SourceErrorKind::Unavailable);
    assert_eq!(*client.calls.lock().expect("call counter"), 2);
}

#[tokio::test]
async fn when_failures_accumulate_circuit_breaker_blocks_further_calls() {
    let client = Arc::new(CountingFailClient {
        calls: Mutex::new(0),
    });
    let adapter = YahooAdapter::with_http_client(client);
    let request = btc_request("2024-01-01", "2024-02-01");

    for _ in 0..3 {
        adapter
            .history(request.clone())
            .await
            .expect_err("failing transport");
    }

    let blocked = adapter
        .history(request)
        .await
        .expect_err("breaker must block");
    assert!(blocked.message().contains("circuit breaker is open"));
    assert_eq!(adapter.health(), coincast_core::HealthState::Unhealthy);
}
