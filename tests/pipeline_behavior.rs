//! Behavior-driven tests for the request-scoped pipeline.
//!
//! One invocation per request: validate, fetch, snapshot, forecast.
//! Failures abort with a typed error and leave nothing half-built.

use coincast_core::{
    CacheMode, CacheStore, DashboardRequest, ForecastError, ForecastPipeline, HistoryFetcher,
    MarketDate, PipelineError, RangeError, SourceRouterBuilder, SourceStrategy,
};
use coincast_tests::day;

fn offline_pipeline(cache: CacheStore) -> ForecastPipeline {
    ForecastPipeline::new(HistoryFetcher::new(
        SourceRouterBuilder::new().with_offline_mode().build(),
        cache,
    ))
}

fn request(start: &str, end: &str, lookback: usize) -> DashboardRequest {
    DashboardRequest {
        start: start.to_owned(),
        end: end.to_owned(),
        lookback,
    }
}

fn today() -> MarketDate {
    day("2024-06-01")
}

#[tokio::test]
async fn when_request_is_valid_pipeline_returns_a_complete_result() {
    // Given: a year of offline history and the default lookback
    let pipeline = offline_pipeline(CacheStore::disabled());

    // When: the pipeline runs once
    let outcome = pipeline
        .run(
            &request("2023-01-01", "2024-01-01", 7),
            today(),
            SourceStrategy::Auto,
            CacheMode::Bypass,
        )
        .await
        .expect("pipeline succeeds");

    // Then: series, snapshot, forecast and monthly are all populated
    let data = &outcome.data;
    assert_eq!(data.series.len(), 365);
    assert!(data.snapshot.last_close > 0.0);
    assert!(data.forecast.lower <= data.forecast.predicted);
    assert!(data.forecast.predicted <= data.forecast.upper);
    assert!(data.monthly.predicted.is_finite());
    assert!(data.monthly.volatility >= 0.0);
}

#[tokio::test]
async fn when_run_twice_pipeline_is_deterministic_for_identical_input() {
    let pipeline = offline_pipeline(CacheStore::disabled());
    let req = request("2023-01-01", "2024-01-01", 7);

    let first = pipeline
        .run(&req, today(), SourceStrategy::Auto, CacheMode::Bypass)
        .await
        .expect("first run succeeds");
    let second = pipeline
        .run(&req, today(), SourceStrategy::Auto, CacheMode::Bypass)
        .await
        .expect("second run succeeds");

    assert_eq!(first.data, second.data);
}

#[tokio::test]
async fn when_cache_is_enabled_second_run_reports_a_hit_with_equal_data() {
    let pipeline = offline_pipeline(CacheStore::with_default_ttl());
    let req = request("2023-01-01", "2024-01-01", 7);

    let first = pipeline
        .run(&req, today(), SourceStrategy::Auto, CacheMode::Use)
        .await
        .expect("first run succeeds");
    let second = pipeline
        .run(&req, today(), SourceStrategy::Auto, CacheMode::Use)
        .await
        .expect("second run succeeds");

    assert!(!first.cache_hit);
    assert!(second.cache_hit);
    assert_eq!(first.data, second.data);
}

#[tokio::test]
async fn when_dates_are_garbage_pipeline_rejects_with_invalid_input() {
    let pipeline = offline_pipeline(CacheStore::disabled());

    let error = pipeline
        .run(
            &request("garbage", "2024-01-01", 7),
            today(),
            SourceStrategy::Auto,
            CacheMode::Bypass,
        )
        .await
        .expect_err("garbage dates must fail");

    assert!(matches!(
        error,
        PipelineError::Range(RangeError::InvalidInput { .. })
    ));
}

#[tokio::test]
async fn when_end_is_in_the_future_pipeline_rejects_before_fetching() {
    let pipeline = offline_pipeline(CacheStore::disabled());

    let error = pipeline
        .run(
            &request("2024-01-01", "2024-06-02", 7),
            today(),
            SourceStrategy::Auto,
            CacheMode::Bypass,
        )
        .await
        .expect_err("future end must fail");

    assert!(matches!(
        error,
        PipelineError::Range(RangeError::FutureEndDate)
    ));
}

#[tokio::test]
async fn when_window_is_too_short_pipeline_surfaces_insufficient_data() {
    let pipeline = offline_pipeline(CacheStore::disabled());

    let error = pipeline
        .run(
            &request("2024-01-01", "2024-01-20", 7),
            today(),
            SourceStrategy::Auto,
            CacheMode::Bypass,
        )
        .await
        .expect_err("19 rows cannot support a forecast");

    assert!(matches!(
        error,
        PipelineError::Forecast(ForecastError::InsufficientData {
            required: 30,
            actual: 19
        })
    ));
}

#[tokio::test]
async fn when_lookback_is_zero_pipeline_rejects_it() {
    let pipeline = offline_pipeline(CacheStore::disabled());

    let error = pipeline
        .run(
            &request("2023-01-01", "2024-01-01", 0),
            today(),
            SourceStrategy::Auto,
            CacheMode::Bypass,
        )
        .await
        .expect_err("lookback 0 must fail");

    assert!(matches!(
        error,
        PipelineError::Forecast(ForecastError::InvalidLookback { value: 0 })
    ));
}

#[tokio::test]
async fn pipeline_errors_render_human_readable_messages() {
    let pipeline = offline_pipeline(CacheStore::disabled());

    let error = pipeline
        .run(
            &request("2024-02-01", "2024-01-01", 7),
            today(),
            SourceStrategy::Auto,
            CacheMode::Bypass,
        )
        .await
        .expect_err("inverted range must fail");

    let message = error.to_string();
    assert!(message.contains("before end date"), "got: {message}");
}
