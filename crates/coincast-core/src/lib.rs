//! # Coincast Core
//!
//! Core contracts, providers and forecaster for the coincast Bitcoin
//! dashboard.
//!
//! ## Overview
//!
//! One request-scoped pipeline: validate the date range, fetch daily
//! BTC-USD history from an interchangeable provider, fit a
//! lookback-window linear regression over the closes, and report
//! next-day and one-month projections with confidence intervals.
//!
//! This is educational software: the model is deliberately simple and
//! its intervals are approximations (see the [`forecast`] module docs).
//! It is not a trading system and makes no predictive claims.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Provider adapters (Yahoo chart API, Coinbase candles) |
//! | [`cache`] | TTL response cache with a no-op substitute |
//! | [`circuit_breaker`] | Circuit breaker for resilient upstream calls |
//! | [`data_source`] | Data source trait, history request, source errors |
//! | [`domain`] | Domain models (PriceSeries, DateRange, Symbol, ...) |
//! | [`envelope`] | Response envelope with metadata |
//! | [`error`] | Construction-time validation errors |
//! | [`fetcher`] | Cache-fronted history fetching |
//! | [`forecast`] | OLS forecaster and monthly extrapolation |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`pipeline`] | Request-scoped validate → fetch → forecast flow |
//! | [`retry`] | Single-retry policy for transient failures |
//! | [`routing`] | Source selection and fallback |
//! | [`source`] | Provider identifiers |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use coincast_core::{
//!     CacheMode, CacheStore, DashboardRequest, ForecastPipeline, HistoryFetcher, MarketDate,
//!     SourceRouterBuilder, SourceStrategy,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = HistoryFetcher::new(
//!         SourceRouterBuilder::new().build(),
//!         CacheStore::with_default_ttl(),
//!     );
//!     let pipeline = ForecastPipeline::new(fetcher);
//!
//!     let request = DashboardRequest {
//!         start: String::from("2020-01-01"),
//!         end: String::from("2024-01-01"),
//!         lookback: 7,
//!     };
//!     let outcome = pipeline
//!         .run(
//!             &request,
//!             MarketDate::today_utc(),
//!             SourceStrategy::Auto,
//!             CacheMode::Use,
//!         )
//!         .await?;
//!
//!     println!(
//!         "next day: {:.2} [{:.2}, {:.2}]",
//!         outcome.data.forecast.predicted,
//!         outcome.data.forecast.lower,
//!         outcome.data.forecast.upper
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every failure surfaces as a typed result at the request boundary:
//! [`RangeError`] for rejected date ranges, [`data_source::SourceError`]
//! for fetch failures, and [`ForecastError`] for declined forecasts,
//! wrapped in [`PipelineError`] by the pipeline. Nothing panics on the
//! request path and no partial result is exposed.

pub mod adapters;
pub mod cache;
pub mod circuit_breaker;
pub mod data_source;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod fetcher;
pub mod forecast;
pub mod http_client;
pub mod pipeline;
pub mod retry;
pub mod routing;
pub mod source;

// Re-export commonly used types at crate root for convenience

// Adapter implementations
pub use adapters::{CoinbaseAdapter, YahooAdapter};

// Caching
pub use cache::{CacheMode, CacheStore};

// Circuit breaker
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};

// Data source trait and types
pub use data_source::{DataSource, HealthState, HistoryRequest, SourceError, SourceErrorKind};

// Domain models
pub use domain::{
    DateRange, MarketDate, MarketSnapshot, PriceRecord, PriceSeries, RangeError, Symbol,
    BTC_INCEPTION,
};

// Envelope types
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta};

// Error types
pub use error::{CoreError, ValidationError};

// Fetching
pub use fetcher::{HistoryFetcher, HistoryOutcome};

// Forecasting
pub use forecast::{
    daily_returns, fit_forecast, monthly_projection, ForecastError, ForecastResult, Lookback,
    MonthlyProjection, MAX_LOOKBACK, MIN_OBSERVATIONS,
};

// HTTP client types
pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, NoopHttpClient, ReqwestHttpClient,
};

// Pipeline
pub use pipeline::{
    DashboardData, DashboardRequest, ForecastPipeline, PipelineError, PipelineOutcome,
};

// Retry policy
pub use retry::RetryPolicy;

// Routing types
pub use routing::{
    RouteFailure, RouteResult, RouteSuccess, SourceRouter, SourceRouterBuilder, SourceSnapshot,
    SourceStrategy,
};

// Source identifiers
pub use source::ProviderId;
