//! Request-scoped dashboard pipeline.
//!
//! One invocation per user interaction: validate the range, fetch the
//! series, compute the headline snapshot, fit the forecast, derive the
//! monthly projection. Either a complete [`DashboardData`] comes back
//! or a typed [`PipelineError`] does; no partial result escapes, and
//! no state survives the call.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::CacheMode;
use crate::data_source::HistoryRequest;
use crate::envelope::EnvelopeError;
use crate::fetcher::HistoryFetcher;
use crate::forecast::{
    fit_forecast, monthly_projection, ForecastError, ForecastResult, Lookback, MonthlyProjection,
};
use crate::routing::{RouteFailure, SourceStrategy};
use crate::{
    DateRange, MarketDate, MarketSnapshot, PriceSeries, ProviderId, RangeError, Symbol,
};

/// Raw user parameters for one dashboard request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardRequest {
    pub start: String,
    pub end: String,
    pub lookback: usize,
}

/// Everything the presentation layer renders for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    pub series: PriceSeries,
    pub snapshot: MarketSnapshot,
    pub forecast: ForecastResult,
    pub monthly: MonthlyProjection,
}

/// Pipeline result plus the fetch metadata the envelope layer reports.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub data: DashboardData,
    pub selected_source: ProviderId,
    pub source_chain: Vec<ProviderId>,
    pub cache_hit: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub latency_ms: u64,
}

/// Request-boundary error taxonomy. Every variant is recoverable: the
/// current request aborts, the process does not.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Range(#[from] RangeError),

    #[error("{}", .0.summary())]
    Fetch(RouteFailure),

    #[error(transparent)]
    Forecast(#[from] ForecastError),
}

/// The validate → fetch → forecast pipeline, generic over the injected
/// fetcher (and through it, the cache and transports).
pub struct ForecastPipeline {
    fetcher: HistoryFetcher,
}

impl ForecastPipeline {
    pub fn new(fetcher: HistoryFetcher) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &HistoryFetcher {
        &self.fetcher
    }

    /// Run one dashboard request against the pinned `BTC-USD` pair.
    ///
    /// `today` is injected so range validation stays a pure function;
    /// callers pass [`MarketDate::today_utc`].
    pub async fn run(
        &self,
        request: &DashboardRequest,
        today: MarketDate,
        strategy: SourceStrategy,
        cache_mode: CacheMode,
    ) -> Result<PipelineOutcome, PipelineError> {
        let range = DateRange::parse(&request.start, &request.end, today)?;
        let lookback = Lookback::new(request.lookback)?;

        let history = HistoryRequest::new(Symbol::btc_usd(), range);
        let outcome = self
            .fetcher
            .fetch(&history, strategy, cache_mode)
            .await
            .map_err(PipelineError::Fetch)?;

        let closes = outcome.series.usable_closes();
        let forecast = fit_forecast(&closes, lookback)?;

        // At least 30 usable closes exist here, so the snapshot's
        // two-close requirement is already met.
        let snapshot =
            MarketSnapshot::from_series(&outcome.series).ok_or(ForecastError::InsufficientData {
                required: 2,
                actual: closes.len(),
            })?;

        let monthly = monthly_projection(snapshot.last_close, forecast.predicted, &closes);

        Ok(PipelineOutcome {
            data: DashboardData {
                series: outcome.series,
                snapshot,
                forecast,
                monthly,
            },
            selected_source: outcome.selected_source,
            source_chain: outcome.source_chain,
            cache_hit: outcome.cache_hit,
            warnings: outcome.warnings,
            errors: outcome.errors,
            latency_ms: outcome.latency_ms,
        })
    }
}
