use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;

use crate::circuit_breaker::CircuitBreaker;
use crate::data_source::{DataSource, HealthState, HistoryRequest, SourceError};
use crate::http_client::{HttpClient, HttpRequest, NoopHttpClient};
use crate::retry::RetryPolicy;
use crate::{DateRange, MarketDate, PriceRecord, PriceSeries, ProviderId, Symbol};

use super::{execute_guarded, health_from_breaker, symbol_seed};

/// Yahoo Finance chart-API adapter.
///
/// Queries `/v8/finance/chart/{symbol}` with explicit `period1` and
/// `period2` unix bounds at daily interval. The chart endpoint is
/// keyless. Rows are clamped to `[start, end)` after normalization so
/// the range contract does not depend on Yahoo's own boundary
/// behavior.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    circuit_breaker: Arc<CircuitBreaker>,
    retry: RetryPolicy,
    timeout_ms: u64,
}

impl Default for YahooAdapter {
    fn default() -> Self {
        Self {
            http_client: Arc::new(NoopHttpClient),
            circuit_breaker: Arc::new(CircuitBreaker::default()),
            retry: RetryPolicy::default(),
            timeout_ms: 10_000,
        }
    }
}

impl YahooAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            ..Self::default()
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn endpoint(&self, symbol: &Symbol, range: &DateRange) -> String {
        format!(
            "https://query1.finance.yahoo.com/v8/finance/chart/{}?period1={}&period2={}&interval=1d&events=history",
            urlencoding::encode(symbol.as_str()),
            range.start().unix_timestamp(),
            range.end().unix_timestamp()
        )
    }

    async fn fetch_history(&self, req: &HistoryRequest) -> Result<PriceSeries, SourceError> {
        let request = HttpRequest::get(self.endpoint(&req.symbol, &req.range))
            .with_header("referer", "https://finance.yahoo.com/")
            .with_timeout_ms(self.timeout_ms);

        let response = execute_guarded(
            "yahoo",
            &self.http_client,
            &self.circuit_breaker,
            &self.retry,
            request,
        )
        .await?;

        if self.http_client.is_offline() {
            return Ok(offline_series(&req.symbol, &req.range));
        }

        let series = parse_chart_body(&response.body, &req.symbol, &req.range)?;
        if series.is_empty() {
            return Err(SourceError::no_data(format!(
                "yahoo returned no rows for {} in [{}, {})",
                req.symbol,
                req.range.start(),
                req.range.end()
            )));
        }

        Ok(series)
    }
}

impl DataSource for YahooAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    fn history<'a>(
        &'a self,
        req: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<PriceSeries, SourceError>> + Send + 'a>> {
        Box::pin(async move { self.fetch_history(&req).await })
    }

    fn health(&self) -> HealthState {
        health_from_breaker(&self.circuit_breaker)
    }
}

/// Normalize a chart payload: keep the date key plus the five numeric
/// columns, skip rows without a full O/H/L triple, carry null closes
/// through as `None`, and clamp to the requested range.
fn parse_chart_body(
    body: &str,
    symbol: &Symbol,
    range: &DateRange,
) -> Result<PriceSeries, SourceError> {
    let chart: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::internal(format!("failed to parse yahoo chart: {e}")))?;

    if let Some(error) = &chart.chart.error {
        if !error.is_empty() {
            return Err(SourceError::unavailable(format!(
                "yahoo chart API error: {error}"
            )));
        }
    }

    let result = chart
        .chart
        .result
        .first()
        .ok_or_else(|| SourceError::internal("no chart data in response"))?;

    // An empty window comes back with the timestamp array absent;
    // that is a NoData outcome, not a malformed payload.
    let timestamps = result.timestamp.as_deref().unwrap_or_default();
    let quote = result
        .indicators
        .quote
        .first()
        .ok_or_else(|| SourceError::internal("no quote data"))?;

    let mut records = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let date = MarketDate::from_unix_timestamp(ts)
            .map_err(|e| SourceError::internal(format!("invalid timestamp: {e}")))?;
        if !range.contains(date) {
            continue;
        }

        let (Some(Some(open)), Some(Some(high)), Some(Some(low))) =
            (quote.open.get(i), quote.high.get(i), quote.low.get(i))
        else {
            continue;
        };
        let close = quote.close.get(i).copied().flatten();
        let volume = quote.volume.get(i).copied().flatten().map(|v| v as f64);

        if let Ok(record) = PriceRecord::new(date, *open, *high, *low, close, volume) {
            records.push(record);
        }
    }

    Ok(PriceSeries::from_records(symbol.clone(), records))
}

/// Deterministic fixture series for offline transports.
fn offline_series(symbol: &Symbol, range: &DateRange) -> PriceSeries {
    let seed = symbol_seed(symbol);
    let mut records = Vec::new();
    let mut date = range.start();
    let mut index = 0_u64;

    while date < range.end() {
        let base = 20_000.0 + ((seed + index) % 3_500) as f64 * 10.0;
        let record = PriceRecord::new(
            date,
            base,
            base + 250.0,
            base - 180.0,
            Some(base + 40.0),
            Some(1_200.0 + index as f64 * 3.0),
        )
        .expect("fixture records are valid");
        records.push(record);

        let Some(next) = date.next_day() else { break };
        date = next;
        index += 1;
    }

    PriceSeries::from_records(symbol.clone(), records)
}

// Yahoo Finance chart response structures.
#[derive(Debug, Clone, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartData {
    result: Vec<YahooChartResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartIndicators {
    quote: Vec<YahooChartQuote>,
}

// Field arrays default to empty: Yahoo omits them entirely for a
// window with no rows.
#[derive(Debug, Clone, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<i64>>,
}
