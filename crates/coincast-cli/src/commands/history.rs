use coincast_core::{
    CacheMode, DateRange, ForecastPipeline, HistoryRequest, MarketDate, SourceStrategy, Symbol,
};
use serde_json::json;

use crate::cli::HistoryArgs;
use crate::error::CliError;

use super::{default_end, default_start, CommandResult};

pub async fn run(
    args: &HistoryArgs,
    pipeline: &ForecastPipeline,
    strategy: SourceStrategy,
    cache_mode: CacheMode,
    today: MarketDate,
) -> Result<CommandResult, CliError> {
    let start = args.start.clone().unwrap_or_else(|| default_start(today));
    let end = args.end.clone().unwrap_or_else(|| default_end(today));

    let range = DateRange::parse(&start, &end, today)?;
    let request = HistoryRequest::new(Symbol::btc_usd(), range);

    match pipeline.fetcher().fetch(&request, strategy, cache_mode).await {
        Ok(outcome) => {
            let data = json!({
                "symbol": outcome.series.symbol(),
                "start": range.start(),
                "end": range.end(),
                "rows": outcome.series.len(),
                "records": outcome.series.records(),
            });

            Ok(CommandResult::ok(data, outcome.source_chain)
                .with_errors(outcome.errors)
                .with_warnings(outcome.warnings)
                .with_latency(outcome.latency_ms)
                .with_cache_hit(outcome.cache_hit))
        }
        Err(failure) => {
            let data = json!({
                "symbol": Symbol::btc_usd(),
                "start": range.start(),
                "end": range.end(),
                "rows": 0,
            });

            Ok(CommandResult::ok(data, failure.source_chain)
                .with_errors(failure.errors)
                .with_warnings(failure.warnings)
                .with_latency(failure.latency_ms))
        }
    }
}
