use coincast_core::{
    CacheMode, DashboardRequest, ForecastPipeline, MarketDate, PipelineError, SourceStrategy,
};
use serde_json::json;

use crate::cli::ForecastArgs;
use crate::error::CliError;

use super::{default_end, default_start, CommandResult};

pub async fn run(
    args: &ForecastArgs,
    pipeline: &ForecastPipeline,
    strategy: SourceStrategy,
    cache_mode: CacheMode,
    today: MarketDate,
) -> Result<CommandResult, CliError> {
    let request = DashboardRequest {
        start: args.start.clone().unwrap_or_else(|| default_start(today)),
        end: args.end.clone().unwrap_or_else(|| default_end(today)),
        lookback: args.lookback,
    };

    match pipeline.run(&request, today, strategy, cache_mode).await {
        Ok(outcome) => {
            let data = json!({
                "request": request,
                "snapshot": outcome.data.snapshot,
                "forecast": outcome.data.forecast,
                "monthly": outcome.data.monthly,
                "rows": outcome.data.series.len(),
            });

            Ok(CommandResult::ok(data, outcome.source_chain)
                .with_errors(outcome.errors)
                .with_warnings(outcome.warnings)
                .with_latency(outcome.latency_ms)
                .with_cache_hit(outcome.cache_hit))
        }
        // Exhausted sources still produce an envelope (exit code 3);
        // bad user input surfaces as a CLI error instead.
        Err(PipelineError::Fetch(failure)) => {
            let data = json!({ "request": request });
            Ok(CommandResult::ok(data, failure.source_chain)
                .with_errors(failure.errors)
                .with_warnings(failure.warnings)
                .with_latency(failure.latency_ms))
        }
        Err(PipelineError::Range(error)) => Err(error.into()),
        Err(PipelineError::Forecast(error)) => Err(error.into()),
    }
}
