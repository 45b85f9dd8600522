mod forecast;
mod history;
mod sources;

use coincast_core::{
    CacheMode, CacheStore, Envelope, EnvelopeError, ForecastPipeline, HistoryFetcher, MarketDate,
    ProviderId, SourceRouterBuilder, SourceStrategy,
};
use serde_json::Value;

use crate::cli::{Cli, Command, SourceSelector};
use crate::error::CliError;
use crate::metadata::Metadata;

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub latency_ms: u64,
    pub cache_hit: bool,
    pub source_chain: Vec<ProviderId>,
}

impl CommandResult {
    pub fn ok(data: Value, source_chain: Vec<ProviderId>) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
            latency_ms: 0,
            cache_hit: false,
            source_chain,
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_errors(mut self, errors: Vec<EnvelopeError>) -> Self {
        self.errors.extend(errors);
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_cache_hit(mut self, cache_hit: bool) -> Self {
        self.cache_hit = cache_hit;
        self
    }
}

pub async fn run(cli: &Cli) -> Result<Envelope<Value>, CliError> {
    let router_builder = if cli.offline {
        SourceRouterBuilder::new().with_offline_mode()
    } else {
        SourceRouterBuilder::new()
    };
    let router = router_builder.with_timeout_ms(cli.timeout_ms).build();

    let cache = if cli.no_cache {
        CacheStore::disabled()
    } else {
        CacheStore::with_default_ttl()
    };
    let cache_mode = if cli.no_cache {
        CacheMode::Bypass
    } else {
        CacheMode::Use
    };

    let pipeline = ForecastPipeline::new(HistoryFetcher::new(router, cache));
    let strategy = to_source_strategy(cli.source);
    let today = MarketDate::today_utc();

    let command_result = match &cli.command {
        Command::Forecast(args) => {
            forecast::run(args, &pipeline, strategy, cache_mode, today).await?
        }
        Command::History(args) => history::run(args, &pipeline, strategy, cache_mode, today).await?,
        Command::Sources => sources::run(pipeline.fetcher().router())?,
    };

    let CommandResult {
        data,
        warnings,
        errors,
        latency_ms,
        cache_hit,
        source_chain,
    } = command_result;

    let mut metadata = Metadata::new(source_chain, latency_ms, cache_hit)?;
    for warning in warnings {
        metadata.push_warning(warning);
    }

    let meta = metadata.into_envelope_meta("v1.0.0")?;
    Envelope::with_errors(meta, data, errors).map_err(CliError::from)
}

fn to_source_strategy(source: SourceSelector) -> SourceStrategy {
    match source {
        SourceSelector::Auto => SourceStrategy::Auto,
        SourceSelector::Yahoo => SourceStrategy::Strict(ProviderId::Yahoo),
        SourceSelector::Coinbase => SourceStrategy::Strict(ProviderId::Coinbase),
    }
}

/// Default range start: five years of history.
pub(crate) fn default_start(today: MarketDate) -> String {
    today
        .checked_add_days(-365 * 5)
        .unwrap_or(coincast_core::BTC_INCEPTION)
        .format_iso()
}

pub(crate) fn default_end(today: MarketDate) -> String {
    today.format_iso()
}
