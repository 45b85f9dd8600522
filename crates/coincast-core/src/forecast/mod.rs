//! Next-day and one-month price projection.
//!
//! The model is a deliberately simple one: ordinary least squares over
//! a trailing window of standardized closes, refit from scratch on
//! every call. Nothing is retained between calls, so identical input
//! yields byte-identical output.
//!
//! Two honesty notes, preserved deliberately rather than silently
//! corrected:
//!
//! - The 95% interval is built from the training-set residual standard
//!   deviation. It is not an out-of-sample predictive interval.
//! - The one-month figure linearly extrapolates the one-day delta
//!   (`current + (next_day - current) * 30`) and widens it by
//!   sqrt(30)-scaled daily-return volatility. It is not a refit 30-day
//!   model.

mod ols;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use self::ols::{window_matrix, OlsModel, Standardizer};

/// Minimum usable observations before any forecast is attempted.
pub const MIN_OBSERVATIONS: usize = 30;

/// Upper bound on the trailing feature window.
pub const MAX_LOOKBACK: usize = 30;

const Z_95: f64 = 1.96;
const MONTH_DAYS: f64 = 30.0;

/// Forecast failure modes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ForecastError {
    #[error("lookback must be between 1 and {MAX_LOOKBACK} days, got {value}")]
    InvalidLookback { value: usize },
    #[error("not enough price history: need {required} usable closes, have {actual}")]
    InsufficientData { required: usize, actual: usize },
}

/// Validated trailing-window size, 1..=30 days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lookback(usize);

impl Lookback {
    pub const DEFAULT: Self = Self(7);

    pub fn new(value: usize) -> Result<Self, ForecastError> {
        if value == 0 || value > MAX_LOOKBACK {
            return Err(ForecastError::InvalidLookback { value });
        }
        Ok(Self(value))
    }

    pub const fn days(self) -> usize {
        self.0
    }
}

impl Default for Lookback {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Next-day point forecast with its 95% training-residual interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub predicted: f64,
    pub lower: f64,
    pub upper: f64,
    pub lookback: usize,
}

/// Derived one-month projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyProjection {
    pub predicted: f64,
    pub lower: f64,
    pub upper: f64,
    /// sqrt(30)-scaled standard deviation of daily percent returns.
    pub volatility: f64,
}

/// Fit the lookback-window OLS model and forecast the next close.
///
/// `closes` must be the usable (non-null) closing prices in date
/// order. Pure function of its inputs; see the module docs for the
/// interval's caveat.
pub fn fit_forecast(closes: &[f64], lookback: Lookback) -> Result<ForecastResult, ForecastError> {
    let window = lookback.days();
    let required = MIN_OBSERVATIONS.max(window + 1);
    if closes.len() < required {
        return Err(ForecastError::InsufficientData {
            required,
            actual: closes.len(),
        });
    }

    let (features, labels) = window_matrix(closes, window);
    let scaler = Standardizer::fit(&features);
    let scaled = scaler.transform(&features);
    let model = OlsModel::fit(&scaled, &labels);

    let latest = scaler.transform_row(&closes[closes.len() - window..]);
    let predicted = model.predict_row(&latest);

    let std = model.training_mse(&scaled, &labels).sqrt();

    Ok(ForecastResult {
        predicted,
        lower: predicted - Z_95 * std,
        upper: predicted + Z_95 * std,
        lookback: window,
    })
}

/// Day-over-day percent returns of successive closes.
pub fn daily_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .map(|pair| pair[1] / pair[0] - 1.0)
        .collect()
}

/// Extend a next-day forecast to one month out.
///
/// `monthly_pred = current + (next_day - current) * 30`, with the
/// interval scaled by sqrt(30) daily-return volatility over the full
/// series. The formula is preserved as-is for behavioral
/// compatibility; see the module docs.
pub fn monthly_projection(
    current_price: f64,
    next_day_forecast: f64,
    closes: &[f64],
) -> MonthlyProjection {
    let returns = daily_returns(closes);
    let volatility = sample_std(&returns) * MONTH_DAYS.sqrt();

    let predicted = current_price + (next_day_forecast - current_price) * MONTH_DAYS;

    MonthlyProjection {
        predicted,
        lower: predicted * (1.0 - Z_95 * volatility),
        upper: predicted * (1.0 + Z_95 * volatility),
        volatility,
    }
}

/// Sample standard deviation (n-1 denominator); zero when fewer than
/// two observations exist.
fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (n - 1) as f64;
    variance.sqrt()
}
