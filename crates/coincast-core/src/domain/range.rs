use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::date::{MarketDate, BTC_INCEPTION};

/// Rejection reasons for a candidate date range, checked in order.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("not a valid calendar date: '{value}'")]
    InvalidInput { value: String },
    #[error("start date must be before end date")]
    RangeInverted,
    #[error("end date cannot be in the future")]
    FutureEndDate,
    #[error("start date cannot be before Bitcoin's first recorded price ({})", BTC_INCEPTION)]
    BeforeInception,
}

/// Validated request date range.
///
/// Invariant: `start < end <= today` and `start >= BTC_INCEPTION`.
/// Fetch semantics downstream are start-inclusive, end-exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    start: MarketDate,
    end: MarketDate,
}

impl DateRange {
    /// Validate an already-parsed pair against `today`.
    ///
    /// `today` is passed explicitly so validation stays a pure function
    /// of its inputs; callers use [`MarketDate::today_utc`].
    pub fn new(start: MarketDate, end: MarketDate, today: MarketDate) -> Result<Self, RangeError> {
        if start >= end {
            return Err(RangeError::RangeInverted);
        }
        if end > today {
            return Err(RangeError::FutureEndDate);
        }
        if start < BTC_INCEPTION {
            return Err(RangeError::BeforeInception);
        }

        Ok(Self { start, end })
    }

    /// Parse and validate raw user input. First failure wins, and
    /// unparseable input is rejected before any ordering check.
    pub fn parse(start: &str, end: &str, today: MarketDate) -> Result<Self, RangeError> {
        let start = MarketDate::parse(start).map_err(|_| RangeError::InvalidInput {
            value: start.trim().to_owned(),
        })?;
        let end = MarketDate::parse(end).map_err(|_| RangeError::InvalidInput {
            value: end.trim().to_owned(),
        })?;

        Self::new(start, end, today)
    }

    pub const fn start(&self) -> MarketDate {
        self.start
    }

    pub const fn end(&self) -> MarketDate {
        self.end
    }

    /// Whether a row with the given date belongs to this range under
    /// the start-inclusive, end-exclusive contract.
    pub fn contains(&self, date: MarketDate) -> bool {
        date >= self.start && date < self.end
    }
}
