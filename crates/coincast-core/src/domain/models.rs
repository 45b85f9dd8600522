use serde::{Deserialize, Serialize};

use crate::{MarketDate, Symbol, ValidationError};

/// Daily OHLCV record keyed by calendar date.
///
/// `close` and `volume` are optional because upstream sources emit null
/// cells for partially recorded days; statistics that read "last close"
/// must go through [`PriceSeries::usable_closes`] and friends, which
/// skip null closes. Volume stays in the source's unit (Yahoo reports
/// quote-currency volume, Coinbase base-currency volume).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub date: MarketDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl PriceRecord {
    pub fn new(
        date: MarketDate,
        open: f64,
        high: f64,
        low: f64,
        close: Option<f64>,
        volume: Option<f64>,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("open", open)?;
        validate_non_negative("high", high)?;
        validate_non_negative("low", low)?;
        validate_optional_non_negative("close", close)?;
        validate_optional_non_negative("volume", volume)?;

        if high < low {
            return Err(ValidationError::InvalidBarRange);
        }

        if open < low || open > high {
            return Err(ValidationError::InvalidBarBounds);
        }
        if let Some(close) = close {
            if close < low || close > high {
                return Err(ValidationError::InvalidBarBounds);
            }
        }

        Ok(Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

/// Immutable daily price series for one symbol.
///
/// Rows are ascending by date with unique dates; construction enforces
/// both regardless of upstream ordering. Mutated only here, read-only
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: Symbol,
    records: Vec<PriceRecord>,
}

impl PriceSeries {
    /// Sort by date and deduplicate; the first record seen for a date
    /// wins (stable sort preserves input order among equal dates).
    pub fn from_records(symbol: Symbol, mut records: Vec<PriceRecord>) -> Self {
        records.sort_by_key(|record| record.date);
        records.dedup_by_key(|record| record.date);
        Self { symbol, records }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Non-null closing prices in date order.
    pub fn usable_closes(&self) -> Vec<f64> {
        self.records
            .iter()
            .filter_map(|record| record.close)
            .collect()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.records.iter().rev().find_map(|record| record.close)
    }
}

/// Headline metrics for the dashboard's current-price row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub last_close: f64,
    pub change_abs: f64,
    pub change_pct: f64,
    pub last_volume: Option<f64>,
}

impl MarketSnapshot {
    /// Change figures compare the last two usable closes; returns
    /// `None` when fewer than two exist.
    pub fn from_series(series: &PriceSeries) -> Option<Self> {
        let closes = series.usable_closes();
        let [.., previous, last] = closes.as_slice() else {
            return None;
        };

        let change_abs = last - previous;
        Some(Self {
            last_close: *last,
            change_abs,
            change_pct: change_abs / previous * 100.0,
            last_volume: series.records.last().and_then(|record| record.volume),
        })
    }
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}

fn validate_optional_non_negative(
    field: &'static str,
    value: Option<f64>,
) -> Result<(), ValidationError> {
    if let Some(value) = value {
        validate_non_negative(field, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> MarketDate {
        MarketDate::parse(s).expect("test date")
    }

    fn record(date: &str, close: f64) -> PriceRecord {
        PriceRecord::new(day(date), close, close + 1.0, close - 1.0, Some(close), None)
            .expect("test record")
    }

    #[test]
    fn rejects_close_outside_range() {
        let err = PriceRecord::new(day("2024-01-01"), 10.0, 12.0, 9.0, Some(12.5), Some(10.0))
            .expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidBarBounds));
    }

    #[test]
    fn from_records_sorts_and_dedups() {
        let series = PriceSeries::from_records(
            Symbol::btc_usd(),
            vec![
                record("2024-01-03", 103.0),
                record("2024-01-01", 101.0),
                record("2024-01-01", 999.0),
                record("2024-01-02", 102.0),
            ],
        );

        let dates: Vec<String> = series
            .records()
            .iter()
            .map(|r| r.date.format_iso())
            .collect();
        assert_eq!(dates, ["2024-01-01", "2024-01-02", "2024-01-03"]);
        // First occurrence wins on the duplicated date.
        assert_eq!(series.records()[0].close, Some(101.0));
    }

    #[test]
    fn usable_closes_skip_null_rows() {
        let mut records = vec![record("2024-01-01", 101.0), record("2024-01-02", 102.0)];
        records.push(
            PriceRecord::new(day("2024-01-03"), 102.0, 103.0, 101.0, None, None)
                .expect("null-close record"),
        );

        let series = PriceSeries::from_records(Symbol::btc_usd(), records);
        assert_eq!(series.usable_closes(), vec![101.0, 102.0]);
        assert_eq!(series.last_close(), Some(102.0));
    }

    #[test]
    fn snapshot_compares_last_two_usable_closes() {
        let series = PriceSeries::from_records(
            Symbol::btc_usd(),
            vec![record("2024-01-01", 100.0), record("2024-01-02", 110.0)],
        );

        let snapshot = MarketSnapshot::from_series(&series).expect("two closes present");
        assert_eq!(snapshot.last_close, 110.0);
        assert_eq!(snapshot.change_abs, 10.0);
        assert!((snapshot.change_pct - 10.0).abs() < 1e-12);
    }

    #[test]
    fn snapshot_requires_two_closes() {
        let series =
            PriceSeries::from_records(Symbol::btc_usd(), vec![record("2024-01-01", 100.0)]);
        assert!(MarketSnapshot::from_series(&series).is_none());
    }
}
