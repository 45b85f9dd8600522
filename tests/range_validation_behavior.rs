//! Behavior-driven tests for date range validation.
//!
//! These tests verify the rejection matrix the dashboard relies on:
//! unparseable input, inverted ranges, future end dates, and starts
//! before Bitcoin's first recorded price, checked in that order.

use coincast_core::{DateRange, MarketDate, RangeError, BTC_INCEPTION};
use coincast_tests::day;

#[test]
fn when_range_is_ordinary_system_accepts_it() {
    // Given: a range strictly inside [inception, today]
    let today = day("2024-06-01");

    // When: the range is validated
    let range = DateRange::new(day("2020-01-01"), day("2024-01-01"), today);

    // Then: it is accepted with its bounds intact
    let range = range.expect("ordinary range should validate");
    assert_eq!(range.start(), day("2020-01-01"));
    assert_eq!(range.end(), day("2024-01-01"));
}

#[test]
fn when_range_touches_both_bounds_system_accepts_it() {
    // Given: start at inception and end exactly at today
    let today = day("2024-06-01");

    // When/Then: both boundary values are legal
    DateRange::new(BTC_INCEPTION, today, today).expect("boundary range should validate");
}

#[test]
fn when_start_equals_end_system_rejects_as_inverted() {
    let today = day("2024-06-01");
    let err = DateRange::new(day("2023-05-05"), day("2023-05-05"), today).expect_err("must fail");
    assert_eq!(err, RangeError::RangeInverted);
}

#[test]
fn when_start_is_after_end_system_rejects_as_inverted() {
    let today = day("2024-06-01");
    let err = DateRange::new(day("2023-06-01"), day("2023-01-01"), today).expect_err("must fail");
    assert_eq!(err, RangeError::RangeInverted);
}

#[test]
fn when_end_is_tomorrow_system_rejects_future_end() {
    // Given: "today" on the caller's clock
    let today = day("2024-06-01");
    let tomorrow = today.next_day().expect("tomorrow exists");

    // When: the end lands one day in the future
    let err = DateRange::new(day("2024-01-01"), tomorrow, today).expect_err("must fail");

    // Then: the future-end rejection fires
    assert_eq!(err, RangeError::FutureEndDate);
}

#[test]
fn when_start_is_day_before_inception_system_rejects_it() {
    let today = day("2024-06-01");
    let err = DateRange::new(day("2009-01-02"), day("2020-01-01"), today).expect_err("must fail");
    assert_eq!(err, RangeError::BeforeInception);
}

#[test]
fn when_input_is_not_a_calendar_date_system_rejects_before_ordering() {
    // Given: garbage start and an otherwise-inverted pair
    let today = day("2024-06-01");

    // When: parsed
    let err = DateRange::parse("not-a-date", "2020-01-01", today).expect_err("must fail");

    // Then: InvalidInput wins over RangeInverted
    assert!(matches!(err, RangeError::InvalidInput { .. }));
}

#[test]
fn when_month_is_out_of_range_system_rejects_input() {
    let today = day("2024-06-01");
    let err = DateRange::parse("2024-13-01", "2024-01-02", today).expect_err("must fail");
    assert!(matches!(err, RangeError::InvalidInput { .. }));
}

#[test]
fn rejection_order_checks_inversion_before_future_end() {
    // Given: a pair that is both inverted and future-dated
    let today = day("2024-06-01");

    // When: validated
    let err = DateRange::new(day("2024-08-01"), day("2024-07-01"), today).expect_err("must fail");

    // Then: the earlier check in the order wins
    assert_eq!(err, RangeError::RangeInverted);
}

#[test]
fn validation_is_pure_with_respect_to_injected_today() {
    // The same pair validates or fails purely on the injected clock.
    let pair = (day("2024-01-01"), day("2024-05-01"));

    assert!(DateRange::new(pair.0, pair.1, day("2024-06-01")).is_ok());
    assert_eq!(
        DateRange::new(pair.0, pair.1, day("2024-04-01")).expect_err("future end"),
        RangeError::FutureEndDate
    );
}

#[test]
fn parsed_and_typed_construction_agree() {
    let today = MarketDate::parse("2024-06-01").expect("today");
    let parsed = DateRange::parse("2020-02-02", "2021-02-02", today).expect("parse path");
    let typed = DateRange::new(day("2020-02-02"), day("2021-02-02"), today).expect("typed path");
    assert_eq!(parsed, typed);
}
