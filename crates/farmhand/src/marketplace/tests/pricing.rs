use chrono::NaiveDate;

use super::common::*;
use crate::marketplace::domain::{BillingMode, HourRange};
use crate::marketplace::pricing::{group_total, inclusive_day_count, quote, quote_for_worker};

#[test]
fn daily_quote_multiplies_days_by_rate() {
    assert_eq!(quote(3, BillingMode::Daily, 600, 75, None, None), 1800);
}

#[test]
fn hourly_quote_multiplies_days_hours_and_rate() {
    assert_eq!(quote(2, BillingMode::Hourly, 600, 75, Some(8), Some(16)), 1200);
}

#[test]
fn zero_days_quote_nothing() {
    assert_eq!(quote(0, BillingMode::Daily, 600, 75, None, None), 0);
    assert_eq!(quote(0, BillingMode::Hourly, 600, 75, Some(8), Some(16)), 0);
}

#[test]
fn incomplete_or_inverted_hours_quote_nothing() {
    assert_eq!(quote(2, BillingMode::Hourly, 600, 75, Some(8), None), 0);
    assert_eq!(quote(2, BillingMode::Hourly, 600, 75, Some(16), Some(8)), 0);
    assert_eq!(quote(2, BillingMode::Hourly, 600, 75, Some(9), Some(9)), 0);
}

#[test]
fn hours_off_the_clock_quote_nothing() {
    assert_eq!(quote(2, BillingMode::Hourly, 600, 75, Some(8), Some(200)), 0);
    assert_eq!(quote(1, BillingMode::Hourly, 600, 75, Some(0), Some(24)), 24 * 75);
    assert_eq!(HourRange::new(8, 25).hours(), None);
}

#[test]
fn each_added_day_adds_exactly_the_daily_rate() {
    for days in 0..10 {
        let current = quote(days, BillingMode::Daily, 600, 75, None, None);
        let next = quote(days + 1, BillingMode::Daily, 600, 75, None, None);
        assert_eq!(next - current, 600, "adding day {}", days + 1);
    }
}

#[test]
fn worker_quote_uses_their_rate_card() {
    let worker = suresh();
    assert_eq!(
        quote_for_worker(&worker, 2, BillingMode::Hourly, Some(HourRange::new(6, 10))),
        2 * 4 * 90
    );
    assert_eq!(quote_for_worker(&worker, 2, BillingMode::Daily, None), 1500);
}

#[test]
fn group_total_sums_daily_rates() {
    let workers = [ravi(), suresh(), lakshmi()];
    assert_eq!(group_total(&workers), 1850);
}

#[test]
fn inclusive_day_count_handles_inverted_ranges() {
    let start = NaiveDate::from_ymd_opt(2026, 11, 3).expect("valid");
    let end = NaiveDate::from_ymd_opt(2026, 11, 5).expect("valid");

    assert_eq!(inclusive_day_count(start, end), 3);
    assert_eq!(inclusive_day_count(start, start), 1);
    assert_eq!(inclusive_day_count(end, start), 0);
}
