//! Trip fee computation through the public API

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

use bikeshare_server::trip::{compute_fees, FeeSchedule};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn schedule(start: &str, rate: &str, end: &str) -> FeeSchedule {
    FeeSchedule {
        start_fee: dec(start),
        minute_rate: dec(rate),
        end_fee: dec(end),
    }
}

#[test]
fn test_thirty_minute_trip() {
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let fees = compute_fees(&schedule("10", "0.5", "0"), start, start + Duration::minutes(30));

    assert_eq!(fees.start_fee, dec("10"));
    assert_eq!(fees.time_fee, dec("15.00"));
    assert_eq!(fees.end_fee, dec("0"));
    assert_eq!(fees.total_fee, dec("25.00"));
}

#[test]
fn test_total_is_sum_of_parts() {
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let end = start + Duration::seconds(437) + Duration::milliseconds(250);
    let fees = compute_fees(&schedule("10", "3", "2.50"), start, end);

    assert_eq!(fees.total_fee, fees.start_fee + fees.time_fee + fees.end_fee);
    // 437.25s = 7.2875 min, * 3 = 21.8625
    assert_eq!(fees.time_fee, dec("21.86"));
}

#[test]
fn test_same_inputs_same_fees() {
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 8, 15, 3).unwrap();
    let end = start + Duration::seconds(1234);
    let schedule = FeeSchedule::default();

    assert_eq!(
        compute_fees(&schedule, start, end),
        compute_fees(&schedule, start, end)
    );
}

#[test]
fn test_end_before_start_charges_fixed_fees_only() {
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let fees = compute_fees(&schedule("10", "3", "1"), start, start - Duration::minutes(5));

    assert_eq!(fees.time_fee, Decimal::ZERO);
    assert_eq!(fees.total_fee, dec("11"));
}
