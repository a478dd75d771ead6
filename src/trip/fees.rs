//! Trip fee calculation
//!
//! `total = start_fee + minute_rate * elapsed_minutes + end_fee`, all in
//! `Decimal` so currency never passes through floating point.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// Currency scale of the fee columns (`NUMERIC(10, 2)`)
const CURRENCY_SCALE: u32 = 2;

/// Fixed and per-minute fees applied to every trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeSchedule {
    pub start_fee: Decimal,
    pub minute_rate: Decimal,
    pub end_fee: Decimal,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            start_fee: Decimal::new(10, 0),
            minute_rate: Decimal::new(3, 0),
            end_fee: Decimal::ZERO,
        }
    }
}

/// Fees charged for a single trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeeBreakdown {
    pub start_fee: Decimal,
    pub time_fee: Decimal,
    pub end_fee: Decimal,
    pub total_fee: Decimal,
}

/// Elapsed minutes between two instants, exact to the microsecond.
///
/// An end before the start counts as zero.
pub fn elapsed_minutes(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Decimal {
    let duration = end_time.signed_duration_since(start_time);
    let micros = duration
        .num_microseconds()
        .unwrap_or(i64::MAX)
        .max(0);
    Decimal::new(micros, 6) / Decimal::from(60)
}

/// Compute the fee breakdown for a trip
pub fn compute_fees(
    schedule: &FeeSchedule,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
) -> FeeBreakdown {
    let time_fee = (schedule.minute_rate * elapsed_minutes(start_time, end_time))
        .round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero);

    FeeBreakdown {
        start_fee: schedule.start_fee,
        time_fee,
        end_fee: schedule.end_fee,
        total_fee: schedule.start_fee + time_fee + schedule.end_fee,
    }
}
