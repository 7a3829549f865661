//! Quote computation for daily and hourly billing.

use chrono::NaiveDate;

use super::domain::{BillingMode, HourRange, Worker};

/// Amount for `day_count` days of work. Zero means "no quote yet"
/// (nothing selected, or an incomplete/inverted hour pair under hourly billing).
pub fn quote(
    day_count: u32,
    billing_mode: BillingMode,
    daily_rate: u32,
    hourly_rate: u32,
    start_hour: Option<u8>,
    end_hour: Option<u8>,
) -> u64 {
    if day_count == 0 {
        return 0;
    }

    match billing_mode {
        BillingMode::Daily => u64::from(day_count) * u64::from(daily_rate),
        BillingMode::Hourly => {
            let hours = match (start_hour, end_hour) {
                (Some(start), Some(end)) => HourRange::new(start, end).hours(),
                _ => None,
            };
            match hours {
                Some(hours) => u64::from(day_count) * u64::from(hours) * u64::from(hourly_rate),
                None => 0,
            }
        }
    }
}

/// Quote against a worker's current rate card.
pub fn quote_for_worker(
    worker: &Worker,
    day_count: u32,
    billing_mode: BillingMode,
    time_range: Option<HourRange>,
) -> u64 {
    quote(
        day_count,
        billing_mode,
        worker.daily_rate,
        worker.hourly_rate,
        time_range.map(|range| range.start_hour),
        time_range.map(|range| range.end_hour),
    )
}

/// Per-day cost of a group: groups always bill daily.
pub fn group_total<'a, I>(workers: I) -> u64
where
    I: IntoIterator<Item = &'a Worker>,
{
    workers
        .into_iter()
        .map(|worker| u64::from(worker.daily_rate))
        .sum()
}

/// Days covered by an inclusive range; zero when the range is inverted.
pub fn inclusive_day_count(start: NaiveDate, end: NaiveDate) -> u32 {
    if end < start {
        return 0;
    }
    let days = (end - start).num_days() + 1;
    u32::try_from(days).unwrap_or(u32::MAX)
}
