//! Calendar-day membership checks over a worker's open dates.

use chrono::{DateTime, NaiveDate, TimeZone};

use super::domain::Worker;

/// Borrowed view over a worker's availability sequence.
#[derive(Debug, Clone, Copy)]
pub struct AvailabilityCalendar<'a> {
    dates: &'a [NaiveDate],
}

impl<'a> AvailabilityCalendar<'a> {
    pub fn new(dates: &'a [NaiveDate]) -> Self {
        Self { dates }
    }

    /// True iff `date` is listed and not earlier than `today`.
    pub fn is_available(&self, date: NaiveDate, today: NaiveDate) -> bool {
        date >= today && self.dates.contains(&date)
    }

    /// Same check for an instant, normalized to the calendar day in its own offset.
    pub fn is_available_at<Tz: TimeZone>(&self, instant: &DateTime<Tz>, today: NaiveDate) -> bool {
        self.is_available(instant.date_naive(), today)
    }

    /// Sorted, de-duplicated dates that can still be booked.
    pub fn bookable_dates(&self, today: NaiveDate) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self
            .dates
            .iter()
            .copied()
            .filter(|date| *date >= today)
            .collect();
        dates.sort_unstable();
        dates.dedup();
        dates
    }

    /// Selected dates that fail the availability check, in selection order.
    pub fn unavailable_in(&self, selection: &[NaiveDate], today: NaiveDate) -> Vec<NaiveDate> {
        selection
            .iter()
            .copied()
            .filter(|date| !self.is_available(*date, today))
            .collect()
    }
}

pub fn list_available_dates(worker: &Worker, today: NaiveDate) -> Vec<NaiveDate> {
    worker.calendar().bookable_dates(today)
}
