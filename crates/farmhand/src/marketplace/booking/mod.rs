mod group;
mod lifecycle;

pub use group::{create_group_booking, GroupBookingTerms, GroupSelection, GroupSummary};
pub use lifecycle::{next_status, permitted_events, transition, transition_expecting};

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    BillingMode, BookingId, BookingRequest, BookingStatus, FarmerRef, HourRange, Worker,
};
use super::error::{InputViolation, MarketplaceError};
use super::payment::PaymentMethod;
use super::pricing;

/// Farmer-entered booking form, prior to validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingDraft {
    pub farmer: FarmerRef,
    pub dates: Vec<NaiveDate>,
    pub work_types: BTreeSet<String>,
    pub billing_mode: BillingMode,
    #[serde(default)]
    pub time_range: Option<HourRange>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub description: String,
    pub farmer_location: String,
}

/// Validate a draft against the worker and produce a pending booking.
///
/// Availability of the selected dates is not checked here; callers run the
/// availability calendar first.
pub fn create_booking(
    worker: &Worker,
    draft: BookingDraft,
    now: DateTime<Utc>,
) -> Result<BookingRequest, MarketplaceError> {
    let BookingDraft {
        farmer,
        mut dates,
        work_types,
        billing_mode,
        time_range,
        payment_method,
        description,
        farmer_location,
    } = draft;

    dates.sort_unstable();
    dates.dedup();
    let (start_date, end_date) = match (dates.first(), dates.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Err(InputViolation::NoDatesSelected.into()),
    };

    let work_types: BTreeSet<String> = work_types
        .into_iter()
        .map(|work_type| work_type.trim().to_string())
        .filter(|work_type| !work_type.is_empty())
        .collect();
    if work_types.is_empty() {
        return Err(InputViolation::NoWorkTypes.into());
    }
    if let Some(unsupported) = work_types.iter().find(|work_type| !worker.has_skill(work_type)) {
        return Err(InputViolation::UnsupportedWorkType(unsupported.clone()).into());
    }

    let farmer_location = farmer_location.trim().to_string();
    if farmer_location.is_empty() {
        return Err(InputViolation::MissingLocation.into());
    }

    if billing_mode == BillingMode::Hourly {
        let range = time_range.ok_or(InputViolation::MissingTimeRange)?;
        if !range.is_within_day() {
            return Err(InputViolation::InvalidTimeRange {
                start_hour: range.start_hour,
                end_hour: range.end_hour,
            }
            .into());
        }
        if range.hours().is_none() {
            return Err(InputViolation::InvertedTimeRange {
                start_hour: range.start_hour,
                end_hour: range.end_hour,
            }
            .into());
        }
    }

    let day_count = u32::try_from(dates.len()).unwrap_or(u32::MAX);
    let total_amount = pricing::quote_for_worker(worker, day_count, billing_mode, time_range);
    if total_amount == 0 {
        return Err(InputViolation::UnresolvableAmount.into());
    }

    Ok(BookingRequest {
        id: BookingId::next(),
        worker_id: worker.id.clone(),
        worker_name: worker.name.clone(),
        farmer,
        work_types,
        start_date,
        end_date,
        day_count,
        time_range,
        billing_mode,
        payment_method,
        rates: worker.rates(),
        total_amount,
        description: description.trim().to_string(),
        status: BookingStatus::Pending,
        created_at: now,
        farmer_location,
        worker_phone: worker.phone.clone(),
        has_review: false,
        group: None,
    })
}
