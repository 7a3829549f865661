use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::super::domain::{
    BillingMode, BookingId, BookingRequest, BookingStatus, FarmerRef, GroupId, GroupMembership,
    Worker, WorkerId,
};
use super::super::error::{InputViolation, MarketplaceError};
use super::super::payment::PaymentMethod;
use super::super::pricing;

/// Ordered, de-duplicated set of workers picked during one search session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupSelection {
    workers: Vec<Worker>,
}

impl GroupSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_workers<I>(workers: I) -> Self
    where
        I: IntoIterator<Item = Worker>,
    {
        workers.into_iter().fold(Self::new(), Self::with)
    }

    /// Add a worker at the end; already-selected workers keep their position.
    pub fn with(mut self, worker: Worker) -> Self {
        if !self.contains(&worker.id) {
            self.workers.push(worker);
        }
        self
    }

    pub fn without(mut self, worker_id: &WorkerId) -> Self {
        self.workers.retain(|worker| &worker.id != worker_id);
        self
    }

    /// Select the worker if absent, deselect if present.
    pub fn toggled(self, worker: Worker) -> Self {
        if self.contains(&worker.id) {
            let id = worker.id;
            self.without(&id)
        } else {
            self.with(worker)
        }
    }

    pub fn contains(&self, worker_id: &WorkerId) -> bool {
        self.workers.iter().any(|worker| &worker.id == worker_id)
    }

    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn summary(&self) -> GroupSummary {
        let average_rating = if self.workers.is_empty() {
            None
        } else {
            let sum: f32 = self.workers.iter().map(|worker| worker.rating).sum();
            Some(sum / self.workers.len() as f32)
        };

        GroupSummary {
            member_count: self.workers.len(),
            total_daily_cost: pricing::group_total(&self.workers),
            average_rating,
        }
    }
}

/// Aggregate figures shown before a group is confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupSummary {
    pub member_count: usize,
    pub total_daily_cost: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f32>,
}

/// Terms shared by every booking in a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupBookingTerms {
    pub farmer: FarmerRef,
    pub work_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub hours_per_day: u8,
    pub location: String,
    #[serde(default)]
    pub instructions: String,
    pub payment_method: PaymentMethod,
}

/// Fan a group out into one pending booking per worker, billed daily at each
/// worker's own rate. Either every booking is produced or none is.
pub fn create_group_booking(
    selection: &GroupSelection,
    terms: &GroupBookingTerms,
    now: DateTime<Utc>,
) -> Result<Vec<BookingRequest>, MarketplaceError> {
    if selection.is_empty() {
        return Err(InputViolation::EmptyGroup.into());
    }

    let work_type = terms.work_type.trim();
    if work_type.is_empty() {
        return Err(InputViolation::NoWorkTypes.into());
    }

    let location = terms.location.trim();
    if location.is_empty() {
        return Err(InputViolation::MissingLocation.into());
    }

    if terms.start_date > terms.end_date {
        return Err(InputViolation::InvertedDateRange {
            start: terms.start_date,
            end: terms.end_date,
        }
        .into());
    }

    if terms.hours_per_day == 0 || terms.hours_per_day > 24 {
        return Err(InputViolation::InvalidDailyHours(terms.hours_per_day).into());
    }

    let day_count = pricing::inclusive_day_count(terms.start_date, terms.end_date);
    let quotes: Vec<u64> = selection
        .workers()
        .iter()
        .map(|worker| pricing::quote_for_worker(worker, day_count, BillingMode::Daily, None))
        .collect();
    if quotes.iter().any(|amount| *amount == 0) {
        return Err(InputViolation::UnresolvableAmount.into());
    }

    let membership = GroupMembership {
        group_id: GroupId::next(),
        hours_per_day: terms.hours_per_day,
    };
    let work_types = BTreeSet::from([work_type.to_string()]);

    let bookings = selection
        .workers()
        .iter()
        .zip(quotes)
        .map(|(worker, total_amount)| BookingRequest {
            id: BookingId::next(),
            worker_id: worker.id.clone(),
            worker_name: worker.name.clone(),
            farmer: terms.farmer.clone(),
            work_types: work_types.clone(),
            start_date: terms.start_date,
            end_date: terms.end_date,
            day_count,
            time_range: None,
            billing_mode: BillingMode::Daily,
            payment_method: terms.payment_method,
            rates: worker.rates(),
            total_amount,
            description: terms.instructions.trim().to_string(),
            status: BookingStatus::Pending,
            created_at: now,
            farmer_location: location.to_string(),
            worker_phone: worker.phone.clone(),
            has_review: false,
            group: Some(membership.clone()),
        })
        .collect();

    Ok(bookings)
}
