use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::availability::AvailabilityCalendar;
use super::payment::PaymentMethod;

/// Identifier wrapper for workers listed on the marketplace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorkerId(pub String);

/// Identifier wrapper for farmers placing bookings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FarmerId(pub String);

/// Identifier wrapper for booking requests.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BookingId(pub String);

/// Identifier wrapper for reviews.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReviewId(pub String);

/// Identifier shared by every booking fanned out from one group selection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupId(pub String);

static BOOKING_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static REVIEW_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static GROUP_SEQUENCE: AtomicU64 = AtomicU64::new(1);

impl BookingId {
    pub(crate) fn next() -> Self {
        let id = BOOKING_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self(format!("bkg-{id:06}"))
    }
}

impl ReviewId {
    pub(crate) fn next() -> Self {
        let id = REVIEW_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self(format!("rev-{id:06}"))
    }
}

impl GroupId {
    pub(crate) fn next() -> Self {
        let id = GROUP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self(format!("grp-{id:06}"))
    }
}

macro_rules! display_inner {
    ($($ty:ty),+) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        })+
    };
}

display_inner!(WorkerId, FarmerId, BookingId, ReviewId, GroupId);

/// Worker profile as listed in search results. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub name: String,
    pub phone: String,
    pub location: String,
    pub skills: BTreeSet<String>,
    pub experience_years: u32,
    pub daily_rate: u32,
    pub hourly_rate: u32,
    pub rating: f32,
    pub total_reviews: u32,
    pub bio: String,
    pub availability: Vec<NaiveDate>,
    pub is_available: bool,
    pub languages: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f32>,
}

impl Worker {
    pub fn calendar(&self) -> AvailabilityCalendar<'_> {
        AvailabilityCalendar::new(&self.availability)
    }

    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.contains(skill)
    }

    pub fn rates(&self) -> RateCard {
        RateCard {
            daily: self.daily_rate,
            hourly: self.hourly_rate,
        }
    }
}

/// Farmer reference carried on a booking. Identity plus a display-name snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmerRef {
    pub id: FarmerId,
    pub name: String,
}

/// Worker rates captured at booking time so amounts stay recomputable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateCard {
    pub daily: u32,
    pub hourly: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingMode {
    Hourly,
    Daily,
}

impl BillingMode {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
        }
    }
}

/// Hour-of-day window worked on each booked day (24h clock, end exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourRange {
    pub start_hour: u8,
    pub end_hour: u8,
}

impl HourRange {
    pub fn new(start_hour: u8, end_hour: u8) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    /// Both ends fall on the clock: start in 0..=23, end in 1..=24.
    pub fn is_within_day(self) -> bool {
        self.start_hour <= 23 && self.end_hour <= 24
    }

    /// Billable hours, or `None` when the window is empty, inverted or off the clock.
    pub fn hours(self) -> Option<u32> {
        (self.is_within_day() && self.end_hour > self.start_hour)
            .then(|| u32::from(self.end_hour - self.start_hour))
    }
}

impl fmt::Display for HourRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00-{:02}:00", self.start_hour, self.end_hour)
    }
}

/// Lifecycle status of a booking request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Links a booking back to the group selection it was fanned out from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub group_id: GroupId,
    pub hours_per_day: u8,
}

/// A single farmer-to-worker booking request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub id: BookingId,
    pub worker_id: WorkerId,
    pub worker_name: String,
    pub farmer: FarmerRef,
    pub work_types: BTreeSet<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub day_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range: Option<HourRange>,
    pub billing_mode: BillingMode,
    pub payment_method: PaymentMethod,
    pub rates: RateCard,
    pub total_amount: u64,
    pub description: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub farmer_location: String,
    pub worker_phone: String,
    pub has_review: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupMembership>,
}

impl BookingRequest {
    /// Re-derive the amount from the stored inputs.
    pub fn recompute_amount(&self) -> u64 {
        let (start, end) = match self.time_range {
            Some(range) => (Some(range.start_hour), Some(range.end_hour)),
            None => (None, None),
        };
        super::pricing::quote(
            self.day_count,
            self.billing_mode,
            self.rates.daily,
            self.rates.hourly,
            start,
            end,
        )
    }

    pub fn amount_is_consistent(&self) -> bool {
        self.recompute_amount() == self.total_amount
    }

    pub fn work_type_summary(&self) -> String {
        self.work_types
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Who is driving a booking event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Worker,
    Farmer,
}

impl ActorRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Worker => "worker",
            Self::Farmer => "farmer",
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Events accepted by the booking state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingEvent {
    Accept,
    Decline,
    Complete,
}

impl BookingEvent {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Decline => "decline",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for BookingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
