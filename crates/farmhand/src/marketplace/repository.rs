use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    BookingId, BookingRequest, BookingStatus, FarmerId, ReviewId, Worker, WorkerId,
};
use super::reviews::{FiledReview, Review};

/// Storage abstraction so the service can be exercised in isolation. Implementations
/// own serialization of concurrent writers.
pub trait MarketplaceRepository: Send + Sync {
    fn workers(&self) -> Result<Vec<Worker>, RepositoryError>;
    fn worker(&self, id: &WorkerId) -> Result<Option<Worker>, RepositoryError>;

    /// Insert all bookings or none of them.
    fn insert_bookings(
        &self,
        bookings: Vec<BookingRequest>,
    ) -> Result<Vec<BookingRequest>, RepositoryError>;
    fn booking(&self, id: &BookingId) -> Result<Option<BookingRequest>, RepositoryError>;
    fn bookings(&self, filter: &BookingFilter) -> Result<Vec<BookingRequest>, RepositoryError>;

    /// Replace a booking only if the stored status still equals `expected`;
    /// otherwise fail with `StatusMismatch` carrying the stored status.
    fn save_booking(
        &self,
        booking: BookingRequest,
        expected: BookingStatus,
    ) -> Result<(), RepositoryError>;

    /// Store the review and the reviewed booking as one unit. Fails with `Conflict`
    /// when the stored booking already carries a review.
    fn file_review(&self, filed: FiledReview) -> Result<(), RepositoryError>;
    fn review(&self, id: &ReviewId) -> Result<Option<Review>, RepositoryError>;
    fn reviews_for_worker(&self, worker_id: &WorkerId) -> Result<Vec<Review>, RepositoryError>;

    /// Store a review that gained a response. Fails with `Conflict` when the stored
    /// review already has one.
    fn save_response(&self, review: Review) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("stored booking is {actual}")]
    StatusMismatch { actual: BookingStatus },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Optional constraints applied when listing bookings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingFilter {
    #[serde(default)]
    pub farmer_id: Option<FarmerId>,
    #[serde(default)]
    pub worker_id: Option<WorkerId>,
    #[serde(default)]
    pub status: Option<BookingStatus>,
}

impl BookingFilter {
    pub fn for_farmer(farmer_id: FarmerId) -> Self {
        Self {
            farmer_id: Some(farmer_id),
            ..Self::default()
        }
    }

    pub fn for_worker(worker_id: WorkerId) -> Self {
        Self {
            worker_id: Some(worker_id),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: BookingStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, booking: &BookingRequest) -> bool {
        self.farmer_id
            .as_ref()
            .map_or(true, |id| &booking.farmer.id == id)
            && self
                .worker_id
                .as_ref()
                .map_or(true, |id| &booking.worker_id == id)
            && self.status.map_or(true, |status| booking.status == status)
    }
}

/// Trait describing outbound notification hooks (push, SMS, in-app feed adapters).
pub trait NotificationSink: Send + Sync {
    fn publish(&self, notification: MarketplaceNotification) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Booking,
    Message,
    Review,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "role", content = "id")]
pub enum Recipient {
    Worker(WorkerId),
    Farmer(FarmerId),
}

/// Notification payload handed to the sink; delivery is the sink's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceNotification {
    pub kind: NotificationKind,
    pub recipient: Recipient,
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<BookingId>,
    pub created_at: DateTime<Utc>,
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
