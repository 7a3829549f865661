use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::config::MarketplaceConfig;
use crate::marketplace::booking::{BookingDraft, GroupBookingTerms};
use crate::marketplace::domain::{
    BillingMode, BookingId, BookingRequest, BookingStatus, FarmerId, FarmerRef, ReviewId, Worker,
    WorkerId,
};
use crate::marketplace::payment::PaymentMethod;
use crate::marketplace::repository::{
    BookingFilter, MarketplaceNotification, MarketplaceRepository, NotificationError,
    NotificationSink, RepositoryError,
};
use crate::marketplace::reviews::{FiledReview, Review};
use crate::marketplace::MarketplaceService;

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 11, 2).expect("valid date")
}

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 11, 2, 6, 0, 0)
        .single()
        .expect("valid instant")
}

pub(super) fn day(offset: i64) -> NaiveDate {
    today() + Duration::days(offset)
}

fn skills(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|name| name.to_string()).collect()
}

pub(super) fn ravi() -> Worker {
    Worker {
        id: WorkerId("w-ravi".to_string()),
        name: "Ravi Kumar".to_string(),
        phone: "+91 98765 43210".to_string(),
        location: "Mandya, Karnataka".to_string(),
        skills: skills(&["Ploughing", "Harvesting", "Irrigation"]),
        experience_years: 8,
        daily_rate: 600,
        hourly_rate: 75,
        rating: 4.8,
        total_reviews: 24,
        bio: "Experienced in paddy and sugarcane cultivation.".to_string(),
        availability: vec![day(1), day(2), day(3), day(5)],
        is_available: true,
        languages: skills(&["Kannada", "Hindi"]),
        distance_km: Some(5.0),
    }
}

pub(super) fn suresh() -> Worker {
    Worker {
        id: WorkerId("w-suresh".to_string()),
        name: "Suresh Patil".to_string(),
        phone: "+91 87654 32109".to_string(),
        location: "Mysore, Karnataka".to_string(),
        skills: skills(&["Harvesting", "Pesticide Spraying", "Weeding"]),
        experience_years: 12,
        daily_rate: 750,
        hourly_rate: 90,
        rating: 4.9,
        total_reviews: 38,
        bio: "Certified in safe pesticide handling.".to_string(),
        availability: vec![day(1), day(2), day(4)],
        is_available: true,
        languages: skills(&["Kannada", "Marathi"]),
        distance_km: Some(15.0),
    }
}

pub(super) fn lakshmi() -> Worker {
    Worker {
        id: WorkerId("w-lakshmi".to_string()),
        name: "Lakshmi Devi".to_string(),
        phone: "+91 76543 21098".to_string(),
        location: "Hassan, Karnataka".to_string(),
        skills: skills(&["Weeding", "Planting", "Harvesting"]),
        experience_years: 6,
        daily_rate: 500,
        hourly_rate: 65,
        rating: 4.7,
        total_reviews: 19,
        bio: "Careful transplanting and vegetable harvests.".to_string(),
        availability: vec![day(2), day(3)],
        is_available: true,
        languages: skills(&["Kannada"]),
        distance_km: Some(25.0),
    }
}

pub(super) fn manjunath() -> Worker {
    Worker {
        id: WorkerId("w-manjunath".to_string()),
        name: "Manjunath Gowda".to_string(),
        phone: "+91 65432 10987".to_string(),
        location: "Tumkur, Karnataka".to_string(),
        skills: skills(&["Tractor Driving", "Ploughing", "Irrigation"]),
        experience_years: 15,
        daily_rate: 800,
        hourly_rate: 100,
        rating: 4.6,
        total_reviews: 42,
        bio: "Owns a tractor and drip-irrigation kit.".to_string(),
        availability: Vec::new(),
        is_available: false,
        languages: skills(&["Kannada", "Telugu"]),
        distance_km: Some(30.0),
    }
}

pub(super) fn pool() -> Vec<Worker> {
    vec![ravi(), suresh(), lakshmi(), manjunath()]
}

pub(super) fn farmer() -> FarmerRef {
    FarmerRef {
        id: FarmerId("f-anand".to_string()),
        name: "Anand Rao".to_string(),
    }
}

pub(super) fn daily_draft(dates: Vec<NaiveDate>) -> BookingDraft {
    BookingDraft {
        farmer: farmer(),
        dates,
        work_types: skills(&["Harvesting"]),
        billing_mode: BillingMode::Daily,
        time_range: None,
        payment_method: PaymentMethod::Upi,
        description: "Paddy harvest, two acres".to_string(),
        farmer_location: "Srirangapatna".to_string(),
    }
}

pub(super) fn group_terms() -> GroupBookingTerms {
    GroupBookingTerms {
        farmer: farmer(),
        work_type: "Harvesting".to_string(),
        start_date: day(2),
        end_date: day(3),
        hours_per_day: 8,
        location: "Srirangapatna".to_string(),
        instructions: "Bring sickles".to_string(),
        payment_method: PaymentMethod::Cash,
    }
}

/// Sets status without going through the state machine, for fixtures only.
pub(super) fn with_status(mut booking: BookingRequest, status: BookingStatus) -> BookingRequest {
    booking.status = status;
    booking
}

pub(super) type TestService = MarketplaceService<MemoryRepository, MemoryNotifications>;

pub(super) fn build_service() -> (TestService, Arc<MemoryRepository>, Arc<MemoryNotifications>) {
    let repository = Arc::new(MemoryRepository::with_workers(pool()));
    let notifications = Arc::new(MemoryNotifications::default());
    let service = MarketplaceService::new(
        repository.clone(),
        notifications.clone(),
        MarketplaceConfig::default(),
    );
    (service, repository, notifications)
}

#[derive(Default)]
struct Tables {
    workers: Vec<Worker>,
    bookings: BTreeMap<BookingId, BookingRequest>,
    reviews: BTreeMap<ReviewId, Review>,
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryRepository {
    pub(super) fn with_workers(workers: Vec<Worker>) -> Self {
        let repository = Self::default();
        repository.tables.lock().expect("repository mutex poisoned").workers = workers;
        repository
    }

    pub(super) fn booking_count(&self) -> usize {
        self.tables
            .lock()
            .expect("repository mutex poisoned")
            .bookings
            .len()
    }

    /// Overwrite a stored booking, simulating another writer.
    pub(super) fn force_status(&self, id: &BookingId, status: BookingStatus) {
        let mut tables = self.tables.lock().expect("repository mutex poisoned");
        if let Some(booking) = tables.bookings.get_mut(id) {
            booking.status = status;
        }
    }

    /// Mark a stored booking as reviewed, simulating another reviewer.
    pub(super) fn force_reviewed(&self, id: &BookingId) {
        let mut tables = self.tables.lock().expect("repository mutex poisoned");
        if let Some(booking) = tables.bookings.get_mut(id) {
            booking.has_review = true;
        }
    }
}

impl MarketplaceRepository for MemoryRepository {
    fn workers(&self) -> Result<Vec<Worker>, RepositoryError> {
        Ok(self
            .tables
            .lock()
            .expect("repository mutex poisoned")
            .workers
            .clone())
    }

    fn worker(&self, id: &WorkerId) -> Result<Option<Worker>, RepositoryError> {
        let tables = self.tables.lock().expect("repository mutex poisoned");
        Ok(tables.workers.iter().find(|worker| &worker.id == id).cloned())
    }

    fn insert_bookings(
        &self,
        bookings: Vec<BookingRequest>,
    ) -> Result<Vec<BookingRequest>, RepositoryError> {
        let mut tables = self.tables.lock().expect("repository mutex poisoned");
        if bookings
            .iter()
            .any(|booking| tables.bookings.contains_key(&booking.id))
        {
            return Err(RepositoryError::Conflict);
        }
        for booking in &bookings {
            tables.bookings.insert(booking.id.clone(), booking.clone());
        }
        Ok(bookings)
    }

    fn booking(&self, id: &BookingId) -> Result<Option<BookingRequest>, RepositoryError> {
        let tables = self.tables.lock().expect("repository mutex poisoned");
        Ok(tables.bookings.get(id).cloned())
    }

    fn bookings(&self, filter: &BookingFilter) -> Result<Vec<BookingRequest>, RepositoryError> {
        let tables = self.tables.lock().expect("repository mutex poisoned");
        Ok(tables
            .bookings
            .values()
            .filter(|booking| filter.matches(booking))
            .cloned()
            .collect())
    }

    fn save_booking(
        &self,
        booking: BookingRequest,
        expected: BookingStatus,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().expect("repository mutex poisoned");
        let stored = tables
            .bookings
            .get_mut(&booking.id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.status != expected {
            return Err(RepositoryError::StatusMismatch {
                actual: stored.status,
            });
        }
        *stored = booking;
        Ok(())
    }

    fn file_review(&self, filed: FiledReview) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().expect("repository mutex poisoned");
        let stored = tables
            .bookings
            .get(&filed.booking.id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.has_review {
            return Err(RepositoryError::Conflict);
        }
        tables
            .bookings
            .insert(filed.booking.id.clone(), filed.booking);
        tables.reviews.insert(filed.review.id.clone(), filed.review);
        Ok(())
    }

    fn review(&self, id: &ReviewId) -> Result<Option<Review>, RepositoryError> {
        let tables = self.tables.lock().expect("repository mutex poisoned");
        Ok(tables.reviews.get(id).cloned())
    }

    fn reviews_for_worker(&self, worker_id: &WorkerId) -> Result<Vec<Review>, RepositoryError> {
        let tables = self.tables.lock().expect("repository mutex poisoned");
        Ok(tables
            .reviews
            .values()
            .filter(|review| &review.worker_id == worker_id)
            .cloned()
            .collect())
    }

    fn save_response(&self, review: Review) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().expect("repository mutex poisoned");
        let stored = tables
            .reviews
            .get_mut(&review.id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.response.is_some() {
            return Err(RepositoryError::Conflict);
        }
        *stored = review;
        Ok(())
    }
}

/// What a competing writer does between the service's read and its write.
#[derive(Clone, Copy)]
pub(super) enum Interleaving {
    MovesStatusTo(BookingStatus),
    FilesReviewFirst,
}

/// Delegates to a `MemoryRepository`, letting a competing writer land just
/// before each status save or review filing.
pub(super) struct RacingRepository {
    pub(super) inner: MemoryRepository,
    interleaving: Interleaving,
}

impl RacingRepository {
    pub(super) fn new(inner: MemoryRepository, interleaving: Interleaving) -> Self {
        Self {
            inner,
            interleaving,
        }
    }
}

impl MarketplaceRepository for RacingRepository {
    fn workers(&self) -> Result<Vec<Worker>, RepositoryError> {
        self.inner.workers()
    }

    fn worker(&self, id: &WorkerId) -> Result<Option<Worker>, RepositoryError> {
        self.inner.worker(id)
    }

    fn insert_bookings(
        &self,
        bookings: Vec<BookingRequest>,
    ) -> Result<Vec<BookingRequest>, RepositoryError> {
        self.inner.insert_bookings(bookings)
    }

    fn booking(&self, id: &BookingId) -> Result<Option<BookingRequest>, RepositoryError> {
        self.inner.booking(id)
    }

    fn bookings(&self, filter: &BookingFilter) -> Result<Vec<BookingRequest>, RepositoryError> {
        self.inner.bookings(filter)
    }

    fn save_booking(
        &self,
        booking: BookingRequest,
        expected: BookingStatus,
    ) -> Result<(), RepositoryError> {
        if let Interleaving::MovesStatusTo(status) = self.interleaving {
            self.inner.force_status(&booking.id, status);
        }
        self.inner.save_booking(booking, expected)
    }

    fn file_review(&self, filed: FiledReview) -> Result<(), RepositoryError> {
        if let Interleaving::FilesReviewFirst = self.interleaving {
            self.inner.force_reviewed(&filed.booking.id);
        }
        self.inner.file_review(filed)
    }

    fn review(&self, id: &ReviewId) -> Result<Option<Review>, RepositoryError> {
        self.inner.review(id)
    }

    fn reviews_for_worker(&self, worker_id: &WorkerId) -> Result<Vec<Review>, RepositoryError> {
        self.inner.reviews_for_worker(worker_id)
    }

    fn save_response(&self, review: Review) -> Result<(), RepositoryError> {
        self.inner.save_response(review)
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifications {
    events: Arc<Mutex<Vec<MarketplaceNotification>>>,
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<MarketplaceNotification> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .clone()
    }
}

impl NotificationSink for MemoryNotifications {
    fn publish(&self, notification: MarketplaceNotification) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(super) struct FailingNotifications;

impl NotificationSink for FailingNotifications {
    fn publish(&self, _notification: MarketplaceNotification) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("sms gateway down".to_string()))
    }
}

pub(super) struct UnavailableRepository;

impl MarketplaceRepository for UnavailableRepository {
    fn workers(&self) -> Result<Vec<Worker>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn worker(&self, _id: &WorkerId) -> Result<Option<Worker>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert_bookings(
        &self,
        _bookings: Vec<BookingRequest>,
    ) -> Result<Vec<BookingRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn booking(&self, _id: &BookingId) -> Result<Option<BookingRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn bookings(&self, _filter: &BookingFilter) -> Result<Vec<BookingRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn save_booking(
        &self,
        _booking: BookingRequest,
        _expected: BookingStatus,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn file_review(&self, _filed: FiledReview) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn review(&self, _id: &ReviewId) -> Result<Option<Review>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn reviews_for_worker(&self, _worker_id: &WorkerId) -> Result<Vec<Review>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn save_response(&self, _review: Review) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
