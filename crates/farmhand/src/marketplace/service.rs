use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::availability::list_available_dates;
use super::booking::{
    create_booking, create_group_booking, transition_expecting, BookingDraft, GroupBookingTerms,
    GroupSelection,
};
use super::domain::{
    ActorRole, BillingMode, BookingEvent, BookingId, BookingRequest, BookingStatus, HourRange,
    ReviewId, Worker, WorkerId,
};
use super::error::{InputViolation, MarketplaceError};
use super::payment::{intent_for_booking, PaymentIntent};
use super::pricing;
use super::repository::{
    BookingFilter, MarketplaceNotification, MarketplaceRepository, NotificationKind,
    NotificationSink, Recipient, RepositoryError,
};
use super::reviews::{Review, ReviewGate};
use super::search::{search, SearchCriteria};
use crate::config::MarketplaceConfig;

/// Quote inputs for a worker whose rates come from the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub day_count: u32,
    pub billing_mode: BillingMode,
    #[serde(default)]
    pub time_range: Option<HourRange>,
}

/// Service composing the booking engine with storage and notification seams.
pub struct MarketplaceService<R, N> {
    repository: Arc<R>,
    notifications: Arc<N>,
    gate: ReviewGate,
    config: MarketplaceConfig,
}

impl<R, N> MarketplaceService<R, N>
where
    R: MarketplaceRepository + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(repository: Arc<R>, notifications: Arc<N>, config: MarketplaceConfig) -> Self {
        let gate = ReviewGate::new(config.review_min_comment_chars);
        Self {
            repository,
            notifications,
            gate,
            config,
        }
    }

    pub fn config(&self) -> &MarketplaceConfig {
        &self.config
    }

    /// Criteria used when a farmer clears their filters.
    pub fn default_criteria(&self) -> SearchCriteria {
        SearchCriteria::with_defaults(&self.config.search)
    }

    pub fn search(&self, criteria: &SearchCriteria) -> Result<Vec<Worker>, MarketplaceServiceError> {
        let pool = self.repository.workers()?;
        let results = search(&pool, criteria);
        debug!(
            pool = pool.len(),
            matched = results.len(),
            filtered = criteria.is_filtered(&self.config.search),
            "worker search"
        );
        Ok(results)
    }

    pub fn worker(&self, worker_id: &WorkerId) -> Result<Worker, MarketplaceServiceError> {
        self.repository
            .worker(worker_id)?
            .ok_or_else(|| MarketplaceServiceError::WorkerNotFound(worker_id.clone()))
    }

    pub fn available_dates(
        &self,
        worker_id: &WorkerId,
        today: NaiveDate,
    ) -> Result<Vec<NaiveDate>, MarketplaceServiceError> {
        let worker = self.worker(worker_id)?;
        Ok(list_available_dates(&worker, today))
    }

    pub fn quote(
        &self,
        worker_id: &WorkerId,
        request: QuoteRequest,
    ) -> Result<u64, MarketplaceServiceError> {
        let worker = self.worker(worker_id)?;
        Ok(pricing::quote_for_worker(
            &worker,
            request.day_count,
            request.billing_mode,
            request.time_range,
        ))
    }

    /// Create a pending booking after checking every selected date against the
    /// worker's calendar.
    pub fn book(
        &self,
        worker_id: &WorkerId,
        draft: BookingDraft,
        now: DateTime<Utc>,
    ) -> Result<BookingRequest, MarketplaceServiceError> {
        let worker = self.worker(worker_id)?;
        let today = now.date_naive();
        if let Some(date) = worker
            .calendar()
            .unavailable_in(&draft.dates, today)
            .into_iter()
            .next()
        {
            return Err(MarketplaceError::from(InputViolation::DateUnavailable(date)).into());
        }

        let booking = create_booking(&worker, draft, now)?;
        let stored = self
            .repository
            .insert_bookings(vec![booking])?
            .into_iter()
            .next()
            .ok_or(RepositoryError::NotFound)?;

        info!(
            booking_id = %stored.id,
            worker_id = %stored.worker_id,
            amount = stored.total_amount,
            billing = stored.billing_mode.label(),
            "booking requested"
        );
        self.notify(MarketplaceNotification {
            kind: NotificationKind::Booking,
            recipient: Recipient::Worker(stored.worker_id.clone()),
            title: "New Booking Request".to_string(),
            message: format!(
                "{} wants to book you for {}",
                stored.farmer.name,
                stored.work_type_summary()
            ),
            booking_id: Some(stored.id.clone()),
            created_at: now,
        });

        Ok(stored)
    }

    pub fn booking(&self, booking_id: &BookingId) -> Result<BookingRequest, MarketplaceServiceError> {
        self.repository
            .booking(booking_id)?
            .ok_or_else(|| MarketplaceServiceError::BookingNotFound(booking_id.clone()))
    }

    pub fn bookings(
        &self,
        filter: &BookingFilter,
    ) -> Result<Vec<BookingRequest>, MarketplaceServiceError> {
        Ok(self.repository.bookings(filter)?)
    }

    /// Apply an event on behalf of `actor`, provided the booking is still `expected`.
    pub fn transition(
        &self,
        booking_id: &BookingId,
        expected: BookingStatus,
        event: BookingEvent,
        actor: ActorRole,
        now: DateTime<Utc>,
    ) -> Result<BookingRequest, MarketplaceServiceError> {
        let current = self.booking(booking_id)?;
        let updated = transition_expecting(&current, expected, event, actor)?;

        self.repository
            .save_booking(updated.clone(), expected)
            .map_err(|err| match err {
                RepositoryError::StatusMismatch { actual } => {
                    MarketplaceServiceError::Marketplace(MarketplaceError::StaleState {
                        booking_id: booking_id.clone(),
                        expected,
                        actual,
                    })
                }
                other => other.into(),
            })?;

        info!(
            booking_id = %updated.id,
            from = expected.label(),
            to = updated.status.label(),
            actor = actor.label(),
            "booking transitioned"
        );

        let recipient = match actor {
            ActorRole::Worker => Recipient::Farmer(updated.farmer.id.clone()),
            ActorRole::Farmer => Recipient::Worker(updated.worker_id.clone()),
        };
        self.notify(MarketplaceNotification {
            kind: NotificationKind::Booking,
            recipient,
            title: format!("Booking {}", updated.status.label()),
            message: format!(
                "Booking {} for {} is now {}",
                updated.id,
                updated.work_type_summary(),
                updated.status.label()
            ),
            booking_id: Some(updated.id.clone()),
            created_at: now,
        });

        Ok(updated)
    }

    /// Fan a group selection out into independent pending bookings.
    ///
    /// Member availability is the caller's responsibility and is not re-checked.
    pub fn book_group(
        &self,
        worker_ids: &[WorkerId],
        terms: &GroupBookingTerms,
        now: DateTime<Utc>,
    ) -> Result<Vec<BookingRequest>, MarketplaceServiceError> {
        let workers = worker_ids
            .iter()
            .map(|id| self.worker(id))
            .collect::<Result<Vec<_>, _>>()?;
        let selection = GroupSelection::from_workers(workers);
        let bookings = create_group_booking(&selection, terms, now)?;
        let stored = self.repository.insert_bookings(bookings)?;

        info!(
            members = stored.len(),
            daily_total = selection.summary().total_daily_cost,
            "group booking requested"
        );
        for booking in &stored {
            self.notify(MarketplaceNotification {
                kind: NotificationKind::Booking,
                recipient: Recipient::Worker(booking.worker_id.clone()),
                title: "New Group Booking Request".to_string(),
                message: format!(
                    "{} wants to book a group for {}",
                    booking.farmer.name,
                    booking.work_type_summary()
                ),
                booking_id: Some(booking.id.clone()),
                created_at: now,
            });
        }

        Ok(stored)
    }

    /// File the farmer's review of a completed booking.
    pub fn review_booking(
        &self,
        booking_id: &BookingId,
        rating: u8,
        comment: &str,
        now: DateTime<Utc>,
    ) -> Result<Review, MarketplaceServiceError> {
        self.check_comment_cap(comment)?;
        let booking = self.booking(booking_id)?;
        let filed = self.gate.submit_review(&booking, rating, comment, now)?;
        let review = filed.review.clone();

        self.repository.file_review(filed).map_err(|err| match err {
            RepositoryError::Conflict => {
                MarketplaceServiceError::Marketplace(MarketplaceError::DuplicateReview(
                    booking_id.clone(),
                ))
            }
            other => other.into(),
        })?;

        info!(
            booking_id = %booking_id,
            review_id = %review.id,
            rating = review.rating,
            "review filed"
        );
        self.notify(MarketplaceNotification {
            kind: NotificationKind::Review,
            recipient: Recipient::Worker(review.worker_id.clone()),
            title: "New Review".to_string(),
            message: format!("{} rated your work {} stars", review.farmer.name, review.rating),
            booking_id: Some(booking_id.clone()),
            created_at: now,
        });

        Ok(review)
    }

    /// Attach the worker's one-time response to a review.
    pub fn respond_to_review(
        &self,
        review_id: &ReviewId,
        comment: &str,
        now: DateTime<Utc>,
    ) -> Result<Review, MarketplaceServiceError> {
        self.check_comment_cap(comment)?;
        let review = self
            .repository
            .review(review_id)?
            .ok_or_else(|| MarketplaceServiceError::ReviewNotFound(review_id.clone()))?;
        let updated = self.gate.submit_response(&review, comment, now)?;

        self.repository
            .save_response(updated.clone())
            .map_err(|err| match err {
                RepositoryError::Conflict => MarketplaceServiceError::Marketplace(
                    MarketplaceError::DuplicateResponse(review_id.clone()),
                ),
                other => other.into(),
            })?;

        info!(review_id = %review_id, "review response recorded");
        self.notify(MarketplaceNotification {
            kind: NotificationKind::Message,
            recipient: Recipient::Farmer(updated.farmer.id.clone()),
            title: "Worker Responded".to_string(),
            message: format!("{} responded to your review", updated.worker_name),
            booking_id: Some(updated.booking_id.clone()),
            created_at: now,
        });

        Ok(updated)
    }

    pub fn worker_reviews(
        &self,
        worker_id: &WorkerId,
    ) -> Result<Vec<Review>, MarketplaceServiceError> {
        Ok(self.repository.reviews_for_worker(worker_id)?)
    }

    /// Payment payload for a booking, or `None` when it is settled in cash.
    pub fn payment_intent(
        &self,
        booking_id: &BookingId,
    ) -> Result<Option<PaymentIntent>, MarketplaceServiceError> {
        let booking = self.booking(booking_id)?;
        Ok(intent_for_booking(&booking))
    }

    fn check_comment_cap(&self, comment: &str) -> Result<(), MarketplaceServiceError> {
        let found = comment.trim().chars().count();
        if found > self.config.review_max_comment_chars {
            return Err(MarketplaceError::from(InputViolation::CommentTooLong {
                max: self.config.review_max_comment_chars,
                found,
            })
            .into());
        }
        Ok(())
    }

    // Notifications are best effort: the state change has already been stored.
    fn notify(&self, notification: MarketplaceNotification) {
        let kind = notification.kind;
        if let Err(err) = self.notifications.publish(notification) {
            warn!(?kind, error = %err, "notification dropped");
        }
    }
}

/// Error raised by the marketplace service.
#[derive(Debug, thiserror::Error)]
pub enum MarketplaceServiceError {
    #[error(transparent)]
    Marketplace(#[from] MarketplaceError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("worker {0} not found")]
    WorkerNotFound(WorkerId),
    #[error("booking {0} not found")]
    BookingNotFound(BookingId),
    #[error("review {0} not found")]
    ReviewNotFound(ReviewId),
}
