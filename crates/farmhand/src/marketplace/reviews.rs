//! One review per completed booking, one worker response per review.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{BookingId, BookingRequest, BookingStatus, FarmerRef, ReviewId, WorkerId};
use super::error::{InputViolation, MarketplaceError};

pub const DEFAULT_MIN_COMMENT_CHARS: usize = 10;
pub const RECENT_REVIEW_DAYS: i64 = 7;
pub const POSITIVE_RATING: u8 = 4;

/// Farmer review of a completed booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub booking_id: BookingId,
    pub worker_id: WorkerId,
    pub worker_name: String,
    pub farmer: FarmerRef,
    pub rating: u8,
    pub comment: String,
    pub work_types: BTreeSet<String>,
    pub work_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ReviewResponse>,
}

/// The worker's single reply to a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewResponse {
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// A new review together with the booking it marks as reviewed. Persist both or neither.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FiledReview {
    pub booking: BookingRequest,
    pub review: Review,
}

/// Gate enforcing review and response preconditions.
#[derive(Debug, Clone, Copy)]
pub struct ReviewGate {
    min_comment_chars: usize,
}

impl Default for ReviewGate {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_COMMENT_CHARS)
    }
}

impl ReviewGate {
    pub fn new(min_comment_chars: usize) -> Self {
        Self { min_comment_chars }
    }

    pub fn min_comment_chars(&self) -> usize {
        self.min_comment_chars
    }

    pub fn submit_review(
        &self,
        booking: &BookingRequest,
        rating: u8,
        comment: &str,
        now: DateTime<Utc>,
    ) -> Result<FiledReview, MarketplaceError> {
        if booking.status != BookingStatus::Completed {
            return Err(InputViolation::BookingNotCompleted(booking.status).into());
        }
        if booking.has_review {
            return Err(MarketplaceError::DuplicateReview(booking.id.clone()));
        }
        if !(1..=5).contains(&rating) {
            return Err(InputViolation::RatingOutOfRange(rating).into());
        }
        let comment = self.checked_comment(comment)?;

        let review = Review {
            id: ReviewId::next(),
            booking_id: booking.id.clone(),
            worker_id: booking.worker_id.clone(),
            worker_name: booking.worker_name.clone(),
            farmer: booking.farmer.clone(),
            rating,
            comment,
            work_types: booking.work_types.clone(),
            work_date: booking.end_date,
            created_at: now,
            response: None,
        };

        let mut booking = booking.clone();
        booking.has_review = true;

        Ok(FiledReview { booking, review })
    }

    /// Attach the worker's response, returning the updated review.
    pub fn submit_response(
        &self,
        review: &Review,
        comment: &str,
        now: DateTime<Utc>,
    ) -> Result<Review, MarketplaceError> {
        if review.response.is_some() {
            return Err(MarketplaceError::DuplicateResponse(review.id.clone()));
        }
        let comment = self.checked_comment(comment)?;

        let mut review = review.clone();
        review.response = Some(ReviewResponse {
            comment,
            created_at: now,
        });
        Ok(review)
    }

    fn checked_comment(&self, comment: &str) -> Result<String, InputViolation> {
        let trimmed = comment.trim();
        let found = trimmed.chars().count();
        if found < self.min_comment_chars {
            return Err(InputViolation::CommentTooShort {
                min: self.min_comment_chars,
                found,
            });
        }
        Ok(trimmed.to_string())
    }
}

pub fn submit_review(
    booking: &BookingRequest,
    rating: u8,
    comment: &str,
    now: DateTime<Utc>,
) -> Result<FiledReview, MarketplaceError> {
    ReviewGate::default().submit_review(booking, rating, comment, now)
}

pub fn submit_response(
    review: &Review,
    comment: &str,
    now: DateTime<Utc>,
) -> Result<Review, MarketplaceError> {
    ReviewGate::default().submit_response(review, comment, now)
}

pub const fn rating_label(rating: u8) -> &'static str {
    match rating {
        1 => "Poor - Not satisfied",
        2 => "Fair - Below expectations",
        3 => "Good - Met expectations",
        4 => "Very Good - Exceeded expectations",
        5 => "Excellent - Outstanding work",
        _ => "Not rated",
    }
}

/// Read-only views over a set of reviews.
#[derive(Debug, Clone, Copy)]
pub struct ReviewFeed<'a> {
    reviews: &'a [Review],
}

impl<'a> ReviewFeed<'a> {
    pub fn new(reviews: &'a [Review]) -> Self {
        Self { reviews }
    }

    /// Reviews created within the last week, newest first.
    pub fn recent(&self, now: DateTime<Utc>) -> Vec<&'a Review> {
        let cutoff = now - Duration::days(RECENT_REVIEW_DAYS);
        let mut recent: Vec<&Review> = self
            .reviews
            .iter()
            .filter(|review| review.created_at > cutoff)
            .collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent
    }

    pub fn positive(&self) -> Vec<&'a Review> {
        self.reviews
            .iter()
            .filter(|review| review.rating >= POSITIVE_RATING)
            .collect()
    }

    pub fn awaiting_response(&self) -> Vec<&'a Review> {
        self.reviews
            .iter()
            .filter(|review| review.response.is_none())
            .collect()
    }

    pub fn summary(&self) -> RatingSummary {
        RatingSummary::from_reviews(self.reviews)
    }
}

/// Count and one-decimal mean of review ratings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingSummary {
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average: Option<f32>,
}

impl RatingSummary {
    pub fn from_reviews(reviews: &[Review]) -> Self {
        if reviews.is_empty() {
            return Self {
                count: 0,
                average: None,
            };
        }

        let total: u32 = reviews.iter().map(|review| u32::from(review.rating)).sum();
        let mean = total as f32 / reviews.len() as f32;
        Self {
            count: reviews.len(),
            average: Some((mean * 10.0).round() / 10.0),
        }
    }
}
