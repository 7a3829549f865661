use chrono::NaiveDate;

use super::domain::{ActorRole, BookingEvent, BookingId, BookingStatus, ReviewId};

/// Rejections returned by the booking engine. Every variant is recoverable and
/// leaves the inputs untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MarketplaceError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputViolation),
    #[error("{actor} cannot {event} a {from} booking")]
    IllegalTransition {
        from: BookingStatus,
        event: BookingEvent,
        actor: ActorRole,
    },
    #[error("booking {0} already has a review")]
    DuplicateReview(BookingId),
    #[error("review {0} already has a response")]
    DuplicateResponse(ReviewId),
    #[error("booking {booking_id} is {actual}, expected {expected}")]
    StaleState {
        booking_id: BookingId,
        expected: BookingStatus,
        actual: BookingStatus,
    },
}

/// Specific reasons behind an `InvalidInput` rejection.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputViolation {
    #[error("at least one date must be selected")]
    NoDatesSelected,
    #[error("at least one work type must be selected")]
    NoWorkTypes,
    #[error("worker does not offer {0}")]
    UnsupportedWorkType(String),
    #[error("work location is required")]
    MissingLocation,
    #[error("hourly billing requires a start and end time")]
    MissingTimeRange,
    #[error("time range {start_hour:02}:00-{end_hour:02}:00 is not within a single day")]
    InvalidTimeRange { start_hour: u8, end_hour: u8 },
    #[error("end time {end_hour:02}:00 must be after start time {start_hour:02}:00")]
    InvertedTimeRange { start_hour: u8, end_hour: u8 },
    #[error("start date {start} is after end date {end}")]
    InvertedDateRange { start: NaiveDate, end: NaiveDate },
    #[error("worker is not available on {0}")]
    DateUnavailable(NaiveDate),
    #[error("no amount could be quoted for the selection")]
    UnresolvableAmount,
    #[error("a group booking needs at least one worker")]
    EmptyGroup,
    #[error("hours per day must be between 1 and 24 (found {0})")]
    InvalidDailyHours(u8),
    #[error("only completed bookings can be reviewed (booking is {0})")]
    BookingNotCompleted(BookingStatus),
    #[error("rating must be between 1 and 5 (found {0})")]
    RatingOutOfRange(u8),
    #[error("comment must be at least {min} characters (found {found})")]
    CommentTooShort { min: usize, found: usize },
    #[error("comment must be at most {max} characters (found {found})")]
    CommentTooLong { max: usize, found: usize },
}
