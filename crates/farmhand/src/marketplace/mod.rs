//! Farm labor marketplace: worker discovery, booking requests, reviews, and payment
//! handoff.
//!
//! The pure engine (availability, pricing, search, booking, reviews, payment) never
//! touches storage; [`MarketplaceService`] composes it with the repository and
//! notification seams, and [`marketplace_router`] exposes the service over HTTP.

pub mod availability;
pub mod booking;
pub mod domain;
pub mod error;
pub mod payment;
pub mod pricing;
pub mod repository;
pub mod reviews;
pub mod roster;
pub mod router;
pub mod search;
pub mod service;

#[cfg(test)]
mod tests;

pub use availability::{list_available_dates, AvailabilityCalendar};
pub use booking::{
    create_booking, create_group_booking, next_status, permitted_events, transition,
    transition_expecting, BookingDraft, GroupBookingTerms, GroupSelection, GroupSummary,
};
pub use domain::{
    ActorRole, BillingMode, BookingEvent, BookingId, BookingRequest, BookingStatus, FarmerId,
    FarmerRef, GroupId, GroupMembership, HourRange, RateCard, ReviewId, Worker, WorkerId,
};
pub use error::{InputViolation, MarketplaceError};
pub use payment::{
    build_payment_intent, intent_for_booking, payment_address, PaymentIntent, PaymentMethod,
};
pub use repository::{
    BookingFilter, MarketplaceNotification, MarketplaceRepository, NotificationError,
    NotificationKind, NotificationSink, Recipient, RepositoryError,
};
pub use reviews::{
    rating_label, submit_response, submit_review, FiledReview, RatingSummary, Review,
    ReviewFeed, ReviewGate, ReviewResponse,
};
pub use roster::{RosterError, WorkerRoster};
pub use router::marketplace_router;
pub use search::{search, PriceRange, SearchCriteria, SearchDefaults, SortKey, SortOrder};
pub use service::{MarketplaceService, MarketplaceServiceError, QuoteRequest};
