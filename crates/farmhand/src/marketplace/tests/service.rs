use std::sync::Arc;

use super::common::*;
use crate::config::MarketplaceConfig;
use crate::marketplace::domain::{
    ActorRole, BookingEvent, BookingStatus, HourRange, WorkerId,
};
use crate::marketplace::error::{InputViolation, MarketplaceError};
use crate::marketplace::repository::{
    BookingFilter, MarketplaceRepository, NotificationKind, Recipient, RepositoryError,
};
use crate::marketplace::search::SearchCriteria;
use crate::marketplace::{
    BillingMode, MarketplaceService, MarketplaceServiceError, PaymentMethod, QuoteRequest,
};

#[test]
fn booking_is_stored_and_worker_notified() {
    let (service, repository, notifications) = build_service();

    let booking = service
        .book(&ravi().id, daily_draft(vec![day(1), day(2)]), now())
        .expect("booking accepted");

    let stored = repository
        .booking(&booking.id)
        .expect("fetch succeeds")
        .expect("booking stored");
    assert_eq!(stored, booking);
    assert_eq!(stored.total_amount, 1200);

    let events = notifications.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, NotificationKind::Booking);
    assert_eq!(events[0].recipient, Recipient::Worker(ravi().id));
    assert_eq!(events[0].booking_id.as_ref(), Some(&booking.id));
}

#[test]
fn booking_an_unlisted_date_is_rejected() {
    let (service, repository, notifications) = build_service();

    match service.book(&ravi().id, daily_draft(vec![day(1), day(4)]), now()) {
        Err(MarketplaceServiceError::Marketplace(MarketplaceError::InvalidInput(
            InputViolation::DateUnavailable(date),
        ))) => assert_eq!(date, day(4)),
        other => panic!("expected unavailable date, got {other:?}"),
    }
    assert_eq!(repository.booking_count(), 0);
    assert!(notifications.events().is_empty());
}

#[test]
fn booking_an_unknown_worker_is_not_found() {
    let (service, _, _) = build_service();

    assert!(matches!(
        service.book(
            &WorkerId("w-nobody".to_string()),
            daily_draft(vec![day(1)]),
            now()
        ),
        Err(MarketplaceServiceError::WorkerNotFound(_))
    ));
}

#[test]
fn full_lifecycle_from_request_to_answered_review() {
    let (service, repository, notifications) = build_service();
    let booking = service
        .book(&suresh().id, daily_draft(vec![day(1)]), now())
        .expect("booking accepted");

    let confirmed = service
        .transition(
            &booking.id,
            BookingStatus::Pending,
            BookingEvent::Accept,
            ActorRole::Worker,
            now(),
        )
        .expect("worker accepts");
    assert_eq!(confirmed.status, BookingStatus::Confirmed);

    let completed = service
        .transition(
            &booking.id,
            BookingStatus::Confirmed,
            BookingEvent::Complete,
            ActorRole::Farmer,
            now(),
        )
        .expect("farmer completes");
    assert_eq!(completed.status, BookingStatus::Completed);

    let review = service
        .review_booking(&booking.id, 5, "Sprayed the whole field carefully.", now())
        .expect("review filed");
    assert!(
        service
            .booking(&booking.id)
            .expect("booking present")
            .has_review
    );

    match service.review_booking(&booking.id, 1, "Trying to review twice.", now()) {
        Err(MarketplaceServiceError::Marketplace(MarketplaceError::DuplicateReview(id))) => {
            assert_eq!(id, booking.id)
        }
        other => panic!("expected duplicate review, got {other:?}"),
    }

    let answered = service
        .respond_to_review(&review.id, "Thank you for the kind words!", now())
        .expect("response recorded");
    assert!(answered.response.is_some());
    assert!(matches!(
        service.respond_to_review(&review.id, "A second response attempt.", now()),
        Err(MarketplaceServiceError::Marketplace(
            MarketplaceError::DuplicateResponse(_)
        ))
    ));

    let stored = repository
        .review(&review.id)
        .expect("fetch succeeds")
        .expect("review stored");
    assert_eq!(stored, answered);
    assert_eq!(
        service.worker_reviews(&suresh().id).expect("reviews"),
        vec![answered]
    );

    let kinds: Vec<_> = notifications.events().iter().map(|n| n.kind).collect();
    assert_eq!(
        kinds,
        vec![
            NotificationKind::Booking,
            NotificationKind::Booking,
            NotificationKind::Booking,
            NotificationKind::Review,
            NotificationKind::Message,
        ]
    );
}

#[test]
fn transition_with_stale_expectation_reports_current_status() {
    let (service, repository, _) = build_service();
    let booking = service
        .book(&ravi().id, daily_draft(vec![day(1)]), now())
        .expect("booking accepted");
    repository.force_status(&booking.id, BookingStatus::Cancelled);

    match service.transition(
        &booking.id,
        BookingStatus::Pending,
        BookingEvent::Accept,
        ActorRole::Worker,
        now(),
    ) {
        Err(MarketplaceServiceError::Marketplace(MarketplaceError::StaleState {
            actual, ..
        })) => assert_eq!(actual, BookingStatus::Cancelled),
        other => panic!("expected stale state, got {other:?}"),
    }
}

fn racing_service(
    interleaving: Interleaving,
) -> (MarketplaceService<RacingRepository, MemoryNotifications>, Arc<RacingRepository>) {
    let repository = Arc::new(RacingRepository::new(
        MemoryRepository::with_workers(pool()),
        interleaving,
    ));
    let service = MarketplaceService::new(
        repository.clone(),
        Arc::new(MemoryNotifications::default()),
        MarketplaceConfig::default(),
    );
    (service, repository)
}

#[test]
fn losing_the_save_race_reports_stale_state() {
    let (service, repository) =
        racing_service(Interleaving::MovesStatusTo(BookingStatus::Cancelled));
    let booking = service
        .book(&ravi().id, daily_draft(vec![day(1)]), now())
        .expect("booking accepted");

    match service.transition(
        &booking.id,
        BookingStatus::Pending,
        BookingEvent::Accept,
        ActorRole::Worker,
        now(),
    ) {
        Err(MarketplaceServiceError::Marketplace(MarketplaceError::StaleState {
            booking_id,
            expected,
            actual,
        })) => {
            assert_eq!(booking_id, booking.id);
            assert_eq!(expected, BookingStatus::Pending);
            assert_eq!(actual, BookingStatus::Cancelled);
        }
        other => panic!("expected stale state, got {other:?}"),
    }
    let stored = repository
        .booking(&booking.id)
        .expect("fetch succeeds")
        .expect("present");
    assert_eq!(stored.status, BookingStatus::Cancelled, "competing write kept");
}

#[test]
fn losing_the_review_race_reports_duplicate_review() {
    let (service, repository) = racing_service(Interleaving::FilesReviewFirst);
    let booking = service
        .book(&ravi().id, daily_draft(vec![day(1)]), now())
        .expect("booking accepted");
    repository
        .inner
        .force_status(&booking.id, BookingStatus::Completed);

    match service.review_booking(&booking.id, 5, "Great work on the farm.", now()) {
        Err(MarketplaceServiceError::Marketplace(MarketplaceError::DuplicateReview(id))) => {
            assert_eq!(id, booking.id)
        }
        other => panic!("expected duplicate review, got {other:?}"),
    }
    assert!(repository
        .reviews_for_worker(&ravi().id)
        .expect("fetch succeeds")
        .is_empty());
}

#[test]
fn illegal_transitions_leave_storage_untouched() {
    let (service, repository, _) = build_service();
    let booking = service
        .book(&ravi().id, daily_draft(vec![day(1)]), now())
        .expect("booking accepted");

    assert!(matches!(
        service.transition(
            &booking.id,
            BookingStatus::Pending,
            BookingEvent::Complete,
            ActorRole::Farmer,
            now(),
        ),
        Err(MarketplaceServiceError::Marketplace(
            MarketplaceError::IllegalTransition { .. }
        ))
    ));
    let stored = repository
        .booking(&booking.id)
        .expect("fetch succeeds")
        .expect("present");
    assert_eq!(stored.status, BookingStatus::Pending);
}

#[test]
fn reviews_require_a_completed_booking() {
    let (service, _, _) = build_service();
    let booking = service
        .book(&ravi().id, daily_draft(vec![day(1)]), now())
        .expect("booking accepted");

    assert!(matches!(
        service.review_booking(&booking.id, 5, "Great work on the farm.", now()),
        Err(MarketplaceServiceError::Marketplace(MarketplaceError::InvalidInput(
            InputViolation::BookingNotCompleted(BookingStatus::Pending)
        )))
    ));
}

#[test]
fn overlong_comments_are_capped_by_configuration() {
    let repository = Arc::new(MemoryRepository::with_workers(pool()));
    let config = MarketplaceConfig {
        review_max_comment_chars: 20,
        ..MarketplaceConfig::default()
    };
    let service = MarketplaceService::new(
        repository,
        Arc::new(MemoryNotifications::default()),
        config,
    );
    let booking = service
        .book(&ravi().id, daily_draft(vec![day(1)]), now())
        .expect("booking accepted");

    assert!(matches!(
        service.review_booking(
            &booking.id,
            5,
            "This comment is far longer than twenty characters.",
            now()
        ),
        Err(MarketplaceServiceError::Marketplace(MarketplaceError::InvalidInput(
            InputViolation::CommentTooLong { max: 20, .. }
        )))
    ));
}

#[test]
fn group_booking_stores_every_member_and_notifies_each() {
    let (service, repository, notifications) = build_service();
    let members = [ravi().id, suresh().id, lakshmi().id];

    let bookings = service
        .book_group(&members, &group_terms(), now())
        .expect("group accepted");

    assert_eq!(bookings.len(), 3);
    assert_eq!(repository.booking_count(), 3);
    assert_eq!(notifications.events().len(), 3);
    let per_farmer = service
        .bookings(&BookingFilter::for_farmer(farmer().id).with_status(BookingStatus::Pending))
        .expect("listing");
    assert_eq!(per_farmer.len(), 3);
}

#[test]
fn group_booking_with_unknown_member_stores_nothing() {
    let (service, repository, _) = build_service();
    let members = [ravi().id, WorkerId("w-ghost".to_string())];

    assert!(matches!(
        service.book_group(&members, &group_terms(), now()),
        Err(MarketplaceServiceError::WorkerNotFound(_))
    ));
    assert_eq!(repository.booking_count(), 0);
}

#[test]
fn notification_failures_do_not_fail_the_booking() {
    let repository = Arc::new(MemoryRepository::with_workers(pool()));
    let service = MarketplaceService::new(
        repository.clone(),
        Arc::new(FailingNotifications),
        MarketplaceConfig::default(),
    );

    service
        .book(&ravi().id, daily_draft(vec![day(1)]), now())
        .expect("booking survives notification failure");
    assert_eq!(repository.booking_count(), 1);
}

#[test]
fn repository_outages_surface_as_repository_errors() {
    let service = MarketplaceService::new(
        Arc::new(UnavailableRepository),
        Arc::new(MemoryNotifications::default()),
        MarketplaceConfig::default(),
    );

    assert!(matches!(
        service.search(&SearchCriteria::default()),
        Err(MarketplaceServiceError::Repository(
            RepositoryError::Unavailable(_)
        ))
    ));
}

#[test]
fn quotes_and_available_dates_come_from_the_stored_worker() {
    let (service, _, _) = build_service();

    let amount = service
        .quote(
            &ravi().id,
            QuoteRequest {
                day_count: 2,
                billing_mode: BillingMode::Hourly,
                time_range: Some(HourRange::new(8, 16)),
            },
        )
        .expect("quote");
    assert_eq!(amount, 1200);

    assert_eq!(
        service
            .available_dates(&lakshmi().id, today())
            .expect("dates"),
        vec![day(2), day(3)]
    );
}

#[test]
fn payment_intent_follows_the_booking_method() {
    let (service, _, _) = build_service();
    let upi = service
        .book(&ravi().id, daily_draft(vec![day(1)]), now())
        .expect("booking accepted");
    let mut cash_draft = daily_draft(vec![day(2)]);
    cash_draft.payment_method = PaymentMethod::Cash;
    let cash = service
        .book(&ravi().id, cash_draft, now())
        .expect("booking accepted");

    let intent = service
        .payment_intent(&upi.id)
        .expect("booking present")
        .expect("upi intent");
    assert_eq!(intent.payee_address, "+919876543210@upi");
    assert_eq!(intent.amount, 600);
    assert!(service
        .payment_intent(&cash.id)
        .expect("booking present")
        .is_none());
}

#[test]
fn default_criteria_follow_configuration() {
    let (service, _, _) = build_service();
    let criteria = service.default_criteria();

    assert_eq!(
        criteria.price_range.max,
        service.config().search.price_ceiling
    );
    assert!(!criteria.is_filtered(&service.config().search));
}
