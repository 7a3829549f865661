use super::super::domain::{ActorRole, BookingEvent, BookingRequest, BookingStatus};
use super::super::error::MarketplaceError;

/// Transition table. `None` means the event is not valid for this status and actor.
///
/// Only a pending booking can be cancelled; who may complete a confirmed booking is
/// left to the caller's authorization layer, so both roles are accepted here.
pub fn next_status(
    from: BookingStatus,
    event: BookingEvent,
    actor: ActorRole,
) -> Option<BookingStatus> {
    match (from, event, actor) {
        (BookingStatus::Pending, BookingEvent::Accept, ActorRole::Worker) => {
            Some(BookingStatus::Confirmed)
        }
        (BookingStatus::Pending, BookingEvent::Decline, ActorRole::Worker) => {
            Some(BookingStatus::Cancelled)
        }
        (BookingStatus::Confirmed, BookingEvent::Complete, _) => Some(BookingStatus::Completed),
        _ => None,
    }
}

/// Events an actor may currently raise, in display order.
pub fn permitted_events(status: BookingStatus, actor: ActorRole) -> Vec<BookingEvent> {
    [
        BookingEvent::Accept,
        BookingEvent::Decline,
        BookingEvent::Complete,
    ]
    .into_iter()
    .filter(|event| next_status(status, *event, actor).is_some())
    .collect()
}

/// Apply an event, returning the updated booking. The input is never modified.
pub fn transition(
    booking: &BookingRequest,
    event: BookingEvent,
    actor: ActorRole,
) -> Result<BookingRequest, MarketplaceError> {
    let to = next_status(booking.status, event, actor).ok_or(
        MarketplaceError::IllegalTransition {
            from: booking.status,
            event,
            actor,
        },
    )?;

    let mut updated = booking.clone();
    updated.status = to;
    Ok(updated)
}

/// Compare-and-swap form: fails with `StaleState` when the caller's view of the
/// status no longer matches the booking it is applied to.
pub fn transition_expecting(
    booking: &BookingRequest,
    expected: BookingStatus,
    event: BookingEvent,
    actor: ActorRole,
) -> Result<BookingRequest, MarketplaceError> {
    if booking.status != expected {
        return Err(MarketplaceError::StaleState {
            booking_id: booking.id.clone(),
            expected,
            actual: booking.status,
        });
    }
    transition(booking, event, actor)
}
