use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::booking::{BookingDraft, GroupBookingTerms, GroupSelection};
use super::domain::{
    ActorRole, BookingEvent, BookingId, BookingStatus, FarmerId, ReviewId, WorkerId,
};
use super::error::MarketplaceError;
use super::payment::PaymentIntent;
use super::repository::{
    BookingFilter, MarketplaceRepository, NotificationSink, RepositoryError,
};
use super::reviews::ReviewFeed;
use super::search::SearchCriteria;
use super::service::{MarketplaceService, MarketplaceServiceError, QuoteRequest};

type SharedService<R, N> = Arc<MarketplaceService<R, N>>;

/// Router builder exposing the booking engine over HTTP.
pub fn marketplace_router<R, N>(service: SharedService<R, N>) -> Router
where
    R: MarketplaceRepository + 'static,
    N: NotificationSink + 'static,
{
    Router::new()
        .route("/api/v1/workers/search", post(search_handler::<R, N>))
        .route(
            "/api/v1/workers/:worker_id/availability",
            get(availability_handler::<R, N>),
        )
        .route(
            "/api/v1/workers/:worker_id/quote",
            post(quote_handler::<R, N>),
        )
        .route(
            "/api/v1/workers/:worker_id/reviews",
            get(worker_reviews_handler::<R, N>),
        )
        .route(
            "/api/v1/workers/:worker_id/bookings",
            get(worker_bookings_handler::<R, N>),
        )
        .route(
            "/api/v1/farmers/:farmer_id/bookings",
            get(farmer_bookings_handler::<R, N>),
        )
        .route("/api/v1/bookings", post(create_booking_handler::<R, N>))
        .route(
            "/api/v1/bookings/:booking_id",
            get(booking_handler::<R, N>),
        )
        .route(
            "/api/v1/bookings/:booking_id/transitions",
            post(transition_handler::<R, N>),
        )
        .route(
            "/api/v1/bookings/:booking_id/review",
            post(review_handler::<R, N>),
        )
        .route(
            "/api/v1/bookings/:booking_id/payment-intent",
            get(payment_intent_handler::<R, N>),
        )
        .route(
            "/api/v1/group-bookings",
            post(group_booking_handler::<R, N>),
        )
        .route(
            "/api/v1/reviews/:review_id/response",
            post(response_handler::<R, N>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateBookingRequest {
    pub(crate) worker_id: WorkerId,
    #[serde(flatten)]
    pub(crate) draft: BookingDraft,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransitionRequest {
    pub(crate) expected: BookingStatus,
    pub(crate) event: BookingEvent,
    pub(crate) actor: ActorRole,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GroupBookingRequest {
    pub(crate) worker_ids: Vec<WorkerId>,
    #[serde(flatten)]
    pub(crate) terms: GroupBookingTerms,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewRequest {
    pub(crate) rating: u8,
    pub(crate) comment: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseRequest {
    pub(crate) comment: String,
}

/// `?status=` narrowing for the booking list routes.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct BookingListQuery {
    #[serde(default)]
    pub(crate) status: Option<BookingStatus>,
}

impl BookingListQuery {
    fn narrow(self, filter: BookingFilter) -> BookingFilter {
        match self.status {
            Some(status) => filter.with_status(status),
            None => filter,
        }
    }
}

pub(crate) async fn search_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    axum::Json(criteria): axum::Json<SearchCriteria>,
) -> Response
where
    R: MarketplaceRepository + 'static,
    N: NotificationSink + 'static,
{
    match service.search(&criteria) {
        Ok(workers) => {
            let payload = json!({
                "count": workers.len(),
                "workers": workers,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn availability_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(worker_id): Path<String>,
) -> Response
where
    R: MarketplaceRepository + 'static,
    N: NotificationSink + 'static,
{
    let worker_id = WorkerId(worker_id);
    let today = Utc::now().date_naive();
    match service.available_dates(&worker_id, today) {
        Ok(dates) => {
            let payload = json!({
                "worker_id": worker_id,
                "dates": dates,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn quote_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(worker_id): Path<String>,
    axum::Json(request): axum::Json<QuoteRequest>,
) -> Response
where
    R: MarketplaceRepository + 'static,
    N: NotificationSink + 'static,
{
    let worker_id = WorkerId(worker_id);
    match service.quote(&worker_id, request) {
        Ok(amount) => {
            let payload = json!({
                "worker_id": worker_id,
                "billing_mode": request.billing_mode,
                "amount": amount,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn worker_reviews_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(worker_id): Path<String>,
) -> Response
where
    R: MarketplaceRepository + 'static,
    N: NotificationSink + 'static,
{
    let worker_id = WorkerId(worker_id);
    let reviews = match service
        .worker(&worker_id)
        .and_then(|_| service.worker_reviews(&worker_id))
    {
        Ok(reviews) => reviews,
        Err(err) => return error_response(err),
    };

    let feed = ReviewFeed::new(&reviews);
    let payload = json!({
        "worker_id": worker_id,
        "summary": feed.summary(),
        "recent": feed.recent(Utc::now()),
        "reviews": reviews,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn worker_bookings_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(worker_id): Path<String>,
    Query(query): Query<BookingListQuery>,
) -> Response
where
    R: MarketplaceRepository + 'static,
    N: NotificationSink + 'static,
{
    let worker_id = WorkerId(worker_id);
    if let Err(err) = service.worker(&worker_id) {
        return error_response(err);
    }
    let filter = query.narrow(BookingFilter::for_worker(worker_id));
    bookings_response(&service, &filter)
}

pub(crate) async fn farmer_bookings_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(farmer_id): Path<String>,
    Query(query): Query<BookingListQuery>,
) -> Response
where
    R: MarketplaceRepository + 'static,
    N: NotificationSink + 'static,
{
    let filter = query.narrow(BookingFilter::for_farmer(FarmerId(farmer_id)));
    bookings_response(&service, &filter)
}

fn bookings_response<R, N>(service: &MarketplaceService<R, N>, filter: &BookingFilter) -> Response
where
    R: MarketplaceRepository + 'static,
    N: NotificationSink + 'static,
{
    match service.bookings(filter) {
        Ok(bookings) => {
            let payload = json!({
                "count": bookings.len(),
                "bookings": bookings,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn create_booking_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    axum::Json(request): axum::Json<CreateBookingRequest>,
) -> Response
where
    R: MarketplaceRepository + 'static,
    N: NotificationSink + 'static,
{
    match service.book(&request.worker_id, request.draft, Utc::now()) {
        Ok(booking) => (StatusCode::CREATED, axum::Json(booking)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn booking_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(booking_id): Path<String>,
) -> Response
where
    R: MarketplaceRepository + 'static,
    N: NotificationSink + 'static,
{
    match service.booking(&BookingId(booking_id)) {
        Ok(booking) => (StatusCode::OK, axum::Json(booking)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn transition_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(booking_id): Path<String>,
    axum::Json(request): axum::Json<TransitionRequest>,
) -> Response
where
    R: MarketplaceRepository + 'static,
    N: NotificationSink + 'static,
{
    let TransitionRequest {
        expected,
        event,
        actor,
    } = request;
    match service.transition(&BookingId(booking_id), expected, event, actor, Utc::now()) {
        Ok(booking) => (StatusCode::OK, axum::Json(booking)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn group_booking_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    axum::Json(request): axum::Json<GroupBookingRequest>,
) -> Response
where
    R: MarketplaceRepository + 'static,
    N: NotificationSink + 'static,
{
    match service.book_group(&request.worker_ids, &request.terms, Utc::now()) {
        Ok(bookings) => {
            let members = bookings
                .iter()
                .map(|booking| service.worker(&booking.worker_id))
                .collect::<Result<Vec<_>, _>>();
            let summary = match members {
                Ok(workers) => GroupSelection::from_workers(workers).summary(),
                Err(err) => return error_response(err),
            };
            let payload = json!({
                "summary": summary,
                "bookings": bookings,
            });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn review_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(booking_id): Path<String>,
    axum::Json(request): axum::Json<ReviewRequest>,
) -> Response
where
    R: MarketplaceRepository + 'static,
    N: NotificationSink + 'static,
{
    match service.review_booking(
        &BookingId(booking_id),
        request.rating,
        &request.comment,
        Utc::now(),
    ) {
        Ok(review) => (StatusCode::CREATED, axum::Json(review)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn response_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(review_id): Path<String>,
    axum::Json(request): axum::Json<ResponseRequest>,
) -> Response
where
    R: MarketplaceRepository + 'static,
    N: NotificationSink + 'static,
{
    match service.respond_to_review(&ReviewId(review_id), &request.comment, Utc::now()) {
        Ok(review) => (StatusCode::OK, axum::Json(review)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn payment_intent_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(booking_id): Path<String>,
) -> Response
where
    R: MarketplaceRepository + 'static,
    N: NotificationSink + 'static,
{
    let booking_id = BookingId(booking_id);
    match service.payment_intent(&booking_id) {
        Ok(intent) => {
            let uri = intent.as_ref().map(PaymentIntent::to_uri);
            let payload = json!({
                "booking_id": booking_id,
                "intent": intent,
                "uri": uri,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) fn error_status(err: &MarketplaceServiceError) -> StatusCode {
    match err {
        MarketplaceServiceError::Marketplace(MarketplaceError::InvalidInput(_)) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        MarketplaceServiceError::Marketplace(
            MarketplaceError::IllegalTransition { .. }
            | MarketplaceError::DuplicateReview(_)
            | MarketplaceError::DuplicateResponse(_)
            | MarketplaceError::StaleState { .. },
        ) => StatusCode::CONFLICT,
        MarketplaceServiceError::WorkerNotFound(_)
        | MarketplaceServiceError::BookingNotFound(_)
        | MarketplaceServiceError::ReviewNotFound(_)
        | MarketplaceServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        MarketplaceServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        MarketplaceServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: MarketplaceServiceError) -> Response {
    let status = error_status(&err);
    let payload = match &err {
        MarketplaceServiceError::Marketplace(MarketplaceError::StaleState { actual, .. }) => {
            json!({
                "error": err.to_string(),
                "current_status": actual,
            })
        }
        _ => json!({ "error": err.to_string() }),
    };
    (status, axum::Json(payload)).into_response()
}
