use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Duration, NaiveDate};
use farmhand::error::AppError;
use farmhand::marketplace::{
    BookingFilter, BookingId, BookingRequest, BookingStatus, FiledReview, MarketplaceNotification,
    MarketplaceRepository, NotificationError, NotificationSink, RepositoryError, Review, ReviewId,
    Worker, WorkerId, WorkerRoster,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct Tables {
    workers: BTreeMap<WorkerId, Worker>,
    worker_order: Vec<WorkerId>,
    bookings: BTreeMap<BookingId, BookingRequest>,
    reviews: BTreeMap<ReviewId, Review>,
}

/// Process-local storage. Every write happens under one lock, so multi-record
/// writes are all-or-nothing and status swaps are compare-and-swap.
#[derive(Default, Clone)]
pub(crate) struct InMemoryMarketplaceRepository {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryMarketplaceRepository {
    pub(crate) fn with_workers(workers: Vec<Worker>) -> Self {
        let tables = Tables {
            worker_order: workers.iter().map(|worker| worker.id.clone()).collect(),
            workers: workers
                .into_iter()
                .map(|worker| (worker.id.clone(), worker))
                .collect(),
            ..Tables::default()
        };
        Self {
            tables: Arc::new(Mutex::new(tables)),
        }
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository lock poisoned".to_string()))
    }
}

impl MarketplaceRepository for InMemoryMarketplaceRepository {
    fn workers(&self) -> Result<Vec<Worker>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .worker_order
            .iter()
            .filter_map(|id| tables.workers.get(id).cloned())
            .collect())
    }

    fn worker(&self, id: &WorkerId) -> Result<Option<Worker>, RepositoryError> {
        Ok(self.tables()?.workers.get(id).cloned())
    }

    fn insert_bookings(
        &self,
        bookings: Vec<BookingRequest>,
    ) -> Result<Vec<BookingRequest>, RepositoryError> {
        let mut tables = self.tables()?;
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
        Ok(self.tables()?.bookings.get(id).cloned())
    }

    fn bookings(&self, filter: &BookingFilter) -> Result<Vec<BookingRequest>, RepositoryError> {
        Ok(self
            .tables()?
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
        let mut tables = self.tables()?;
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
        let mut tables = self.tables()?;
        match tables.bookings.get(&filed.booking.id) {
            None => return Err(RepositoryError::NotFound),
            Some(stored) if stored.has_review => return Err(RepositoryError::Conflict),
            Some(_) => {}
        }
        tables
            .bookings
            .insert(filed.booking.id.clone(), filed.booking);
        tables.reviews.insert(filed.review.id.clone(), filed.review);
        Ok(())
    }

    fn review(&self, id: &ReviewId) -> Result<Option<Review>, RepositoryError> {
        Ok(self.tables()?.reviews.get(id).cloned())
    }

    fn reviews_for_worker(&self, worker_id: &WorkerId) -> Result<Vec<Review>, RepositoryError> {
        Ok(self
            .tables()?
            .reviews
            .values()
            .filter(|review| &review.worker_id == worker_id)
            .cloned()
            .collect())
    }

    fn save_response(&self, review: Review) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
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

/// Writes notifications to the log and keeps them for the demo transcript.
#[derive(Default, Clone)]
pub(crate) struct LoggingNotificationSink {
    events: Arc<Mutex<Vec<MarketplaceNotification>>>,
}

impl LoggingNotificationSink {
    pub(crate) fn events(&self) -> Vec<MarketplaceNotification> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl NotificationSink for LoggingNotificationSink {
    fn publish(&self, notification: MarketplaceNotification) -> Result<(), NotificationError> {
        info!(
            kind = ?notification.kind,
            recipient = ?notification.recipient,
            title = %notification.title,
            "notification"
        );
        self.events
            .lock()
            .map_err(|_| NotificationError::Transport("notification log poisoned".to_string()))?
            .push(notification);
        Ok(())
    }
}

fn names(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|item| item.to_string()).collect()
}

/// Seed roster used when no CSV roster is supplied. Availability is laid out
/// relative to `today` so the demo always has bookable dates.
pub(crate) fn demo_workers(today: NaiveDate) -> Vec<Worker> {
    let days = |offsets: &[i64]| -> Vec<NaiveDate> {
        offsets
            .iter()
            .map(|offset| today + Duration::days(*offset))
            .collect()
    };

    vec![
        Worker {
            id: WorkerId("w-ravi".to_string()),
            name: "Ravi Kumar".to_string(),
            phone: "+91 98765 43210".to_string(),
            location: "Mandya, Karnataka".to_string(),
            skills: names(&["Ploughing", "Harvesting", "Irrigation"]),
            experience_years: 8,
            daily_rate: 600,
            hourly_rate: 75,
            rating: 4.8,
            total_reviews: 24,
            bio: "Experienced in paddy and sugarcane cultivation.".to_string(),
            availability: days(&[1, 2, 3, 5, 6]),
            is_available: true,
            languages: names(&["Kannada", "Hindi"]),
            distance_km: Some(5.0),
        },
        Worker {
            id: WorkerId("w-suresh".to_string()),
            name: "Suresh Patil".to_string(),
            phone: "+91 87654 32109".to_string(),
            location: "Mysore, Karnataka".to_string(),
            skills: names(&["Harvesting", "Pesticide Spraying", "Weeding"]),
            experience_years: 12,
            daily_rate: 750,
            hourly_rate: 90,
            rating: 4.9,
            total_reviews: 38,
            bio: "Certified in safe pesticide handling.".to_string(),
            availability: days(&[1, 2, 4, 5]),
            is_available: true,
            languages: names(&["Kannada", "Marathi"]),
            distance_km: Some(15.0),
        },
        Worker {
            id: WorkerId("w-lakshmi".to_string()),
            name: "Lakshmi Devi".to_string(),
            phone: "+91 76543 21098".to_string(),
            location: "Hassan, Karnataka".to_string(),
            skills: names(&["Weeding", "Planting", "Harvesting"]),
            experience_years: 6,
            daily_rate: 500,
            hourly_rate: 65,
            rating: 4.7,
            total_reviews: 19,
            bio: "Careful transplanting and vegetable harvests.".to_string(),
            availability: days(&[2, 3, 4]),
            is_available: true,
            languages: names(&["Kannada"]),
            distance_km: Some(25.0),
        },
        Worker {
            id: WorkerId("w-manjunath".to_string()),
            name: "Manjunath Gowda".to_string(),
            phone: "+91 65432 10987".to_string(),
            location: "Tumkur, Karnataka".to_string(),
            skills: names(&["Tractor Driving", "Ploughing", "Irrigation"]),
            experience_years: 15,
            daily_rate: 800,
            hourly_rate: 100,
            rating: 4.6,
            total_reviews: 42,
            bio: "Owns a tractor and drip-irrigation kit.".to_string(),
            availability: Vec::new(),
            is_available: false,
            languages: names(&["Kannada", "Telugu"]),
            distance_km: Some(30.0),
        },
    ]
}

/// Workers from a roster CSV when given, otherwise the seed roster.
pub(crate) fn load_workers(roster: Option<&Path>, today: NaiveDate) -> Result<Vec<Worker>, AppError> {
    match roster {
        Some(path) => {
            let file = File::open(path)?;
            let workers = WorkerRoster::from_reader(file)?;
            info!(path = %path.display(), workers = workers.len(), "roster loaded");
            Ok(workers)
        }
        None => Ok(demo_workers(today)),
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
