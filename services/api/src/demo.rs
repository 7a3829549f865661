use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::SearchArgs;
use crate::infra::{load_workers, InMemoryMarketplaceRepository, LoggingNotificationSink};
use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use clap::Args;
use farmhand::config::AppConfig;
use farmhand::error::AppError;
use farmhand::marketplace::{
    rating_label, search, ActorRole, BillingMode, BookingDraft, BookingEvent, BookingStatus,
    FarmerId, FarmerRef, GroupBookingTerms, GroupSelection, MarketplaceService, PaymentMethod,
    PriceRange, SearchCriteria, SortOrder, Worker,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Worker roster CSV (defaults to the seed roster)
    #[arg(long)]
    pub(crate) roster: Option<PathBuf>,
    /// Reference date for availability (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Skip the group booking portion of the demo
    #[arg(long)]
    pub(crate) skip_group: bool,
}

pub(crate) fn run_search(args: SearchArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let workers = load_workers(args.roster.as_deref(), today)?;
    let criteria = criteria_from_args(&args);

    let results = search(&workers, &criteria);
    println!(
        "{} of {} workers match (sorted by {:?}, {:?})",
        results.len(),
        workers.len(),
        criteria.sort_by,
        criteria.sort_order
    );
    for worker in &results {
        print_worker(worker, today);
    }
    Ok(())
}

fn criteria_from_args(args: &SearchArgs) -> SearchCriteria {
    let defaults = SearchCriteria::default();
    SearchCriteria {
        query: args.query.clone(),
        required_skills: args.skills.iter().cloned().collect::<BTreeSet<_>>(),
        min_rating: args.min_rating.unwrap_or(defaults.min_rating),
        price_range: args
            .max_price
            .map_or(defaults.price_range, |max_price| PriceRange::new(0, max_price)),
        max_distance_km: args.max_distance.unwrap_or(defaults.max_distance_km),
        available_only: args.available_only,
        sort_by: args.sort_by.into(),
        sort_order: if args.asc {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        },
    }
}

fn print_worker(worker: &Worker, today: NaiveDate) {
    let distance = worker
        .distance_km
        .map(|km| format!("{km:.0} km"))
        .unwrap_or_else(|| "distance unknown".to_string());
    let next_open = worker
        .calendar()
        .bookable_dates(today)
        .first()
        .map(|date| date.to_string())
        .unwrap_or_else(|| "no open dates".to_string());
    println!(
        "- {} ({}) | Rs {}/day, Rs {}/hr | {:.1} stars | {} yrs | {} | next open {}",
        worker.name,
        worker.location,
        worker.daily_rate,
        worker.hourly_rate,
        worker.rating,
        worker.experience_years,
        distance,
        next_open
    );
}

fn demo_instant(today: NaiveDate) -> DateTime<Utc> {
    today
        .and_hms_opt(9, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or_else(Utc::now)
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        roster,
        today,
        skip_group,
    } = args;

    let config = AppConfig::load()?;
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let now = demo_instant(today);
    let workers = load_workers(roster.as_deref(), today)?;

    let repository = Arc::new(InMemoryMarketplaceRepository::with_workers(workers));
    let notifications = Arc::new(LoggingNotificationSink::default());
    let service = MarketplaceService::new(
        repository,
        notifications.clone(),
        config.marketplace.clone(),
    );
    let farmer = FarmerRef {
        id: FarmerId("f-demo".to_string()),
        name: "Anand Rao".to_string(),
    };

    println!("Farm labor marketplace demo ({today})");
    let mut criteria = service.default_criteria();
    criteria.query = "harvest".to_string();
    criteria.available_only = true;
    let matches = service.search(&criteria)?;
    println!("\nHarvesters taking bookings:");
    for worker in &matches {
        print_worker(worker, today);
    }

    let Some((worker, dates)) = matches.iter().find_map(|worker| {
        let open = worker.calendar().bookable_dates(today);
        (open.len() >= 2).then(|| (worker, open[..2].to_vec()))
    }) else {
        println!("\nNo harvester has two open dates; nothing to book.");
        return Ok(());
    };

    println!("\nBooking {} for {} day(s)", worker.name, dates.len());
    let booking = service.book(
        &worker.id,
        BookingDraft {
            farmer: farmer.clone(),
            dates,
            work_types: BTreeSet::from(["Harvesting".to_string()]),
            billing_mode: BillingMode::Daily,
            time_range: None,
            payment_method: PaymentMethod::PhonePe,
            description: "Paddy harvest, two acres".to_string(),
            farmer_location: "Srirangapatna, Mandya".to_string(),
        },
        now,
    )?;
    println!(
        "- {} created: {} to {}, Rs {} ({})",
        booking.id,
        booking.start_date,
        booking.end_date,
        booking.total_amount,
        booking.status
    );

    let confirmed = service.transition(
        &booking.id,
        BookingStatus::Pending,
        BookingEvent::Accept,
        ActorRole::Worker,
        now,
    )?;
    println!("- worker accepted -> {}", confirmed.status);
    let completed = service.transition(
        &booking.id,
        BookingStatus::Confirmed,
        BookingEvent::Complete,
        ActorRole::Farmer,
        now + Duration::days(3),
    )?;
    println!("- farmer marked work done -> {}", completed.status);

    let review = service.review_booking(
        &booking.id,
        5,
        "Finished before the rain and left the field clean.",
        now + Duration::days(3),
    )?;
    println!(
        "- review {}: {} stars ({})",
        review.id,
        review.rating,
        rating_label(review.rating)
    );
    if let Err(err) = service.review_booking(
        &booking.id,
        1,
        "Trying to leave a second review.",
        now + Duration::days(3),
    ) {
        println!("  second review rejected: {err}");
    }
    let answered = service.respond_to_review(
        &review.id,
        "Thank you! Happy to help next season.",
        now + Duration::days(4),
    )?;
    if let Some(response) = &answered.response {
        println!("- {} replied: {}", answered.worker_name, response.comment);
    }

    match service.payment_intent(&booking.id)? {
        Some(intent) => println!(
            "- pay Rs {} to {} via {}",
            intent.amount,
            intent.payee_address,
            intent.to_uri()
        ),
        None => println!("- settle in cash with {}", booking.worker_name),
    }

    if !skip_group {
        run_group_demo(&service, &matches, farmer, today, now)?;
    }

    println!(
        "\n{} notifications dispatched",
        notifications.events().len()
    );
    Ok(())
}

fn run_group_demo(
    service: &MarketplaceService<InMemoryMarketplaceRepository, LoggingNotificationSink>,
    matches: &[Worker],
    farmer: FarmerRef,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let selection = matches
        .iter()
        .take(3)
        .cloned()
        .fold(GroupSelection::new(), GroupSelection::with);
    let summary = selection.summary();
    println!(
        "\nGroup of {} harvesters: Rs {}/day combined, average rating {}",
        summary.member_count,
        summary.total_daily_cost,
        summary
            .average_rating
            .map(|rating| format!("{rating:.1}"))
            .unwrap_or_else(|| "n/a".to_string())
    );
    if selection.is_empty() {
        return Ok(());
    }

    let member_ids: Vec<_> = selection
        .workers()
        .iter()
        .map(|worker| worker.id.clone())
        .collect();
    let bookings = service.book_group(
        &member_ids,
        &GroupBookingTerms {
            farmer,
            work_type: "Harvesting".to_string(),
            start_date: today + Duration::days(7),
            end_date: today + Duration::days(8),
            hours_per_day: 8,
            location: "Srirangapatna, Mandya".to_string(),
            instructions: "Bring sickles and tarpaulins".to_string(),
            payment_method: PaymentMethod::Cash,
        },
        now,
    )?;
    for booking in &bookings {
        println!(
            "- {} for {}: Rs {} ({})",
            booking.id, booking.worker_name, booking.total_amount, booking.status
        );
    }
    Ok(())
}
