use crate::cli::ServeArgs;
use crate::infra::{load_workers, AppState, InMemoryMarketplaceRepository, LoggingNotificationSink};
use crate::routes::with_marketplace_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Local;
use farmhand::config::AppConfig;
use farmhand::error::AppError;
use farmhand::marketplace::MarketplaceService;
use farmhand::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let workers = load_workers(args.roster.as_deref(), Local::now().date_naive())?;
    let worker_count = workers.len();
    let repository = Arc::new(InMemoryMarketplaceRepository::with_workers(workers));
    let notifications = Arc::new(LoggingNotificationSink::default());
    let service = Arc::new(MarketplaceService::new(
        repository,
        notifications,
        config.marketplace.clone(),
    ));

    let app = with_marketplace_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, workers = worker_count, "farmhand marketplace ready");

    axum::serve(listener, app).await?;
    Ok(())
}
