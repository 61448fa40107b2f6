use crate::cli::ServeArgs;
use crate::infra::{
    sample_requests, sample_residents, AppState, InMemoryLotteryStore, InMemoryRequestSource,
    InMemoryResidentDirectory, LogNotifier,
};
use crate::routes::with_lottery_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::{Datelike, Local};
use park_net::config::AppConfig;
use park_net::error::AppError;
use park_net::lottery::{LotteryService, Period};
use park_net::telemetry;
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

    let requests = Arc::new(InMemoryRequestSource::default());
    let residents = Arc::new(InMemoryResidentDirectory::default());
    let lotteries = Arc::new(InMemoryLotteryStore::default());
    let notifier = Arc::new(LogNotifier::new(config.notifier.from_address.clone()));

    if args.sample_data {
        let today = Local::now().date_naive();
        let period = Period::new(today.year(), today.month())
            .expect("current calendar month is a valid period");
        for resident in sample_residents() {
            residents.upsert(resident);
        }
        for request in sample_requests(period) {
            requests.push(request);
        }
        info!(%period, "sample residents and requests loaded");
    }

    let lottery_service = Arc::new(LotteryService::new(requests, residents, lotteries, notifier));

    let app = with_lottery_routes(lottery_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "parking lottery service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
