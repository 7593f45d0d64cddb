use crate::cli::ServeArgs;
use crate::infra::{build_session, load_list, AppState};
use crate::routes::with_preference_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use preference_sync::config::AppConfig;
use preference_sync::error::AppError;
use preference_sync::telemetry;
use preference_sync::workflows::preferences::TracingSink;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
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

    let list = load_list(
        args.initial_csv.as_deref(),
        config.preferences.min_count(),
    )?;
    info!(
        seeded = list.len(),
        reserved_slots = list.empty_slots().len(),
        "preference session initialised"
    );
    let session = build_session(list, &config.preferences, TracingSink);
    let session = Arc::new(Mutex::new(session));

    let app = with_preference_routes(session)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "preference sync service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
