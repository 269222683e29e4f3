use crate::cli::ServeArgs;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::routes::{with_application_routes, AppState};
use crate::telemetry;
use crate::workflows::application::{ApplicationIntakeService, ConfiguredSink, FormSessions};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

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
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let sink = ConfiguredSink::from_config(&config.submission)?;
    info!(sink = sink.kind(), "submission sink configured");
    let sessions = FormSessions::from_config(&config.sessions);
    let intake_service = Arc::new(ApplicationIntakeService::with_sessions(
        Arc::new(sink),
        sessions,
    ));
    spawn_session_sweeper(intake_service.clone());

    let app = with_application_routes(intake_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "closer application intake ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn spawn_session_sweeper(service: Arc<ApplicationIntakeService<ConfiguredSink>>) {
    let period = service.sessions().idle_timeout();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            if let Err(err) = service.sessions().retire_idle() {
                warn!(%err, "idle session sweep failed");
            }
        }
    });
}
