use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use psb_portal::config::AppConfig;
use psb_portal::error::AppError;
use psb_portal::http::{api_router, AppState, SessionKeys};
use psb_portal::otp::{LogSmsGateway, OtpPolicy};
use psb_portal::telemetry;
use psb_portal::uploads::UploadService;
use tracing::info;

use crate::cli::ServeArgs;
use crate::infra::{connect_storage, OpsState};
use crate::routes::with_ops_routes;

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
    let ops_state = OpsState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let storage = connect_storage(&config, args.storage.memory).await?;
    let api_state = AppState::new(
        storage,
        Arc::new(LogSmsGateway),
        OtpPolicy::from(config.otp),
        UploadService::local(&config.uploads),
        SessionKeys::from_config(&config.session),
    );

    let app = with_ops_routes(api_router(api_state))
        .layer(Extension(ops_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "recruitment portal ready");

    axum::serve(listener, app).await?;
    Ok(())
}
