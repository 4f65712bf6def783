use crate::cli::ServeArgs;
use crate::infra::{in_memory_dispatcher, spawn_maintenance, throttled_files, AppState};
use crate::routes::with_service_routes;
use autocare::config::AppConfig;
use autocare::error::AppError;
use autocare::security::{
    rate_limit_middleware, request_logging_middleware, security_guard_middleware,
    FixedWindowLimiter, RateLimitConfig,
};
use autocare::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::net::SocketAddr;
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
        files: throttled_files(&config.limits),
    };

    let limiter = Arc::new(FixedWindowLimiter::new(RateLimitConfig::from(&config.limits)));
    let dispatcher = in_memory_dispatcher(&config.notifications);
    let maintenance = spawn_maintenance(
        dispatcher.clone(),
        limiter.clone(),
        app_state.files.clone(),
        config.notifications.maintenance_interval,
    );

    let app = with_service_routes(dispatcher)
        .layer(axum::middleware::from_fn(security_guard_middleware))
        .layer(axum::middleware::from_fn_with_state(
            limiter,
            rate_limit_middleware,
        ))
        .layer(axum::middleware::from_fn(request_logging_middleware))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        rate_limit_max = config.limits.rate_limit_max,
        fs_throttle_max = config.limits.fs_throttle_max,
        "vehicle maintenance api ready"
    );

    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await;
    maintenance.abort();
    served?;
    Ok(())
}
