use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::{gateway_routes, service_routes, with_operational_routes};
use axum::http::{header, HeaderName, HeaderValue};
use axum::{Extension, Router};
use axum_prometheus::PrometheusMetricLayer;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use valora::config::AppConfig;
use valora::error::AppError;
use valora::telemetry;

const SECURITY_HEADERS: [(HeaderName, &str); 5] = [
    (
        header::STRICT_TRANSPORT_SECURITY,
        "max-age=63072000; includeSubDomains; preload",
    ),
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "DENY"),
    (
        header::CONTENT_SECURITY_POLICY,
        "default-src 'self'; object-src 'none'; frame-ancestors 'none'; base-uri 'none'",
    ),
    (header::REFERRER_POLICY, "no-referrer"),
];

pub(crate) async fn run(args: ServeArgs) -> Result<(), AppError> {
    let config = load_config(args)?;
    let routes = service_routes(&config)?;
    serve(config, routes, "valuation services").await
}

pub(crate) async fn run_gateway(args: ServeArgs) -> Result<(), AppError> {
    let config = load_config(args)?;
    let routes = gateway_routes(&config)?;
    info!(upstream = %config.gateway.orchestrator_url, "gateway forwarding to orchestrator");
    serve(config, routes, "valuation gateway").await
}

fn load_config(mut args: ServeArgs) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;
    Ok(config)
}

async fn serve(config: AppConfig, routes: Router, name: &'static str) -> Result<(), AppError> {
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let app_state = AppState::new(prometheus_handle);

    let app = with_security_headers(
        with_operational_routes(routes)
            .layer(Extension(app_state.clone()))
            .layer(prometheus_layer),
    );

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    app_state.mark_ready();

    info!(?config.environment, %addr, service = name, "listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

/// Security headers unless a handler already set them, permissive CORS and request tracing.
pub(crate) fn with_security_headers(router: Router) -> Router {
    let router = SECURITY_HEADERS
        .into_iter()
        .fold(router, |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::if_not_present(
                name,
                HeaderValue::from_static(value),
            ))
        });

    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
