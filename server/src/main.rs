mod api;
mod auth;
mod config;
mod db;
mod venue_store;

use axum::extract::MatchedPath;
use axum::http::Request;
use axum::middleware;
use axum::routing::get;
use axum::{Json, Router};
use std::env;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Span;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use soundcheck_core::VisionModel;

use crate::config::ServerConfig;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::PgPool,
    pub config: Arc<ServerConfig>,
    pub vision: Option<Arc<dyn VisionModel>>,
}

/// Console logging with env-filter control (RUST_LOG).
fn init_telemetry() {
    let fmt_layer = tracing_subscriber::fmt::layer();
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(api::openapi())
}

#[tokio::main]
async fn main() {
    // Check for --openapi flag to dump spec and exit
    if env::args().any(|arg| arg == "--openapi") {
        let spec = api::openapi().to_pretty_json().unwrap();
        println!("{}", spec);
        return;
    }

    init_telemetry();

    let config = ServerConfig::from_env().expect("Failed to load configuration");

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    db::init_schema(&pool)
        .await
        .expect("Failed to initialize database schema");

    // Optional: without a configured vision model the backfill runs on the
    // ranking heuristic alone.
    let vision: Option<Arc<dyn VisionModel>> =
        soundcheck_core::vision_model_from_env().map(Arc::from);
    match &vision {
        Some(model) => tracing::info!("vision arbitration enabled ({})", model.model_name()),
        None => tracing::info!("vision arbitration disabled"),
    }

    let listen_addr = config.listen_addr.clone();
    let state = AppState {
        pool,
        config: Arc::new(config),
        vision,
    };

    // Public routes (no auth required)
    let public_router = api::public::router();

    // Protected routes (admin token required)
    let admin_router = Router::new()
        .nest("/api/admin", api::admin::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin_token,
        ));

    let app = Router::new()
        .merge(public_router)
        .merge(admin_router)
        .route("/api-docs/openapi.json", get(openapi_json))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let matched_path = request
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str)
                        .unwrap_or(request.uri().path());

                    // Don't create a span at all for noisy endpoints
                    if matched_path == "/api/health" {
                        tracing::trace_span!("http_request")
                    } else {
                        tracing::info_span!(
                            "http_request",
                            method = %request.method(),
                            path = %matched_path,
                        )
                    }
                })
                .on_request(|_request: &Request<_>, _span: &Span| {})
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        // Skip logging for noisy endpoints (trace-level spans)
                        if span.metadata().map(|m| m.level()) == Some(&tracing::Level::TRACE) {
                            return;
                        }
                        let status = response.status().as_u16();
                        if status >= 500 {
                            tracing::error!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request failed with server error"
                            );
                        } else {
                            tracing::info!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request completed"
                            );
                        }
                    },
                )
                .on_failure(
                    |error: tower_http::classify::ServerErrorsFailureClass,
                     latency: std::time::Duration,
                     _span: &Span| {
                        tracing::error!(
                            error = %error,
                            latency_ms = %latency.as_millis(),
                            "request failed"
                        );
                    },
                ),
        );

    let listener = tokio::net::TcpListener::bind(&listen_addr).await.unwrap();

    tracing::info!("Server listening on {}", listener.local_addr().unwrap());
    tracing::info!("OpenAPI spec available at /api-docs/openapi.json");

    axum::serve(listener, app).await.unwrap();
}
