mod config;
mod dto;
mod error;
mod handlers;
mod models;
mod repositories;
mod services;
mod utils;

#[cfg(test)]
mod test_support;

use std::time::Duration;

use axum::{
    http::{header, Method},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use sqlx::mysql::MySqlPoolOptions;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{AppState, Config};
use crate::handlers::notification_sender::{
    create_notification_sender_handler, delete_notification_sender_handler, get_notification_sender_handler,
    list_notification_senders_handler, update_notification_sender_handler,
};
use crate::handlers::otp::{send_otp_handler, verify_otp_handler};
use crate::handlers::token::token_handler;

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness check - verifies database connection
async fn ready_handler(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<HealthResponse>, axum::http::StatusCode> {
    sqlx::query("SELECT 1")
        .execute(&state.pool)
        .await
        .map_err(|_| axum::http::StatusCode::SERVICE_UNAVAILABLE)?;

    Ok(Json(HealthResponse {
        status: "ready",
        version: env!("CARGO_PKG_VERSION"),
    }))
}

/// Create the application router with all routes configured
///
/// # Routes
///
/// ## Public
/// - GET /health, GET /ready
/// - POST /oauth/token - token endpoint, all four grant types
///
/// ## Notification senders
/// - GET /notification-senders/message - list
/// - POST /notification-senders/message - create
/// - GET /notification-senders/message/{id} - get
/// - PUT /notification-senders/message/{id} - update
/// - DELETE /notification-senders/message/{id} - delete
///
/// ## OTP
/// - POST /notification-senders/otp/send
/// - POST /notification-senders/otp/verify
pub fn create_router(state: AppState) -> Router {
    let notification_sender_routes = Router::new()
        .route(
            "/message",
            get(list_notification_senders_handler).post(create_notification_sender_handler),
        )
        .route(
            "/message/:id",
            get(get_notification_sender_handler)
                .put(update_notification_sender_handler)
                .delete(delete_notification_sender_handler),
        )
        .route("/otp/send", post(send_otp_handler))
        .route("/otp/verify", post(verify_otp_handler));

    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/oauth/token", post(token_handler))
        .nest("/notification-senders", notification_sender_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .max_age(Duration::from_secs(3600)),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "token_issuance_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let pool = MySqlPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let addr = config.socket_addr();

    let state = AppState::new(pool, config)?;

    let app = create_router(state);

    tracing::info!("token-issuance-core v{} listening on {}", env!("CARGO_PKG_VERSION"), addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
