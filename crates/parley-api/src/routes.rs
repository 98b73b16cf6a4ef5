//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, request tracing, rate limiting,
//! and all endpoint handlers.

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers;
use crate::rate_limit::RateLimiter;
use crate::state::AppState;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS: allow the local chat UI origins on the configured port.
    let port = state.config.general.port;
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([
            format!("http://127.0.0.1:{}", port)
                .parse::<HeaderValue>()
                .expect("valid origin"),
            format!("http://localhost:{}", port)
                .parse::<HeaderValue>()
                .expect("valid origin"),
        ]))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let limiter = RateLimiter::new(state.config.api.rate_limit_per_sec);

    // The health check stays outside the rate limit so probes never 429.
    let public_routes = Router::new().route("/api/health", get(handlers::health));

    let rate_limited_routes = Router::new()
        .route("/api/session/create", post(handlers::create_session))
        .route("/api/message/send", post(handlers::send_message))
        .route(
            "/api/conversation/history/{session_id}",
            get(handlers::conversation_history),
        )
        .route(
            "/api/session/context/{session_id}",
            get(handlers::session_context),
        )
        .route(
            "/api/message/{message_id}/feedback",
            post(handlers::message_feedback),
        )
        .layer(axum::middleware::from_fn(
            crate::rate_limit::rate_limit_middleware,
        ))
        .layer(axum::Extension(limiter));

    Router::new()
        .merge(public_routes)
        .merge(rate_limited_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind and serve the API on the configured port.
pub async fn serve(state: AppState) -> std::io::Result<()> {
    let port = state.config.general.port;
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("API listening on http://127.0.0.1:{}", port);
    axum::serve(listener, router).await
}
