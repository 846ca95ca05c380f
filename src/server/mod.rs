//! HTTP server for idea analysis
//!
//! Exposes the streaming analysis endpoint, shared-result lookup, a health
//! check, and the static frontend.

mod events;
pub mod routes;
pub mod state;
mod static_files;

pub use events::{sse_response, to_sse_event, EVENT_BUFFER};
pub use routes::ApiError;
pub use state::ServerAppState;

use crate::config::AppConfig;
use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// How long shutdown waits for running analyses to finish and persist
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the router with every route, the static fallback and CORS
pub fn build_router(
    state: ServerAppState,
    public_dir: &str,
    cors_origins: Option<&[String]>,
) -> Router {
    let cors = match cors_origins {
        Some(origins) if !origins.is_empty() => {
            // Restricted CORS: only allow specified origins
            let allowed_origins: Vec<HeaderValue> =
                origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([CONTENT_TYPE, ACCEPT])
        }
        _ => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([CONTENT_TYPE, ACCEPT]),
    };

    Router::new()
        .route("/api/analyze", post(routes::analyze_routes::analyze_handler))
        .route("/api/result/:id", get(routes::result_routes::result_handler))
        .route("/api/health", get(routes::result_routes::health_handler))
        .fallback_service(static_files::static_service(public_dir))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP server until a shutdown signal arrives
pub async fn run_server(config: &AppConfig, state: ServerAppState) -> Result<(), String> {
    let app = build_router(
        state.clone(),
        &config.public_dir,
        config.cors_origins.as_deref(),
    );

    let addr: SocketAddr = format!("{}:{}", config.bind, config.port)
        .parse()
        .map_err(|e| format!("Invalid address: {}", e))?;

    let frontend_status = if static_files::has_frontend(&config.public_dir) {
        config.public_dir.as_str()
    } else {
        "none (no index.html)"
    };

    println!("\n✨  Vibe Check is live!");
    println!("🚀  Open → http://localhost:{}", config.port);
    println!("    Result store: {}", state.store.backend_name());
    println!("    Frontend:     {}\n", frontend_status);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    log::info!("Server listening on http://{}", addr);

    // Create shutdown signal that waits for the shutdown state flag
    let shutdown_state = state.shutdown_state.clone();
    let shutdown_signal = async move {
        loop {
            if shutdown_state.is_shutdown_requested() {
                log::info!("Shutdown signal received, stopping server...");
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| format!("Server error: {}", e))?;

    let running = state.shutdown_state.active_runs();
    if running > 0 {
        log::info!("Waiting for {} running analyses to finish", running);
        if !state.shutdown_state.wait_for_idle(DRAIN_TIMEOUT).await {
            log::warn!(
                "{} analyses still running after {:?}; their results are lost",
                state.shutdown_state.active_runs(),
                DRAIN_TIMEOUT
            );
        }
    }

    Ok(())
}
