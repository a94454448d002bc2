//! HTTP API module for Worktrack
//!
//! Exposes the session engine and the summary categorizer over REST, plus a
//! server-sent event stream of session transitions.

pub mod routes;
mod sse;

use crate::categorize::Categorizer;
use crate::error::{CoreError, Result};
use crate::session::{SessionEngine, SessionEvent};

use axum::{
    routing::{get, patch, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// The session engine. Every handler takes the lock for the whole
    /// operation, which serializes transitions.
    pub engine: Arc<Mutex<SessionEngine>>,
    /// Summary categorizer (LLM with keyword fallback)
    pub categorizer: Arc<Categorizer>,
    /// Broadcast channel for SSE session events
    pub event_tx: broadcast::Sender<SessionEvent>,
}

impl AppState {
    pub fn new(
        engine: Arc<Mutex<SessionEngine>>,
        categorizer: Arc<Categorizer>,
        event_tx: broadcast::Sender<SessionEvent>,
    ) -> Self {
        AppState {
            engine,
            categorizer,
            event_tx,
        }
    }

    /// Lock the engine, recovering the guard if a previous holder panicked
    pub fn engine(&self) -> MutexGuard<'_, SessionEngine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Start the HTTP API server
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let app = create_router(state);

    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| CoreError::Api(e.to_string()))?;

    Ok(())
}

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - allow all origins for local frontends
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Sessions
        .route("/sessions/start", post(routes::start_session))
        .route("/sessions/active", get(routes::get_active_session))
        .route("/sessions/:id", get(routes::get_session))
        .route("/sessions/:id/pause", patch(routes::pause_session))
        .route("/sessions/:id/stop", post(routes::stop_session))
        // Summaries
        .route("/summary", get(routes::get_summary))
        .route("/summary/generate", post(routes::generate_summary))
        .route("/summary/markdown", get(routes::get_summary_markdown))
        // Server-Sent Events
        .route("/events", get(sse::events_handler));

    Router::new()
        .route("/health", get(routes::health))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
