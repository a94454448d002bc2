//! Worktrack - track work as timed sessions and summarize where the time went
//!
//! This crate provides:
//! - A session engine with pause/resume/stop and millisecond time accounting
//! - Categorization of finished sessions (keyword rules, optional LLM)
//! - Markdown summaries
//! - An HTTP API with server-sent session events
//!
//! # Usage
//!
//! As a library:
//! ```
//! use worktrack::session::SessionEngine;
//!
//! let mut engine = SessionEngine::default();
//! let session = engine.start("Write release notes").unwrap();
//! let stopped = engine.stop(&session.id).unwrap();
//! assert!(stopped.end_time.is_some());
//! ```
//!
//! As a standalone server (CLI):
//! ```text
//! worktrack --config ~/.worktrack/config.toml
//! ```

pub mod api;
pub mod categorize;
pub mod config;
pub mod error;
pub mod session;
pub mod summary;

// Re-export main types for convenience
pub use categorize::Categorizer;
pub use config::Config;
pub use error::{CoreError, Result, SessionError};
pub use session::SessionEngine;

use session::{Clock, SessionEvent, SystemClock};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// Composition root: owns the engine, the categorizer and the event channel
pub struct Core {
    /// Configuration
    pub config: Config,

    /// Session engine shared with request handlers
    engine: Arc<Mutex<SessionEngine>>,

    /// Categorizer for summaries
    categorizer: Arc<Categorizer>,

    /// Broadcast channel for session events (engine to SSE clients)
    event_tx: broadcast::Sender<SessionEvent>,
}

impl Core {
    /// Create a new Core instance with the given configuration
    pub fn new(config: Config) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a Core instance with a custom clock
    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let (event_tx, _) = broadcast::channel(256);
        let engine = SessionEngine::new(clock).with_event_sender(event_tx.clone());
        let categorizer = Categorizer::from_config(&config.categorizer);

        Ok(Core {
            config,
            engine: Arc::new(Mutex::new(engine)),
            categorizer: Arc::new(categorizer),
            event_tx,
        })
    }

    /// State handed to the HTTP layer
    pub fn app_state(&self) -> api::AppState {
        api::AppState::new(
            self.engine.clone(),
            self.categorizer.clone(),
            self.event_tx.clone(),
        )
    }

    /// Start the HTTP API server (blocks until shutdown)
    pub async fn start_api_server(&self) -> Result<()> {
        let addr = self.config.server_addr();
        tracing::info!("Starting API server on {}", addr);
        api::serve(addr, self.app_state()).await
    }

    /// Get the session engine handle
    pub fn engine(&self) -> &Arc<Mutex<SessionEngine>> {
        &self.engine
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }
}
