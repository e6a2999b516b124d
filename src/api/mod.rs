//! HTTP API server for the describe endpoint

pub mod describe;
pub mod health;

use std::sync::Arc;

use axum::Router;
use axum::routing::any;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::vision::SceneDescriber;

/// Shared state for API handlers
///
/// Read-only at request time; concurrent requests share nothing mutable.
pub struct ApiState {
    /// Scene describer, present only when the vision credential is
    /// configured. Its absence turns every describe request into a 500
    /// before any parsing work is done.
    pub describer: Option<Arc<dyn SceneDescriber>>,
    /// Per-request cap on buffered image bytes
    pub max_image_bytes: usize,
}

/// Build the router with all routes
#[must_use]
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/describe", any(describe::describe))
        .with_state(state)
        .merge(health::router())
        .layer(TraceLayer::new_for_http())
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    /// Create a new API server
    #[must_use]
    pub fn new(state: Arc<ApiState>, port: u16) -> Self {
        Self { state, port }
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if the server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, router(self.state))
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}
