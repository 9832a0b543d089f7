//! HTTP surface.
//!
//! One axum router exposes the session operations as JSON endpoints.
//! Requests are traced with `tower_http` and CORS is open so a browser
//! front end served from anywhere can talk to it.

pub mod error;
pub mod routes;

pub use error::ApiError;

use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::Result;
use crate::session::Session;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    session: Arc<Session>,
}

impl AppState {
    /// Wrap a session for the router.
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// Session served by this router.
    pub fn session(&self) -> &Session {
        &self.session
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes::router()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve `session` until Ctrl+C or SIGTERM.
pub async fn serve(config: &Config, session: Arc<Session>) -> Result<()> {
    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, library = %config.library_dir.display(), "pdfstack listening");

    axum::serve(listener, router(AppState::new(session)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, starting graceful shutdown"),
        _ = terminate => tracing::info!("Received SIGTERM, starting graceful shutdown"),
    }
}
