//! Server Implementation
//!
//! HTTP 服务器启动和管理

use crate::api;
use crate::core::{Config, Result, ServerState};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state (for sharing with tests or tooling)
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> Result<()> {
        // Create application state if not provided
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config),
        };

        // Start background tasks (deadline sweeper)
        let tasks = state.start_background_tasks();

        let app = api::router()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state.clone());

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| crate::core::ServerError::Internal(e.into()))?;
        tracing::info!("Escrow server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutting down...");
            })
            .await
            .map_err(|e| crate::core::ServerError::Internal(e.into()))?;

        // HTTP loop exited: stop the sweeper before returning
        tasks.shutdown().await;

        Ok(())
    }
}
