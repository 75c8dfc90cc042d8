//! Server Module
//!
//! HTTP inference server: health check and prediction endpoints over a
//! lazily loaded embedding model.

mod config;
mod handler;

pub use config::{Config, DEFAULT_MAX_BODY_BYTES, DEFAULT_MODEL_PATH};
pub use handler::{AppState, UNSUPPORTED_MEDIA_MESSAGE};

use crate::metrics::Metrics;
use crate::model::{ModelCache, Predictor};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Health check route
pub const PING_PATH: &str = "/ping";

/// Prediction route
pub const INVOCATIONS_PATH: &str = "/invocations";

/// Inference server
pub struct Server {
    config: Config,
    state: AppState,
}

impl Server {
    /// Create a new server with the given configuration
    pub fn new(config: Config) -> Self {
        let cache = Arc::new(ModelCache::new(&config.model_path));
        Self::with_cache(config, cache)
    }

    /// Create a server around an existing model cache
    pub fn with_cache(config: Config, cache: Arc<ModelCache>) -> Self {
        let state = AppState {
            predictor: Predictor::new(cache),
            metrics: Arc::new(Metrics::new()),
        };
        Self { config, state }
    }

    /// Routes with shared state attached
    pub fn router(&self) -> Router {
        Router::new()
            .route(PING_PATH, get(handler::ping))
            .route(INVOCATIONS_PATH, post(handler::invocations))
            .layer(DefaultBodyLimit::max(self.config.max_body_bytes))
            .with_state(self.state.clone())
    }

    /// Bind the configured address and serve until Ctrl-C
    pub async fn run(self) -> std::io::Result<()> {
        let addr = self.config.addr();
        let listener = TcpListener::bind(&addr).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.config.preload {
            self.preload().await;
        }

        info!(
            "Inference server listening on {} (model: {})",
            listener.local_addr()?,
            self.cache().source()
        );

        let metrics = Arc::clone(&self.state.metrics);
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Server stopped. {}", metrics.summary());
        Ok(())
    }

    async fn preload(&self) {
        let cache = Arc::clone(self.cache());
        match tokio::task::spawn_blocking(move || cache.get_model()).await {
            Ok(Ok(_)) => info!("Model preloaded"),
            Ok(Err(e)) => {
                warn!(error = %e, "Model preload failed, health check will report not ready")
            }
            Err(e) => error!(error = %e, "Model preload task failed"),
        }
    }

    /// Get the model cache
    pub fn cache(&self) -> &Arc<ModelCache> {
        self.state.predictor.cache()
    }

    /// Get metrics reference
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.state.metrics
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
