//! Application startup and lifecycle management.
//!
//! The model is loaded before the listener is bound; a service without a
//! model never accepts a connection.

use crate::config::PredictionConfig;
use crate::services::{load_model, Classifier};
use crate::{build_router, AppState};
use service_core::axum::Router;
use service_core::error::AppError;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Load the configured model artifact and bind the HTTP listener.
    pub async fn build(config: PredictionConfig) -> Result<Self, AppError> {
        let model = load_model(&config.model.path).map_err(|e| {
            tracing::error!(
                path = %config.model.path.display(),
                error = %e,
                "Failed to load model artifact"
            );
            AppError::ConfigError(anyhow::Error::new(e))
        })?;

        Self::build_with_model(config, Arc::new(model)).await
    }

    /// Bind the HTTP listener around an already constructed classifier.
    pub async fn build_with_model(
        config: PredictionConfig,
        model: Arc<dyn Classifier>,
    ) -> Result<Self, AppError> {
        let addr = config.common.socket_addr();
        let state = AppState { config, model };
        let router = build_router(state)?;

        // Port 0 picks a random port for testing
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(address = %addr, port, "Prediction service listening");

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until SIGINT or SIGTERM, then drain in-flight requests.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        service_core::axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Service shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
