//! Application startup and lifecycle management.

use crate::config::RelayConfig;
use crate::handlers::{email, health, scrape, verify};
use crate::services::{
    CompletionProvider, EmailProvider, HuggingFaceProvider, PageFetcher, SmtpProvider,
    TopicClassifier,
};
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{request_id_middleware, request_span};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state. Everything in it is immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: PageFetcher,
    pub classifier: TopicClassifier,
    pub email_provider: Arc<dyn EmailProvider>,
}

impl AppState {
    pub fn from_config(config: &RelayConfig) -> Result<Self, AppError> {
        let fetcher = PageFetcher::new(&config.scrape)
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let completion: Option<Arc<dyn CompletionProvider>> =
            match HuggingFaceProvider::from_config(&config.inference)
                .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?
            {
                Some(provider) => {
                    tracing::info!(url = %config.inference.api_url, "Completion provider initialized");
                    Some(Arc::new(provider) as Arc<dyn CompletionProvider>)
                }
                None => {
                    tracing::warn!("No inference API key set, classification uses keyword fallback only");
                    None
                }
            };

        let smtp = SmtpProvider::new(config.smtp.clone())
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;
        if smtp.is_configured() {
            tracing::info!(server = %smtp.server(), sender = %smtp.sender(), "SMTP email provider initialized");
        } else {
            tracing::warn!("SMTP credentials not set, email endpoints will report a configuration error");
        }

        Ok(Self {
            fetcher,
            classifier: TopicClassifier::new(completion),
            email_provider: Arc::new(smtp),
        })
    }
}

/// Request body cap for report uploads, which carry a base64 spreadsheet.
pub const REPORT_BODY_LIMIT_BYTES: usize = 50 * 1024 * 1024;

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/scrape", get(scrape::scrape))
        .route("/verify", post(verify::verify))
        .route("/verify-llm", post(verify::verify))
        .route("/send-email", post(email::send_email))
        .route(
            "/send-email-with-excel",
            post(email::send_email_with_excel).layer(DefaultBodyLimit::max(REPORT_BODY_LIMIT_BYTES)),
        )
        .route("/test-email", post(email::test_email))
}

/// Routes are served both at the root and under `/api`, where the dashboard calls them.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api_routes())
        .nest("/api", api_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(request_span::<axum::body::Body>))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: RelayConfig) -> Result<Self, AppError> {
        let state = AppState::from_config(&config)?;
        Self::build_with_state(&config, state).await
    }

    /// Build around prepared state (port 0 = random port for testing).
    pub async fn build_with_state(config: &RelayConfig, state: AppState) -> Result<Self, AppError> {
        let address = config.common.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", address, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Relay service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
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
            Ok(mut sig) => {
                sig.recv().await;
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

    tracing::info!("Shutdown signal received");
}
