use crate::config::UploadConfig;
use crate::handlers;
use crate::services::{FilePersister, LocalStorage, Storage};
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware,
    tracing::{make_request_span, request_id_middleware},
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<UploadConfig>,
    pub persister: Arc<FilePersister>,
}

impl AppState {
    pub fn new(config: UploadConfig, storage: Arc<dyn Storage>) -> Self {
        let persister = FilePersister::new(storage, config.storage.route_prefix());
        Self {
            config: Arc::new(config),
            persister: Arc::new(persister),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let max_body_bytes = state.config.upload.max_body_bytes;

    // The multipart reader enforces the ceiling and reports 413 itself, for
    // declared and chunked bodies alike.
    let upload_routes = Router::new()
        .route("/api/upload", post(handlers::upload_files))
        .layer(DefaultBodyLimit::max(max_body_bytes));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .merge(upload_routes)
        .nest_service(
            &state.config.storage.route_prefix(),
            ServeDir::new(&state.config.storage.upload_dir),
        )
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

type ServerFuture = Pin<Box<dyn Future<Output = std::io::Result<()>> + Send>>;

pub struct Application {
    port: u16,
    server: ServerFuture,
}

impl Application {
    pub async fn build(config: UploadConfig) -> Result<Self, AppError> {
        let storage = LocalStorage::new(&config.storage.upload_dir)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to initialize upload directory {}: {}",
                    config.storage.upload_dir.display(),
                    e
                );
                AppError::from(e)
            })?;

        let address = config.server.address();
        let storage = Arc::new(storage);
        let app = build_router(AppState::new(config, storage.clone()));

        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            upload_dir = %storage.base_path().display(),
            "Listening on {}",
            port
        );

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

        Ok(Self {
            port,
            server: Box::pin(async move { server.await }),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
