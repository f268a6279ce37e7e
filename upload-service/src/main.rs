use service_core::observability::init_tracing;
use tracing::info;
use upload_service::config::UploadConfig;
use upload_service::services::init_metrics;
use upload_service::startup::Application;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let configuration = UploadConfig::load().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing("upload-service", &configuration.telemetry)?;
    init_metrics()?;

    let app = Application::build(configuration).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        anyhow::anyhow!("Startup error: {}", e)
    })?;

    info!("Starting upload-service on port {}", app.port());
    app.run_until_stopped().await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    Ok(())
}
