use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use appointment_scheduler::config::AppConfig;
use appointment_scheduler::handlers;
use appointment_scheduler::services::extraction::Extractor;
use appointment_scheduler::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let extractor = Extractor::gemini(config.extraction_settings());
    if extractor.has_credential() {
        tracing::info!("using Gemini extraction model (model: {})", config.gemini_model);
    } else {
        tracing::warn!("GEMINI_API_KEY is not set, schedule requests will fail until it is configured");
    }

    let state = Arc::new(AppState {
        config: config.clone(),
        extractor,
    });

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
