mod config;
mod cv;
mod errors;
mod extraction;
mod layout;
mod llm_client;
mod render;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::cv::store::CvStore;
use crate::extraction::MistralGateway;
use crate::layout::default_page_config;
use crate::llm_client::LlmClient;
use crate::render::{HtmlPreview, PdfExport};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed numeric env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client and the extraction gateway on top of it
    let llm = LlmClient::new(
        config.mistral_api_key.clone(),
        config.mistral_api_url.clone(),
        config.mistral_model.clone(),
        Duration::from_secs(config.llm_timeout_secs),
    )?;
    if config.mistral_api_key.is_none() {
        tracing::warn!("MISTRAL_API_KEY is not set; extraction requests will fail");
    }
    info!(
        "LLM client initialized (model: {}, timeout: {}s)",
        llm.model(),
        config.llm_timeout_secs
    );
    let gateway = Arc::new(MistralGateway::new(llm));

    // Transient uploads are staged here and removed after each extraction
    std::fs::create_dir_all(&config.upload_dir)?;
    info!("Upload staging directory: {}", config.upload_dir.display());

    // Both sinks lay out on the same page geometry
    let page_config = default_page_config();
    info!(
        "Layout page config: {}x{}pt, body {}pt",
        page_config.page_width_pt, page_config.page_height_pt, page_config.body_size_pt
    );
    let preview = Arc::new(HtmlPreview::new(page_config.clone())?);
    let export = Arc::new(PdfExport::new(page_config));

    // Build app state
    let state = AppState {
        config: config.clone(),
        store: Arc::new(CvStore::new()),
        gateway,
        preview,
        export,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the editor has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
