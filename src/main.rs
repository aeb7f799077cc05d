use anyhow::Result;
use std::sync::Arc;

use projectbrief_backend::pipeline::{Pipeline, TemplateRegistry};
use projectbrief_backend::services::{AnalysisService, ChatCompletionClient, CompletionService};
use projectbrief_backend::{app, config, logging};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration; a missing API key stops startup here
    let settings = config::Settings::from_env()?;

    // Initialize logging
    logging::init_logging(&settings);

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        "Starting project brief backend"
    );

    // Create completion service client
    let client = ChatCompletionClient::new(
        &settings.llm_base_url,
        &settings.llm_api_key,
        settings.llm_timeout_seconds,
    )?;
    let completion: Arc<dyn CompletionService> = Arc::new(client);

    // Optionally check completion service health (non-blocking)
    tokio::spawn({
        let completion = completion.clone();
        async move {
            match completion.health_check().await {
                Ok(()) => tracing::info!("Completion service is reachable"),
                Err(e) => tracing::warn!(error = %e, "Completion service health check failed"),
            }
        }
    });

    let templates = TemplateRegistry::builtin(settings.llm_model.as_deref())?;
    tracing::info!(
        templates = templates.len(),
        model = settings.llm_model.as_deref().unwrap_or("per-template default"),
        "Prompt templates loaded"
    );

    let pipeline = Pipeline::new(completion, templates, settings.llm_decode_retries);

    // Create application state
    let state = app::AppState::new(settings.clone(), AnalysisService::new(pipeline));

    // Build application
    let app = app::create_app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&settings.server_addr).await?;
    tracing::info!("Listening on {}", settings.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
