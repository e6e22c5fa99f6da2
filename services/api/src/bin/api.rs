//! services/api/src/bin/api.rs

use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    Router,
};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use triathlon_api_lib::{
    adapters::{AnthropicAdapter, AzureOpenAiAdapter, DbAdapter},
    config::{Config, ProviderConfig},
    error::ApiError,
    web::{self, ApiDoc, AppState},
};
use triathlon_core::{ports::TextGenerationService, ProgramGenerator};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize the Text Generation Provider ---
    let provider: Arc<dyn TextGenerationService> = match &config.provider {
        ProviderConfig::Anthropic {
            api_key,
            model,
            base_url,
        } => {
            info!(model = %model, "Using the Anthropic provider");
            Arc::new(AnthropicAdapter::new(
                reqwest::Client::new(),
                api_key.clone(),
                model.clone(),
                base_url.clone(),
            ))
        }
        ProviderConfig::AzureAi {
            endpoint,
            api_key,
            deployment,
            api_version,
        } => {
            info!(deployment = %deployment, "Using the Azure AI provider");
            let client = AzureOpenAiAdapter::client_for(endpoint, api_key, deployment, api_version);
            Arc::new(AzureOpenAiAdapter::new(client, deployment.clone()))
        }
    };
    let generator = Arc::new(ProgramGenerator::new(provider, config.generation_profile()));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        db: db_adapter,
        generator,
    });

    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS origin '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    // --- 5. Create the Web Router ---
    let app = Router::new()
        .merge(web::router(app_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
