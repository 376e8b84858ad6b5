use anyhow::Context;
use inbox_service::{
    create_router,
    db::{create_pool, redact_database_url, run_migrations},
    message::{InMemoryMessageStore, MessageRepository, MessageService, RestBackend},
    profile::ProfileRepository,
    state::{AppState, Config, MessageBackend},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn build_message_service(config: &Config) -> anyhow::Result<MessageService> {
    let service = match config.backend {
        MessageBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres backend")?;

            let url_for_logging = redact_database_url(database_url);

            tracing::info!("Connecting to database at {}...", url_for_logging);
            let db = create_pool(database_url)
                .await
                .with_context(|| format!("Failed to connect to database at {}", url_for_logging))?;

            tracing::info!("Running migrations...");
            run_migrations(&db).await?;

            let messages = Arc::new(MessageRepository::new(db.clone()));
            MessageService::new(
                messages.clone(),
                Arc::new(ProfileRepository::new(db)),
                messages,
            )
        }
        MessageBackend::Rest => {
            let url = config
                .rest_api_url
                .clone()
                .context("REST_API_URL is required for the rest backend")?;
            tracing::info!("Using REST message backend at {}", url);

            let backend = Arc::new(RestBackend::new(url, config.rest_api_key.clone()));
            MessageService::new(backend.clone(), backend.clone(), backend)
        }
        MessageBackend::Memory => {
            tracing::warn!("Using in-memory message backend; data is lost on restart");
            let store = Arc::new(InMemoryMessageStore::new());
            MessageService::new(store.clone(), store.clone(), store)
        }
    };

    Ok(service)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,inbox_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env()?);

    let message_service = build_message_service(&config).await?;

    let state = AppState {
        config: config.clone(),
        message_service,
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
