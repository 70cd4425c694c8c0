use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use govdesk_engine::{DecisionEngine, EmbeddingProvider, HashingEmbeddings};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod clients;
mod config;
mod error;
mod extract;
mod middleware;
mod routes;
mod state;
mod sweeper;
#[cfg(test)]
mod test_support;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "GovDesk Decision API",
        version = "0.1.0",
        description = "Turn-by-turn dialogue engine for the government-service assistant."
    ),
    paths(
        routes::health::health_check,
        routes::decision::next_turn,
        routes::decision::reset_context,
    ),
    components(schemas(
        HealthResponse,
        govdesk_core::turn::TurnRequest,
        govdesk_core::turn::TurnResponse,
        govdesk_core::turn::ReplyStage,
        govdesk_core::error::ApiError,
    )),
    tags(
        (name = "system", description = "Health and version"),
        (name = "decision", description = "Conversation turns"),
    )
)]
struct ApiDoc;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "govdesk_api=debug,govdesk_engine=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let cfg = config::ApiConfig::from_env().expect("invalid configuration");

    // Service catalog database
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&cfg.database_url)
        .await
        .expect("Failed to connect to database");

    let http = reqwest::Client::new();

    let embedder: Arc<dyn EmbeddingProvider> = match &cfg.azure_embeddings {
        Some(azure) => Arc::new(
            clients::AzureOpenAiEmbeddings::new(http.clone(), azure)
                .expect("invalid Azure OpenAI endpoint"),
        ),
        None => {
            tracing::warn!(
                dimensions = cfg.embedding_dimensions,
                "AZURE_OPENAI_ENDPOINT not set, using hashing embeddings"
            );
            Arc::new(HashingEmbeddings::new(cfg.embedding_dimensions))
        }
    };

    let engine = DecisionEngine::builder(
        Arc::new(
            clients::RasaClassifier::new(http.clone(), &cfg.rasa_base_url)
                .expect("invalid RASA_BASE_URL"),
        ),
        embedder,
        Arc::new(clients::PgServiceCatalog::new(pool.clone())),
        Arc::new(clients::HttpDirectory::new(
            http,
            cfg.directory_base_url.clone(),
        )),
    )
    .config(cfg.engine.clone())
    .build();
    let engine = Arc::new(engine);

    sweeper::spawn(engine.clone(), cfg.sweep_interval);

    let app_state = state::AppState { db: pool, engine };

    // CORS
    let cors_layer = middleware::cors::build_cors_layer();

    // Router with per-endpoint rate limiting on the decision routes
    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(routes::health::router())
        .merge(routes::decision::turn_router().layer(middleware::rate_limit::turn_layer()))
        .merge(routes::decision::context_router().layer(middleware::rate_limit::reset_layer()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer),
        )
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    tracing::info!(
        directory = %cfg.directory_base_url,
        rasa = %cfg.rasa_base_url,
        timezone = %cfg.engine.timezone,
        "GovDesk API listening on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("server error");
}
