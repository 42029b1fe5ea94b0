//! Application setup and server configuration.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use entity_miner::{
    ChromaVectorStore, FsBlobStore, HostedEmbedder, HostedModel, MemoryJobStore,
    MemoryTemplateStore, MemoryVectorStore, MinerConfig, MinerDeps, VectorStore,
};
use llm_client::LlmClient;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::server::routes::{
    add_entity_handler, events_handler, get_story_handler, health_handler, job_handler,
    mine_handler, similar_entities_handler, template_handler, upload_story_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: MinerDeps,
    pub miner_config: Arc<MinerConfig>,
}

impl AppState {
    pub fn new(deps: MinerDeps, miner_config: MinerConfig) -> Self {
        Self {
            deps,
            miner_config: Arc::new(miner_config),
        }
    }
}

/// Wire the stores and the hosted model from configuration.
pub fn build_state(config: &Config) -> Result<AppState> {
    let templates = match &config.templates_path {
        Some(path) => {
            let store = MemoryTemplateStore::from_json_file(path)
                .with_context(|| format!("Failed to load templates from {}", path))?;
            tracing::info!(path = %path, count = store.len(), "Prompt templates loaded");
            store
        }
        None => {
            tracing::warn!("TEMPLATES_PATH not set, starting with no prompt templates");
            MemoryTemplateStore::new()
        }
    };

    let mut client = LlmClient::new(&config.llm_base_url);
    if let Some(key) = &config.llm_api_key {
        client = client.with_api_key(key);
    }

    let vectors: Arc<dyn VectorStore> = match &config.chroma_url {
        Some(url) => {
            tracing::info!(
                url = %url,
                embedding_model = %config.embedding_model,
                "Using Chroma vector store"
            );
            let embedder = HostedEmbedder::new(client.clone(), &config.embedding_model);
            Arc::new(ChromaVectorStore::new(url, Arc::new(embedder)))
        }
        None => {
            tracing::warn!("CHROMA_URL not set, using in-memory vector store");
            Arc::new(MemoryVectorStore::new())
        }
    };

    let deps = MinerDeps::new(
        Arc::new(templates),
        Arc::new(HostedModel::new(client)),
        vectors,
        Arc::new(FsBlobStore::new(&config.blob_root)),
        Arc::new(MemoryJobStore::new()),
    );
    let miner_config = MinerConfig::new(&config.model_id)
        .with_max_concurrent_profiles(config.max_concurrent_profiles);

    Ok(AppState::new(deps, miner_config))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

/// Build the Axum application router
pub fn build_app(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        // Mining
        .route("/api/mine", post(mine_handler))
        .route("/api/jobs/:job_id", get(job_handler))
        .route("/api/events", post(events_handler))
        // Stories, templates, vectors
        .route(
            "/api/story",
            get(get_story_handler).post(upload_story_handler),
        )
        .route("/api/templates", get(template_handler))
        .route("/api/similar_entities", get(similar_entities_handler))
        .route("/api/entity", post(add_entity_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(Extension(state))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}
