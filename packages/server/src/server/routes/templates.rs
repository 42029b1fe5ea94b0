use axum::{
    extract::{Extension, Query},
    Json,
};
use entity_miner::{PromptTemplate, GLOBAL_SCOPE};
use serde::Deserialize;

use crate::server::{app::AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct TemplateQuery {
    pub template_type: String,
    /// Scope key; global templates when absent
    #[serde(default)]
    pub novel_name: Option<String>,
}

/// Fetch one prompt template.
pub async fn template_handler(
    Extension(state): Extension<AppState>,
    Query(query): Query<TemplateQuery>,
) -> Result<Json<PromptTemplate>, ApiError> {
    let scope = query.novel_name.as_deref().unwrap_or(GLOBAL_SCOPE);
    state
        .deps
        .templates
        .get(scope, &query.template_type)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "template {} not found for {}",
                query.template_type, scope
            ))
        })
}
