//! Prompt template storage.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::template::PromptTemplate;

/// Key-value store of prompt templates, keyed by (scope, template_type).
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Get a template. `Ok(None)` means no such record.
    async fn get(&self, scope: &str, template_type: &str) -> Result<Option<PromptTemplate>>;

    /// Insert or replace a template.
    async fn put(&self, template: &PromptTemplate) -> Result<()>;

    /// All templates in a scope.
    async fn list(&self, scope: &str) -> Result<Vec<PromptTemplate>>;
}
