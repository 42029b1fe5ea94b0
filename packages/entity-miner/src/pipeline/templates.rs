//! Template lookup that never fails.
//!
//! A missing record or an unreachable store degrades to `None`. The stage that
//! needs the template reports the configuration error when it runs.

use tracing::{debug, error, warn};

use crate::traits::template_store::TemplateStore;
use crate::types::template::PromptTemplate;

/// Fetch `(scope, template_type)`, logging instead of failing.
pub async fn fetch_template(
    store: &dyn TemplateStore,
    scope: &str,
    template_type: &str,
    label: &str,
) -> Option<PromptTemplate> {
    match store.get(scope, template_type).await {
        Ok(Some(template)) => {
            debug!(scope, template_type, label, "Fetched prompt template");
            Some(template)
        }
        Ok(None) => {
            warn!(scope, template_type, label, "Prompt template not found");
            None
        }
        Err(e) => {
            error!(scope, template_type, label, error = %e, "Error fetching prompt template");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryTemplateStore;
    use crate::testing::FailingTemplateStore;

    #[tokio::test]
    async fn test_present_template() {
        let store = MemoryTemplateStore::new();
        store
            .put(&PromptTemplate::global("t", "sys", "{text}"))
            .await
            .unwrap();

        let found = fetch_template(&store, "global", "t", "genre").await;
        assert_eq!(found.unwrap().system_prompt, "sys");
    }

    #[tokio::test]
    async fn test_missing_template_is_none() {
        let store = MemoryTemplateStore::new();
        assert!(fetch_template(&store, "global", "t", "genre").await.is_none());
    }

    #[tokio::test]
    async fn test_store_failure_is_none() {
        assert!(fetch_template(&FailingTemplateStore, "global", "t", "genre")
            .await
            .is_none());
    }
}
