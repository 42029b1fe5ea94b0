//! Persistence sink: profiles into the vector store.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::traits::vector_store::{DocumentBatch, Metadata, VectorStore};
use crate::types::profile::EntityProfile;

/// Value of the `source` metadata field on every mined document.
pub const SOURCE: &str = "entity_miner";

/// Collection holding one user's documents for one novel.
pub fn collection_name(username: &str, novel_name: &str) -> String {
    format!("{}-{}", username, novel_name)
}

/// Document id: `{namespace}-{display_name}`.
pub fn document_id(namespace: &str, profile: &EntityProfile) -> String {
    format!("{}-{}", namespace, profile.display_name())
}

/// Writes profiles to a vector store in one batch.
#[derive(Clone)]
pub struct ProfileSink {
    store: Arc<dyn VectorStore>,
}

impl ProfileSink {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }

    /// Build the batch for a set of profiles.
    ///
    /// Ids must be unique within a batch: a later profile with an id already
    /// present is dropped.
    pub fn build_batch(
        profiles: &[EntityProfile],
        genre: &str,
        namespace: &str,
    ) -> Result<DocumentBatch> {
        let created_at = Utc::now().to_rfc3339();
        let mut seen = HashSet::new();
        let mut batch = DocumentBatch::new();

        for profile in profiles {
            let id = document_id(namespace, profile);
            if !seen.insert(id.clone()) {
                warn!(id = %id, "Duplicate document id in batch, keeping the first");
                continue;
            }

            let mut metadata = Metadata::new();
            metadata.insert("novel_name".into(), Value::from(namespace));
            metadata.insert("genre".into(), Value::from(genre));
            metadata.insert("source".into(), Value::from(SOURCE));
            metadata.insert("category".into(), Value::from(profile.category().as_str()));
            metadata.insert("created_at".into(), Value::from(created_at.as_str()));

            batch.push(id, profile.to_document()?, metadata);
        }

        Ok(batch)
    }

    /// Save profiles into `collection`. Returns whether the write succeeded.
    ///
    /// An empty profile list makes no store call and counts as success.
    pub async fn save(
        &self,
        collection: &str,
        profiles: &[EntityProfile],
        genre: &str,
        namespace: &str,
    ) -> bool {
        if profiles.is_empty() {
            info!(collection, "No profiles to save");
            return true;
        }

        let batch = match Self::build_batch(profiles, genre, namespace) {
            Ok(batch) => batch,
            Err(e) => {
                error!(collection, error = %e, "Failed to serialize profiles");
                return false;
            }
        };
        let count = batch.len();

        match self.store.add(collection, batch).await {
            Ok(()) => {
                info!(collection, count, "Saved profiles to vector store");
                true
            }
            Err(e) => {
                error!(collection, count, error = %e, "Failed to save profiles to vector store");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryVectorStore;
    use crate::testing::FailingVectorStore;
    use crate::types::profile::{LocationProfile, PersonProfile};

    fn shedinn() -> EntityProfile {
        PersonProfile::named("Shedinn").into()
    }

    fn aass_nag() -> EntityProfile {
        LocationProfile::named("Aass-Nag").into()
    }

    #[test]
    fn test_document_ids() {
        assert_eq!(document_id("novel1", &shedinn()), "novel1-Shedinn");
        assert_eq!(document_id("novel1", &aass_nag()), "novel1-Aass-Nag");
    }

    #[test]
    fn test_collection_name() {
        assert_eq!(collection_name("alice", "dragons"), "alice-dragons");
    }

    #[test]
    fn test_batch_metadata() {
        let batch = ProfileSink::build_batch(&[shedinn()], "High Fantasy", "novel1").unwrap();
        let metadata = &batch.metadatas[0];
        assert_eq!(metadata["novel_name"], "novel1");
        assert_eq!(metadata["genre"], "High Fantasy");
        assert_eq!(metadata["source"], "entity_miner");
        assert!(metadata.contains_key("created_at"));
        assert!(batch.documents[0].contains("\"name\":\"Shedinn\""));
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let batch =
            ProfileSink::build_batch(&[shedinn(), aass_nag(), shedinn()], "g", "n").unwrap();
        assert_eq!(batch.ids, vec!["n-Shedinn", "n-Aass-Nag"]);
    }

    #[tokio::test]
    async fn test_save_writes_batch() {
        let store = Arc::new(MemoryVectorStore::new());
        let sink = ProfileSink::new(store.clone());

        assert!(sink.save("alice-novel1", &[shedinn(), aass_nag()], "g", "novel1").await);
        assert_eq!(store.count("alice-novel1"), 2);
        assert_eq!(store.add_calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_save_makes_no_call() {
        let store = Arc::new(MemoryVectorStore::new());
        let sink = ProfileSink::new(store.clone());

        assert!(sink.save("c", &[], "g", "n").await);
        assert_eq!(store.add_calls(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_returns_false() {
        let sink = ProfileSink::new(Arc::new(FailingVectorStore));
        assert!(!sink.save("c", &[shedinn()], "g", "n").await);
    }
}
