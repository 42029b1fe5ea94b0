//! Text embeddings for vector stores that do not embed on their own.

use async_trait::async_trait;

use crate::error::{MinerError, Result};

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed one text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed many texts, one vector per text in input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}

/// Fail unless there is one vector per input.
pub fn check_batch(inputs: usize, vectors: &[Vec<f32>]) -> Result<()> {
    if vectors.len() != inputs {
        return Err(MinerError::Parse(format!(
            "embedder returned {} vectors for {} inputs",
            vectors.len(),
            inputs
        )));
    }
    Ok(())
}
