//! Embedding provider trait for turning text into fixed-length vectors.

use async_trait::async_trait;

use crate::error::{RagError, Result};

/// A provider that generates vector embeddings from text input.
///
/// The same provider must be used at ingestion and query time so that query
/// vectors are comparable with the stored chunk vectors. The default
/// [`embed_batch`](EmbeddingProvider::embed_batch) calls
/// [`embed`](EmbeddingProvider::embed) sequentially; backends with a native
/// batch endpoint should override it.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs, in input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Short provider name used in errors and logs.
    fn name(&self) -> &str {
        "embedding"
    }
}

/// Reject vectors that cannot be compared with stored embeddings.
pub fn check_dimensions(provider: &dyn EmbeddingProvider, vector: &[f32]) -> Result<()> {
    let expected = provider.dimensions();
    if vector.is_empty() || vector.len() != expected {
        return Err(RagError::EmbeddingError {
            provider: provider.name().to_string(),
            message: format!("expected {expected} dimensions, got {}", vector.len()),
        });
    }
    if vector.iter().any(|v| !v.is_finite()) {
        return Err(RagError::EmbeddingError {
            provider: provider.name().to_string(),
            message: "vector contains non-finite values".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(usize);

    #[async_trait]
    impl EmbeddingProvider for Fixed {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.5; self.0])
        }

        fn dimensions(&self) -> usize {
            self.0
        }
    }

    #[test]
    fn rejects_wrong_length_and_nan() {
        let provider = Fixed(3);
        assert!(check_dimensions(&provider, &[0.1, 0.2, 0.3]).is_ok());
        assert!(check_dimensions(&provider, &[]).is_err());
        assert!(check_dimensions(&provider, &[0.1, 0.2]).is_err());
        assert!(check_dimensions(&provider, &[0.1, f32::NAN, 0.3]).is_err());
    }

    #[tokio::test]
    async fn default_batch_preserves_order_and_length() {
        let provider = Fixed(2);
        let out = provider.embed_batch(&["a", "b", "c"]).await.unwrap();
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|v| v.len() == 2));
    }
}
