//! Query-time retrieval of the chunks nearest to a question.

use std::sync::Arc;

use tracing::{debug, error};

use crate::document::{RetrievedDocument, ScoredRow, UNKNOWN};
use crate::embedding::{EmbeddingProvider, check_dimensions};
use crate::error::Result;
use crate::vectorstore::VectorStore;

/// Embeds a question and fetches the `k` closest stored chunks.
///
/// The retriever never changes the store. Each search checks out its own
/// connection, so one retriever can serve concurrent questions.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    locator_prefix: String,
}

impl Retriever {
    /// Create a retriever that strips `locator_prefix` from stored locators.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        locator_prefix: impl Into<String>,
    ) -> Self {
        Self { embedder, store, locator_prefix: locator_prefix.into() }
    }

    /// Return at most `k` documents ordered by ascending distance.
    ///
    /// Failures are logged and yield an empty list; use
    /// [`try_retrieve`](Self::try_retrieve) to observe them.
    pub async fn retrieve(&self, query: &str, k: usize) -> Vec<RetrievedDocument> {
        match self.try_retrieve(query, k).await {
            Ok(documents) => documents,
            Err(e) => {
                error!(error = %e, "retrieval failed, continuing without documents");
                Vec::new()
            }
        }
    }

    /// Like [`retrieve`](Self::retrieve), but reports failures.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`](crate::RagError::EmbeddingError)
    /// when the query cannot be embedded, and the store's connection or
    /// query error when the search fails.
    pub async fn try_retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedDocument>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed(query).await?;
        check_dimensions(self.embedder.as_ref(), &embedding)?;

        let mut rows = self.store.nearest(&embedding, k).await?;
        rows.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        rows.truncate(k);

        let documents: Vec<RetrievedDocument> =
            rows.into_iter().map(|row| self.to_document(row)).collect();
        debug!(k, result_count = documents.len(), "retrieved documents");
        Ok(documents)
    }

    fn to_document(&self, row: ScoredRow) -> RetrievedDocument {
        let source_locator = match row.source_locator {
            Some(locator) => normalize_locator(&locator, &self.locator_prefix),
            None => UNKNOWN.to_string(),
        };
        let date =
            row.date.map_or_else(|| UNKNOWN.to_string(), |d| d.format("%Y-%m-%d").to_string());
        RetrievedDocument {
            body_text: row.body_text,
            title: row.title,
            source_locator,
            date,
            similarity_score: 1.0 - row.distance,
        }
    }
}

/// Remove every occurrence of `prefix` from `locator`.
fn normalize_locator(locator: &str, prefix: &str) -> String {
    if prefix.is_empty() { locator.to_string() } else { locator.replace(prefix, "") }
}
