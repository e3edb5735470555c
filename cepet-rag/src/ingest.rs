//! Chunk ingestion: load → split → embed → store, all-or-nothing.
//!
//! One [`Ingestor::ingest`] call is one run. Every write of the run goes
//! through a single [`IngestTransaction`]; the first failing document aborts
//! the run and nothing it wrote is kept.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::chunking::{Chunker, RecursiveChunker};
use crate::config::RagConfig;
use crate::document::{Association, Dimension, NewChunk, SourceDocumentSpec};
use crate::embedding::{EmbeddingProvider, check_dimensions};
use crate::error::{RagError, Result};
use crate::loader::DocumentLoader;
use crate::vectorstore::{IngestStore, IngestTransaction};

/// Counts of what one ingestion run wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Documents processed.
    pub documents: usize,
    /// Chunk rows inserted.
    pub chunks: usize,
    /// Chunk-category pairs inserted.
    pub category_links: usize,
    /// Chunk-theme pairs inserted.
    pub theme_links: usize,
}

/// Writes source documents into the store as embedded, linked chunks.
pub struct Ingestor {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn IngestStore>,
    loader: Arc<dyn DocumentLoader>,
    chunker: Arc<dyn Chunker>,
}

impl Ingestor {
    /// Create an ingestor that splits with a [`RecursiveChunker`] sized from `config`.
    pub fn new(
        config: &RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn IngestStore>,
        loader: Arc<dyn DocumentLoader>,
    ) -> Self {
        let chunker = Arc::new(RecursiveChunker::new(config.chunk_size, config.chunk_overlap));
        Self { embedder, store, loader, chunker }
    }

    /// Replace the chunking strategy.
    pub fn with_chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = chunker;
        self
    }

    /// Empty every table and restart id sequences. Run before a full rebuild.
    pub async fn reset(&self) -> Result<()> {
        self.store.truncate_all().await?;
        info!("cleared existing corpus");
        Ok(())
    }

    /// Ingest `specs` in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Ingestion`] naming the first document that failed,
    /// after rolling back every write of the run. Errors opening or
    /// committing the transaction are returned as-is.
    pub async fn ingest(&self, specs: &[SourceDocumentSpec]) -> Result<IngestReport> {
        let mut tx = self.store.begin().await?;
        let mut report = IngestReport::default();

        for spec in specs {
            let outcome = self.ingest_document(tx.as_mut(), spec, &mut report).await;
            if let Err(e) = outcome {
                error!(document.title = %spec.title, error = %e, "ingestion failed, rolling back");
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(
                        error = %rollback_err,
                        "rollback failed; the transaction is discarded on drop"
                    );
                }
                return Err(e.for_document(&spec.title));
            }
        }

        tx.commit().await?;
        info!(
            documents = report.documents,
            chunks = report.chunks,
            category_links = report.category_links,
            theme_links = report.theme_links,
            "ingestion committed"
        );
        Ok(report)
    }

    async fn ingest_document(
        &self,
        tx: &mut dyn IngestTransaction,
        spec: &SourceDocumentSpec,
        report: &mut IngestReport,
    ) -> Result<()> {
        validate(spec)?;

        let type_id = tx.get_or_create(Dimension::Type, &spec.type_name).await?;
        let issuer_id = tx.get_or_create(Dimension::Issuer, &spec.issuer_name).await?;
        let mut category_ids = Vec::with_capacity(spec.categories.len());
        for name in &spec.categories {
            category_ids.push(tx.get_or_create(Dimension::Category, name).await?);
        }
        let mut theme_ids = Vec::with_capacity(spec.themes.len());
        for name in &spec.themes {
            theme_ids.push(tx.get_or_create(Dimension::Theme, name).await?);
        }

        let text = self.loader.load(&spec.locator).await?;
        let bodies = self.chunker.split(&text);
        report.documents += 1;
        if bodies.is_empty() {
            warn!(
                document.title = %spec.title,
                locator = %spec.locator,
                "document has no text, skipping chunks"
            );
            return Ok(());
        }

        let texts: Vec<&str> = bodies.iter().map(String::as_str).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != bodies.len() {
            return Err(RagError::EmbeddingError {
                provider: self.embedder.name().to_string(),
                message: format!("expected {} embeddings, got {}", bodies.len(), embeddings.len()),
            });
        }
        for embedding in &embeddings {
            check_dimensions(self.embedder.as_ref(), embedding)?;
        }

        let chunks: Vec<NewChunk> = bodies
            .into_iter()
            .zip(embeddings)
            .map(|(body_text, embedding)| NewChunk {
                title: spec.title.clone(),
                date: Some(spec.date),
                type_id,
                body_text,
                source_locator: spec.locator.clone(),
                issuer_id,
                embedding,
            })
            .collect();

        let chunk_ids = tx.insert_chunks(&chunks).await?;
        if chunk_ids.len() != chunks.len() {
            return Err(RagError::DataIntegrityError(format!(
                "inserted {} chunks but received {} ids",
                chunks.len(),
                chunk_ids.len()
            )));
        }

        let category_pairs = cross(&chunk_ids, &category_ids);
        let theme_pairs = cross(&chunk_ids, &theme_ids);
        tx.link(Association::Category, &category_pairs).await?;
        tx.link(Association::Theme, &theme_pairs).await?;

        report.chunks += chunk_ids.len();
        report.category_links += category_pairs.len();
        report.theme_links += theme_pairs.len();
        debug!(
            document.title = %spec.title,
            chunk_count = chunk_ids.len(),
            categories = category_ids.len(),
            themes = theme_ids.len(),
            "ingested document"
        );
        Ok(())
    }
}

fn validate(spec: &SourceDocumentSpec) -> Result<()> {
    let fields = [
        ("title", &spec.title),
        ("type", &spec.type_name),
        ("issuer", &spec.issuer_name),
        ("locator", &spec.locator),
    ];
    for (field, value) in fields {
        if value.trim().is_empty() {
            return Err(RagError::DataIntegrityError(format!("missing {field}")));
        }
    }
    if spec.categories.iter().chain(&spec.themes).any(|name| name.trim().is_empty()) {
        return Err(RagError::DataIntegrityError("empty category or theme name".to_string()));
    }
    Ok(())
}

fn cross(chunk_ids: &[i64], dimension_ids: &[i64]) -> Vec<(i64, i64)> {
    chunk_ids.iter().flat_map(|c| dimension_ids.iter().map(move |d| (*c, *d))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_pairs_every_chunk_with_every_dimension() {
        assert_eq!(cross(&[1, 2], &[7, 8]), vec![(1, 7), (1, 8), (2, 7), (2, 8)]);
        assert!(cross(&[1, 2], &[]).is_empty());
    }

    #[test]
    fn blank_fields_fail_validation() {
        let spec = SourceDocumentSpec {
            title: "Decreto 5".into(),
            date: chrono::NaiveDate::from_ymd_opt(2021, 3, 15).unwrap(),
            type_name: "Decreto".into(),
            issuer_name: " ".into(),
            categories: vec![],
            themes: vec![],
            locator: "docs/d5.txt".into(),
        };
        assert!(matches!(validate(&spec), Err(RagError::DataIntegrityError(_))));
    }
}
