//! In-memory vector store using cosine distance.
//!
//! [`InMemoryVectorStore`] implements both [`VectorStore`] and
//! [`IngestStore`] on top of a snapshot protected by a `tokio::sync::RwLock`.
//! A transaction works on a private copy of the snapshot and swaps it in on
//! commit, so an abandoned run leaves the store exactly as it was. It is
//! suitable for development and tests; production uses
//! [`PgVectorStore`](crate::pgvector::PgVectorStore).

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::document::{Association, Dimension, DimensionRecord, NewChunk, ScoredRow, StoredChunk};
use crate::error::{RagError, Result};
use crate::vectorstore::{IngestStore, IngestTransaction, VectorStore};

const BACKEND: &str = "InMemory";

#[derive(Debug, Clone, Default)]
struct Snapshot {
    dimensions: BTreeMap<Dimension, Vec<DimensionRecord>>,
    chunks: Vec<StoredChunk>,
    links: BTreeMap<Association, BTreeSet<(i64, i64)>>,
}

impl Snapshot {
    fn next_chunk_id(&self) -> i64 {
        self.chunks.last().map_or(1, |c| c.id + 1)
    }
}

/// An in-memory store with cosine-distance search and staged transactions.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    state: Arc<RwLock<Snapshot>>,
    offline: AtomicBool,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the store being unreachable. While offline every operation
    /// fails with [`RagError::ConnectionError`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RagError::ConnectionError {
                backend: BACKEND.to_string(),
                message: "store is offline".to_string(),
            });
        }
        Ok(())
    }

    /// All committed chunk rows, in id order.
    pub async fn chunks(&self) -> Vec<StoredChunk> {
        self.state.read().await.chunks.clone()
    }

    /// All committed rows of one dimension table, in id order.
    pub async fn dimension_rows(&self, dimension: Dimension) -> Vec<DimensionRecord> {
        self.state.read().await.dimensions.get(&dimension).cloned().unwrap_or_default()
    }

    /// All committed `(chunk_id, dimension_id)` pairs of one association table.
    pub async fn links(&self, association: Association) -> Vec<(i64, i64)> {
        self.state
            .read()
            .await
            .links
            .get(&association)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }
}

/// Cosine distance `1 - cos(a, b)`. Returns 1.0 if either vector has zero magnitude.
fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum();
    let norm_a: f64 = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn nearest(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredRow>> {
        self.check_online()?;
        let state = self.state.read().await;

        let mut rows: Vec<ScoredRow> = state
            .chunks
            .iter()
            .map(|stored| ScoredRow {
                body_text: stored.chunk.body_text.clone(),
                title: stored.chunk.title.clone(),
                source_locator: Some(stored.chunk.source_locator.clone()),
                date: stored.chunk.date,
                distance: cosine_distance(&stored.chunk.embedding, embedding),
            })
            .collect();

        rows.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        rows.truncate(top_k);
        Ok(rows)
    }
}

#[async_trait]
impl IngestStore for InMemoryVectorStore {
    async fn begin(&self) -> Result<Box<dyn IngestTransaction>> {
        self.check_online()?;
        let staged = self.state.read().await.clone();
        Ok(Box::new(InMemoryTransaction { target: Arc::clone(&self.state), staged }))
    }

    async fn truncate_all(&self) -> Result<()> {
        self.check_online()?;
        *self.state.write().await = Snapshot::default();
        debug!(backend = BACKEND, "truncated all tables");
        Ok(())
    }
}

/// Staged writes of one ingestion run against an [`InMemoryVectorStore`].
struct InMemoryTransaction {
    target: Arc<RwLock<Snapshot>>,
    staged: Snapshot,
}

#[async_trait]
impl IngestTransaction for InMemoryTransaction {
    async fn get_or_create(&mut self, dimension: Dimension, name: &str) -> Result<i64> {
        let rows = self.staged.dimensions.entry(dimension).or_default();
        if let Some(existing) = rows.iter().find(|r| r.name == name) {
            return Ok(existing.id);
        }
        let id = rows.last().map_or(1, |r| r.id + 1);
        rows.push(DimensionRecord { id, name: name.to_string() });
        Ok(id)
    }

    async fn insert_chunks(&mut self, chunks: &[NewChunk]) -> Result<Vec<i64>> {
        let mut ids = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let id = self.staged.next_chunk_id();
            self.staged.chunks.push(StoredChunk { id, chunk: chunk.clone() });
            ids.push(id);
        }
        Ok(ids)
    }

    async fn link(&mut self, association: Association, pairs: &[(i64, i64)]) -> Result<()> {
        let dimension_ids: BTreeSet<i64> = self
            .staged
            .dimensions
            .get(&association.dimension())
            .map(|rows| rows.iter().map(|r| r.id).collect())
            .unwrap_or_default();

        for &(chunk_id, dimension_id) in pairs {
            let chunk_exists = self.staged.chunks.iter().any(|c| c.id == chunk_id);
            if !chunk_exists || !dimension_ids.contains(&dimension_id) {
                return Err(RagError::VectorStoreError {
                    backend: BACKEND.to_string(),
                    message: format!(
                        "foreign key violation on {}: ({chunk_id}, {dimension_id})",
                        association.table()
                    ),
                });
            }
        }

        self.staged.links.entry(association).or_default().extend(pairs.iter().copied());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let InMemoryTransaction { target, staged } = *self;
        *target.write().await = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(title: &str, embedding: Vec<f32>) -> NewChunk {
        NewChunk {
            title: title.to_string(),
            date: None,
            type_id: 1,
            body_text: format!("{title} body"),
            source_locator: format!("docs/{title}.pdf"),
            issuer_id: 1,
            embedding,
        }
    }

    #[test]
    fn cosine_distance_bounds() {
        assert!(cosine_distance(&[1.0, 0.0], &[1.0, 0.0]).abs() < 1e-9);
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-9);
        assert!((cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-9);
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
    }

    #[tokio::test]
    async fn uncommitted_writes_are_invisible() {
        let store = InMemoryVectorStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.get_or_create(Dimension::Issuer, "Ministerio de Educación").await.unwrap();
        tx.insert_chunks(&[chunk("a", vec![1.0, 0.0])]).await.unwrap();
        drop(tx);

        assert!(store.chunks().await.is_empty());
        assert!(store.dimension_rows(Dimension::Issuer).await.is_empty());
    }

    #[tokio::test]
    async fn get_or_create_is_idempotent_within_a_transaction() {
        let store = InMemoryVectorStore::new();
        let mut tx = store.begin().await.unwrap();
        let first = tx.get_or_create(Dimension::Category, "Educación").await.unwrap();
        let again = tx.get_or_create(Dimension::Category, "Educación").await.unwrap();
        let other = tx.get_or_create(Dimension::Category, "Salud").await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_eq!(store.dimension_rows(Dimension::Category).await.len(), 2);
    }

    #[tokio::test]
    async fn duplicate_links_are_ignored() {
        let store = InMemoryVectorStore::new();
        let mut tx = store.begin().await.unwrap();
        let theme = tx.get_or_create(Dimension::Theme, "Becas").await.unwrap();
        let ids = tx.insert_chunks(&[chunk("a", vec![1.0])]).await.unwrap();
        tx.link(Association::Theme, &[(ids[0], theme)]).await.unwrap();
        tx.link(Association::Theme, &[(ids[0], theme)]).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.links(Association::Theme).await, vec![(ids[0], theme)]);
    }

    #[tokio::test]
    async fn link_to_unknown_row_fails() {
        let store = InMemoryVectorStore::new();
        let mut tx = store.begin().await.unwrap();
        let err = tx.link(Association::Category, &[(42, 7)]).await.unwrap_err();
        assert!(matches!(err, RagError::VectorStoreError { .. }));
    }

    #[tokio::test]
    async fn nearest_orders_by_distance() {
        let store = InMemoryVectorStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_chunks(&[
            chunk("far", vec![0.0, 1.0]),
            chunk("near", vec![1.0, 0.1]),
            chunk("opposite", vec![-1.0, 0.0]),
        ])
        .await
        .unwrap();
        tx.commit().await.unwrap();

        let rows = store.nearest(&[1.0, 0.0], 2).await.unwrap();
        let titles: Vec<_> = rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["near", "far"]);
    }

    #[tokio::test]
    async fn offline_store_refuses_connections() {
        let store = InMemoryVectorStore::new();
        store.set_offline(true);
        assert!(matches!(
            store.nearest(&[1.0], 3).await,
            Err(RagError::ConnectionError { .. })
        ));
        assert!(store.begin().await.is_err());
    }
}
