//! Vector store contracts.
//!
//! The query path only needs [`VectorStore::nearest`]. The ingestion path
//! works through an [`IngestTransaction`] obtained from
//! [`IngestStore::begin`]: every write of one ingestion run goes through the
//! same transaction, which is committed once at the end. Dropping a
//! transaction without committing discards its writes.

use async_trait::async_trait;

use crate::document::{Association, Dimension, NewChunk, ScoredRow};
use crate::error::Result;

/// Read-only nearest-neighbour search over stored chunks.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Return at most `top_k` chunks ordered by ascending distance to `embedding`.
    ///
    /// Implementations acquire a connection for the duration of the call and
    /// release it on every exit path.
    async fn nearest(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredRow>>;
}

/// Write access used by the ingestor.
#[async_trait]
pub trait IngestStore: Send + Sync {
    /// Start the transaction that scopes one ingestion run.
    async fn begin(&self) -> Result<Box<dyn IngestTransaction>>;

    /// Remove every chunk, association and dimension row, restarting id sequences.
    async fn truncate_all(&self) -> Result<()>;
}

/// One all-or-nothing ingestion transaction.
#[async_trait]
pub trait IngestTransaction: Send {
    /// Return the id of the row named `name`, inserting it if absent.
    async fn get_or_create(&mut self, dimension: Dimension, name: &str) -> Result<i64>;

    /// Insert chunks and return their generated ids in insertion order.
    async fn insert_chunks(&mut self, chunks: &[NewChunk]) -> Result<Vec<i64>>;

    /// Insert `(chunk_id, dimension_id)` links. Existing links are left untouched.
    async fn link(&mut self, association: Association, pairs: &[(i64, i64)]) -> Result<()>;

    /// Make every write of this transaction visible.
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discard every write of this transaction.
    async fn rollback(self: Box<Self>) -> Result<()>;
}
