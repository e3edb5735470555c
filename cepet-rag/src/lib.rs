//! Retrieval-augmented question answering over Chilean official documents.
//!
//! This crate provides:
//! - Manifest parsing and all-or-nothing ingestion into a pgvector-backed corpus
//! - Query-time retrieval of the nearest chunks with normalized provenance
//! - Grounded answer generation and source citation rendering
//! - An in-memory store for development and tests
//!
//! Backends are feature-gated: `openai` enables [`OpenAIEmbeddingProvider`]
//! and [`OpenAIChatModel`], `pgvector` enables [`PgVectorStore`]. Both are on
//! by default.

pub mod chunking;
pub mod config;
pub mod context;
pub mod document;
pub mod embedding;
pub mod error;
pub mod formatter;
pub mod generator;
pub mod ingest;
pub mod inmemory;
pub mod llm;
pub mod loader;
pub mod manifest;
#[cfg(feature = "openai")]
pub mod openai;
#[cfg(feature = "pgvector")]
pub mod pgvector;
pub mod pipeline;
pub mod retriever;
pub mod vectorstore;

pub use chunking::{Chunker, RecursiveChunker};
pub use config::{DatabaseConfig, RagConfig, RagConfigBuilder};
pub use context::{AssembledContext, NO_DOCUMENTS_CONTEXT, assemble};
pub use document::{
    Association, Dimension, DimensionRecord, NewChunk, RetrievedDocument, ScoredRow,
    SourceDocumentSpec, SourceMetadata, StoredChunk, UNKNOWN,
};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use formatter::format_response;
pub use generator::{APOLOGY, AnswerGenerator, PromptTemplate, REFUSAL_SENTENCE};
pub use ingest::{IngestReport, Ingestor};
pub use inmemory::InMemoryVectorStore;
pub use llm::LanguageModel;
pub use loader::{DocumentLoader, FileLoader};
pub use manifest::{load_manifest, parse_manifest};
#[cfg(feature = "openai")]
pub use openai::{OpenAIChatModel, OpenAIEmbeddingProvider};
#[cfg(feature = "pgvector")]
pub use pgvector::PgVectorStore;
pub use pipeline::{RagAnswer, RagChain, RagChainBuilder};
pub use retriever::Retriever;
pub use vectorstore::{IngestStore, IngestTransaction, VectorStore};
