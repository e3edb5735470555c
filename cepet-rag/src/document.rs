//! Data types for source documents, stored chunks, metadata dimensions and
//! query-time retrieval results.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Placeholder shown when a retrieved row carries no date or locator.
pub const UNKNOWN: &str = "N/A";

/// A validated manifest entry describing one source document to ingest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceDocumentSpec {
    /// Official title, e.g. `Decreto 5`.
    pub title: String,
    /// Publication date.
    pub date: NaiveDate,
    /// Document type name (`Decreto`, `Ley`, ...).
    pub type_name: String,
    /// Issuing body name.
    pub issuer_name: String,
    /// Category names the document belongs to.
    pub categories: Vec<String>,
    /// Theme names the document covers.
    pub themes: Vec<String>,
    /// File locator as stored in the `url` column, e.g. `docs/decreto_5.pdf`.
    pub locator: String,
}

/// A categorical metadata table, deduplicated by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dimension {
    /// `tipos`
    Type,
    /// `emisores`
    Issuer,
    /// `categorias`
    Category,
    /// `temas`
    Theme,
}

impl Dimension {
    /// All dimensions, in table-creation order.
    pub const ALL: [Dimension; 4] =
        [Dimension::Type, Dimension::Issuer, Dimension::Category, Dimension::Theme];

    /// Table name in the relational schema.
    pub fn table(self) -> &'static str {
        match self {
            Dimension::Type => "tipos",
            Dimension::Issuer => "emisores",
            Dimension::Category => "categorias",
            Dimension::Theme => "temas",
        }
    }

    /// Primary key column.
    pub fn id_column(self) -> &'static str {
        match self {
            Dimension::Type => "id_tipo",
            Dimension::Issuer => "id_emisor",
            Dimension::Category => "id_categoria",
            Dimension::Theme => "id_tema",
        }
    }

    /// Name column, unique within the table.
    pub fn name_column(self) -> &'static str {
        match self {
            Dimension::Type => "nombre_tipo",
            Dimension::Issuer => "nombre_emisor",
            Dimension::Category => "nombre_categoria",
            Dimension::Theme => "nombre_tema",
        }
    }
}

/// A row of a [`Dimension`] table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionRecord {
    /// Generated identifier.
    pub id: i64,
    /// Unique name.
    pub name: String,
}

/// Which association table a chunk link goes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Association {
    /// `documento_categoria`
    Category,
    /// `documento_tema`
    Theme,
}

impl Association {
    /// Join table name.
    pub fn table(self) -> &'static str {
        match self {
            Association::Category => "documento_categoria",
            Association::Theme => "documento_tema",
        }
    }

    /// Foreign key column pointing at the dimension table.
    pub fn dimension_column(self) -> &'static str {
        match self {
            Association::Category => "categoria_id",
            Association::Theme => "tema_id",
        }
    }

    /// The dimension table referenced by this association.
    pub fn dimension(self) -> Dimension {
        match self {
            Association::Category => Dimension::Category,
            Association::Theme => Dimension::Theme,
        }
    }
}

/// A chunk ready to be written by the ingestor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewChunk {
    /// Title of the parent document.
    pub title: String,
    /// Date of the parent document.
    pub date: Option<NaiveDate>,
    /// Id in the `tipos` table.
    pub type_id: i64,
    /// The chunk text.
    pub body_text: String,
    /// Locator of the parent document file.
    pub source_locator: String,
    /// Id in the `emisores` table.
    pub issuer_id: i64,
    /// Embedding of `body_text`.
    pub embedding: Vec<f32>,
}

/// A persisted chunk row, as held by the in-memory backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredChunk {
    /// Generated identifier.
    pub id: i64,
    /// The inserted payload.
    #[serde(flatten)]
    pub chunk: NewChunk,
}

/// A raw nearest-neighbour row returned by a [`VectorStore`](crate::VectorStore).
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRow {
    /// Chunk text.
    pub body_text: String,
    /// Parent document title.
    pub title: String,
    /// Raw stored locator, if any.
    pub source_locator: Option<String>,
    /// Parent document date, if any.
    pub date: Option<NaiveDate>,
    /// Vector distance to the query embedding (smaller is closer).
    pub distance: f64,
}

/// A chunk retrieved for one query, with normalized provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    /// Chunk text.
    pub body_text: String,
    /// Parent document title.
    pub title: String,
    /// Locator with the storage prefix removed, or [`UNKNOWN`].
    pub source_locator: String,
    /// ISO date, or [`UNKNOWN`].
    pub date: String,
    /// `1 - distance`; higher is more relevant.
    pub similarity_score: f64,
}

impl RetrievedDocument {
    /// Metadata record used for citations.
    pub fn source_metadata(&self) -> SourceMetadata {
        SourceMetadata {
            title: self.title.clone(),
            source_locator: self.source_locator.clone(),
            date: self.date.clone(),
            similarity_score: self.similarity_score,
        }
    }
}

/// Provenance of one retrieved chunk, carried alongside the answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Parent document title.
    pub title: String,
    /// Normalized locator.
    pub source_locator: String,
    /// ISO date, or [`UNKNOWN`].
    pub date: String,
    /// Similarity score of the chunk.
    pub similarity_score: f64,
}

impl SourceMetadata {
    /// Build a record with only the citation fields filled in.
    pub fn new(title: impl Into<String>, source_locator: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source_locator: source_locator.into(),
            date: UNKNOWN.to_string(),
            similarity_score: 0.0,
        }
    }
}
