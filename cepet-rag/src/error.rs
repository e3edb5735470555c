//! Error types for the `cepet-rag` crate.

use thiserror::Error;

/// Errors that can occur while ingesting or querying the document corpus.
#[derive(Debug, Error)]
pub enum RagError {
    /// The vector store could not be reached or a connection could not be checked out.
    #[error("Connection error ({backend}): {message}")]
    ConnectionError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A query or insert against the vector store failed.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The embedding provider failed or returned a malformed vector.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The language model invocation failed.
    #[error("Generation error ({provider}): {message}")]
    GenerationError {
        /// The language model provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A manifest entry is malformed or required metadata is missing.
    #[error("Data integrity error: {0}")]
    DataIntegrityError(String),

    /// A source document could not be loaded.
    #[error("Failed to load '{locator}': {message}")]
    LoadError {
        /// The file locator of the document.
        locator: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A document failed during an ingestion run; the whole run was rolled back.
    #[error("Ingestion of document '{title}' failed: {source}")]
    Ingestion {
        /// Title of the document that failed.
        title: String,
        /// The underlying failure.
        #[source]
        source: Box<RagError>,
    },
}

impl RagError {
    /// Wrap this error with the title of the document being ingested.
    pub fn for_document(self, title: impl Into<String>) -> Self {
        RagError::Ingestion { title: title.into(), source: Box::new(self) }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingestion_error_names_document_and_cause() {
        let err = RagError::EmbeddingError {
            provider: "OpenAI".into(),
            message: "API returned 500".into(),
        }
        .for_document("Decreto 5");

        let rendered = err.to_string();
        assert!(rendered.contains("Decreto 5"));
        assert!(rendered.contains("API returned 500"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
