//! Question answering orchestrator.
//!
//! The [`RagChain`] runs the query stages in a fixed order: retrieve the
//! nearest chunks, assemble them into a context, ask the model for a grounded
//! answer. Each stage's output is passed explicitly to the next; the chain
//! holds no per-question state and can be shared across tasks behind an `Arc`.
//!
//! # Example
//!
//! ```rust,ignore
//! use cepet_rag::{RagChain, RagConfig, InMemoryVectorStore};
//!
//! let chain = RagChain::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .language_model(Arc::new(model))
//!     .build()?;
//!
//! let answer = chain.ask("¿Qué es CEPET?").await;
//! println!("{}", answer.display());
//! ```

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use crate::config::RagConfig;
use crate::context::{AssembledContext, assemble};
use crate::document::SourceMetadata;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::formatter::format_response;
use crate::generator::{AnswerGenerator, PromptTemplate};
use crate::llm::LanguageModel;
use crate::retriever::Retriever;
use crate::vectorstore::VectorStore;

/// The outcome of one question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RagAnswer {
    /// The question as asked.
    pub question: String,
    /// Model answer, the refusal sentence, or the apology.
    pub answer: String,
    /// Provenance of every chunk placed in the context.
    pub sources: Vec<SourceMetadata>,
    /// Non-fatal problems worth showing next to the answer.
    pub notices: Vec<String>,
}

impl RagAnswer {
    /// The answer followed by its deduplicated source list.
    pub fn display(&self) -> String {
        format_response(&self.answer, &self.sources)
    }
}

/// The query-side RAG chain. Construct one via [`RagChain::builder()`].
pub struct RagChain {
    config: RagConfig,
    retriever: Retriever,
    generator: AnswerGenerator,
}

impl RagChain {
    /// Create a new [`RagChainBuilder`].
    pub fn builder() -> RagChainBuilder {
        RagChainBuilder::default()
    }

    /// Return a reference to the chain configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the retriever.
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Answer `question` using the configured `top_k`.
    pub async fn ask(&self, question: &str) -> RagAnswer {
        self.ask_with_top_k(question, self.config.top_k).await
    }

    /// Answer `question` from at most `top_k` retrieved chunks.
    ///
    /// Never fails. A retrieval failure leaves the context empty and adds a
    /// notice; a model failure yields the apology text.
    pub async fn ask_with_top_k(&self, question: &str, top_k: usize) -> RagAnswer {
        let mut notices = Vec::new();
        let assembled = match self.try_context(question, top_k).await {
            Ok(assembled) => assembled,
            Err(e) => {
                error!(error = %e, "retrieval failed, answering without documents");
                notices.push(format!("No se pudo consultar la base de datos: {e}"));
                assemble(&[])
            }
        };

        let answer = self.generator.generate(&assembled.context, question).await;
        info!(source_count = assembled.sources.len(), notices = notices.len(), "question answered");

        RagAnswer { question: question.to_string(), answer, sources: assembled.sources, notices }
    }

    /// Retrieve and assemble the context for `question` without calling the model.
    ///
    /// Retrieval failures yield the empty-context sentinel.
    pub async fn context_for(&self, question: &str, top_k: usize) -> AssembledContext {
        assemble(&self.retriever.retrieve(question, top_k).await)
    }

    async fn try_context(&self, question: &str, top_k: usize) -> Result<AssembledContext> {
        let documents = self.retriever.try_retrieve(question, top_k).await?;
        Ok(assemble(&documents))
    }
}

/// Builder for constructing a [`RagChain`].
///
/// All fields except `config` and `prompt_template` are required.
#[derive(Default)]
pub struct RagChainBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    language_model: Option<Arc<dyn LanguageModel>>,
    prompt_template: Option<PromptTemplate>,
}

impl RagChainBuilder {
    /// Set the chain configuration. Defaults to [`RagConfig::default()`].
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider. Must match the one used at ingestion.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the language model.
    pub fn language_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.language_model = Some(model);
        self
    }

    /// Override the grounding prompt.
    pub fn prompt_template(mut self, template: PromptTemplate) -> Self {
        self.prompt_template = Some(template);
        self
    }

    /// Build the [`RagChain`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if any required field is missing.
    pub fn build(self) -> Result<RagChain> {
        let config = self.config.unwrap_or_default();
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;
        let language_model = self
            .language_model
            .ok_or_else(|| RagError::ConfigError("language_model is required".to_string()))?;

        let retriever =
            Retriever::new(embedding_provider, vector_store, config.locator_prefix.clone());
        let mut generator = AnswerGenerator::new(language_model);
        if let Some(template) = self.prompt_template {
            generator = generator.with_template(template);
        }

        Ok(RagChain { config, retriever, generator })
    }
}
