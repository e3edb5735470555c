//! Rendering retrieved chunks into the context block handed to the model.

use std::fmt::Write;

use crate::document::{RetrievedDocument, SourceMetadata};

/// Context used when retrieval produced nothing.
pub const NO_DOCUMENTS_CONTEXT: &str = "No se encontraron documentos relevantes.";

/// The prompt context and the provenance of every chunk in it.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledContext {
    /// Text inserted into the prompt.
    pub context: String,
    /// One entry per retrieved document, in retrieval order.
    pub sources: Vec<SourceMetadata>,
}

impl AssembledContext {
    /// `true` if no document contributed to the context.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Render documents into delimited excerpts, preserving their order.
pub fn assemble(documents: &[RetrievedDocument]) -> AssembledContext {
    if documents.is_empty() {
        return AssembledContext { context: NO_DOCUMENTS_CONTEXT.to_string(), sources: Vec::new() };
    }

    let mut context = String::new();
    for doc in documents {
        let _ = write!(
            context,
            "\n---\nExtracto de: {}\nArchivo: {}\nTexto: {}\n",
            doc.title, doc.source_locator, doc.body_text
        );
    }
    context.push_str("\n---\n");

    let sources = documents.iter().map(RetrievedDocument::source_metadata).collect();
    AssembledContext { context, sources }
}
