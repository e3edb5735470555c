//! Grounded answer generation.

use std::sync::Arc;

use tracing::{debug, error};

use crate::error::{RagError, Result};
use crate::llm::LanguageModel;

/// Exact reply the model is told to give when the context lacks the answer.
pub const REFUSAL_SENTENCE: &str = "No tengo información sobre eso en los documentos consultados";

/// Shown instead of an answer when the model call fails.
pub const APOLOGY: &str = "Lo siento, ocurrió un error al procesar tu pregunta.";

const DEFAULT_TEMPLATE: &str = "
Eres un asistente experto en documentos oficiales chilenos.
Responde la pregunta del usuario basándote únicamente en el siguiente contexto extraído \
de la base de datos.
Si la información no se encuentra en el contexto, di \
\"No tengo información sobre eso en los documentos consultados\".
Al final de tu respuesta, cita SOLO la fuente o fuentes DIRECTAMENTE usadas para la respuesta \
(título y archivo).

Contexto:
{context}

Pregunta:
{question}

Respuesta concisa y directa:
";

const CONTEXT_SLOT: &str = "{context}";
const QUESTION_SLOT: &str = "{question}";

/// A prompt with `{context}` and `{question}` slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self { template: DEFAULT_TEMPLATE.to_string() }
    }
}

impl PromptTemplate {
    /// Use a custom template.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if either slot is missing.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        for slot in [CONTEXT_SLOT, QUESTION_SLOT] {
            if !template.contains(slot) {
                return Err(RagError::ConfigError(format!("prompt template has no {slot} slot")));
            }
        }
        Ok(Self { template })
    }

    /// Fill both slots in a single pass; substituted text is never rescanned.
    pub fn render(&self, context: &str, question: &str) -> String {
        let mut out = String::with_capacity(self.template.len() + context.len() + question.len());
        let mut rest = self.template.as_str();
        loop {
            let next = [(CONTEXT_SLOT, context), (QUESTION_SLOT, question)]
                .into_iter()
                .filter_map(|(slot, value)| rest.find(slot).map(|pos| (pos, slot, value)))
                .min_by_key(|(pos, _, _)| *pos);
            let Some((pos, slot, value)) = next else { break };
            out.push_str(&rest[..pos]);
            out.push_str(value);
            rest = &rest[pos + slot.len()..];
        }
        out.push_str(rest);
        out
    }
}

/// Asks the language model to answer from the assembled context only.
pub struct AnswerGenerator {
    llm: Arc<dyn LanguageModel>,
    template: PromptTemplate,
}

impl AnswerGenerator {
    /// Create a generator with the default grounding prompt.
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm, template: PromptTemplate::default() }
    }

    /// Replace the prompt template.
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    /// The template in use.
    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// Generate the answer text. Never fails: model errors become [`APOLOGY`].
    pub async fn generate(&self, context: &str, question: &str) -> String {
        match self.try_generate(context, question).await {
            Ok(answer) => answer,
            Err(e) => {
                error!(model = self.llm.name(), error = %e, "answer generation failed");
                APOLOGY.to_string()
            }
        }
    }

    /// Like [`generate`](Self::generate), but reports model failures.
    pub async fn try_generate(&self, context: &str, question: &str) -> Result<String> {
        let prompt = self.template.render(context, question);
        debug!(model = self.llm.name(), prompt_chars = prompt.chars().count(), "invoking model");
        let reply = self.llm.complete(&prompt).await?;
        Ok(reply.trim().to_string())
    }
}
