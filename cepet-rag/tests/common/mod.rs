//! Deterministic stand-ins for the network-backed components.

#![allow(dead_code)]

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

use async_trait::async_trait;
use cepet_rag::{
    DocumentLoader, EmbeddingProvider, LanguageModel, NO_DOCUMENTS_CONTEXT, REFUSAL_SENTENCE,
    RagError, Result, SourceDocumentSpec,
};
use chrono::NaiveDate;

pub const DIM: usize = 16;

/// Bag-of-words embedder: each lowercase word bumps one hashed component.
pub struct HashEmbedder;

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; DIM];
        for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            vector[(hasher.finish() % DIM as u64) as usize] += 1.0;
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        DIM
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// Returns the same vector for every input.
pub struct FixedEmbedder(pub Vec<f32>);

#[async_trait]
impl EmbeddingProvider for FixedEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(self.0.clone())
    }

    fn dimensions(&self) -> usize {
        self.0.len()
    }
}

/// Always fails, as an unreachable embedding API would.
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::EmbeddingError {
            provider: "failing".into(),
            message: "API returned 503".into(),
        })
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// Refuses when the context is empty, otherwise replies with a fixed answer.
/// Records every prompt it receives.
pub struct ScriptedModel {
    pub answer: String,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(answer: &str) -> Self {
        Self { answer: answer.to_string(), prompts: Mutex::new(Vec::new()) }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if prompt.contains(NO_DOCUMENTS_CONTEXT) {
            return Ok(format!("{REFUSAL_SENTENCE}\n"));
        }
        Ok(format!(" {} ", self.answer))
    }
}

/// Serves document text from memory; unknown locators fail to load.
#[derive(Default)]
pub struct MapLoader {
    texts: HashMap<String, String>,
}

impl MapLoader {
    pub fn with(mut self, locator: &str, text: &str) -> Self {
        self.texts.insert(locator.to_string(), text.to_string());
        self
    }
}

#[async_trait]
impl DocumentLoader for MapLoader {
    async fn load(&self, locator: &str) -> Result<String> {
        self.texts.get(locator).cloned().ok_or_else(|| RagError::LoadError {
            locator: locator.to_string(),
            message: "no such document".to_string(),
        })
    }
}

pub fn spec(title: &str, issuer: &str, locator: &str) -> SourceDocumentSpec {
    SourceDocumentSpec {
        title: title.to_string(),
        date: NaiveDate::from_ymd_opt(2021, 3, 15).unwrap(),
        type_name: "Decreto".to_string(),
        issuer_name: issuer.to_string(),
        categories: vec!["Educación".to_string(), "Formación técnica".to_string()],
        themes: vec!["CEPET".to_string()],
        locator: locator.to_string(),
    }
}

/// Three paragraphs that a 50-character splitter keeps apart.
pub const THREE_PARAGRAPHS: &str = "El CEPET forma técnicos en Chile.\n\n\
     Los cursos duran dos semestres.\n\n\
     La matrícula es gratuita.";
