//! End-to-end questions through `RagChain`.

mod common;

use std::sync::Arc;

use cepet_rag::{
    InMemoryVectorStore, Ingestor, NO_DOCUMENTS_CONTEXT, RagChain, RagConfig, RecursiveChunker,
    REFUSAL_SENTENCE,
};
use common::{HashEmbedder, MapLoader, ScriptedModel, THREE_PARAGRAPHS, spec};

const EMPTY_SOURCES_BULLET: &str = "- *No se recuperaron fuentes específicas del contexto.*";

fn chain(store: Arc<InMemoryVectorStore>, model: Arc<ScriptedModel>) -> RagChain {
    RagChain::builder()
        .config(RagConfig::default())
        .embedding_provider(Arc::new(HashEmbedder))
        .vector_store(store)
        .language_model(model)
        .build()
        .unwrap()
}

async fn populated_store() -> Arc<InMemoryVectorStore> {
    let store = Arc::new(InMemoryVectorStore::new());
    let loader = MapLoader::default()
        .with("docs/decreto_5.txt", THREE_PARAGRAPHS)
        .with("docs/ley_10.txt", "La ley regula las becas de estudio.");
    Ingestor::new(&RagConfig::default(), Arc::new(HashEmbedder), store.clone(), Arc::new(loader))
        .with_chunker(Arc::new(RecursiveChunker::new(50, 0)))
        .ingest(&[
            spec("Decreto 5", "Ministerio de Educación", "docs/decreto_5.txt"),
            spec("Ley 10", "Congreso Nacional", "docs/ley_10.txt"),
        ])
        .await
        .unwrap();
    store
}

#[tokio::test]
async fn empty_store_refuses_and_cites_nothing() {
    let model = Arc::new(ScriptedModel::new("irrelevante"));
    let rag = chain(Arc::new(InMemoryVectorStore::new()), model.clone());
    let answer = rag.ask("¿Qué es CEPET?").await;

    assert_eq!(answer.answer, REFUSAL_SENTENCE);
    assert!(answer.sources.is_empty());
    assert!(answer.notices.is_empty());

    let display = answer.display();
    assert!(display.starts_with(REFUSAL_SENTENCE));
    assert!(display.contains(EMPTY_SOURCES_BULLET));
    assert!(model.prompts()[0].contains(NO_DOCUMENTS_CONTEXT));
}

#[tokio::test]
async fn unreachable_store_adds_a_notice() {
    let store = populated_store().await;
    store.set_offline(true);
    let rag = chain(store, Arc::new(ScriptedModel::new("irrelevante")));
    let answer = rag.ask("¿Qué es CEPET?").await;

    assert_eq!(answer.answer, REFUSAL_SENTENCE);
    assert_eq!(answer.notices.len(), 1);
    assert!(answer.notices[0].starts_with("No se pudo consultar la base de datos"));
    assert!(answer.display().contains(EMPTY_SOURCES_BULLET));
}

#[tokio::test]
async fn answer_cites_retrieved_sources() {
    let model = Arc::new(ScriptedModel::new("El CEPET forma técnicos."));
    let answer = chain(populated_store().await, model.clone()).ask("¿Qué es el CEPET?").await;

    assert_eq!(answer.answer, "El CEPET forma técnicos.");
    assert_eq!(answer.sources.len(), 4);
    assert!(answer.display().contains("- Decreto 5 (Archivo: decreto_5.txt)"));

    let prompt = &model.prompts()[0];
    assert!(prompt.contains("Extracto de: Decreto 5\nArchivo: decreto_5.txt\n"));
    assert!(prompt.contains("Pregunta:\n¿Qué es el CEPET?\n"));
}

#[tokio::test]
async fn top_k_override_limits_context() {
    let chain = chain(populated_store().await, Arc::new(ScriptedModel::new("ok")));
    assert_eq!(chain.ask_with_top_k("becas", 1).await.sources.len(), 1);

    let context = chain.context_for("becas", 2).await;
    assert_eq!(context.sources.len(), 2);
    assert!(context.context.ends_with("\n---\n"));
}

#[tokio::test]
async fn chain_is_shared_across_tasks() {
    let chain = Arc::new(chain(populated_store().await, Arc::new(ScriptedModel::new("ok"))));
    let handles: Vec<_> = ["¿Qué es CEPET?", "becas", "matrícula"]
        .into_iter()
        .map(|question| {
            let chain = Arc::clone(&chain);
            tokio::spawn(async move { chain.ask(question).await })
        })
        .collect();

    for handle in handles {
        let answer = handle.await.unwrap();
        assert_eq!(answer.answer, "ok");
        assert!(answer.sources.len() <= 5);
    }
}
