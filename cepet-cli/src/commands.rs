//! Command implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use cepet_rag::{
    DatabaseConfig, EmbeddingProvider, FileLoader, Ingestor, LanguageModel, OpenAIChatModel,
    OpenAIEmbeddingProvider, PgVectorStore, RagAnswer, RagChain, RagConfig, load_manifest,
};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{info, warn};

use crate::cli::Settings;

const DEFAULT_DIMENSIONS: usize = 1536;

pub struct IngestOptions {
    pub manifest: PathBuf,
    pub base_dir: Option<PathBuf>,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub page_size: usize,
}

pub async fn ingest(settings: &Settings, options: IngestOptions) -> Result<()> {
    let config = RagConfig::builder()
        .chunk_size(options.chunk_size)
        .chunk_overlap(options.chunk_overlap)
        .locator_prefix(settings.locator_prefix.clone())
        .insert_page_size(options.page_size)
        .build()?;

    let specs = load_manifest(&options.manifest)
        .await
        .with_context(|| format!("failed to read manifest {}", options.manifest.display()))?;
    info!(documents = specs.len(), manifest = %options.manifest.display(), "manifest loaded");

    let base_dir = options.base_dir.unwrap_or_else(|| manifest_dir(&options.manifest));
    let store = Arc::new(connect(settings).await?.with_page_size(config.insert_page_size));
    let loader = Arc::new(FileLoader::new(base_dir));
    let ingestor = Ingestor::new(&config, Arc::new(embedder(settings)?), store, loader);

    warn!("clearing existing corpus before ingestion");
    ingestor.reset().await.context("failed to clear existing corpus")?;

    let report =
        ingestor.ingest(&specs).await.context("ingestion aborted, no documents were stored")?;
    println!(
        "Ingested {} documents: {} chunks, {} category links, {} theme links.",
        report.documents, report.chunks, report.category_links, report.theme_links
    );
    Ok(())
}

pub async fn ask(
    settings: &Settings,
    question: &str,
    top_k: usize,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let chain = build_chain(settings)?;

    if dry_run {
        let assembled = chain.context_for(question, top_k).await;
        println!("{}", assembled.context);
        return Ok(());
    }

    let answer = chain.ask_with_top_k(question, top_k).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
    } else {
        print_answer(&answer);
    }
    Ok(())
}

pub async fn chat(settings: &Settings, top_k: usize) -> Result<()> {
    let chain = build_chain(settings)?;
    let mut editor = DefaultEditor::new()?;
    let mut history: Vec<RagAnswer> = Vec::new();

    println!("¿Qué quieres saber sobre los documentos? (escribe 'salir' para terminar)");
    loop {
        let line = match editor.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let question = line.trim();
        match question {
            "" => continue,
            "salir" | "exit" => break,
            ":historial" => {
                for (i, past) in history.iter().enumerate() {
                    println!("{}. {}", i + 1, past.question);
                }
                continue;
            }
            _ => {}
        }
        let _ = editor.add_history_entry(question);

        let answer = chain.ask_with_top_k(question, top_k).await;
        print_answer(&answer);
        history.push(answer);
    }

    info!(questions = history.len(), "chat session ended");
    Ok(())
}

pub async fn schema(settings: &Settings) -> Result<()> {
    let dimensions = settings.embedding_dimensions.unwrap_or(DEFAULT_DIMENSIONS);
    let store = connect(settings).await?;
    store.ensure_schema(dimensions).await.context("failed to create schema")?;
    println!("Schema ready (vector({dimensions})).");
    Ok(())
}

fn print_answer(answer: &RagAnswer) {
    for notice in &answer.notices {
        println!("Aviso: {notice}");
    }
    println!("{}", answer.display());
}

fn build_chain(settings: &Settings) -> Result<RagChain> {
    let model =
        OpenAIChatModel::new(api_key(settings)?)?.with_model(settings.openai_model.clone());
    chain_with(settings, Arc::new(embedder(settings)?), Arc::new(model))
}

/// The query side never blocks on the database up front: a dead server
/// shows up as a notice on the answer.
fn chain_with(
    settings: &Settings,
    embedder: Arc<dyn EmbeddingProvider>,
    model: Arc<dyn LanguageModel>,
) -> Result<RagChain> {
    let config = RagConfig::builder().locator_prefix(settings.locator_prefix.clone()).build()?;
    let store = PgVectorStore::connect_lazy(&database_config(settings)?)
        .context("invalid database settings")?;

    Ok(RagChain::builder()
        .config(config)
        .embedding_provider(embedder)
        .vector_store(Arc::new(store))
        .language_model(model)
        .build()?)
}

async fn connect(settings: &Settings) -> Result<PgVectorStore> {
    let config = database_config(settings)?;
    PgVectorStore::connect(&config).await.context("failed to connect to the database")
}

fn database_config(settings: &Settings) -> Result<DatabaseConfig> {
    let config = match &settings.database_url {
        Some(url) if !url.trim().is_empty() => {
            DatabaseConfig { url: Some(url.clone()), ..DatabaseConfig::default() }
        }
        _ => DatabaseConfig::from_env().context("database is not configured")?,
    };
    Ok(DatabaseConfig { acquire_timeout_secs: settings.db_timeout, ..config })
}

fn embedder(settings: &Settings) -> Result<OpenAIEmbeddingProvider> {
    let provider = OpenAIEmbeddingProvider::new(api_key(settings)?)?
        .with_model(settings.embedding_model.clone());
    Ok(match settings.embedding_dimensions {
        Some(dimensions) => provider.with_dimensions(dimensions),
        None => provider,
    })
}

fn api_key(settings: &Settings) -> Result<String> {
    settings
        .openai_api_key
        .clone()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| anyhow!("OPENAI_API_KEY must be set"))
}

fn manifest_dir(manifest: &Path) -> PathBuf {
    manifest.parent().map(Path::to_path_buf).unwrap_or_default()
}
