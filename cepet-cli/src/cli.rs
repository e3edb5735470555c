//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "cepet", version, about = "Ask questions about Chilean official documents")]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection and model settings shared by every command.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// PostgreSQL URL; falls back to DB_HOST, DB_PORT, DB_NAME, DB_USER and DB_PASS
    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Seconds to wait for a database connection
    #[arg(long, global = true, env = "DB_ACQUIRE_TIMEOUT", default_value_t = 5)]
    pub db_timeout: u64,

    /// OpenAI API key
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Chat model used to answer questions
    #[arg(long, global = true, env = "OPENAI_MODEL", default_value = "gpt-4o-mini")]
    pub openai_model: String,

    /// Embedding model; must match the one used at ingestion
    #[arg(
        long,
        global = true,
        env = "OPENAI_EMBEDDING_MODEL",
        default_value = "text-embedding-3-small"
    )]
    pub embedding_model: String,

    /// Request shortened embeddings of this many dimensions (default 1536)
    #[arg(long, global = true, env = "OPENAI_EMBEDDING_DIMENSIONS")]
    pub embedding_dimensions: Option<usize>,

    /// Substring removed from stored file locators before they are cited
    #[arg(long, global = true, default_value = "docs/")]
    pub locator_prefix: String,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Clear the corpus and rebuild it from a manifest of source documents
    Ingest {
        /// JSON manifest listing the documents to ingest
        #[arg(long, default_value = "manifest.json")]
        manifest: PathBuf,

        /// Directory file locators are resolved against; defaults to the
        /// manifest's directory
        #[arg(long)]
        base_dir: Option<PathBuf>,

        /// Maximum chunk size in characters
        #[arg(long, default_value_t = 1000)]
        chunk_size: usize,

        /// Characters shared by consecutive chunks
        #[arg(long, default_value_t = 200)]
        chunk_overlap: usize,

        /// Rows per chunk INSERT statement
        #[arg(long, default_value_t = 100)]
        page_size: usize,
    },

    /// Answer one question and exit
    Ask {
        /// The question
        question: String,

        /// Number of chunks retrieved as context
        #[arg(long, default_value_t = 5)]
        top_k: usize,

        /// Print the retrieved context without calling the model
        #[arg(long)]
        dry_run: bool,

        /// Print the answer and its sources as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive question loop
    Chat {
        /// Number of chunks retrieved as context
        #[arg(long, default_value_t = 5)]
        top_k: usize,
    },

    /// Create the pgvector extension and the corpus tables if absent
    Schema,
}
