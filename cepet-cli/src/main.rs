//! `cepet` - ingest the CEPET document corpus and answer questions about it.

mod cli;
mod commands;
mod telemetry;

use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    telemetry::init(cli.settings.verbose);

    match cli.command {
        Commands::Ingest { manifest, base_dir, chunk_size, chunk_overlap, page_size } => {
            let options = commands::IngestOptions {
                manifest,
                base_dir,
                chunk_size,
                chunk_overlap,
                page_size,
            };
            commands::ingest(&cli.settings, options).await
        }
        Commands::Ask { question, top_k, dry_run, json } => {
            commands::ask(&cli.settings, &question, top_k, dry_run, json).await
        }
        Commands::Chat { top_k } => commands::chat(&cli.settings, top_k).await,
        Commands::Schema => commands::schema(&cli.settings).await,
    }
}
