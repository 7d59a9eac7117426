// Main entry point for the mailsift CLI

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mailsift::stores::postgres::compose_database_url;
use mailsift::{
    archive, run_mailbox, run_store, MboxSource, PipelineConfig, PipelineSummary,
    PostgresConnector, SinkConfig, StoreConnector,
};

#[derive(Parser)]
#[command(name = "mailsift", version, about = "Extract tokens and address metadata from archived email")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read a mailbox, extract tokens, store and/or print them
    Ingest {
        /// Path to the mailbox file
        mbox_path: PathBuf,

        /// Store server URL; without it, tokens go to stdout only
        #[arg(long)]
        db_url: Option<String>,

        /// Database name
        #[arg(long, short = 'd', default_value = "archive")]
        db_name: String,

        /// Collection name
        #[arg(long, short = 'c', default_value = "mails")]
        collection: String,

        /// Number of pool workers
        #[arg(long, short = 'w', default_value_t = 3)]
        workers: usize,

        /// Print every token to stdout even when storing
        #[arg(long)]
        print_tokens: bool,

        /// Keep duplicate bodies instead of dropping them
        #[arg(long)]
        no_dedup: bool,
    },

    /// Tokenize everything already in the store and print the words
    Words {
        /// Store server URL
        #[arg(long)]
        db_url: String,

        /// Database name
        #[arg(long, short = 'd', default_value = "archive")]
        db_name: String,

        /// Collection name
        #[arg(long, short = 'c', default_value = "mails")]
        collection: String,

        /// Number of pool workers
        #[arg(long, short = 'w', default_value_t = 3)]
        workers: usize,
    },

    /// Copy a mailbox into the store as raw records, unprocessed
    Archive {
        /// Path to the mailbox file
        mbox_path: PathBuf,

        /// Store server URL
        #[arg(long)]
        db_url: String,

        /// Database name
        #[arg(long, short = 'd', default_value = "archive")]
        db_name: String,

        /// Collection name
        #[arg(long, short = 'c', default_value = "mails")]
        collection: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Ingest {
            mbox_path,
            db_url,
            db_name,
            collection,
            workers,
            print_tokens,
            no_dedup,
        } => {
            let source = MboxSource::open(&mbox_path)
                .with_context(|| format!("failed to open mailbox {}", mbox_path.display()))?;

            let mut sinks = Vec::new();
            if print_tokens || db_url.is_none() {
                sinks.push(SinkConfig::stdout());
            }
            if let Some(url) = db_url {
                sinks.push(SinkConfig::Store(connector(&url, &db_name, &collection)));
            }

            let config = PipelineConfig::new()
                .with_workers(workers)
                .with_dedup(!no_dedup);
            let summary = run_mailbox(source, &config, sinks)
                .await
                .context("ingest run failed")?;
            report(&summary);
        }

        Command::Words {
            db_url,
            db_name,
            collection,
            workers,
        } => {
            let config = PipelineConfig::new().with_workers(workers);
            let summary = run_store(
                connector(&db_url, &db_name, &collection),
                &config,
                vec![SinkConfig::stdout()],
            )
            .await
            .context("words run failed")?;
            report(&summary);
        }

        Command::Archive {
            mbox_path,
            db_url,
            db_name,
            collection,
        } => {
            let source = MboxSource::open(&mbox_path)
                .with_context(|| format!("failed to open mailbox {}", mbox_path.display()))?;

            let summary = archive(source, connector(&db_url, &db_name, &collection))
                .await
                .context("archive run failed")?;
            tracing::info!(
                archived = summary.archived,
                failures = summary.failures,
                "archive finished"
            );
        }
    }

    Ok(())
}

fn connector(url: &str, db_name: &str, collection: &str) -> Arc<dyn StoreConnector> {
    let database_url = compose_database_url(url, db_name);
    Arc::new(PostgresConnector::new(database_url, collection))
}

fn report(summary: &PipelineSummary) {
    tracing::info!(
        dispatched = summary.dispatched,
        processed = summary.processed,
        duplicates = summary.duplicates_dropped(),
        item_failures = summary.item_failures,
        "run finished"
    );
    for sink in &summary.sinks {
        tracing::info!(
            kind = sink.kind,
            delivered = sink.delivered,
            failures = sink.failures,
            "sink finished"
        );
    }
    for (dropped, first_seen) in &summary.duplicates {
        tracing::debug!(%dropped, %first_seen, "duplicate body");
    }
    if summary.workers_failed > 0 {
        tracing::warn!(
            workers_failed = summary.workers_failed,
            "run completed degraded"
        );
    }
}
