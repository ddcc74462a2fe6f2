use anyhow::Context;
use clap::{Parser, Subcommand};
use schedule_feed::constants::DEFAULT_HORIZON_DAYS;
use schedule_feed::context::status_report;
use schedule_feed::pipeline::storage::build_document_store;
use schedule_feed::types::CollectionRun;
use schedule_feed::{logging, metrics, AppContext, Config};
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "schedule_feed")]
#[command(about = "Collects upcoming performer appearances from web search into a calendar")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect upcoming events for one subject
    Collect {
        /// Performer or group name
        #[arg(long)]
        subject: String,
        /// How many days ahead to look
        #[arg(long, default_value_t = DEFAULT_HORIZON_DAYS)]
        days: u32,
        /// Genre tag that broadens extraction beyond concerts (overrides config)
        #[arg(long)]
        genre: Option<String>,
        /// Store the validated events in the document store
        #[arg(long)]
        save: bool,
        /// Insert the validated events into the calendar
        #[arg(long)]
        calendar: bool,
    },
    /// Collect several subjects concurrently
    CollectMany {
        /// Subjects (comma-separated)
        #[arg(long, value_delimiter = ',')]
        subjects: Vec<String>,
        #[arg(long, default_value_t = DEFAULT_HORIZON_DAYS)]
        days: u32,
        #[arg(long)]
        save: bool,
    },
    /// Show configured credentials and document store health
    Status,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn save_run(context: &AppContext, run: &CollectionRun) -> anyhow::Result<()> {
    if !run.success || run.events.is_empty() {
        warn!("Nothing to save for {}", run.subject);
        return Ok(());
    }
    let result = context.persistence().persist(&run.events, &run.subject).await;
    print_json(&result)
}

fn connect(config: Config) -> anyhow::Result<AppContext> {
    AppContext::from_config(config).context("failed to initialize providers")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();
    let cli = Cli::parse();

    let mut config = Config::load().context("failed to load configuration")?;
    if let Commands::Collect { genre: Some(genre), .. } = &cli.command {
        config.extraction.genre = Some(genre.clone());
    }
    metrics::init_metrics();

    match cli.command {
        Commands::Collect {
            subject,
            days,
            save,
            calendar,
            ..
        } => {
            let context = connect(config)?;
            info!("Collecting {} for the next {} days", subject, days);
            let run = context.orchestrator().collect(&subject, days).await;
            print_json(&run)?;

            if save {
                save_run(&context, &run).await?;
            }
            if calendar && run.success {
                let syncer = context.calendar()?;
                let report = syncer
                    .sync_all(&run.events, &tokio_util::sync::CancellationToken::new())
                    .await;
                print_json(&report)?;
            }
            if !run.success {
                error!("{}", run.message);
            }
        }
        Commands::CollectMany { subjects, days, save } => {
            if subjects.iter().all(|s| s.trim().is_empty()) {
                anyhow::bail!("--subjects needs at least one name");
            }
            let context = connect(config)?;
            let batch = context.orchestrator().collect_many(&subjects, days).await;
            print_json(&batch)?;

            if save {
                for run in &batch.successful {
                    save_run(&context, run).await?;
                }
            }
        }
        Commands::Status => {
            let store = build_document_store(&config.storage);
            print_json(&status_report(&config, store.as_ref()).await)?;
        }
    }
    Ok(())
}
