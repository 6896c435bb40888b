use clap::{Parser, Subcommand};
use csv::Writer;
use housing_core::{
    create_listing_table, format_metadata, Category, Database, ListingFilter, Result,
};
use housing_scrapers::{
    all_sources, HttpRenderer, Orchestrator, OrchestratorJob, ScrapeSettings, Scheduler, Source,
};
use serde_json::json;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use tabled::{settings::Style, Table, Tabled};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Database file path (-d, --database)
    #[arg(short = 'd', long, env = "DB_PATH", default_value = "data/listings.db", global = true)]
    database: PathBuf,

    /// Navigation timeout in seconds for sources without their own
    #[arg(long, env = "NAVIGATION_TIMEOUT_SECS", global = true)]
    navigation_timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape one source and print its listings as JSON
    #[command(long_about = "Scrape one source on demand and print its listings as JSON. Nothing is stored.")]
    Scrape(ScrapeCommand),

    /// Scrape every source concurrently and print the merged listings as JSON
    ScrapeAll,

    /// Scrape every source one at a time and store the results
    #[command(long_about = "Scrape every source sequentially, upserting each source's listings before the next one starts.")]
    Refresh,

    /// List stored listings
    #[command(long_about = "List stored listings, most recently updated first, with optional filtering.")]
    List(ListCommand),

    /// Export stored listings to CSV
    Export(ExportCommand),

    /// Show the supported sources
    Sources,

    /// Check the database for corruption and duplicate rows
    Check,

    /// Refresh on a fixed interval until interrupted
    #[command(long_about = "Run the refresh on a fixed interval in the foreground. Ctrl-C stops the scheduler, abandoning a refresh in progress.")]
    Serve(ServeCommand),
}

#[derive(Parser)]
struct ScrapeCommand {
    /// Source id, see `sources`
    source: String,
}

#[derive(Parser)]
struct ListCommand {
    /// Source to filter by (-f, --source)
    #[arg(short = 'f', long)]
    source: Option<String>,

    /// Minimum monthly rent (-p, --min-price)
    #[arg(short = 'p', long)]
    min_price: Option<i64>,

    /// Maximum monthly rent (-P, --max-price)
    #[arg(short = 'P', long)]
    max_price: Option<i64>,

    /// Minimum bedrooms, 0 for studios (-b, --min-bedrooms)
    #[arg(short = 'b', long)]
    min_bedrooms: Option<i32>,

    /// Residential, commercial or storage (-c, --category)
    #[arg(short = 'c', long)]
    category: Option<String>,

    /// Maximum number of listings to display (-l, --limit)
    #[arg(short = 'l', long)]
    limit: Option<i64>,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct ExportCommand {
    /// Output file path (-o, --output)
    #[arg(short = 'o', long, default_value = "listings.csv")]
    output: PathBuf,
}

#[derive(Parser)]
struct ServeCommand {
    /// Hours between refreshes
    #[arg(long, env = "SCRAPE_INTERVAL_HOURS", default_value_t = 12.0)]
    interval_hours: f64,
}

#[derive(Tabled)]
struct SourceRow {
    #[tabled(rename = "Id")]
    id: &'static str,
    #[tabled(rename = "Name")]
    name: &'static str,
    #[tabled(rename = "Website")]
    homepage: &'static str,
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn orchestrator(settings: ScrapeSettings) -> Result<Orchestrator> {
    let renderer = HttpRenderer::new(all_sources().len())?;
    Ok(Orchestrator::new(Arc::new(renderer), settings))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut settings = ScrapeSettings::default();
    if let Some(secs) = cli.navigation_timeout {
        settings = settings.with_navigation_timeout_secs(secs);
    }

    match cli.command {
        Commands::Scrape(cmd) => {
            let orchestrator = orchestrator(settings)?;
            match orchestrator.scrape_source(&cmd.source).await {
                Ok(result) => print_json(&result)?,
                Err(e) => {
                    error!(source = %cmd.source, error = %e, "Scrape failed");
                    eprintln!("{}", e.user_message());
                    return Err(e);
                }
            }
        }
        Commands::ScrapeAll => {
            let merged = orchestrator(settings)?.scrape_all().await;
            print_json(&merged)?;
        }
        Commands::Refresh => {
            let db = Database::new(&cli.database).await?;
            let summary = orchestrator(settings)?.run_all_to_db(&db).await?;
            let meta = db.get_metadata().await?;
            let failed: Vec<_> = summary.failures().map(|o| o.source.as_str()).collect();
            let persisted = summary.ensure_persisted();

            print_json(&json!({
                "status": if persisted.is_ok() { "ok" } else { "error" },
                "total": meta.total_listings,
                "last_updated": meta.last_updated,
                "failed": failed,
            }))?;
            if let Err(e) = persisted {
                error!(error = %e, "Refresh could not store every source");
                return Err(e);
            }
        }
        Commands::List(cmd) => {
            let db = Database::new(&cli.database).await?;
            let category = cmd
                .category
                .as_deref()
                .map(str::parse::<Category>)
                .transpose()?;
            let filter = ListingFilter {
                source: cmd.source,
                min_price: cmd.min_price,
                max_price: cmd.max_price,
                min_bedrooms: cmd.min_bedrooms,
                category,
                limit: cmd.limit,
            };

            let listings = db.list_listings(&filter).await?;
            let meta = db.get_metadata().await?;

            if cmd.json {
                let sources: BTreeSet<&str> = listings.iter().map(|l| l.source.as_str()).collect();
                print_json(&json!({
                    "listings": listings,
                    "last_updated": meta.last_updated,
                    "total": meta.total_listings,
                    "sources": sources,
                }))?;
            } else {
                println!("{}", create_listing_table(&listings));
                println!("{}", format_metadata(&meta));
            }
        }
        Commands::Export(cmd) => {
            let db = Database::new(&cli.database).await?;
            let listings = db.get_all_listings().await?;

            let mut writer = Writer::from_path(&cmd.output)?;
            for listing in &listings {
                writer.serialize(listing)?;
            }
            writer.flush()?;
            info!(count = listings.len(), path = %cmd.output.display(), "Exported listings");
        }
        Commands::Sources => {
            let rows: Vec<SourceRow> = all_sources()
                .iter()
                .map(|s| SourceRow {
                    id: s.id(),
                    name: s.name(),
                    homepage: s.homepage(),
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::modern()));
        }
        Commands::Check => {
            let db = Database::new(&cli.database).await?;
            let issues = db.check_integrity().await?;
            if issues.is_empty() {
                println!("Database integrity check passed");
            } else {
                for issue in &issues {
                    println!("{}", issue);
                }
                error!(issues = issues.len(), "Database integrity check failed");
            }
        }
        Commands::Serve(cmd) => {
            let settings = settings.with_interval_hours(cmd.interval_hours);
            let db = Database::new(&cli.database).await?;
            let job = OrchestratorJob::new(Arc::new(orchestrator(settings)?), db);

            let scheduler = Scheduler::start(Arc::new(job), settings.scrape_interval);
            tokio::signal::ctrl_c().await?;
            info!("Interrupt received, shutting down");
            scheduler.shutdown().await;
        }
    }

    Ok(())
}
