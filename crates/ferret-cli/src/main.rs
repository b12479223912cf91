use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use ferret_client::ReqwestFetcher;
use ferret_core::models::{AnchorSet, CrawlRequest, FieldSet, RunResult, SourcedContact};
use ferret_core::traits::{Fetcher, NullSink, RunSink};
use ferret_core::{ChannelReporter, CrawlConfig, CrawlService};
use ferret_db::{Database, DatabaseConfig, RunRepository};

#[derive(Parser)]
#[command(name = "ferret", version, about = "Contact extraction crawler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl seed URLs and extract contacts
    Crawl {
        /// Run name, stored with the results
        #[arg(short, long, default_value = "run")]
        name: String,

        /// Seed URL (repeatable)
        #[arg(short, long = "url")]
        urls: Vec<String>,

        /// File with one seed URL per line (`#` starts a comment)
        #[arg(long)]
        urls_file: Option<PathBuf>,

        /// Comma-separated fields: email, phone, name, role (empty = all)
        #[arg(short, long, default_value = "")]
        fields: String,

        /// Anchors name/role are looked up around: email, phone
        #[arg(long, default_value = "email,phone")]
        anchors: String,

        /// Follow links discovered on processed pages
        #[arg(long, default_value_t = false)]
        spider: bool,

        /// Maximum pages to process (0 = unbounded)
        #[arg(long, default_value_t = 0)]
        max_pages: usize,

        /// Maximum concurrent fetches
        #[arg(long, env = "FERRET_CONCURRENCY", default_value_t = 8)]
        concurrency: usize,

        /// Per-request timeout in seconds
        #[arg(long, env = "FERRET_TIMEOUT_SECS", default_value_t = 30)]
        timeout_secs: u64,

        /// Allow fetching private/reserved IP ranges
        #[arg(long, env = "FERRET_ALLOW_PRIVATE", default_value_t = false)]
        allow_private: bool,

        /// Save the run to the database (DATABASE_URL)
        #[arg(long, default_value_t = false)]
        save: bool,
    },

    /// Inspect and edit stored runs
    Runs {
        #[command(subcommand)]
        command: RunsCommand,
    },
}

#[derive(Subcommand)]
enum RunsCommand {
    /// List stored runs, newest first
    List,

    /// Print a stored run's contacts
    Show {
        id: i64,

        /// Output CSV instead of JSON
        #[arg(long, default_value_t = false)]
        csv: bool,
    },

    /// Rename a stored run
    Rename { id: i64, name: String },

    /// Delete a stored run
    Delete { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Logs go to stderr; stdout carries the results.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("ferret=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Crawl {
            name,
            urls,
            urls_file,
            fields,
            anchors,
            spider,
            max_pages,
            concurrency,
            timeout_secs,
            allow_private,
            save,
        } => {
            let mut seeds = urls;
            if let Some(path) = urls_file {
                seeds.extend(read_seed_file(&path)?);
            }

            let request = CrawlRequest::new(name, seeds)
                .with_fields(parse_fields(&fields)?)
                .with_anchors(anchors.parse::<AnchorSet>()?)
                .with_spider_mode(spider)
                .with_max_pages((max_pages > 0).then_some(max_pages));

            let mut fetcher = ReqwestFetcher::with_timeout(Duration::from_secs(timeout_secs))
                .context("Failed to create HTTP client")?;
            if allow_private {
                fetcher = fetcher.allow_private_urls();
            }
            let config = CrawlConfig::default().with_concurrency(concurrency);

            let run = if save {
                let repo = connect_db().await?;
                cmd_crawl(fetcher, repo, config, request, io::stdout()).await?
            } else {
                cmd_crawl(fetcher, NullSink, config, request, io::stdout()).await?
            };

            tracing::info!(
                run = %run.run_name,
                contacts = run.contacts.len(),
                pages = run.stats.pages_processed,
                skipped = run.stats.pages_skipped,
                cancelled = run.cancelled,
                "Done"
            );
        }
        Commands::Runs { command } => {
            let repo = connect_db().await?;
            match command {
                RunsCommand::List => cmd_runs_list(&repo).await?,
                RunsCommand::Show { id, csv } => cmd_runs_show(&repo, id, csv).await?,
                RunsCommand::Rename { id, name } => cmd_runs_rename(&repo, id, &name).await?,
                RunsCommand::Delete { id } => cmd_runs_delete(&repo, id).await?,
            }
        }
    }

    Ok(())
}

/// Connect to the run database using DATABASE_URL and apply migrations.
async fn connect_db() -> Result<RunRepository> {
    let config = DatabaseConfig::from_env()?;
    let db = Database::connect(&config)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await?;
    Ok(db.run_repo())
}

/// An empty field list asks for everything.
fn parse_fields(raw: &str) -> Result<FieldSet> {
    let fields: FieldSet = raw.parse()?;
    if fields.is_empty() {
        return Ok(FieldSet::all());
    }
    Ok(fields)
}

fn read_seed_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file: {}", path.display()))?;
    Ok(parse_seed_lines(&content))
}

fn parse_seed_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Run a crawl, printing each processed page as a JSON line while it runs.
/// Ctrl-C cancels the run; the partial result is still handed to the sink.
async fn cmd_crawl<F, S, W>(
    fetcher: F,
    sink: S,
    config: CrawlConfig,
    request: CrawlRequest,
    mut out: W,
) -> Result<RunResult>
where
    F: Fetcher + 'static,
    S: RunSink,
    W: Write + Send + 'static,
{
    let service = CrawlService::new(fetcher, sink, config)?;

    let cancel_token = CancellationToken::new();
    let signal_token = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, stopping crawl");
            signal_token.cancel();
        }
    });

    let (reporter, mut pages) = ChannelReporter::new();
    let printer = tokio::spawn(async move {
        while let Some(page) = pages.recv().await {
            let line = serde_json::to_string(&page)?;
            writeln!(out, "{line}")?;
            out.flush()?;
        }
        Ok::<_, anyhow::Error>(())
    });

    let run = service.run(request, cancel_token, &reporter).await;
    drop(reporter);
    log_printer_outcome(printer.await);

    Ok(run?)
}

/// Output failures (e.g. a closed pipe) must not discard a finished run.
fn log_printer_outcome(outcome: Result<Result<()>, tokio::task::JoinError>) {
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "Stopped writing page results"),
        Err(e) => tracing::warn!(error = %e, "Output task failed"),
    }
}

async fn cmd_runs_list(repo: &RunRepository) -> Result<()> {
    let runs = repo.list().await?;
    if runs.is_empty() {
        println!("No stored runs");
        return Ok(());
    }

    for run in &runs {
        println!(
            "  #{:<5} {}  {} ({} contacts{})",
            run.id,
            run.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            run.name,
            run.contacts.len(),
            if run.cancelled { ", cancelled" } else { "" },
        );
    }
    println!("\nTotal: {} runs", runs.len());

    Ok(())
}

async fn cmd_runs_show(repo: &RunRepository, id: i64, csv: bool) -> Result<()> {
    let Some(run) = repo.get(id).await? else {
        bail!("Run #{id} not found");
    };

    if csv {
        write_csv(&run.contacts, io::stdout())?;
    } else {
        println!("{}", serde_json::to_string_pretty(&run.contacts)?);
    }
    Ok(())
}

async fn cmd_runs_rename(repo: &RunRepository, id: i64, name: &str) -> Result<()> {
    let Some(run) = repo.get(id).await? else {
        bail!("Run #{id} not found");
    };
    repo.update(id, name, &run.contacts).await?;
    println!("Renamed run #{id} to '{name}'");
    Ok(())
}

async fn cmd_runs_delete(repo: &RunRepository, id: i64) -> Result<()> {
    if !repo.delete(id).await? {
        bail!("Run #{id} not found");
    }
    println!("Deleted run #{id}");
    Ok(())
}

/// Contacts as CSV with a header row; missing fields are empty cells.
fn write_csv<W: Write>(contacts: &[SourcedContact], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["email", "phone", "name", "role", "url"])?;
    for sourced in contacts {
        let c = &sourced.contact;
        writer.write_record([
            c.email.as_deref().unwrap_or(""),
            c.phone.as_deref().unwrap_or(""),
            c.name.as_deref().unwrap_or(""),
            c.role.as_deref().unwrap_or(""),
            sourced.url.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
