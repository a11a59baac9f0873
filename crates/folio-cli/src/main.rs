//! folio - render the portfolio site and drive its offline cache worker.
//!
//! `render` turns `site.config.json` into the page. `install`, `activate` and
//! `fetch` run the worker lifecycle against a cache on disk, one event per
//! invocation, with the lifecycle position recorded between runs.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use folio_core::config::Settings;
use folio_core::render::{self, DEFAULT_SHELL};
use folio_core::site::load_site_config;
use folio_core::worker::{
    CacheStorage, DirFetcher, DiskStorage, Fetcher, HttpFetcher, OfflineWorker, RecordStore,
    Request, WorkerError, WorkerRecord,
};

/// Subdirectory of the cache dir holding the buckets
const BUCKETS_DIR: &str = "caches";

#[derive(Parser)]
#[command(name = "folio", version, about = "Portfolio site renderer and offline cache worker")]
struct Cli {
    /// Settings file (defaults to ~/.config/folio/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the page from a site config
    Render {
        #[arg(long, default_value = "assets/data/site.config.json")]
        site_config: PathBuf,
        /// Page shell with {{region}} markers
        #[arg(long)]
        template: Option<PathBuf>,
        /// Output file (stdout if omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Pre-cache the asset manifest into the current bucket
    ///
    /// A worker that is already installed or activated for this cache name
    /// refuses to install again unless --force is given.
    Install {
        /// Read assets from a local site directory instead of HTTP
        #[arg(long)]
        site_dir: Option<PathBuf>,
        /// Install again even if this cache name was already installed
        #[arg(long)]
        force: bool,
    },
    /// Delete every bucket except the current one
    Activate,
    /// Run one fetch through the worker
    Fetch {
        /// Path or URL, resolved against the base URL
        path: String,
        #[arg(long)]
        site_dir: Option<PathBuf>,
        /// Write the response body here
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List cache buckets and their entries
    Status,
}

/// Initialize the tracing subscriber for logging.
/// The returned guard must be held until exit so buffered file logs are flushed.
fn init_tracing(log_file: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| "folio.log".into());
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => {
            let mut settings = Settings::load_from(path)?;
            settings.apply_overrides(|key| std::env::var(key).ok());
            Ok(settings)
        }
        None => Settings::load(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;
    let _guard = init_tracing(settings.log_file.as_deref());
    info!("folio starting");

    match cli.command {
        Command::Render {
            site_config,
            template,
            out,
        } => render_page(&site_config, template.as_deref(), out.as_deref()),
        Command::Install { site_dir, force } => install(&settings, site_dir, force).await,
        Command::Activate => activate(&settings).await,
        Command::Fetch {
            path,
            site_dir,
            output,
        } => fetch(&settings, &path, site_dir, output.as_deref()).await,
        Command::Status => status(&settings),
    }
}

fn render_page(site_config: &Path, template: Option<&Path>, out: Option<&Path>) -> Result<()> {
    let cfg = load_site_config(site_config)?;
    let shell = match template {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read template: {}", path.display()))?,
        None => DEFAULT_SHELL.to_string(),
    };
    let html = render::render(&cfg).fill(&shell);

    match out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, html)
                .with_context(|| format!("Failed to write page: {}", path.display()))?;
            eprintln!("Rendered {} -> {}", site_config.display(), path.display());
        }
        None => print!("{html}"),
    }
    Ok(())
}

/// Build the worker for the configured bucket, resumed at its recorded state.
fn open_worker(
    settings: &Settings,
    site_dir: Option<PathBuf>,
) -> Result<(OfflineWorker<DiskStorage, Box<dyn Fetcher>>, RecordStore)> {
    let cache_dir = settings.cache_dir()?;
    let storage = DiskStorage::new(cache_dir.join(BUCKETS_DIR))
        .context("Failed to open cache storage")?;

    let fetcher: Box<dyn Fetcher> = match site_dir.or_else(|| settings.site_dir.clone()) {
        Some(dir) => Box::new(DirFetcher::new(settings.base_url()?, dir)),
        None => Box::new(HttpFetcher::new()?),
    };

    let mut records = RecordStore::new(cache_dir);
    records.load()?;
    let state = records.state_for(&settings.cache_name);

    let worker = OfflineWorker::new(
        settings.cache_name.clone(),
        settings.assets.clone(),
        settings.registration()?,
        storage,
        fetcher,
    )
    .resume(state);
    Ok((worker, records))
}

fn record_state<S: CacheStorage, F: Fetcher>(
    records: &mut RecordStore,
    worker: &OfflineWorker<S, F>,
) -> Result<()> {
    records.update(WorkerRecord::new(worker.cache_name(), worker.state()));
    records.save()
}

async fn install(settings: &Settings, site_dir: Option<PathBuf>, force: bool) -> Result<()> {
    let (mut worker, mut records) = open_worker(settings, site_dir)?;
    let result = if force {
        worker.reinstall().await
    } else {
        worker.install().await
    };
    record_state(&mut records, &worker)?;
    let report = result.map_err(|e| match e {
        e @ WorkerError::InvalidState { .. } => anyhow::anyhow!("{e} (use --force to install again)"),
        other => other.into(),
    })?;

    eprintln!(
        "Installed {}: {} of {} assets cached",
        worker.cache_name(),
        report.cached.len(),
        report.attempted()
    );
    for failure in &report.failed {
        eprintln!("  failed: {} ({})", failure.path, failure.error);
    }
    Ok(())
}

async fn activate(settings: &Settings) -> Result<()> {
    let (mut worker, mut records) = open_worker(settings, None)?;
    let result = worker.activate().await;
    record_state(&mut records, &worker)?;
    let report = result?;

    eprintln!("Activated {}", worker.cache_name());
    for bucket in &report.deleted {
        eprintln!("  deleted: {bucket}");
    }
    for failure in &report.failures {
        eprintln!("  could not delete {}: {}", failure.bucket, failure.error);
    }
    Ok(())
}

async fn fetch(
    settings: &Settings,
    path: &str,
    site_dir: Option<PathBuf>,
    output: Option<&Path>,
) -> Result<()> {
    let (worker, _) = open_worker(settings, site_dir)?;
    let request = Request::get(settings.resolve_url(path)?);
    let outcome = worker.handle_fetch(&request).await?;

    eprintln!(
        "{} {} {} bytes ({}) from {}{}",
        outcome.response.status,
        request.url,
        outcome.response.body.len(),
        outcome.response.header("content-type").unwrap_or("unknown type"),
        outcome.source,
        if outcome.intercepted { "" } else { " (out of scope)" }
    );
    if let Some(path) = output {
        std::fs::write(path, &outcome.response.body)
            .with_context(|| format!("Failed to write body: {}", path.display()))?;
    }
    Ok(())
}

fn status(settings: &Settings) -> Result<()> {
    let cache_dir = settings.cache_dir()?;
    let storage = DiskStorage::new(cache_dir.join(BUCKETS_DIR))?;
    let mut records = RecordStore::new(cache_dir);
    records.load()?;

    println!(
        "Worker: {} ({}), {} assets in manifest",
        settings.cache_name,
        records.state_for(&settings.cache_name),
        settings.assets.len()
    );
    let keys = storage.keys()?;
    if keys.is_empty() {
        println!("No cache buckets");
    }
    for key in keys {
        let marker = if key == settings.cache_name { "*" } else { " " };
        let entries = storage.entries(&key)?;
        println!("{marker} {key} ({} entries)", entries.len());
        for entry in entries {
            println!(
                "    {} {} {} {:>8} B  {}",
                entry.method,
                entry.status,
                entry.url,
                entry.size,
                entry.cached.age_display()
            );
        }
    }
    Ok(())
}
