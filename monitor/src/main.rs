use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::EventStream;
use procspy::{
    collector::LinuxProcessCollector,
    config::Config,
    coordinator::Coordinator,
    input,
    refresher::Refresher,
    signals::SignalListener,
    terminal::TerminalSession,
    watcher::FsWatch,
};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// How long background tasks get to stop after shutdown is signalled.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Live terminal view of running processes
#[derive(Parser, Debug)]
#[command(name = "procspy", version, about, long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Refresh interval in seconds
    #[arg(short, long)]
    interval: Option<u64>,

    /// Directory whose activity triggers a refresh
    #[arg(short, long)]
    watch: Option<PathBuf>,

    /// Refresh on the timer only
    #[arg(long, conflicts_with = "watch")]
    no_watch: bool,

    /// Maximum number of processes per snapshot
    #[arg(short, long)]
    max_records: Option<usize>,

    /// Log file path
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let path = cli.config.clone().unwrap_or_else(Config::config_path);
    let mut config = Config::load_or_default(&path)?;

    if let Some(interval) = cli.interval {
        config.general.refresh_interval_secs = interval;
    }
    if let Some(max_records) = cli.max_records {
        config.general.max_records = max_records;
    }
    if let Some(path) = &cli.watch {
        config.watch.path = path.clone();
    }
    if cli.no_watch {
        config.watch.enabled = false;
    }
    if let Some(file) = &cli.log_file {
        config.logging.file = Some(file.clone());
    }
    config.validate()?;
    Ok(config)
}

/// Log to a file; stdout belongs to the terminal UI.
fn init_logging(config: &Config) -> Result<()> {
    let path = config.log_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(&config)?;
    info!("procspy starting...");

    let collector = Arc::new(LinuxProcessCollector::new());
    let refresher = Arc::new(Refresher::new(collector, config.general.max_records));

    // Setup failures abort here, before the terminal is touched.
    let fs_watch = if config.watch.enabled {
        Some(FsWatch::start(&config.watch.path, &[config.log_path()])?)
    } else {
        info!("Filesystem trigger disabled");
        None
    };
    let signals = SignalListener::new().context("failed to install signal handlers")?;
    let session = TerminalSession::enter().context("failed to initialize terminal")?;

    let (request_tx, mut request_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut tasks = JoinSet::new();

    tasks.spawn(Arc::clone(&refresher).run_timer(
        config.refresh_interval(),
        request_tx.clone(),
        shutdown_rx.clone(),
    ));
    let _watch_guard = match fs_watch {
        Some((guard, activity)) => {
            tasks.spawn(Arc::clone(&refresher).run_watch(
                activity,
                request_tx.clone(),
                shutdown_rx.clone(),
            ));
            Some(guard)
        }
        None => None,
    };
    tasks.spawn(input::forward_events(
        EventStream::new(),
        request_tx.clone(),
        shutdown_rx.clone(),
    ));
    tasks.spawn(signals.run(request_tx, shutdown_rx));

    let mut coordinator = Coordinator::new(session, shutdown_tx);
    let result = coordinator.run(&mut request_rx).await;
    drop(request_rx);

    let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
        while tasks.join_next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        warn!("Background tasks did not stop within {:?}, aborting", SHUTDOWN_GRACE);
        tasks.abort_all();
    }

    coordinator
        .into_surface()
        .leave()
        .context("failed to restore terminal")?;
    result?;
    info!("procspy stopped");
    Ok(())
}
