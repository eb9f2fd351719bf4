//! `mm`: keeps a media share canonical
//!
//! Running two `mm watch` processes against the same state and journal files
//! is not supported; nothing locks them.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bridge_desktop::MountedShareFileSystem;
use bridge_traits::storage::RemoteFileSystem;
use clap::{Parser, Subcommand, ValueEnum};
use core_metadata::LoftyTagReader;
use core_runtime::config::{AppConfig, AppConfigBuilder};
use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use core_sync::{
    read_journal, AlbumReconciler, Component, UndoOperation, WatchState, Watcher, WatcherConfig,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(version, about = "Media share naming, artwork and lyrics manager")]
struct Opts {
    /// Log intended changes without touching the share
    #[arg(long, global = true)]
    dry_run: bool,

    /// Increase verbosity (-v debug, -vv trace). Default INFO.
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Share mount point, overrides MM_SHARE_ROOT
    #[arg(long, global = true)]
    share_root: Option<PathBuf>,

    /// Move albums filed under the wrong artist to `<Artist>/<Album>`
    #[arg(long, global = true)]
    relocate_artists: bool,

    /// Log output format: pretty, json or compact
    #[arg(long, global = true, env = "MM_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report naming, artwork and lyrics issues without changing anything
    Scan {
        #[arg(short = 'c', long, value_enum, default_value_t = ComponentArg::All)]
        component: ComponentArg,
        /// Stop after this many albums (0 = all)
        #[arg(short = 'n', long, default_value_t = 0)]
        limit: usize,
    },
    /// Rename, add covers and write lyrics for every album
    Fix {
        #[arg(short = 'c', long, value_enum, default_value_t = ComponentArg::All)]
        component: ComponentArg,
        /// Stop after this many albums (0 = all)
        #[arg(short = 'n', long, default_value_t = 0)]
        limit: usize,
    },
    /// Poll the share and reconcile albums as they change
    Watch {
        /// Seconds between scans, overrides MM_POLL_INTERVAL
        #[arg(short = 'i', long)]
        interval: Option<u64>,
        #[arg(short = 'c', long, value_enum, default_value_t = ComponentArg::All)]
        component: ComponentArg,
    },
    /// Show configuration, share reachability, watch snapshot and journal summary
    Status,
    /// Print undo journal entries, newest last
    Journal {
        /// Only the last N entries (0 = all)
        #[arg(short = 'n', long, default_value_t = 20)]
        last: usize,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ComponentArg {
    Naming,
    Artwork,
    Lyrics,
    All,
}

impl From<ComponentArg> for Component {
    fn from(arg: ComponentArg) -> Self {
        match arg {
            ComponentArg::Naming => Component::Naming,
            ComponentArg::Artwork => Component::Artwork,
            ComponentArg::Lyrics => Component::Lyrics,
            ComponentArg::All => Component::All,
        }
    }
}

fn log_level(verbose: u8) -> LogLevel {
    match verbose {
        0 => LogLevel::Info,
        1 => LogLevel::Debug,
        _ => LogLevel::Trace,
    }
}

/// Environment (and `.env`) first, command-line flags on top
fn load_config(opts: &Opts, builder: AppConfigBuilder) -> anyhow::Result<AppConfig> {
    let mut builder = builder;

    if let Some(root) = &opts.share_root {
        builder = builder.share_root(root);
    }
    if opts.dry_run {
        builder = builder.dry_run(true);
    }
    if opts.relocate_artists {
        builder = builder.relocate_artists(true);
    }
    if let Command::Watch {
        interval: Some(secs),
        ..
    } = &opts.command
    {
        builder = builder.poll_interval(Duration::from_secs(*secs));
    }

    builder.build().context("Invalid configuration")
}

/// One-line connection check: lists the share's top level
async fn share_status(fs: &dyn RemoteFileSystem) -> String {
    match fs.list_directory("").await {
        Ok(entries) => format!("reachable ({} top-level entries)", entries.len()),
        Err(e) => {
            warn!(error = %e, "Share listing failed");
            format!("unreachable: {}", e)
        }
    }
}

fn reconciler(
    fs: Arc<dyn RemoteFileSystem>,
    config: &AppConfig,
    component: ComponentArg,
) -> anyhow::Result<AlbumReconciler> {
    AlbumReconciler::new(fs, Arc::new(LoftyTagReader::new()), config, component.into())
        .context("Failed to set up album reconciler")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let opts = Opts::parse();

    let mut logging = LoggingConfig::default().with_level(log_level(opts.verbose));
    if let Some(format) = opts.log_format {
        logging = logging.with_format(format);
    }
    init_logging(logging).context("Failed to initialize logging")?;

    let builder = AppConfigBuilder::from_env().context("Invalid MM_* environment")?;
    let config = load_config(&opts, builder)?;

    run(opts.command, config).await
}

async fn run(command: Command, config: AppConfig) -> anyhow::Result<()> {
    let fs: Arc<dyn RemoteFileSystem> = Arc::new(MountedShareFileSystem::new(&config.share_root));

    if config.dry_run {
        info!("Dry run: no changes will be made");
    }

    match command {
        Command::Scan { component, limit } => {
            let stats = reconciler(fs, &config, component)?
                .scan_library("", limit)
                .await
                .context("Library scan failed")?;

            println!("Albums scanned:      {}", stats.albums_scanned);
            println!("Tracks scanned:      {}", stats.tracks_scanned);
            println!("Naming issues:       {}", stats.naming_issues);
            println!("Missing covers:      {}", stats.missing_covers);
            println!("Low-quality covers:  {}", stats.low_quality_covers);
            println!("Missing lyrics:      {}", stats.missing_lyrics);
        }
        Command::Fix { component, limit } => {
            let stats = reconciler(fs, &config, component)?
                .fix_library("", limit)
                .await
                .context("Library fix failed")?;

            println!("Albums processed:    {}", stats.albums_processed);
            println!("Tracks processed:    {}", stats.tracks_processed);
            println!("Renames:             {}", stats.renames);
            println!("Covers added:        {}", stats.covers_added);
            println!("Covers replaced:     {}", stats.covers_replaced);
            println!("Lyrics added:        {}", stats.lyrics_added);
            println!("Errors:              {}", stats.errors);
        }
        Command::Watch { component, .. } => {
            let callback = Arc::new(reconciler(fs.clone(), &config, component)?);
            let mut watcher = Watcher::new(fs, WatcherConfig::from(&config))
                .await
                .context("Failed to load watch state")?
                .with_callback(callback);

            let token = CancellationToken::new();
            let on_signal = token.clone();
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => info!("Interrupt received, stopping after the current cycle"),
                    Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
                }
                on_signal.cancel();
            });

            let cycles = watcher.run(token).await;
            println!("Watch stopped after {} cycles", cycles);
        }
        Command::Status => {
            let state = WatchState::load(&config.watch_state_path)
                .await
                .context("Failed to read watch state")?;
            let journal = read_journal(&config.undo_log_path)
                .await
                .context("Failed to read undo journal")?;

            println!("Share root:          {}", config.share_root.display());
            println!("Share:               {}", share_status(fs.as_ref()).await);
            println!("Compilations folder: {}", config.compilations_folder);
            println!("Audio extensions:    {}", config.audio_extensions.join(", "));
            println!(
                "Cover thresholds:    {}px, {}KB",
                config.cover_min_dimension,
                config.cover_min_size / 1024
            );
            println!("Relocate artists:    {}", config.relocate_artists);
            println!(
                "Last scan:           {}",
                state
                    .last_scan
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "never".to_string())
            );
            println!("Tracked files:       {}", state.len());
            println!("Journal entries:     {}", journal.len());
            println!("Undo journal:        {}", config.undo_log_path.display());
            println!("Poll interval:       {}s", config.poll_interval.as_secs());
        }
        Command::Journal { last } => {
            let journal = read_journal(&config.undo_log_path)
                .await
                .context("Failed to read undo journal")?;
            let skip = if last == 0 {
                0
            } else {
                journal.len().saturating_sub(last)
            };

            for entry in &journal[skip..] {
                let details = match &entry.operation {
                    UndoOperation::Rename { src, dst } => format!("{} -> {}", src, dst),
                    UndoOperation::Write {
                        path,
                        had_previous,
                        previous_size,
                    } => {
                        if *had_previous {
                            format!("{} (replaced {} bytes)", path, previous_size)
                        } else {
                            format!("{} (new)", path)
                        }
                    }
                    UndoOperation::Delete { path } => path.clone(),
                };
                println!(
                    "{}  {:<7} {}",
                    entry.timestamp.to_rfc3339(),
                    entry.operation.name(),
                    details
                );
            }
        }
    }

    Ok(())
}
