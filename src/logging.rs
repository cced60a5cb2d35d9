//! Logging setup for the GUI and the CLI.
//!
//! Everything goes through `tracing`. Two daily-rotated files are written to
//! the platform data directory, keeping 10 of each:
//!
//! - `wrangler.<date>.log`: every level the filter lets through
//! - `error.<date>.log`: warnings and errors only
//!
//! The console layer is optional so the CLI can keep stdout clean for output
//! and the GUI can skip it in release builds. `RUST_LOG` overrides the default
//! `info` filter.
//!
//! ```no_run
//! wrangler::logging::init(true).ok();
//! tracing::info!("Client started");
//! ```

use anyhow::{Context as _, Result};
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

const MAX_LOG_FILES: usize = 10;

/// `<data_dir>/wrangler/logs`, created on first use.
///
/// - Windows: `%APPDATA%/wrangler/logs`
/// - macOS: `~/Library/Application Support/wrangler/logs`
/// - Linux: `~/.local/share/wrangler/logs`
pub fn get_log_dir() -> Result<PathBuf> {
    let base_dir = dirs::data_dir().context("Failed to determine data directory")?;
    let log_dir = base_dir.join("wrangler").join("logs");

    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    }

    Ok(log_dir)
}

fn daily_appender(log_dir: &std::path::Path, prefix: &str) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(log_dir)
        .with_context(|| format!("Failed to create {prefix} log appender"))
}

type FileLayer<S> =
    fmt::Layer<S, fmt::format::DefaultFields, fmt::format::Format, RollingFileAppender>;

fn file_layer<S>(appender: RollingFileAppender) -> FileLayer<S> {
    fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(appender)
}

/// Installs the global subscriber. Call once, before anything logs.
pub fn init(console: bool) -> Result<()> {
    let log_dir = get_log_dir()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Failed to create env filter")?;

    let console_layer = console.then(|| {
        fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .compact()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer(daily_appender(&log_dir, "wrangler")?))
        .with(file_layer(daily_appender(&log_dir, "error")?).with_filter(LevelFilter::WARN))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!(dir = %log_dir.display(), "Logging initialized");
    Ok(())
}

/// Path of today's combined log file.
pub fn get_current_log_path() -> Result<PathBuf> {
    let log_dir = get_log_dir()?;
    let today = chrono::Local::now().format("%Y-%m-%d");
    Ok(log_dir.join(format!("wrangler.{today}.log")))
}
