//! # Wrangler Entry Point
//!
//! ```text
//! main()
//!   │
//!   ├─> Parse CLI arguments (clap)
//!   ├─> Initialize logging
//!   ├─> Build the HTTP client and controller
//!   │
//!   ├─> If a subcommand is given:
//!   │   └─> Run it on the tokio runtime and exit
//!   │
//!   └─> Otherwise:
//!       └─> Launch the eframe desktop application
//! ```

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod cli;

use anyhow::{Context as _, Result, anyhow};
use clap::Parser as _;
use std::sync::Arc;
use wrangler::api::HttpDatasetApi;
use wrangler::controller::DatasetController;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    let console = cli.command.is_some() || cfg!(debug_assertions);
    if let Err(e) = wrangler::logging::init(console) {
        // console-only fallback
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .try_init()
            .ok();
        tracing::warn!("File logging unavailable: {e:#}");
    }

    let mut app_config = wrangler::config::load_app_config();
    app_config.client = app_config.client.with_env_overrides();
    if let Some(url) = &cli.api_url {
        app_config.client.api_base_url.clone_from(url);
    }

    let api = HttpDatasetApi::new(&app_config.client)?;
    let controller = DatasetController::new(Arc::new(api));
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;

    if let Some(command) = cli.command {
        return runtime.block_on(cli::run_command(command, &controller, &app_config.client));
    }

    tracing::info!(api = %app_config.client.api_base_url, "Starting desktop client");
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Data Wrangler")
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([640.0, 400.0]),
        ..Default::default()
    };

    let handle = runtime.handle().clone();
    eframe::run_native(
        "Data Wrangler",
        native_options,
        Box::new(move |cc| {
            Ok(Box::new(wrangler::gui::WranglerApp::new(
                cc, controller, handle, app_config,
            )))
        }),
    )
    .map_err(|e| anyhow!("GUI failed: {e}"))
}
