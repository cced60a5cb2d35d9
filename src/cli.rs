#![expect(clippy::print_stdout)]

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use wrangler::api::ProgressFn;
use wrangler::config::{API_URL_ENV, ClientConfig};
use wrangler::controller::{DatasetController, SaveOutcome};
use wrangler::dataset::DatasetId;
use wrangler::grid::Cell;
use wrangler::import::{ImportRequest, format_file_size};
use wrangler::store::SelectOutcome;

#[derive(Parser)]
#[command(name = "wrangler", about = "Client for a remote tabular dataset service")]
pub struct Cli {
    /// Base URL of the dataset service, e.g. <http://127.0.0.1:8000/api>
    #[arg(long, global = true, env = API_URL_ENV)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List datasets on the server
    Datasets,
    /// Print the first rows of a dataset
    Show {
        name: String,

        /// Number of rows to print
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Delete a dataset from the server
    Delete { name: String },
    /// Upload a file (CSV, Excel, JSON, XML, Parquet) as a new dataset
    Import {
        file: PathBuf,

        /// Dataset name. Defaults to the file name without extension.
        #[arg(short, long)]
        name: Option<String>,
    },
    /// List the import, transformation and export tools the server offers
    Tools,
    /// Print summary statistics for a dataset
    Analyze { name: String },
    /// Download a dataset in another format
    Export {
        name: String,

        /// File type, e.g. csv, json, xlsx
        #[arg(short, long, default_value = "csv")]
        format: String,

        /// Directory to write into. Defaults to the configured export directory.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Change one cell and save the dataset
    Set {
        name: String,

        /// Row number, starting at 1
        #[arg(long)]
        row: usize,

        /// Column label
        #[arg(long)]
        column: String,

        /// New value; numbers and booleans keep their type
        value: String,
    },
}

pub async fn run_command(
    command: Commands,
    controller: &DatasetController,
    client: &ClientConfig,
) -> Result<()> {
    match command {
        Commands::Datasets => handle_datasets(controller).await,
        Commands::Show { name, limit } => handle_show(controller, name, limit).await,
        Commands::Delete { name } => {
            let id = DatasetId::from(name);
            controller.delete(&id).await?;
            println!("Deleted {id}.");
            Ok(())
        }
        Commands::Import { file, name } => handle_import(controller, file, name).await,
        Commands::Tools => handle_tools(controller).await,
        Commands::Analyze { name } => {
            let summary = controller.analyze(&DatasetId::from(name)).await?;
            println!("{}", serde_json::to_string_pretty(&summary.summary)?);
            Ok(())
        }
        Commands::Export {
            name,
            format,
            output,
        } => {
            // export formats come from the server when it lists any
            if let Err(e) = controller.load_tools().await {
                tracing::warn!("Using default export formats: {e}");
            }
            let dir = output.unwrap_or_else(|| client.resolved_export_dir());
            let path = controller
                .export(&DatasetId::from(name), &format, &dir)
                .await?;
            println!("Exported to {}", path.display());
            Ok(())
        }
        Commands::Set {
            name,
            row,
            column,
            value,
        } => handle_set(controller, name, row, &column, &value).await,
    }
}

async fn handle_datasets(controller: &DatasetController) -> Result<()> {
    controller.refresh().await?;
    let store = controller.store();
    if store.datasets().is_empty() {
        println!("No datasets.");
        return Ok(());
    }
    for id in store.datasets() {
        let marker = if store.active() == Some(id) { "*" } else { " " };
        println!("{marker} {id}");
    }
    Ok(())
}

async fn handle_show(controller: &DatasetController, name: String, limit: usize) -> Result<()> {
    let id = DatasetId::from(name);
    controller.select(id.clone()).await?;

    let store = controller.store();
    let grid = store.grid();
    println!("{}", grid.columns().join("\t"));
    for row in grid.head(limit).rows() {
        let cells: Vec<String> = row.iter().map(|c| c.display_text()).collect();
        println!("{}", cells.join("\t"));
    }
    if grid.row_count() > limit {
        println!("… {} more rows", grid.row_count() - limit);
    }
    Ok(())
}

async fn handle_import(
    controller: &DatasetController,
    file: PathBuf,
    name: Option<String>,
) -> Result<()> {
    if let Err(e) = controller.load_tools().await {
        tracing::warn!("Import tools unavailable, skipping type check: {e}");
    }

    let request = ImportRequest::new(&file, name.as_deref())?;
    println!(
        "Uploading {} ({}) as '{}'...",
        request.file_name(),
        format_file_size(request.size()),
        request.dataset_name()
    );

    let progress: ProgressFn = Arc::new(|pct| {
        print!("\r{pct:>3}%");
        std::io::stdout().flush().ok();
    });
    let id = controller.import(request, progress).await?;
    println!();

    let store = controller.store();
    println!(
        "Imported {id}: {} rows, {} columns.",
        store.grid().row_count(),
        store.grid().column_count()
    );
    Ok(())
}

async fn handle_tools(controller: &DatasetController) -> Result<()> {
    let loaded = controller.load_tools().await;
    let registry = controller.registry();
    print_list("Import tools", registry.import_tools());
    print_list("Transformation tools", registry.transformation_tools());
    print_list("Export formats", &registry.export_formats());
    loaded.context("Some tool lists could not be loaded")?;
    Ok(())
}

fn print_list(title: &str, items: &[String]) {
    println!("{title}:");
    if items.is_empty() {
        println!("  (none)");
    }
    for item in items {
        println!("  {item}");
    }
}

async fn handle_set(
    controller: &DatasetController,
    name: String,
    row: usize,
    column: &str,
    value: &str,
) -> Result<()> {
    let id = DatasetId::from(name);
    if controller.select(id.clone()).await? == SelectOutcome::Superseded {
        anyhow::bail!("selection of {id} was superseded");
    }

    let edited = {
        let store = controller.store();
        let grid = store.grid();
        let col = grid
            .columns()
            .iter()
            .position(|c| c == column)
            .with_context(|| format!("{id} has no column '{column}'"))?;
        let r = row
            .checked_sub(1)
            .filter(|r| *r < grid.row_count())
            .with_context(|| format!("{id} has {} rows, row {row} is out of range", grid.row_count()))?;
        let previous = grid.cell(r, col).map(|c| c.value.clone()).unwrap_or_default();
        grid.with_cell(r, col, Cell::from_input(value, &previous))?
    };
    controller.edit(edited);

    match controller.save().await? {
        SaveOutcome::Saved { dataset, rows } => println!("Saved {dataset} ({rows} rows)."),
        SaveOutcome::Skipped => println!("Nothing to save."),
    }
    Ok(())
}
