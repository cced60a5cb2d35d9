//! Async orchestration of [`DatasetApi`] calls against the [`DatasetStore`].
//!
//! The controller is cheap to clone; every clone shares the same store and
//! registry, so the GUI can hand one to each background task. Locks are only
//! held between awaits, never across them.

use crate::api::{AnalysisSummary, DatasetApi, DatasetRows, ProgressFn};
use crate::dataset::DatasetId;
use crate::error::{Result, WranglerError};
use crate::grid::Grid;
use crate::import::ImportRequest;
use crate::registry::ToolRegistry;
use crate::store::{DatasetStore, FetchTicket, SelectOutcome};
use parking_lot::{Mutex, MutexGuard};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing is active; no request was sent.
    Skipped,
    Saved { dataset: DatasetId, rows: usize },
}

#[derive(Clone)]
pub struct DatasetController {
    api: Arc<dyn DatasetApi>,
    store: Arc<Mutex<DatasetStore>>,
    registry: Arc<Mutex<ToolRegistry>>,
}

impl DatasetController {
    pub fn new(api: Arc<dyn DatasetApi>) -> Self {
        Self {
            api,
            store: Arc::new(Mutex::new(DatasetStore::new())),
            registry: Arc::new(Mutex::new(ToolRegistry::new())),
        }
    }

    /// Locks the store for reading or local mutation. Do not hold the guard
    /// across an await.
    pub fn store(&self) -> MutexGuard<'_, DatasetStore> {
        self.store.lock()
    }

    pub fn registry(&self) -> MutexGuard<'_, ToolRegistry> {
        self.registry.lock()
    }

    /// Reloads the dataset list, auto-selecting an entry when nothing is
    /// active.
    pub async fn refresh(&self) -> Result<()> {
        let ticket = self.store.lock().begin_refresh();
        let result = self.api.list_datasets().await;
        if let Err(e) = &result {
            warn!("Failed to list datasets: {e}");
        }

        let next = self.store.lock().finish_refresh(ticket, result)?;
        if let Some(fetch) = next {
            self.run_fetch(fetch).await?;
        }
        Ok(())
    }

    /// Makes `id` active and loads its rows. Resolves to
    /// [`SelectOutcome::Superseded`] when another selection was made first.
    pub async fn select(&self, id: DatasetId) -> Result<SelectOutcome> {
        let ticket = self.store.lock().begin_select(id);
        self.run_fetch(ticket).await
    }

    async fn run_fetch(&self, ticket: FetchTicket) -> Result<SelectOutcome> {
        debug!(dataset = %ticket.id(), "Fetching dataset rows");
        let result = self
            .api
            .fetch_dataset(ticket.id())
            .await
            .map(DatasetRows::into_grid);
        if let Err(e) = &result {
            warn!(dataset = %ticket.id(), "Failed to load dataset: {e}");
        }

        let id = ticket.id().clone();
        let outcome = self.store.lock().finish_select(ticket, result)?;
        if outcome == SelectOutcome::Applied {
            info!(dataset = %id, "Dataset loaded");
        }
        Ok(outcome)
    }

    pub fn edit(&self, grid: Grid) {
        self.store.lock().edit(grid);
    }

    /// Sends the grid as it is right now. Edits made while the request is in
    /// flight are not included and stay dirty.
    pub async fn save(&self) -> Result<SaveOutcome> {
        let Some(ticket) = self.store.lock().begin_save()? else {
            debug!("Save skipped: no active dataset");
            return Ok(SaveOutcome::Skipped);
        };

        let result = self.api.save_dataset(ticket.id(), ticket.grid()).await;
        self.store.lock().finish_save(&ticket, result.is_ok());

        match result {
            Ok(_) => {
                let rows = ticket.grid().row_count();
                info!(dataset = %ticket.id(), rows, "Dataset saved");
                Ok(SaveOutcome::Saved {
                    dataset: ticket.id().clone(),
                    rows,
                })
            }
            Err(e) => {
                warn!(dataset = %ticket.id(), "Failed to save dataset: {e}");
                Err(e)
            }
        }
    }

    pub async fn delete(&self, id: &DatasetId) -> Result<()> {
        if let Err(e) = self.api.delete_dataset(id).await {
            warn!(dataset = %id, "Failed to delete dataset: {e}");
            return Err(e);
        }
        info!(dataset = %id, "Dataset deleted");

        self.store.lock().remove(id);
        // the delete stands even if the re-list fails; the store keeps the error
        if let Err(e) = self.refresh().await {
            warn!(dataset = %id, "Dataset list not reloaded after delete: {e}");
        }
        Ok(())
    }

    /// Uploads a validated file and activates the dataset the server created.
    ///
    /// Returns the new id once the upload succeeds. A failure to re-list or
    /// load the new dataset afterwards is left in the store's error.
    pub async fn import(&self, request: ImportRequest, on_progress: ProgressFn) -> Result<DatasetId> {
        let allowed = self.registry.lock().import_tools().to_vec();
        request.check_allowed(&allowed)?;

        info!(
            file = request.file_name(),
            dataset = request.dataset_name(),
            size = request.size(),
            "Uploading dataset"
        );
        let upload = request.into_upload().await?;
        let id = match self.api.upload_dataset(upload, on_progress).await {
            Ok(id) => id,
            Err(e) => {
                warn!("Upload failed: {e}");
                return Err(e);
            }
        };
        info!(dataset = %id, "Import completed");

        if let Err(e) = self.import_completed(id.clone()).await {
            warn!(dataset = %id, "Imported dataset not loaded: {e}");
        }
        Ok(id)
    }

    /// Activates `id`, then re-lists and loads its rows concurrently.
    pub async fn import_completed(&self, id: DatasetId) -> Result<()> {
        let (fetch, refresh) = self.store.lock().begin_import_completed(id);

        let (listing, fetched) = tokio::join!(self.api.list_datasets(), self.run_fetch(fetch));
        if let Err(e) = &listing {
            warn!("Failed to list datasets: {e}");
        }

        let next = self.store.lock().finish_refresh(refresh, listing)?;
        if let Some(fetch) = next {
            self.run_fetch(fetch).await?;
        }
        fetched.map(|_| ())
    }

    /// Fetches the three tool lists. Lists that load are applied even when
    /// another one fails; the first failure is returned.
    pub async fn load_tools(&self) -> Result<()> {
        let (imports, transformations, exports) = tokio::join!(
            self.api.list_import_tools(),
            self.api.list_transformation_tools(),
            self.api.list_export_tools(),
        );

        let mut first_error = None;
        let mut registry = self.registry.lock();
        if let Some(tools) = keep_first_error(imports, "import", &mut first_error) {
            registry.set_import_tools(tools);
        }
        if let Some(tools) = keep_first_error(transformations, "transformation", &mut first_error) {
            registry.set_transformation_tools(tools);
        }
        if let Some(tools) = keep_first_error(exports, "export", &mut first_error) {
            registry.set_export_tools(tools);
        }
        drop(registry);

        first_error.map_or(Ok(()), Err)
    }

    pub async fn analyze(&self, id: &DatasetId) -> Result<AnalysisSummary> {
        match self.api.analyze_dataset(id).await {
            Ok(summary) => {
                info!(dataset = %id, "Analysis received");
                Ok(summary)
            }
            Err(e) => {
                warn!(dataset = %id, "Analysis failed: {e}");
                Err(e)
            }
        }
    }

    /// Downloads `id` as `file_type` into `dir`, returning the written path.
    pub async fn export(&self, id: &DatasetId, file_type: &str, dir: &Path) -> Result<PathBuf> {
        let formats = self.registry.lock().export_formats();
        if !formats.iter().any(|f| f.eq_ignore_ascii_case(file_type)) {
            return Err(WranglerError::Validation(format!(
                "unsupported export format '{file_type}' (available: {})",
                formats.join(", ")
            )));
        }

        let file = match self.api.export_dataset(id, file_type).await {
            Ok(file) => file,
            Err(e) => {
                warn!(dataset = %id, file_type, "Export failed: {e}");
                return Err(e);
            }
        };

        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(&file.file_name);
        tokio::fs::write(&path, &file.bytes).await?;
        info!(dataset = %id, path = %path.display(), "Export written");
        Ok(path)
    }
}

fn keep_first_error(
    result: Result<Vec<String>>,
    kind: &str,
    first_error: &mut Option<WranglerError>,
) -> Option<Vec<String>> {
    match result {
        Ok(tools) => Some(tools),
        Err(e) => {
            warn!("Failed to list {kind} tools: {e}");
            if first_error.is_none() {
                *first_error = Some(e);
            }
            None
        }
    }
}
