#![allow(dead_code, clippy::unwrap_used)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::oneshot;
use wrangler::api::{
    AnalysisSummary, DatasetApi, DatasetListing, DatasetRows, ExportedFile, ProgressFn, SaveAck,
    Upload,
};
use wrangler::grid::{Grid, Record};
use wrangler::{DatasetId, Result, WranglerError};

/// In-memory dataset service. Datasets keep insertion order, new uploads are
/// appended last.
#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    datasets: Vec<(DatasetId, Vec<Record>)>,
    calls: Vec<String>,
    saved: Vec<(DatasetId, Vec<Record>)>,
    gates: HashMap<DatasetId, oneshot::Receiver<()>>,
    failing_fetches: HashSet<DatasetId>,
    listing_fails: bool,
    upload_rejection: Option<String>,
    import_tools: Vec<String>,
    export_tools: Vec<String>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_dataset(self: Arc<Self>, name: &str, rows: Value) -> Arc<Self> {
        self.state
            .lock()
            .datasets
            .push((DatasetId::from(name), records(rows)));
        self
    }

    /// Holds the next fetch of `name` until the returned sender fires.
    pub fn gate(&self, name: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state.lock().gates.insert(DatasetId::from(name), rx);
        tx
    }

    /// Every fetch of `name` fails as if the connection timed out.
    pub fn fail_fetch(&self, name: &str) {
        self.state.lock().failing_fetches.insert(DatasetId::from(name));
    }

    /// Every listing fails as if the connection timed out.
    pub fn fail_listing(&self) {
        self.state.lock().listing_fails = true;
    }

    pub fn reject_uploads(&self, message: &str) {
        self.state.lock().upload_rejection = Some(message.to_owned());
    }

    pub fn set_import_tools(&self, tools: &[&str]) {
        self.state.lock().import_tools = tools.iter().map(|t| (*t).to_owned()).collect();
    }

    pub fn set_export_tools(&self, tools: &[&str]) {
        self.state.lock().export_tools = tools.iter().map(|t| (*t).to_owned()).collect();
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn saved(&self) -> Vec<(DatasetId, Vec<Record>)> {
        self.state.lock().saved.clone()
    }

    pub fn names(&self) -> Vec<DatasetId> {
        self.state
            .lock()
            .datasets
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    fn record_call(&self, call: String) {
        self.state.lock().calls.push(call);
    }

    fn rows_of(&self, id: &DatasetId) -> Option<Vec<Record>> {
        self.state
            .lock()
            .datasets
            .iter()
            .find(|(name, _)| name == id)
            .map(|(_, rows)| rows.clone())
    }
}

pub fn records(rows: Value) -> Vec<Record> {
    serde_json::from_value(rows).unwrap()
}

/// Header line plus comma-separated values; numeric fields become numbers.
fn parse_csv(bytes: &[u8]) -> Vec<Record> {
    let text = String::from_utf8_lossy(bytes);
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let Some(header) = lines.next() else {
        return Vec::new();
    };
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();
    lines
        .map(|line| {
            columns
                .iter()
                .zip(line.split(',').map(str::trim))
                .map(|(col, raw)| {
                    let value = raw
                        .parse::<i64>()
                        .map(Value::from)
                        .unwrap_or_else(|_| Value::from(raw));
                    ((*col).to_owned(), value)
                })
                .collect()
        })
        .collect()
}

#[async_trait]
impl DatasetApi for FakeApi {
    async fn list_datasets(&self) -> Result<DatasetListing> {
        self.record_call("list".to_owned());
        if self.state.lock().listing_fails {
            return Err(WranglerError::transport("timeout"));
        }
        Ok(DatasetListing {
            datasets: self.names(),
            active_dataset: None,
        })
    }

    async fn fetch_dataset(&self, id: &DatasetId) -> Result<DatasetRows> {
        self.record_call(format!("fetch {id}"));
        let gate = { self.state.lock().gates.remove(id) };
        if let Some(gate) = gate {
            gate.await.ok();
        }
        if self.state.lock().failing_fetches.contains(id) {
            return Err(WranglerError::transport("timeout"));
        }
        self.rows_of(id)
            .map(|data| DatasetRows::Records { data })
            .ok_or_else(|| WranglerError::NotFound(id.to_string()))
    }

    async fn save_dataset(&self, id: &DatasetId, grid: &Grid) -> Result<SaveAck> {
        self.record_call(format!("save {id}"));
        let data = grid.to_records();
        let mut state = self.state.lock();
        state.saved.push((id.clone(), data.clone()));
        if let Some((_, rows)) = state.datasets.iter_mut().find(|(name, _)| name == id) {
            rows.clone_from(&data);
        }
        Ok(SaveAck {
            message: Some("Dataset saved successfully".to_owned()),
            data,
        })
    }

    async fn delete_dataset(&self, id: &DatasetId) -> Result<()> {
        self.record_call(format!("delete {id}"));
        let mut state = self.state.lock();
        let before = state.datasets.len();
        state.datasets.retain(|(name, _)| name != id);
        if state.datasets.len() == before {
            return Err(WranglerError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn upload_dataset(&self, upload: Upload, on_progress: ProgressFn) -> Result<DatasetId> {
        self.record_call(format!("upload {}", upload.dataset_name));
        let rejection = { self.state.lock().upload_rejection.clone() };
        if let Some(message) = rejection {
            on_progress(30);
            return Err(WranglerError::Validation(message));
        }

        for pct in [30, 60, 99] {
            on_progress(pct);
        }
        let id = DatasetId::from(upload.dataset_name.as_str());
        let rows = parse_csv(&upload.bytes);
        {
            let mut state = self.state.lock();
            state.datasets.retain(|(name, _)| *name != id);
            state.datasets.push((id.clone(), rows));
        }
        on_progress(100);
        Ok(id)
    }

    async fn list_import_tools(&self) -> Result<Vec<String>> {
        self.record_call("import tools".to_owned());
        Ok(self.state.lock().import_tools.clone())
    }

    async fn list_transformation_tools(&self) -> Result<Vec<String>> {
        self.record_call("transformation tools".to_owned());
        Ok(vec!["filter".to_owned(), "sort".to_owned()])
    }

    async fn list_export_tools(&self) -> Result<Vec<String>> {
        self.record_call("export tools".to_owned());
        Ok(self.state.lock().export_tools.clone())
    }

    async fn analyze_dataset(&self, id: &DatasetId) -> Result<AnalysisSummary> {
        self.record_call(format!("analyze {id}"));
        let rows = self
            .rows_of(id)
            .ok_or_else(|| WranglerError::NotFound(id.to_string()))?;
        let mut summary = serde_json::Map::new();
        summary.insert("row_count".to_owned(), Value::from(rows.len()));
        Ok(AnalysisSummary { summary })
    }

    async fn export_dataset(&self, id: &DatasetId, file_type: &str) -> Result<ExportedFile> {
        self.record_call(format!("export {id} {file_type}"));
        let rows = self
            .rows_of(id)
            .ok_or_else(|| WranglerError::NotFound(id.to_string()))?;
        Ok(ExportedFile {
            file_name: format!("{id}.{file_type}"),
            bytes: serde_json::to_vec(&rows)?.into(),
        })
    }
}
