//! Client side of the dataset service's REST surface.
//!
//! [`DatasetApi`] is the seam between the rest of the crate and the network:
//! [`HttpDatasetApi`] talks to the real backend, tests substitute an
//! in-memory implementation.
//!
//! | Method | Path | Operation |
//! |---|---|---|
//! | GET | `/datasets/` | [`DatasetApi::list_datasets`] |
//! | GET | `/datasets/{name}/` | [`DatasetApi::fetch_dataset`] |
//! | POST | `/datasets/{name}/save/` | [`DatasetApi::save_dataset`] |
//! | DELETE | `/datasets/{name}/delete/` | [`DatasetApi::delete_dataset`] |
//! | POST | `/import/` | [`DatasetApi::upload_dataset`] |
//! | GET | `/import/tools/` | [`DatasetApi::list_import_tools`] |
//! | GET | `/transformations/tools/` | [`DatasetApi::list_transformation_tools`] |
//! | GET | `/export/tools/` | [`DatasetApi::list_export_tools`] |
//! | GET | `/analysis/{name}/` | [`DatasetApi::analyze_dataset`] |
//! | GET | `/export/?dataset_name=&file_type=` | [`DatasetApi::export_dataset`] |
//!
//! Every call is one-shot: failures come straight back to the caller.

pub mod http;
pub mod progress;

pub use http::HttpDatasetApi;
pub use progress::{ProgressFn, UploadProgress};

use crate::dataset::DatasetId;
use crate::error::Result;
use crate::grid::{Cell, Grid, Record};
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// `GET /datasets/`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DatasetListing {
    pub datasets: Vec<DatasetId>,
    /// Some backend versions advertise which dataset they consider current.
    #[serde(default)]
    pub active_dataset: Option<DatasetId>,
}

/// `GET /datasets/{name}/`. Two shapes exist in the wild: named row objects,
/// and pre-celled positional rows.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum DatasetRows {
    Records { data: Vec<Record> },
    Cells { values: Vec<Vec<Cell>> },
}

impl DatasetRows {
    pub fn into_grid(self) -> Grid {
        match self {
            Self::Records { data } => Grid::from_records(&data),
            Self::Cells { values } => Grid::from_cell_rows(values),
        }
    }
}

/// Body of `POST /datasets/{name}/save/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveRequest {
    pub data: Vec<Record>,
}

impl SaveRequest {
    pub fn from_grid(grid: &Grid) -> Self {
        Self {
            data: grid.to_records(),
        }
    }
}

/// What the backend echoes after a save.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SaveAck {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Vec<Record>,
}

/// A file ready to be sent to `POST /import/`.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub mime_type: &'static str,
    pub dataset_name: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ImportResponse {
    pub dataset_name: DatasetId,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ImportTools {
    pub import_tools: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TransformationTools {
    pub transformation_tools: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ExportTools {
    pub export_tools: Vec<String>,
}

/// `GET /analysis/{name}/`: summary statistics, opaque to the client.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AnalysisSummary {
    #[serde(default)]
    pub summary: serde_json::Map<String, serde_json::Value>,
}

/// A downloaded export.
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Operations the client needs from the dataset service.
#[async_trait]
pub trait DatasetApi: Send + Sync {
    async fn list_datasets(&self) -> Result<DatasetListing>;

    async fn fetch_dataset(&self, id: &DatasetId) -> Result<DatasetRows>;

    async fn save_dataset(&self, id: &DatasetId, grid: &Grid) -> Result<SaveAck>;

    async fn delete_dataset(&self, id: &DatasetId) -> Result<()>;

    /// Streams the file as multipart. `on_progress` sees non-decreasing
    /// percentages and, on success only, a final 100.
    async fn upload_dataset(&self, upload: Upload, on_progress: ProgressFn) -> Result<DatasetId>;

    async fn list_import_tools(&self) -> Result<Vec<String>>;

    async fn list_transformation_tools(&self) -> Result<Vec<String>>;

    async fn list_export_tools(&self) -> Result<Vec<String>>;

    async fn analyze_dataset(&self, id: &DatasetId) -> Result<AnalysisSummary>;

    async fn export_dataset(&self, id: &DatasetId, file_type: &str) -> Result<ExportedFile>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_listing_with_and_without_active() {
        let listing: DatasetListing =
            serde_json::from_value(json!({"datasets": ["sales", "inventory"]})).unwrap();
        assert_eq!(listing.datasets, vec![DatasetId::from("sales"), DatasetId::from("inventory")]);
        assert_eq!(listing.active_dataset, None);

        let listing: DatasetListing = serde_json::from_value(
            json!({"datasets": ["sales"], "active_dataset": "sales"}),
        )
        .unwrap();
        assert_eq!(listing.active_dataset, Some(DatasetId::from("sales")));
    }

    #[test]
    fn test_both_fetch_payload_shapes() {
        let rows: DatasetRows =
            serde_json::from_value(json!({"data": [{"q1": 10, "q2": 20}]})).unwrap();
        let grid = rows.into_grid();
        assert_eq!(grid.columns(), ["q1", "q2"]);

        let rows: DatasetRows =
            serde_json::from_value(json!({"values": [[{"value": 10}, {"value": 20}]]})).unwrap();
        let grid = rows.into_grid();
        assert_eq!(grid.columns(), ["column1", "column2"]);
        assert_eq!(grid.cell(0, 1), Some(&Cell::new(json!(20))));
    }

    #[test]
    fn test_save_request_uses_original_labels() {
        let record: Record = serde_json::from_value(json!({"region": "north", "units": 3})).unwrap();
        let grid = Grid::from_records(&[record]);
        let body = serde_json::to_value(SaveRequest::from_grid(&grid)).unwrap();
        assert_eq!(body, json!({"data": [{"region": "north", "units": 3}]}));
    }
}
