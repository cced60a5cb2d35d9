use super::progress::{UploadProgress, chunked_body};
use super::{
    AnalysisSummary, DatasetApi, DatasetListing, DatasetRows, ExportTools, ExportedFile,
    ImportResponse, ImportTools, ProgressFn, SaveAck, SaveRequest, TransformationTools, Upload,
};
use crate::config::ClientConfig;
use crate::dataset::DatasetId;
use crate::error::{Result, WranglerError};
use crate::grid::Grid;
use async_trait::async_trait;
use reqwest::{StatusCode, Url, header};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Which call a response belongs to; decides how failure statuses map onto
/// error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    ListDatasets,
    FetchDataset,
    SaveDataset,
    DeleteDataset,
    Upload,
    ImportTools,
    TransformationTools,
    ExportTools,
    Analyze,
    Export,
}

impl Operation {
    fn targets_dataset(self) -> bool {
        matches!(
            self,
            Self::FetchDataset | Self::SaveDataset | Self::DeleteDataset | Self::Analyze | Self::Export
        )
    }

    // 400 on export means the file type was refused
    fn reports_validation(self) -> bool {
        matches!(self, Self::Upload | Self::Export)
    }
}

/// Maps a non-success response onto the error kinds callers act on.
pub(crate) fn classify_failure(
    op: Operation,
    status: StatusCode,
    body: &str,
    subject: &str,
) -> WranglerError {
    let message = error_message(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_owned()
    });
    match status.as_u16() {
        404 if op.targets_dataset() => WranglerError::NotFound(subject.to_owned()),
        400 | 422 if op.reports_validation() => WranglerError::Validation(message),
        code => WranglerError::Transport {
            status: Some(code),
            message,
        },
    }
}

/// Pulls `error` (and `details`) out of the backend's JSON error body.
fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
        return Some(body.chars().take(200).collect());
    };
    let error = json.get("error").and_then(|v| v.as_str())?;
    match json.get("details").and_then(|v| v.as_str()) {
        Some(details) => Some(format!("{error}: {details}")),
        None => Some(error.to_owned()),
    }
}

/// `attachment; filename=sales.csv` -> `sales.csv`, keeping only the final
/// path component.
fn attachment_file_name(header: Option<&str>) -> Option<String> {
    let raw = header?
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))?
        .trim_matches('"');
    Path::new(raw)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .map(str::to_owned)
}

/// [`DatasetApi`] over HTTP with reqwest.
pub struct HttpDatasetApi {
    client: reqwest::Client,
    base_url: Url,
    request_timeout: Duration,
    upload_chunk_size: usize,
}

impl HttpDatasetApi {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.api_base_url).map_err(|e| {
            WranglerError::Config(format!(
                "invalid API base URL '{}': {e}",
                config.api_base_url
            ))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(WranglerError::Config(format!(
                "API base URL '{base_url}' cannot carry a path"
            )));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| WranglerError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            upload_chunk_size: config.upload_chunk_size,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL plus percent-encoded path segments and the trailing slash the
    /// backend's routes expect.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                WranglerError::Config(format!("API base URL '{}' cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments)
            .push("");
        Ok(url)
    }

    pub(crate) fn export_url(&self, id: &DatasetId, file_type: &str) -> Result<Url> {
        let mut url = self.endpoint(&["export"])?;
        url.query_pairs_mut()
            .append_pair("dataset_name", id.as_str())
            .append_pair("file_type", file_type);
        Ok(url)
    }

    async fn check(
        response: reqwest::Response,
        op: Operation,
        subject: &str,
    ) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let err = classify_failure(op, status, &body, subject);
        tracing::debug!(?op, %status, "backend rejected request: {err}");
        Err(err)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, op: Operation, subject: &str) -> Result<T> {
        tracing::debug!(?op, %url, "GET");
        let response = self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await?;
        let response = Self::check(response, op, subject).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl DatasetApi for HttpDatasetApi {
    async fn list_datasets(&self) -> Result<DatasetListing> {
        let url = self.endpoint(&["datasets"])?;
        self.get_json(url, Operation::ListDatasets, "datasets").await
    }

    async fn fetch_dataset(&self, id: &DatasetId) -> Result<DatasetRows> {
        let url = self.endpoint(&["datasets", id.as_str()])?;
        self.get_json(url, Operation::FetchDataset, id.as_str()).await
    }

    async fn save_dataset(&self, id: &DatasetId, grid: &Grid) -> Result<SaveAck> {
        let url = self.endpoint(&["datasets", id.as_str(), "save"])?;
        tracing::debug!(%url, rows = grid.row_count(), "POST");
        let response = self
            .client
            .post(url)
            .timeout(self.request_timeout)
            .json(&SaveRequest::from_grid(grid))
            .send()
            .await?;
        let response = Self::check(response, Operation::SaveDataset, id.as_str()).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(SaveAck::default());
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn delete_dataset(&self, id: &DatasetId) -> Result<()> {
        let url = self.endpoint(&["datasets", id.as_str(), "delete"])?;
        tracing::debug!(%url, "DELETE");
        let response = self
            .client
            .delete(url)
            .timeout(self.request_timeout)
            .send()
            .await?;
        Self::check(response, Operation::DeleteDataset, id.as_str()).await?;
        Ok(())
    }

    async fn upload_dataset(&self, upload: Upload, on_progress: ProgressFn) -> Result<DatasetId> {
        let url = self.endpoint(&["import"])?;
        let total = upload.bytes.len() as u64;
        let progress = Arc::new(UploadProgress::new(total, on_progress));

        let body = reqwest::Body::wrap_stream(chunked_body(
            upload.bytes,
            self.upload_chunk_size,
            Arc::clone(&progress),
        ));
        let part = reqwest::multipart::Part::stream_with_length(body, total)
            .file_name(upload.file_name)
            .mime_str(upload.mime_type)?;
        let form = reqwest::multipart::Form::new()
            .text("dataset_name", upload.dataset_name.clone())
            .part("file", part);

        tracing::debug!(%url, bytes = total, "POST multipart");
        // No overall timeout: large files legitimately take a while.
        let response = self.client.post(url).multipart(form).send().await?;
        let response = Self::check(response, Operation::Upload, &upload.dataset_name).await?;
        let ack: ImportResponse = response.json().await?;

        progress.finish();
        Ok(ack.dataset_name)
    }

    async fn list_import_tools(&self) -> Result<Vec<String>> {
        let url = self.endpoint(&["import", "tools"])?;
        let tools: ImportTools = self.get_json(url, Operation::ImportTools, "import tools").await?;
        Ok(tools.import_tools)
    }

    async fn list_transformation_tools(&self) -> Result<Vec<String>> {
        let url = self.endpoint(&["transformations", "tools"])?;
        let tools: TransformationTools = self
            .get_json(url, Operation::TransformationTools, "transformation tools")
            .await?;
        Ok(tools.transformation_tools)
    }

    async fn list_export_tools(&self) -> Result<Vec<String>> {
        let url = self.endpoint(&["export", "tools"])?;
        let tools: ExportTools = self.get_json(url, Operation::ExportTools, "export tools").await?;
        Ok(tools.export_tools)
    }

    async fn analyze_dataset(&self, id: &DatasetId) -> Result<AnalysisSummary> {
        let url = self.endpoint(&["analysis", id.as_str()])?;
        self.get_json(url, Operation::Analyze, id.as_str()).await
    }

    async fn export_dataset(&self, id: &DatasetId, file_type: &str) -> Result<ExportedFile> {
        let url = self.export_url(id, file_type)?;
        tracing::debug!(%url, "GET export");
        let response = self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await?;
        let response = Self::check(response, Operation::Export, id.as_str()).await?;

        let file_name = attachment_file_name(
            response
                .headers()
                .get(header::CONTENT_DISPOSITION)
                .and_then(|v| v.to_str().ok()),
        )
        .unwrap_or_else(|| format!("{id}.{file_type}"));
        let bytes = response.bytes().await?;
        Ok(ExportedFile { file_name, bytes })
    }
}
