#![allow(clippy::unwrap_used)]

mod common;

use common::{FakeApi, records};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use wrangler::api::ProgressFn;
use wrangler::controller::{DatasetController, SaveOutcome};
use wrangler::grid::{Cell, Grid};
use wrangler::import::ImportRequest;
use wrangler::store::SelectOutcome;
use wrangler::DatasetId;

fn sales_and_inventory() -> Arc<FakeApi> {
    FakeApi::new()
        .with_dataset("sales", json!([{"q1": 10, "q2": 20}]))
        .with_dataset("inventory", json!([{"sku": "A-1", "stock": 4}, {"sku": "B-2", "stock": 0}]))
}

fn recorder() -> (ProgressFn, Arc<Mutex<Vec<u8>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let callback: ProgressFn = Arc::new(move |pct| sink.lock().push(pct));
    (callback, seen)
}

#[tokio::test]
async fn test_refresh_selects_first_dataset_and_loads_grid() {
    let api = sales_and_inventory();
    let controller = DatasetController::new(api.clone());

    controller.refresh().await.unwrap();

    let store = controller.store();
    assert_eq!(store.datasets(), [DatasetId::from("sales"), DatasetId::from("inventory")]);
    assert_eq!(store.active(), Some(&DatasetId::from("sales")));
    assert_eq!(store.grid().columns(), ["q1", "q2"]);
    assert_eq!(
        store.grid().rows(),
        [vec![Cell::new(json!(10)), Cell::new(json!(20))]]
    );
    assert!(!store.is_loading());
    assert_eq!(api.calls(), ["list", "fetch sales"]);
}

#[tokio::test]
async fn test_refresh_twice_does_not_reselect() {
    let api = sales_and_inventory();
    let controller = DatasetController::new(api.clone());

    controller.refresh().await.unwrap();
    controller.select(DatasetId::from("inventory")).await.unwrap();
    controller.refresh().await.unwrap();

    assert_eq!(controller.store().active(), Some(&DatasetId::from("inventory")));
    assert_eq!(api.count_calls("fetch"), 2);
}

#[tokio::test]
async fn test_save_without_active_dataset_sends_nothing() {
    let api = FakeApi::new();
    let controller = DatasetController::new(api.clone());

    let outcome = controller.save().await.unwrap();

    assert_eq!(outcome, SaveOutcome::Skipped);
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_save_sends_edited_rows_with_original_labels() {
    let api = sales_and_inventory();
    let controller = DatasetController::new(api.clone());
    controller.refresh().await.unwrap();

    let edited = {
        let store = controller.store();
        store.grid().with_cell(0, 1, Cell::new(json!(25))).unwrap()
    };
    controller.edit(edited);
    assert!(controller.store().is_dirty());

    let outcome = controller.save().await.unwrap();

    assert_eq!(
        outcome,
        SaveOutcome::Saved {
            dataset: DatasetId::from("sales"),
            rows: 1
        }
    );
    assert!(!controller.store().is_dirty());
    assert_eq!(
        api.saved(),
        [(DatasetId::from("sales"), records(json!([{"q1": 10, "q2": 25}])))]
    );
}

#[tokio::test]
async fn test_rejected_upload_leaves_datasets_unchanged() {
    let api = sales_and_inventory();
    api.reject_uploads("Unsupported file type");
    let controller = DatasetController::new(api.clone());
    controller.refresh().await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("q3.csv");
    std::fs::write(&path, "region,units\nnorth,3\n").unwrap();
    let request = ImportRequest::new(&path, None).unwrap();
    let (progress, seen) = recorder();

    let err = controller.import(request, progress).await.unwrap_err();

    assert!(err.is_validation(), "{err:?}");
    assert!(!seen.lock().contains(&100));
    let store = controller.store();
    assert_eq!(store.datasets(), [DatasetId::from("sales"), DatasetId::from("inventory")]);
    assert_eq!(store.active(), Some(&DatasetId::from("sales")));
}

#[tokio::test]
async fn test_import_activates_new_dataset() {
    let api = sales_and_inventory();
    let controller = DatasetController::new(api.clone());
    controller.refresh().await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("q3.csv");
    std::fs::write(&path, "region,units\nnorth,3\nsouth,5\n").unwrap();
    let request = ImportRequest::new(&path, Some("q3_sales")).unwrap();
    let (progress, seen) = recorder();

    let id = controller.import(request, progress).await.unwrap();

    assert_eq!(id, DatasetId::from("q3_sales"));
    let seen = seen.lock().clone();
    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{seen:?}");
    assert_eq!(seen.last(), Some(&100));

    // the new entry is listed last, yet stays active after the re-list
    let store = controller.store();
    assert_eq!(store.datasets().last(), Some(&DatasetId::from("q3_sales")));
    assert_eq!(store.active(), Some(&DatasetId::from("q3_sales")));
    assert_eq!(store.grid().columns(), ["region", "units"]);
    assert_eq!(store.grid().row_count(), 2);
}

#[tokio::test]
async fn test_import_succeeds_when_new_dataset_fails_to_load() {
    let api = sales_and_inventory();
    api.fail_fetch("q3_sales");
    let controller = DatasetController::new(api.clone());
    controller.refresh().await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("q3.csv");
    std::fs::write(&path, "region,units\nnorth,3\n").unwrap();
    let request = ImportRequest::new(&path, Some("q3_sales")).unwrap();
    let (progress, _) = recorder();

    let id = controller.import(request, progress).await.unwrap();

    assert_eq!(id, DatasetId::from("q3_sales"));
    assert_eq!(api.count_calls("upload"), 1);
    let store = controller.store();
    assert_eq!(store.datasets().last(), Some(&DatasetId::from("q3_sales")));
    assert_eq!(store.active(), Some(&DatasetId::from("q3_sales")));
    assert!(store.grid().is_empty());
    assert!(store.error().is_some_and(|e| e.contains("timeout")), "{:?}", store.error());
}

#[tokio::test]
async fn test_import_accepts_excel_with_processor_tool_names() {
    let api = sales_and_inventory();
    api.set_import_tools(&["CSV", "Excel", "JSON", "XML", "Parquet"]);
    let controller = DatasetController::new(api.clone());
    controller.load_tools().await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("book.xlsx");
    std::fs::write(&path, b"PK\x03\x04").unwrap();
    let request = ImportRequest::new(&path, Some("book")).unwrap();
    let (progress, _) = recorder();

    let id = controller.import(request, progress).await.unwrap();

    assert_eq!(id, DatasetId::from("book"));
    assert_eq!(api.count_calls("upload"), 1);
}

#[tokio::test]
async fn test_import_tools_restrict_file_types_before_upload() {
    let api = sales_and_inventory();
    api.set_import_tools(&["json"]);
    let controller = DatasetController::new(api.clone());
    controller.load_tools().await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("q3.csv");
    std::fs::write(&path, "region,units\nnorth,3\n").unwrap();
    let request = ImportRequest::new(&path, None).unwrap();
    let (progress, _) = recorder();

    let err = controller.import(request, progress).await.unwrap_err();

    assert!(err.is_validation(), "{err:?}");
    assert_eq!(api.count_calls("upload"), 0);
}

#[tokio::test]
async fn test_later_selection_wins() {
    let api = sales_and_inventory();
    let release_sales = api.gate("sales");
    let controller = DatasetController::new(api.clone());

    let (first, second) = tokio::join!(controller.select(DatasetId::from("sales")), async {
        let outcome = controller.select(DatasetId::from("inventory")).await;
        release_sales.send(()).ok();
        outcome
    });

    assert_eq!(first.unwrap(), SelectOutcome::Superseded);
    assert_eq!(second.unwrap(), SelectOutcome::Applied);
    let store = controller.store();
    assert_eq!(store.active(), Some(&DatasetId::from("inventory")));
    assert_eq!(store.grid().columns(), ["sku", "stock"]);
    assert!(!store.is_fetching());
}

#[tokio::test]
async fn test_failed_select_keeps_selection_with_empty_grid() {
    let api = sales_and_inventory();
    let controller = DatasetController::new(api.clone());
    controller.refresh().await.unwrap();

    let err = controller.select(DatasetId::from("archive")).await.unwrap_err();

    assert!(err.is_not_found());
    let store = controller.store();
    assert_eq!(store.active(), Some(&DatasetId::from("archive")));
    assert!(store.grid().is_empty());
    assert!(store.error().is_some());
    // the list itself is untouched
    assert_eq!(store.datasets().len(), 2);
}

#[tokio::test]
async fn test_deleting_active_dataset_selects_next() {
    let api = sales_and_inventory();
    let controller = DatasetController::new(api.clone());
    controller.refresh().await.unwrap();

    controller.delete(&DatasetId::from("sales")).await.unwrap();

    let store = controller.store();
    assert_eq!(store.datasets(), [DatasetId::from("inventory")]);
    assert_eq!(store.active(), Some(&DatasetId::from("inventory")));
    assert_eq!(store.grid().row_count(), 2);
}

#[tokio::test]
async fn test_deleting_last_dataset_clears_grid() {
    let api = FakeApi::new().with_dataset("sales", json!([{"q1": 10}]));
    let controller = DatasetController::new(api.clone());
    controller.refresh().await.unwrap();

    controller.delete(&DatasetId::from("sales")).await.unwrap();

    let store = controller.store();
    assert!(store.datasets().is_empty());
    assert_eq!(store.active(), None);
    assert_eq!(*store.grid(), Grid::empty());
}

#[tokio::test]
async fn test_export_writes_file() {
    let api = sales_and_inventory();
    api.set_export_tools(&["csv", "json"]);
    let controller = DatasetController::new(api.clone());
    controller.load_tools().await.unwrap();
    let dir = tempfile::tempdir().unwrap();

    let path = controller
        .export(&DatasetId::from("sales"), "json", dir.path())
        .await
        .unwrap();

    assert_eq!(path, dir.path().join("sales.json"));
    let written: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(written, json!([{"q1": 10, "q2": 20}]));
}

#[tokio::test]
async fn test_export_rejects_unlisted_format() {
    let api = sales_and_inventory();
    api.set_export_tools(&["csv"]);
    let controller = DatasetController::new(api.clone());
    controller.load_tools().await.unwrap();
    let dir = tempfile::tempdir().unwrap();

    let err = controller
        .export(&DatasetId::from("sales"), "xlsx", dir.path())
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(api.count_calls("export sales"), 0);
}

#[tokio::test]
async fn test_analyze_returns_summary() {
    let api = sales_and_inventory();
    let controller = DatasetController::new(api.clone());

    let summary = controller.analyze(&DatasetId::from("inventory")).await.unwrap();

    assert_eq!(summary.summary.get("row_count"), Some(&json!(2)));
}

#[tokio::test]
async fn test_delete_succeeds_when_next_dataset_fails_to_load() {
    let api = sales_and_inventory();
    let controller = DatasetController::new(api.clone());
    controller.refresh().await.unwrap();
    api.fail_fetch("inventory");

    controller.delete(&DatasetId::from("sales")).await.unwrap();

    assert_eq!(api.names(), [DatasetId::from("inventory")]);
    let store = controller.store();
    assert_eq!(store.datasets(), [DatasetId::from("inventory")]);
    assert_eq!(store.active(), Some(&DatasetId::from("inventory")));
    assert!(store.grid().is_empty());
    assert!(store.error().is_some());
}

#[tokio::test]
async fn test_delete_succeeds_when_relist_fails() {
    let api = sales_and_inventory();
    let controller = DatasetController::new(api.clone());
    controller.refresh().await.unwrap();
    api.fail_listing();

    controller.delete(&DatasetId::from("sales")).await.unwrap();

    assert_eq!(api.names(), [DatasetId::from("inventory")]);
    let store = controller.store();
    // the deleted entry is dropped locally even without a fresh listing
    assert_eq!(store.datasets(), [DatasetId::from("inventory")]);
    assert_eq!(store.active(), None);
    assert!(store.error().is_some_and(|e| e.contains("timeout")), "{:?}", store.error());
}
