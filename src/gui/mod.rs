//! Desktop shell: sidebar navigation, toolbar, and the three pages.
//!
//! Backend work runs on the tokio runtime owned by `main`. Each task reports
//! back with exactly one [`UiEvent`] over a crossbeam channel, which
//! [`WranglerApp::update`] drains every frame before drawing. A task that
//! panics reports [`UiEvent::TaskFailed`] instead.

pub mod datasets_page;
pub mod grid_view;
pub mod import_page;

use crate::api::AnalysisSummary;
use crate::config::{self, AppConfig};
use crate::controller::{DatasetController, SaveOutcome};
use crate::dataset::DatasetId;
use crate::route::Route;
use crate::store::SelectOutcome;
use crate::toolbar::{ToolEffect, Toolbar};
use crossbeam_channel::{Receiver, Sender};
use datasets_page::{DatasetsAction, DatasetsPage};
use eframe::egui;
use grid_view::GridView;
use import_page::ImportPage;
use std::future::Future;
use std::path::PathBuf;

const PREFS_KEY: &str = "wrangler_prefs";

enum UiEvent {
    Refreshed(Result<(), String>),
    Selected(DatasetId, Result<SelectOutcome, String>),
    Saved(Result<SaveOutcome, String>),
    Deleted(DatasetId, Result<(), String>),
    Imported(Result<DatasetId, String>),
    ToolsLoaded(Result<(), String>),
    Analyzed(DatasetId, Result<AnalysisSummary, String>),
    Exported(DatasetId, Result<PathBuf, String>),
    /// Startup with a spreadsheet route: the restored selection and the
    /// listing that ran beside it.
    Restored(DatasetId, Result<SelectOutcome, String>, Result<(), String>),
    TaskFailed(String),
}

/// UI state that survives restarts through eframe storage.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
struct Prefs {
    last_route: String,
    export_format: String,
    read_only: bool,
}

impl Default for Prefs {
    fn default() -> Self {
        Self {
            last_route: Route::Import.path(),
            export_format: "csv".to_owned(),
            read_only: false,
        }
    }
}

pub struct WranglerApp {
    controller: DatasetController,
    runtime: tokio::runtime::Handle,
    events_tx: Sender<UiEvent>,
    events_rx: Receiver<UiEvent>,
    config: AppConfig,
    prefs: Prefs,

    route: Route,
    toolbar: Toolbar,
    import_page: ImportPage,
    datasets_page: DatasetsPage,
    grid_view: GridView,
    shown_dataset: Option<DatasetId>,
    analysis: Option<(DatasetId, AnalysisSummary)>,
    status: Option<(bool, String)>,
    pending: usize,
}

impl WranglerApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        controller: DatasetController,
        runtime: tokio::runtime::Handle,
        config: AppConfig,
    ) -> Self {
        crate::theme::apply_wrangler_theme(&cc.egui_ctx);

        let prefs: Prefs = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, PREFS_KEY))
            .unwrap_or_default();
        let route = Route::parse(&prefs.last_route).unwrap_or_default();
        let (events_tx, events_rx) = crossbeam_channel::unbounded();

        let mut app = Self {
            controller,
            runtime,
            events_tx,
            events_rx,
            config,
            prefs,
            route,
            toolbar: Toolbar::default(),
            import_page: ImportPage::default(),
            datasets_page: DatasetsPage::default(),
            grid_view: GridView::default(),
            shown_dataset: None,
            analysis: None,
            status: None,
            pending: 0,
        };
        app.start(&cc.egui_ctx);
        app
    }

    fn start(&mut self, ctx: &egui::Context) {
        let controller = self.controller.clone();
        let restore = match &self.route {
            Route::Spreadsheet(id) => Some(id.clone()),
            _ => None,
        };
        self.spawn(ctx, restore_session(controller, restore));

        let controller = self.controller.clone();
        self.spawn(ctx, async move {
            UiEvent::ToolsLoaded(controller.load_tools().await.map_err(String::from))
        });
    }

    fn spawn<F>(&mut self, ctx: &egui::Context, task: F)
    where
        F: Future<Output = UiEvent> + Send + 'static,
    {
        self.pending += 1;
        spawn_reporting(&self.runtime, self.events_tx.clone(), ctx.clone(), task);
    }

    fn log_action(&mut self, action: &str, details: &str) {
        self.config.activity.push(action, details);
    }

    fn set_status(&mut self, ok: bool, text: impl Into<String>) {
        self.status = Some((ok, text.into()));
    }

    fn refresh(&mut self, ctx: &egui::Context) {
        let controller = self.controller.clone();
        self.spawn(ctx, async move {
            UiEvent::Refreshed(controller.refresh().await.map_err(String::from))
        });
    }

    fn open_dataset(&mut self, ctx: &egui::Context, id: DatasetId) {
        self.route = Route::Spreadsheet(id.clone());
        let controller = self.controller.clone();
        self.spawn(ctx, async move {
            let result = controller.select(id.clone()).await.map_err(String::from);
            UiEvent::Selected(id, result)
        });
    }

    fn save(&mut self, ctx: &egui::Context) {
        let controller = self.controller.clone();
        self.spawn(ctx, async move {
            UiEvent::Saved(controller.save().await.map_err(String::from))
        });
    }

    fn run_effect(&mut self, ctx: &egui::Context, name: &str, effect: ToolEffect) {
        let active = self.controller.store().active().cloned();
        let Some(id) = active else {
            self.set_status(false, format!("{name} needs an open dataset"));
            return;
        };

        let controller = self.controller.clone();
        match effect {
            ToolEffect::Analyze => self.spawn(ctx, async move {
                let result = controller.analyze(&id).await.map_err(String::from);
                UiEvent::Analyzed(id, result)
            }),
            ToolEffect::Export => {
                let format = self.prefs.export_format.clone();
                let dir = self.config.client.resolved_export_dir();
                self.spawn(ctx, async move {
                    let result = controller.export(&id, &format, &dir).await.map_err(String::from);
                    UiEvent::Exported(id, result)
                });
            }
            ToolEffect::NotImplemented => {
                self.set_status(false, format!("{name} is not available yet"));
            }
        }
    }

    fn handle_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.pending = self.pending.saturating_sub(1);
            self.apply_event(event);
        }
    }

    fn apply_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Refreshed(Ok(()))
            | UiEvent::ToolsLoaded(Ok(()))
            | UiEvent::Selected(_, Ok(SelectOutcome::Superseded)) => {}
            UiEvent::Refreshed(Err(e)) => {
                self.set_status(false, format!("Could not load datasets: {e}"));
                self.log_action("Refresh", &format!("Failure: {e}"));
            }
            UiEvent::ToolsLoaded(Err(e)) => {
                tracing::warn!("Tool lists unavailable: {e}");
            }
            UiEvent::Selected(id, Ok(SelectOutcome::Applied)) => {
                self.set_status(true, format!("Loaded '{id}'"));
            }
            UiEvent::Selected(id, Err(e)) => {
                self.set_status(false, format!("Could not load '{id}': {e}"));
                self.log_action("Open", &format!("{id}: {e}"));
            }
            UiEvent::Saved(Ok(SaveOutcome::Skipped)) => {
                self.set_status(false, "Nothing to save: no dataset is open");
            }
            UiEvent::Saved(Ok(SaveOutcome::Saved { dataset, rows })) => {
                self.set_status(true, format!("Saved '{dataset}' ({rows} rows)"));
                self.log_action("Save", &format!("{dataset}: {rows} rows"));
            }
            UiEvent::Saved(Err(e)) => {
                self.set_status(false, format!("Save failed: {e}"));
                self.log_action("Save", &format!("Failure: {e}"));
            }
            UiEvent::Deleted(id, Ok(())) => {
                self.set_status(true, format!("Deleted '{id}'"));
                self.log_action("Delete", id.as_str());
            }
            UiEvent::Deleted(id, Err(e)) => {
                self.set_status(false, format!("Could not delete '{id}': {e}"));
                self.log_action("Delete", &format!("{id}: {e}"));
            }
            UiEvent::Imported(Ok(id)) => {
                self.import_page.finish_upload(Ok(id.to_string()));
                self.set_status(true, format!("Imported '{id}'"));
                self.log_action("Import", id.as_str());
                self.route = Route::Spreadsheet(id);
            }
            UiEvent::Imported(Err(e)) => {
                self.import_page.finish_upload(Err(e.clone()));
                self.set_status(false, format!("Import failed: {e}"));
                self.log_action("Import", &format!("Failure: {e}"));
            }
            UiEvent::Analyzed(id, Ok(summary)) => {
                self.analysis = Some((id, summary));
            }
            UiEvent::Analyzed(id, Err(e)) => {
                self.set_status(false, format!("Analysis of '{id}' failed: {e}"));
            }
            UiEvent::Exported(id, Ok(path)) => {
                self.set_status(true, format!("Exported to {}", path.display()));
                self.log_action("Export", &format!("{id} -> {}", path.display()));
            }
            UiEvent::Exported(id, Err(e)) => {
                self.set_status(false, format!("Export of '{id}' failed: {e}"));
                self.log_action("Export", &format!("{id}: {e}"));
            }
            UiEvent::Restored(id, selected, refreshed) => {
                self.apply_event(UiEvent::Refreshed(refreshed));
                // the restored dataset's status takes precedence
                self.apply_event(UiEvent::Selected(id, selected));
            }
            UiEvent::TaskFailed(e) => {
                self.set_status(false, format!("Background task failed: {e}"));
                self.log_action("Task", &format!("Failure: {e}"));
            }
        }
    }

    /// Keeps the spreadsheet route pointing at the active dataset once no
    /// request is in flight.
    fn sync_route(&mut self) {
        if self.pending > 0 {
            return;
        }
        let active = self.controller.store().active().cloned();
        if let Route::Spreadsheet(shown) = &self.route {
            match active {
                Some(active) if &active != shown => self.route = Route::Spreadsheet(active),
                Some(_) => {}
                None => self.route = Route::Datasets,
            }
        }
    }

    fn render_sidebar(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        ui.add_space(10.0);
        ui.vertical_centered(|ui| {
            ui.label(
                egui::RichText::new("WRANGLER")
                    .strong()
                    .size(20.0)
                    .color(crate::theme::ACCENT_COLOR),
            );
            ui.add_space(crate::theme::SPACING_LARGE);
        });

        let mut next_route = None;
        let mut open = None;
        let active = self.controller.store().active().cloned();

        ui.vertical(|ui| {
            ui.spacing_mut().item_spacing.y = 8.0;

            if sidebar_button(ui, "📥", "Import", self.route == Route::Import).clicked() {
                next_route = Some(Route::Import);
            }
            if sidebar_button(ui, "🗂", "Datasets", self.route == Route::Datasets).clicked() {
                next_route = Some(Route::Datasets);
            }
            let on_sheet = matches!(self.route, Route::Spreadsheet(_));
            if sidebar_button(ui, "📊", "Spreadsheet", on_sheet).clicked()
                && let Some(id) = &active
            {
                next_route = Some(Route::Spreadsheet(id.clone()));
            }
        });

        ui.add_space(crate::theme::SPACING_LARGE);
        ui.label(egui::RichText::new("DATASETS").small().weak());
        ui.separator();

        egui::ScrollArea::vertical()
            .id_salt("sidebar_datasets")
            .show(ui, |ui| {
                let store = self.controller.store();
                if store.datasets().is_empty() {
                    ui.weak(if store.is_loading() { "Loading…" } else { "None yet" });
                }
                for id in store.datasets() {
                    let is_active = active.as_ref() == Some(id);
                    if sidebar_button(ui, "📄", id.as_str(), is_active).clicked() {
                        open = Some(id.clone());
                    }
                }
            });

        if let Some(route) = next_route {
            self.route = route;
        }
        if let Some(id) = open {
            self.open_dataset(ctx, id);
        }
    }

    fn render_top_bar(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        let mut clicked = None;
        let mut refresh = false;
        let formats = self.controller.registry().export_formats();
        if !formats.contains(&self.prefs.export_format)
            && let Some(first) = formats.first()
        {
            self.prefs.export_format = first.clone();
        }

        crate::theme::top_bar_frame().show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.heading(egui::RichText::new(self.route.title()).strong());
                ui.separator();

                let store = self.controller.store();
                for action in self.toolbar.actions() {
                    let button = ui
                        .add_enabled(action.is_enabled(&store), egui::Button::new(action.name))
                        .on_hover_text(action.tooltip)
                        .on_disabled_hover_text(action.tooltip);
                    if button.clicked() {
                        clicked = Some((action.name, action.effect));
                    }
                    if action.effect == ToolEffect::Export {
                        egui::ComboBox::from_id_salt("export_format")
                            .width(70.0)
                            .selected_text(self.prefs.export_format.as_str())
                            .show_ui(ui, |ui| {
                                for format in &formats {
                                    ui.selectable_value(
                                        &mut self.prefs.export_format,
                                        format.clone(),
                                        format.as_str(),
                                    );
                                }
                            });
                    }
                }
                drop(store);

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("🔄").on_hover_text("Reload the dataset list").clicked() {
                        refresh = true;
                    }
                    if self.pending > 0 {
                        ui.spinner();
                    }
                });
            });
        });

        if refresh {
            self.refresh(ctx);
        }
        if let Some((name, effect)) = clicked {
            self.run_effect(ctx, name, effect);
        }
    }

    fn render_spreadsheet(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        let mut save = false;
        let mut dismiss_error = false;
        let edited = {
            let store = self.controller.store();
            if self.shown_dataset.as_ref() != store.active() {
                self.grid_view.cancel_edit();
                self.shown_dataset = store.active().cloned();
            }

            let Some(active) = store.active() else {
                ui.weak("No dataset is open. Pick one from the sidebar.");
                return;
            };

            ui.horizontal(|ui| {
                ui.heading(active.as_str());
                let grid = store.grid();
                ui.weak(format!("{} rows × {} columns", grid.row_count(), grid.column_count()));
                if store.is_dirty() {
                    ui.label(egui::RichText::new("● unsaved").color(crate::theme::DIRTY_COLOR));
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .add_enabled(!store.is_fetching(), egui::Button::new("💾 Save"))
                        .on_hover_text("Ctrl+S")
                        .clicked()
                    {
                        save = true;
                    }
                    ui.checkbox(&mut self.prefs.read_only, "Read-only");
                });
            });

            if let Some(error) = store.error() {
                ui.horizontal(|ui| {
                    ui.label(crate::theme::outcome_text(false, error));
                    if ui.small_button("✖").on_hover_text("Dismiss").clicked() {
                        dismiss_error = true;
                    }
                });
            }
            ui.separator();

            if store.is_fetching() {
                ui.vertical_centered(|ui| {
                    ui.add_space(crate::theme::SPACING_LARGE);
                    ui.spinner();
                    ui.weak("Loading rows…");
                });
                None
            } else if store.grid().is_empty() && store.error().is_none() {
                ui.weak("This dataset has no rows.");
                None
            } else {
                self.grid_view.show(ui, store.grid(), self.prefs.read_only)
            }
        };

        if dismiss_error {
            self.controller.store().clear_error();
        }
        if let Some(grid) = edited {
            self.controller.edit(grid);
        }
        if save {
            self.save(ctx);
        }
    }

    fn render_analysis(&mut self, ctx: &egui::Context) {
        let Some((id, summary)) = &self.analysis else {
            return;
        };
        let mut open = true;

        egui::Window::new(format!("Analysis: {id}"))
            .open(&mut open)
            .default_width(420.0)
            .show(ctx, |ui| {
                if summary.summary.is_empty() {
                    ui.weak("The server returned no statistics.");
                    return;
                }
                egui::ScrollArea::vertical().show(ui, |ui| {
                    egui::Grid::new("analysis_grid")
                        .num_columns(2)
                        .spacing([20.0, 4.0])
                        .striped(true)
                        .show(ui, |ui| {
                            for (key, value) in &summary.summary {
                                ui.strong(key);
                                ui.label(summary_text(value));
                                ui.end_row();
                            }
                        });
                });
            });

        if !open {
            self.analysis = None;
        }
    }

    fn render_footer(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some((ok, text)) = &self.status {
                    let label = ui.label(crate::theme::outcome_text(*ok, text.as_str()).small());
                    if !ok && let Ok(log) = crate::logging::get_current_log_path() {
                        label.on_hover_text(format!("Details in {}", log.display()));
                    }
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(
                        egui::RichText::new(&self.config.client.api_base_url)
                            .small()
                            .weak(),
                    );
                });
            });
        });
    }
}

impl eframe::App for WranglerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_events();
        self.sync_route();

        let save_shortcut = egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::S);
        if matches!(self.route, Route::Spreadsheet(_))
            && ctx.input_mut(|i| i.consume_shortcut(&save_shortcut))
        {
            self.save(ctx);
        }

        egui::SidePanel::left("main_sidebar")
            .frame(crate::theme::sidebar_frame())
            .resizable(false)
            .default_width(200.0)
            .show(ctx, |ui| {
                self.render_sidebar(ctx, ui);
            });

        self.render_footer(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_top_bar(ctx, ui);
            ui.add_space(crate::theme::SPACING_MEDIUM);

            match self.route.clone() {
                Route::Import => {
                    let registry = self.controller.registry().clone();
                    if let Some(request) = self.import_page.show(ui, &registry) {
                        let progress = self.import_page.begin_upload(ctx);
                        let controller = self.controller.clone();
                        self.spawn(ctx, async move {
                            UiEvent::Imported(
                                controller.import(request, progress).await.map_err(String::from),
                            )
                        });
                    }
                }
                Route::Datasets => {
                    let action = {
                        let store = self.controller.store();
                        self.datasets_page.show(
                            ui,
                            store.datasets(),
                            store.active(),
                            &self.config.activity,
                        )
                    };
                    match action {
                        Some(DatasetsAction::Open(id)) => self.open_dataset(ctx, id),
                        Some(DatasetsAction::Delete(id)) => {
                            let controller = self.controller.clone();
                            self.spawn(ctx, async move {
                                let result = controller.delete(&id).await.map_err(String::from);
                                UiEvent::Deleted(id, result)
                            });
                        }
                        Some(DatasetsAction::Refresh) => self.refresh(ctx),
                        Some(DatasetsAction::ClearActivity) => self.config.activity.clear(),
                        None => {}
                    }
                }
                Route::Spreadsheet(_) => self.render_spreadsheet(ctx, ui),
            }
        });

        self.render_analysis(ctx);

        if self.import_page.is_uploading() || self.pending > 0 {
            ctx.request_repaint_after(std::time::Duration::from_millis(250));
        }
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        self.prefs.last_route = self.route.path();
        eframe::set_value(storage, PREFS_KEY, &self.prefs);
        if let Err(e) = config::save_app_config(&self.config) {
            tracing::warn!("Failed to save config: {e}");
        }
    }
}

fn sidebar_button(ui: &mut egui::Ui, icon: &str, text: &str, active: bool) -> egui::Response {
    let (rect, response) =
        ui.allocate_at_least(egui::vec2(ui.available_width(), 32.0), egui::Sense::click());

    if ui.is_rect_visible(rect) {
        let bg_fill = if active {
            crate::theme::ACCENT_COLOR
        } else if response.hovered() {
            ui.visuals().faint_bg_color
        } else {
            egui::Color32::TRANSPARENT
        };
        ui.painter().rect_filled(rect, 6.0, bg_fill);

        let text_color = if active {
            egui::Color32::WHITE
        } else if response.hovered() {
            ui.visuals().strong_text_color()
        } else {
            ui.visuals().weak_text_color()
        };

        ui.painter().text(
            rect.left_center() + egui::vec2(12.0, 0.0),
            egui::Align2::LEFT_CENTER,
            format!("{icon}  {text}"),
            egui::FontId::proportional(14.0),
            text_color,
        );
    }

    response
}

/// Lists datasets, first reselecting the dataset the last session showed.
async fn restore_session(controller: DatasetController, restore: Option<DatasetId>) -> UiEvent {
    let Some(id) = restore else {
        return UiEvent::Refreshed(controller.refresh().await.map_err(String::from));
    };
    // selecting first makes the restored dataset win over auto-select
    let (selected, refreshed) = tokio::join!(controller.select(id.clone()), controller.refresh());
    UiEvent::Restored(
        id,
        selected.map_err(String::from),
        refreshed.map_err(String::from),
    )
}

/// Runs `task` on `runtime` and delivers its event, or [`UiEvent::TaskFailed`]
/// if it panicked, so every spawn is answered exactly once.
fn spawn_reporting<F>(
    runtime: &tokio::runtime::Handle,
    events: Sender<UiEvent>,
    ctx: egui::Context,
    task: F,
) where
    F: Future<Output = UiEvent> + Send + 'static,
{
    let handle = runtime.spawn(task);
    runtime.spawn(async move {
        let event = match handle.await {
            Ok(event) => event,
            Err(e) => {
                tracing::error!("Background task failed: {e}");
                UiEvent::TaskFailed(e.to_string())
            }
        };
        if events.send(event).is_err() {
            tracing::error!("Failed to deliver UI event");
        }
        ctx.request_repaint();
    });
}

fn summary_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        other => other.to_string(),
    }
}
