use crate::config::ActivityLog;
use crate::dataset::DatasetId;
use eframe::egui;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetsAction {
    Open(DatasetId),
    Delete(DatasetId),
    Refresh,
    ClearActivity,
}

/// Dataset list with open/delete, next to the activity log.
#[derive(Debug, Default)]
pub struct DatasetsPage {
    confirm_delete: Option<DatasetId>,
}

impl DatasetsPage {
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        datasets: &[DatasetId],
        active: Option<&DatasetId>,
        activity: &ActivityLog,
    ) -> Option<DatasetsAction> {
        let mut action = None;

        ui.columns(2, |columns| {
            if let [left, right] = columns {
                left.vertical(|ui| {
                    action = self.render_list(ui, datasets, active);
                });
                right.vertical(|ui| {
                    if render_activity(ui, activity) {
                        action = Some(DatasetsAction::ClearActivity);
                    }
                });
            }
        });

        if let Some(confirmed) = self.render_confirm(ui.ctx()) {
            action = Some(confirmed);
        }
        action
    }

    fn render_list(
        &mut self,
        ui: &mut egui::Ui,
        datasets: &[DatasetId],
        active: Option<&DatasetId>,
    ) -> Option<DatasetsAction> {
        let mut action = None;

        ui.horizontal(|ui| {
            ui.heading("🗂 Datasets");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("🔄 Refresh").clicked() {
                    action = Some(DatasetsAction::Refresh);
                }
            });
        });
        ui.separator();

        if datasets.is_empty() {
            ui.weak("No datasets yet. Import a file to get started.");
            return action;
        }

        egui::ScrollArea::vertical()
            .id_salt("dataset_list")
            .show(ui, |ui| {
                egui::Grid::new("dataset_grid")
                    .num_columns(3)
                    .spacing([15.0, 6.0])
                    .striped(true)
                    .show(ui, |ui| {
                        for id in datasets {
                            let is_active = active == Some(id);
                            let name = egui::RichText::new(id.as_str());
                            ui.label(if is_active { name.strong() } else { name });
                            if ui.button("Open").clicked() {
                                action = Some(DatasetsAction::Open(id.clone()));
                            }
                            if ui.button("🗑 Delete").clicked() {
                                self.confirm_delete = Some(id.clone());
                            }
                            ui.end_row();
                        }
                    });
            });

        action
    }

    fn render_confirm(&mut self, ctx: &egui::Context) -> Option<DatasetsAction> {
        let id = self.confirm_delete.clone()?;
        let mut action = None;
        let mut close = false;

        egui::Window::new("Delete dataset")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(format!("Delete '{id}' from the server? This cannot be undone."));
                ui.add_space(crate::theme::SPACING_SMALL);
                ui.horizontal(|ui| {
                    if ui.button("Delete").clicked() {
                        action = Some(DatasetsAction::Delete(id.clone()));
                        close = true;
                    }
                    if ui.button("Cancel").clicked() {
                        close = true;
                    }
                });
            });

        if close {
            self.confirm_delete = None;
        }
        action
    }
}

/// Returns true when the user asked to clear the log.
fn render_activity(ui: &mut egui::Ui, activity: &ActivityLog) -> bool {
    let mut clear = false;
    ui.horizontal(|ui| {
        ui.heading("📜 Activity");
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("🗑 Clear").on_hover_text("Wipe history").clicked() {
                clear = true;
            }
        });
    });
    ui.separator();

    egui::ScrollArea::vertical()
        .id_salt("activity_log")
        .stick_to_bottom(true)
        .show(ui, |ui| {
            egui::Grid::new("activity_grid")
                .num_columns(3)
                .spacing([15.0, 4.0])
                .striped(true)
                .show(ui, |ui| {
                    for entry in activity.entries() {
                        ui.label(
                            entry
                                .timestamp
                                .with_timezone(&chrono::Local)
                                .format("%H:%M:%S")
                                .to_string(),
                        );
                        ui.label(egui::RichText::new(&entry.action).strong());
                        ui.label(&entry.details);
                        ui.end_row();
                    }
                });
        });
    clear
}
