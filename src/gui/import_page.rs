use crate::api::ProgressFn;
use crate::import::{ImportRequest, SUPPORTED_TYPES, format_file_size};
use crate::registry::ToolRegistry;
use eframe::egui;
use rfd::FileDialog;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// File picker, dataset name, and upload progress.
#[derive(Debug, Default)]
pub struct ImportPage {
    selected: Option<PathBuf>,
    file_size: Option<u64>,
    dataset_name: String,
    progress: Arc<AtomicU8>,
    uploading: bool,
    message: Option<(bool, String)>,
}

impl ImportPage {
    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    /// Progress sink for the upload that is about to start. Resets the bar.
    pub fn begin_upload(&mut self, ctx: &egui::Context) -> ProgressFn {
        self.progress.store(0, Ordering::SeqCst);
        self.uploading = true;
        self.message = None;

        let progress = Arc::clone(&self.progress);
        let ctx = ctx.clone();
        Arc::new(move |pct| {
            progress.store(pct, Ordering::SeqCst);
            ctx.request_repaint();
        })
    }

    pub fn finish_upload(&mut self, outcome: Result<String, String>) {
        self.uploading = false;
        match outcome {
            Ok(dataset) => {
                self.message = Some((true, format!("Imported '{dataset}'")));
                self.selected = None;
                self.file_size = None;
                self.dataset_name.clear();
            }
            Err(e) => self.message = Some((false, e)),
        }
    }

    /// Returns a validated request when the user submits.
    pub fn show(&mut self, ui: &mut egui::Ui, registry: &ToolRegistry) -> Option<ImportRequest> {
        let mut submitted = None;

        ui.heading("Import a dataset");
        ui.add_space(crate::theme::SPACING_SMALL);

        crate::theme::card_frame(ui).show(ui, |ui| {
            ui.set_width(ui.available_width().min(560.0));

            ui.horizontal(|ui| {
                if ui
                    .add_enabled(!self.uploading, egui::Button::new("📂 Choose file…"))
                    .clicked()
                {
                    self.pick_file();
                }
                match &self.selected {
                    Some(path) => {
                        ui.label(path.display().to_string());
                        if let Some(size) = self.file_size {
                            ui.weak(format!("({})", format_file_size(size)));
                        }
                    }
                    None => {
                        ui.weak("No file selected");
                    }
                }
            });

            ui.add_space(crate::theme::SPACING_SMALL);
            ui.horizontal(|ui| {
                ui.label("Dataset name:");
                ui.add_enabled(
                    !self.uploading,
                    egui::TextEdit::singleline(&mut self.dataset_name)
                        .hint_text("defaults to the file name"),
                );
            });

            let accepted = if registry.import_tools().is_empty() {
                SUPPORTED_TYPES
                    .iter()
                    .map(|(ext, _)| *ext)
                    .collect::<Vec<_>>()
                    .join(", ")
            } else {
                registry.import_tools().join(", ")
            };
            ui.weak(format!("Accepted: {accepted}"));

            ui.add_space(crate::theme::SPACING_MEDIUM);
            let can_submit = self.selected.is_some() && !self.uploading;
            if ui
                .add_enabled(can_submit, egui::Button::new("⬆ Upload"))
                .clicked()
                && let Some(path) = &self.selected
            {
                match ImportRequest::new(path, Some(self.dataset_name.as_str())) {
                    Ok(request) => submitted = Some(request),
                    Err(e) => self.message = Some((false, e.to_string())),
                }
            }

            if self.uploading {
                let pct = self.progress.load(Ordering::SeqCst);
                ui.add(egui::ProgressBar::new(f32::from(pct) / 100.0).show_percentage());
            }

            if let Some((ok, text)) = &self.message {
                ui.add_space(crate::theme::SPACING_SMALL);
                ui.label(crate::theme::outcome_text(*ok, text.as_str()));
            }
        });

        submitted
    }

    fn pick_file(&mut self) {
        let extensions: Vec<&str> = SUPPORTED_TYPES.iter().map(|(ext, _)| *ext).collect();
        let Some(path) = FileDialog::new()
            .add_filter("Datasets", &extensions)
            .pick_file()
        else {
            return;
        };

        self.file_size = std::fs::metadata(&path).map(|m| m.len()).ok();
        if self.dataset_name.trim().is_empty()
            && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
        {
            self.dataset_name = stem.to_owned();
        }
        self.selected = Some(path);
        self.message = None;
    }
}
