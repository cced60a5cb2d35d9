//! Editable table over a [`Grid`].
//!
//! Click a cell to edit it; Enter or clicking elsewhere commits, Escape
//! cancels. A commit hands back a new grid and leaves the one being rendered
//! untouched.

use crate::grid::{Cell, Grid};
use eframe::egui;
use egui_extras::{Column, TableBuilder};

const ROW_HEIGHT: f32 = 22.0;

#[derive(Debug, Clone, PartialEq, Eq)]
struct EditState {
    row: usize,
    col: usize,
    text: String,
    focused: bool,
}

#[derive(Debug, Default)]
pub struct GridView {
    editing: Option<EditState>,
}

impl GridView {
    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Renders `grid` and returns the edited copy when a cell edit is
    /// committed. Never returns a grid in read-only mode.
    pub fn show(&mut self, ui: &mut egui::Ui, grid: &Grid, read_only: bool) -> Option<Grid> {
        if read_only {
            self.editing = None;
        }

        let mut start_edit = None;
        let mut finish = None;
        let editing = &mut self.editing;

        egui::ScrollArea::horizontal()
            .auto_shrink([false, true])
            .show(ui, |ui| {
                TableBuilder::new(ui)
                    .striped(true)
                    .resizable(true)
                    .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
                    .column(Column::auto().at_least(40.0)) // Row number
                    .columns(
                        Column::initial(120.0).at_least(60.0).clip(true),
                        grid.column_count(),
                    )
                    .min_scrolled_height(0.0)
                    .header(ROW_HEIGHT + 3.0, |mut header| {
                        header.col(|ui| {
                            ui.strong("#");
                        });
                        for label in grid.columns() {
                            header.col(|ui| {
                                ui.strong(label);
                            });
                        }
                    })
                    .body(|body| {
                        body.rows(ROW_HEIGHT, grid.row_count(), |mut row| {
                            let r = row.index();
                            row.col(|ui| {
                                ui.weak((r + 1).to_string());
                            });

                            for c in 0..grid.column_count() {
                                row.col(|ui| match editing {
                                    Some(edit) if edit.row == r && edit.col == c => {
                                        let response = ui.add(
                                            egui::TextEdit::singleline(&mut edit.text)
                                                .desired_width(f32::INFINITY),
                                        );
                                        if !edit.focused {
                                            response.request_focus();
                                            edit.focused = true;
                                        }
                                        if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
                                            finish = Some(false);
                                        } else if response.lost_focus() {
                                            finish = Some(true);
                                        }
                                    }
                                    _ => {
                                        let text =
                                            grid.cell(r, c).map(Cell::display_text).unwrap_or_default();
                                        let response = ui.add(
                                            egui::Label::new(text.as_str())
                                                .truncate()
                                                .sense(egui::Sense::click()),
                                        );
                                        if !read_only && response.clicked() {
                                            start_edit = Some((r, c, text));
                                        }
                                    }
                                });
                            }
                        });
                    });
            });

        let committed = match finish {
            Some(true) => self.editing.take().and_then(|edit| commit(grid, edit)),
            Some(false) => {
                self.editing = None;
                None
            }
            None => None,
        };

        if let Some((row, col, text)) = start_edit {
            self.editing = Some(EditState {
                row,
                col,
                text,
                focused: false,
            });
        }

        committed
    }
}

fn commit(grid: &Grid, edit: EditState) -> Option<Grid> {
    let previous = grid.cell(edit.row, edit.col)?;
    let cell = Cell::from_input(&edit.text, &previous.value);
    if &cell == previous {
        return None;
    }

    match grid.with_cell(edit.row, edit.col, cell) {
        Ok(next) => Some(next),
        Err(e) => {
            tracing::warn!("Discarding cell edit: {e}");
            None
        }
    }
}
