//! Colors and frames shared by the desktop pages.

use eframe::egui;
use egui::{Color32, CornerRadius, Margin, Stroke};

pub const ACCENT_COLOR: Color32 = Color32::from_rgb(38, 132, 196);
pub const ERROR_COLOR: Color32 = Color32::from_rgb(229, 83, 75);
pub const SUCCESS_COLOR: Color32 = Color32::from_rgb(87, 171, 90);
/// Unsaved-edits marker.
pub const DIRTY_COLOR: Color32 = Color32::from_rgb(224, 175, 60);

const SURFACE: Color32 = Color32::from_rgb(30, 30, 33);
const SURFACE_DEEP: Color32 = Color32::from_rgb(23, 23, 26);
const BORDER: Color32 = Color32::from_rgb(48, 48, 53);

pub const SPACING_SMALL: f32 = 8.0;
pub const SPACING_MEDIUM: f32 = 12.0;
pub const SPACING_LARGE: f32 = 20.0;

const ROUNDING: u8 = 6;

pub fn apply_wrangler_theme(ctx: &egui::Context) {
    ctx.style_mut(|style| {
        style.visuals = egui::Visuals::dark();
        let visuals = &mut style.visuals;

        visuals.selection.bg_fill = ACCENT_COLOR.linear_multiply(0.4);
        visuals.selection.stroke = Stroke::new(1.0, ACCENT_COLOR);
        visuals.hyperlink_color = ACCENT_COLOR;

        // striped grid rows and text edits
        visuals.faint_bg_color = Color32::from_rgb(36, 36, 40);
        visuals.extreme_bg_color = Color32::from_rgb(19, 19, 21);

        for widget in [
            &mut visuals.widgets.inactive,
            &mut visuals.widgets.hovered,
            &mut visuals.widgets.active,
        ] {
            widget.corner_radius = CornerRadius::same(ROUNDING);
        }
        visuals.widgets.hovered.weak_bg_fill = ACCENT_COLOR.linear_multiply(0.6);
        visuals.widgets.active.weak_bg_fill = ACCENT_COLOR;
        visuals.window_corner_radius = CornerRadius::same(10);

        style.spacing.button_padding = egui::vec2(10.0, 4.0);
        style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    });
}

pub fn card_frame(ui: &egui::Ui) -> egui::Frame {
    egui::Frame::group(ui.style())
        .fill(ui.visuals().faint_bg_color)
        .corner_radius(CornerRadius::same(8))
        .inner_margin(Margin::same(14))
}

pub fn sidebar_frame() -> egui::Frame {
    egui::Frame::new()
        .fill(SURFACE_DEEP)
        .inner_margin(Margin::symmetric(10, 12))
}

pub fn top_bar_frame() -> egui::Frame {
    egui::Frame::new()
        .fill(SURFACE)
        .stroke(Stroke::new(1.0, BORDER))
        .corner_radius(CornerRadius::same(ROUNDING))
        .inner_margin(Margin::symmetric(14, 8))
}

/// Green for success, red for failure.
pub fn outcome_text(ok: bool, text: impl Into<String>) -> egui::RichText {
    let color = if ok { SUCCESS_COLOR } else { ERROR_COLOR };
    egui::RichText::new(text).color(color)
}
