use eframe::egui::{self, Ui};

use spectrogram_generator::generation::params::{WindowFunction, RECOMMENDED_HEIGHTS};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Settings tab
// ---------------------------------------------------------------------------

pub fn settings_panel(ui: &mut Ui, state: &mut AppState) {
    let running = state.is_running();

    egui::ScrollArea::vertical().show(ui, |ui: &mut Ui| {
        ui.add_enabled_ui(!running, |ui: &mut Ui| {
            general_section(ui, state);
            ui.add_space(8.0);
            full_section(ui, state);
            ui.add_space(8.0);
            zoom_section(ui, state);
            ui.add_space(8.0);

            ui.horizontal(|ui: &mut Ui| {
                if ui.button("Save settings").clicked() {
                    state.save_settings();
                }
                if ui.button("Restore defaults").clicked() {
                    state.reset_settings();
                }
            });
        });
    });
}

fn general_section(ui: &mut Ui, state: &mut AppState) {
    ui.strong("General");
    egui::Grid::new("general_settings")
        .num_columns(3)
        .spacing([8.0, 4.0])
        .show(ui, |ui: &mut Ui| {
            ui.label("SoX path:");
            let sox = ui.add(
                egui::TextEdit::singleline(&mut state.settings.full.sox_path)
                    .hint_text("automatic")
                    .desired_width(320.0),
            );
            if sox.lost_focus() {
                state.apply_sox_override();
            }
            if ui.button("Browse").clicked() {
                if let Some(path) = rfd::FileDialog::new()
                    .set_title("Select the SoX executable")
                    .pick_file()
                {
                    state.settings.full.sox_path = path.to_string_lossy().into_owned();
                    state.apply_sox_override();
                }
            }
            ui.end_row();

            ui.label("Output folder:");
            ui.add(
                egui::TextEdit::singleline(&mut state.settings.full.output_folder)
                    .desired_width(320.0),
            );
            if ui.button("Browse").clicked() {
                if let Some(dir) = rfd::FileDialog::new()
                    .set_title("Select the output folder")
                    .pick_folder()
                {
                    state.settings.full.output_folder = dir.to_string_lossy().into_owned();
                    state.refresh_outputs();
                }
            }
            ui.end_row();
        });
}

/// Width / height / dynamic range / window rows shared by both presets.
fn preset_rows(
    ui: &mut Ui,
    id: &str,
    width: &mut String,
    height: &mut String,
    z_range: &mut String,
    window: &mut String,
) {
    ui.label("Width (px):");
    ui.add(egui::TextEdit::singleline(width).desired_width(80.0));
    ui.label("Height (bins):");
    ui.add(egui::TextEdit::singleline(height).desired_width(80.0))
        .on_hover_text(format!("Recommended: {RECOMMENDED_HEIGHTS:?}"));
    ui.end_row();

    ui.label("Dynamic range (dB):");
    ui.add(egui::TextEdit::singleline(z_range).desired_width(80.0));
    ui.label("Window:");
    egui::ComboBox::from_id_salt(id)
        .selected_text(window.as_str())
        .show_ui(ui, |ui: &mut Ui| {
            for w in WindowFunction::ALL {
                ui.selectable_value(window, w.as_str().to_string(), w.as_str());
            }
        });
    ui.end_row();
}

fn full_section(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Full spectrogram");
    let full = &mut state.settings.full;
    egui::Grid::new("full_settings")
        .num_columns(4)
        .spacing([8.0, 4.0])
        .show(ui, |ui: &mut Ui| {
            preset_rows(
                ui,
                "full_window",
                &mut full.width,
                &mut full.height,
                &mut full.z_range,
                &mut full.window_type,
            );
        });
}

fn zoom_section(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Zoomed spectrogram");
    let zoom = &mut state.settings.zoom;
    egui::Grid::new("zoom_settings")
        .num_columns(4)
        .spacing([8.0, 4.0])
        .show(ui, |ui: &mut Ui| {
            preset_rows(
                ui,
                "zoom_window",
                &mut zoom.width,
                &mut zoom.height,
                &mut zoom.z_range,
                &mut zoom.window_type,
            );

            ui.label("Start (M:SS):");
            ui.add(egui::TextEdit::singleline(&mut zoom.zoom_start).desired_width(80.0));
            ui.label("Duration (M:SS):");
            ui.add(egui::TextEdit::singleline(&mut zoom.zoom_duration).desired_width(80.0));
            ui.end_row();
        });
}
