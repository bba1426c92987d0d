use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use spectrogram_generator::generation::command::display_name;
use spectrogram_generator::generation::output::file_uri;
use spectrogram_generator::generation::params::Severity;

use crate::state::{AppState, NoticeKind, RunState, Tab};

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Add files…").clicked() {
                add_files_dialog(state);
                ui.close_menu();
            }
            if ui.button("Add folder…").clicked() {
                add_folder_dialog(state);
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Save settings").clicked() {
                state.save_settings();
                ui.close_menu();
            }
        });

        ui.separator();

        if ui.selectable_label(state.tab == Tab::Main, "Generate").clicked() {
            state.tab = Tab::Main;
        }
        if ui.selectable_label(state.tab == Tab::Settings, "Settings").clicked() {
            state.tab = Tab::Settings;
        }

        ui.separator();

        match &state.sox_path {
            Some(p) => ui.label(format!("SoX: {}", p.display())),
            None => ui.label(RichText::new("SoX not found").color(Color32::RED)),
        };
    });
}

// ---------------------------------------------------------------------------
// Input files
// ---------------------------------------------------------------------------

pub fn files_panel(ui: &mut Ui, state: &mut AppState) {
    ui.strong(format!("Files ({})", state.selection.len()));

    ScrollArea::vertical()
        .id_salt("input_files")
        .max_height(140.0)
        .auto_shrink([false, true])
        .show(ui, |ui: &mut Ui| {
            if state.selection.is_empty() {
                ui.weak("No files selected. Use “Add files” or “Add folder”.");
            }
            let mut clicked = None;
            for (i, path) in state.selection.files().iter().enumerate() {
                let label = ui
                    .selectable_label(state.highlighted.contains(&i), display_name(path))
                    .on_hover_text(path.display().to_string());
                if label.clicked() {
                    clicked = Some(i);
                }
            }
            if let Some(i) = clicked {
                state.toggle_highlight(i);
            }
        });

    ui.add_enabled_ui(!state.is_running(), |ui: &mut Ui| {
        ui.horizontal(|ui: &mut Ui| {
            if ui.button("Add files").clicked() {
                add_files_dialog(state);
            }
            if ui.button("Add folder").clicked() {
                add_folder_dialog(state);
            }
            if ui
                .add_enabled(!state.highlighted.is_empty(), egui::Button::new("Remove selected"))
                .clicked()
            {
                state.remove_highlighted();
            }
            if ui.button("Clear list").clicked() {
                state.clear_files();
            }
        });
    });
}

// ---------------------------------------------------------------------------
// Generation controls
// ---------------------------------------------------------------------------

pub fn generation_panel(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Generate spectrograms");

    let running = state.is_running();
    ui.add_enabled_ui(!running, |ui: &mut Ui| {
        ui.horizontal(|ui: &mut Ui| {
            ui.checkbox(&mut state.full_enabled, "Full spectrogram");
            ui.checkbox(&mut state.zoom_enabled, "Zoomed spectrogram");
        });
    });

    ui.horizontal(|ui: &mut Ui| {
        if ui.add_enabled(!running, egui::Button::new("Generate")).clicked() {
            state.start_generation();
        }
        if running && ui.button("Cancel").clicked() {
            state.cancel();
        }
    });

    if let RunState::Running { completed, total, .. } = &state.run {
        let fraction = if *total == 0 {
            0.0
        } else {
            *completed as f32 / *total as f32
        };
        ui.add(egui::ProgressBar::new(fraction).text(format!("{completed}/{total}")));
    }

    ui.label(&state.status_message);

    if let RunState::Finished(summary) = &state.run {
        ui.weak(format!(
            "Last run: {} of {} files, {} images written",
            summary.files_done, summary.total_files, summary.generated
        ));
    }

    if !state.failures.is_empty() {
        egui::CollapsingHeader::new(
            RichText::new(format!("{} failed", state.failures.len())).color(Color32::RED),
        )
        .id_salt("failures")
        .show(ui, |ui: &mut Ui| {
            for f in &state.failures {
                ui.label(format!("{} [{}]: {}", display_name(&f.file), f.preset, f.error));
            }
        });
    }
}

// ---------------------------------------------------------------------------
// Output listing
// ---------------------------------------------------------------------------

pub fn outputs_panel(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.strong(format!("Output ({})", state.outputs.len()));
        if ui.small_button("Refresh").clicked() {
            state.refresh_outputs();
        }
        if ui.small_button("Open folder").clicked() {
            let folder = state.output_folder();
            state.open(&folder);
        }
        if let Some(path) = state.selected_output_path() {
            if ui.small_button("Open selected").clicked() {
                state.open(&path);
            }
        }
    });

    ui.columns(2, |cols| {
        ScrollArea::vertical()
            .id_salt("outputs")
            .auto_shrink([false, false])
            .show(&mut cols[0], |ui: &mut Ui| {
                let mut open = None;
                for (i, name) in state.outputs.iter().enumerate() {
                    let resp = ui.selectable_label(state.selected_output == Some(i), name);
                    if resp.clicked() {
                        state.selected_output = Some(i);
                    }
                    if resp.double_clicked() {
                        open = Some(i);
                    }
                }
                if let Some(i) = open {
                    state.selected_output = Some(i);
                    if let Some(path) = state.selected_output_path() {
                        state.open(&path);
                    }
                }
            });

        match state.selected_output_path() {
            Some(path) => {
                cols[1].add(egui::Image::new(file_uri(&path)).shrink_to_fit());
            }
            None => {
                cols[1].weak("Select an image to preview it.");
            }
        }
    });
}

// ---------------------------------------------------------------------------
// Modal windows
// ---------------------------------------------------------------------------

/// Show the pending notice or height confirmation, if any.
pub fn dialogs(ctx: &egui::Context, state: &mut AppState) {
    if let RunState::AwaitingConfirmation { report, .. } = &state.run {
        let mut answer = None;
        egui::Window::new("Non-standard height")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui: &mut Ui| {
                for issue in report.issues.iter().filter(|i| i.severity == Severity::Advisory) {
                    ui.label(issue.to_string());
                }
                ui.label("Continue anyway?");
                ui.horizontal(|ui: &mut Ui| {
                    if ui.button("Yes").clicked() {
                        answer = Some(true);
                    }
                    if ui.button("No").clicked() {
                        answer = Some(false);
                    }
                });
            });
        if let Some(accept) = answer {
            state.confirm(accept);
        }
        return;
    }

    let Some(notice) = &state.notice else {
        return;
    };
    let color = match notice.kind {
        NoticeKind::Info => ui_text_color(ctx),
        NoticeKind::Warning => Color32::from_rgb(220, 160, 0),
        NoticeKind::Error => Color32::RED,
    };

    let mut close = false;
    egui::Window::new(&notice.title)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui: &mut Ui| {
            ui.label(RichText::new(&notice.text).color(color));
            if ui.button("OK").clicked() {
                close = true;
            }
        });
    if close {
        state.notice = None;
    }
}

fn ui_text_color(ctx: &egui::Context) -> Color32 {
    ctx.style().visuals.text_color()
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn add_files_dialog(state: &mut AppState) {
    let files = rfd::FileDialog::new()
        .set_title("Select FLAC files")
        .add_filter("FLAC files", &["flac"])
        .add_filter("All files", &["*"])
        .pick_files();

    if let Some(paths) = files {
        state.add_files(paths);
    }
}

pub fn add_folder_dialog(state: &mut AppState) {
    if let Some(dir) = rfd::FileDialog::new()
        .set_title("Select a folder with FLAC files")
        .pick_folder()
    {
        state.add_folder(&dir);
    }
}
