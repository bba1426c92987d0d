use std::time::Duration;

use eframe::egui;

use crate::state::{AppState, Tab};
use crate::ui::{panels, settings};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct SpectrogramApp {
    pub state: AppState,
}

impl SpectrogramApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for SpectrogramApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.poll();
        for uri in std::mem::take(&mut self.state.stale_previews) {
            ctx.forget_image(&uri);
        }
        if self.state.is_running() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Central panel: active tab ----
        egui::CentralPanel::default().show(ctx, |ui| match self.state.tab {
            Tab::Main => {
                panels::files_panel(ui, &mut self.state);
                ui.separator();
                panels::generation_panel(ui, &mut self.state);
                ui.separator();
                panels::outputs_panel(ui, &mut self.state);
            }
            Tab::Settings => settings::settings_panel(ui, &mut self.state),
        });

        panels::dialogs(ctx, &mut self.state);
    }
}
