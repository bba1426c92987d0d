mod app;
mod state;
mod ui;

use app::SpectrogramApp;
use eframe::egui;
use spectrogram_generator::settings::Settings;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let settings_path = match Settings::default_path() {
        Ok(p) => Some(p),
        Err(e) => {
            log::warn!("{e}; settings will not be saved");
            None
        }
    };
    let settings = settings_path
        .as_deref()
        .map(Settings::load_or_default)
        .unwrap_or_default();

    if let Err(e) = std::fs::create_dir_all(settings.output_folder()) {
        log::warn!("Cannot create output folder {}: {e}", settings.output_folder().display());
    }

    let state = AppState::new(settings, settings_path);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([760.0, 620.0])
            .with_min_inner_size([560.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Spectrogram Generator",
        options,
        Box::new(|cc| {
            // Install image loaders so egui can preview the generated PNGs.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(SpectrogramApp::new(state)))
        }),
    )
}
