mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::Context;
use app::SolarViewerApp;
use config::DashboardConfig;
use eframe::egui;
use state::AppState;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = DashboardConfig::load(std::env::args_os().nth(1).map(PathBuf::from))
        .context("loading dashboard config")?;

    // Datasets are fully loaded before the first frame.
    let mut state = AppState::new(config);
    state.load_all();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 900.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Solar Viewer – Plant Logs",
        options,
        Box::new(|_cc| Ok(Box::new(SolarViewerApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("running the UI: {e}"))
}
