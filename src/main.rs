mod app;
mod color;
mod state;
mod ui;

use app::DaplotApp;
use daplot::{AppConfig, Daplot};
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load().unwrap_or_else(|e| {
        log::error!("{e:#}; using default settings");
        AppConfig::default()
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "DaPlot – Data Plotter",
        options,
        Box::new(|_cc| Ok(Box::new(DaplotApp::new(Daplot::new(config))))),
    )
}
