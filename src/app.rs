use eframe::egui;

use daplot::Daplot;

use crate::state::AppState;
use crate::ui::{editor, panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DaplotApp {
    pub state: AppState,
}

impl DaplotApp {
    pub fn new(core: Daplot) -> Self {
        Self {
            state: AppState::new(core),
        }
    }
}

impl eframe::App for DaplotApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Bottom panel: prediction ----
        egui::TopBottomPanel::bottom("prediction_panel")
            .resizable(true)
            .show(ctx, |ui| {
                panels::prediction_panel(ui, &mut self.state);
            });

        // ---- Left side panel: tables, axes, filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::data_plot(ui, &self.state);
        });

        editor::editor_window(ctx, &mut self.state);
    }
}
