use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use daplot::data::loader::SUPPORTED_EXTENSIONS;
use daplot::predict::{Method, ModelInfo};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – tables, axes and filter widgets
// ---------------------------------------------------------------------------

/// Render the left panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Tables");
    ui.separator();

    if state.tables.is_empty() {
        ui.label("No tables loaded.");
        return;
    }

    let mut select = None;
    let mut delete = None;
    for summary in &state.tables {
        ui.horizontal(|ui: &mut Ui| {
            let active = state.active.as_ref() == Some(&summary.id);
            let label = format!("{}  ({}×{})", short_id(summary.id.as_str()), summary.rows, summary.columns);
            if ui
                .selectable_label(active, label)
                .on_hover_text(summary.headers.join(", "))
                .clicked()
            {
                select = Some(summary.id.clone());
            }
            if ui.small_button("✖").on_hover_text("Delete").clicked() {
                delete = Some(summary.id.clone());
            }
        });
    }
    if ui.button("Clear all").clicked() {
        state.clear_all();
        return;
    }
    if let Some(id) = delete {
        state.delete_table(&id);
    } else if let Some(id) = select {
        if let Err(e) = state.select_table(id) {
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }

    if state.active.is_none() {
        return;
    }
    ui.separator();

    let columns: Vec<String> = state.unique_values.keys().cloned().collect();
    let ordered = state
        .active_table()
        .map(|t| t.column_names())
        .unwrap_or(columns);

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Axis selectors ----
            ui.strong("Axes");
            axis_selector(ui, "x_axis", "X", &ordered, state.x_column.clone(), |col| {
                state.set_x_column(col)
            });
            axis_selector(ui, "y_axis", "Y", &ordered, state.y_column.clone(), |col| {
                state.set_y_column(col)
            });
            ui.separator();

            // ---- Per-column filter widgets (collapsible) ----
            ui.strong(format!("Filters  ({} rows visible)", state.visible_rows));
            for col in &ordered {
                let Some(all_values) = state.unique_values.get(col).cloned() else {
                    continue;
                };

                let n_selected = state.filters.get(col).map_or(0, |s| s.len());
                let n_total = all_values.len();
                let header_text = format!("{col}  ({n_selected}/{n_total})");

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(col)
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("All").clicked() {
                                state.select_all(col);
                            }
                            if ui.small_button("None").clicked() {
                                state.select_none(col);
                            }
                        });

                        for val in &all_values {
                            let mut checked =
                                state.filters.get(col).is_some_and(|s| s.contains(val));
                            if ui.checkbox(&mut checked, val.as_str()).changed() {
                                state.toggle_filter_value(col, val);
                            }
                        }
                    });
            }
        });
}

fn axis_selector(
    ui: &mut Ui,
    id: &str,
    label: &str,
    columns: &[String],
    current: Option<String>,
    mut on_change: impl FnMut(String),
) {
    ui.horizontal(|ui: &mut Ui| {
        ui.label(label);
        let current = current.unwrap_or_default();
        egui::ComboBox::from_id_salt(id)
            .selected_text(&current)
            .show_ui(ui, |ui: &mut Ui| {
                for col in columns {
                    if ui.selectable_label(current == *col, col).clicked() && current != *col {
                        on_change(col.clone());
                    }
                }
            });
    });
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

// ---------------------------------------------------------------------------
// Bottom panel – prediction controls and results
// ---------------------------------------------------------------------------

pub fn prediction_panel(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Predict");
        egui::ComboBox::from_id_salt("method")
            .selected_text(state.method.label())
            .show_ui(ui, |ui: &mut Ui| {
                for method in Method::ALL {
                    ui.selectable_value(&mut state.method, method, method.label());
                }
            });

        let max_steps = state.core.config().max_steps;
        ui.add(egui::Slider::new(&mut state.steps, 1..=max_steps).text("steps"));

        let ready = state.plot.as_ref().is_some_and(|p| !p.x_values.is_empty());
        if ui.add_enabled(ready, egui::Button::new("Run")).clicked() {
            state.run_prediction();
        }

        ui.separator();
        if ui
            .add_enabled(state.active.is_some(), egui::Button::new("Edit data…"))
            .clicked()
        {
            state.open_editor();
        }
    });

    let Some(result) = &state.prediction else {
        return;
    };
    ui.separator();
    ui.horizontal_wrapped(|ui: &mut Ui| {
        let m = &result.metrics;
        ui.label(format!(
            "In-sample fit on {} points:  MSE {:.4}   RMSE {:.4}   R² {:.4}",
            m.training_samples, m.mse, m.rmse, m.r2_score
        ));
        ui.separator();
        ui.label(model_summary(&result.model_info));
    });
    ui.horizontal_wrapped(|ui: &mut Ui| {
        ui.label("Forecast:");
        for (x, y) in result.future_x.iter().zip(&result.predictions) {
            ui.monospace(format!("({x:.3}, {y:.3})"));
        }
    });
}

/// One-line description of the fitted model.
fn model_summary(info: &ModelInfo) -> String {
    match info {
        ModelInfo::Linear { slope, intercept } => {
            format!("y = {slope:.4}·x + {intercept:.4}")
        }
        ModelInfo::Polynomial {
            degree,
            n_features,
            ..
        } => format!("degree {degree}, {n_features} features"),
        ModelInfo::Svr {
            kernel,
            support_vectors,
            ..
        } => format!("{kernel} kernel, {support_vectors} support vectors"),
        ModelInfo::RandomForest {
            n_estimators,
            max_depth,
            ..
        } => format!("{n_estimators} trees, max depth {max_depth}"),
        ModelInfo::NeuralNetwork {
            hidden_layer_sizes,
            iterations,
            ..
        } => format!("layers {hidden_layer_sizes:?}, {iterations} iterations"),
        ModelInfo::Xgboost {
            implemented_as,
            n_estimators,
            ..
        } => format!("{n_estimators} trees ({implemented_as})"),
        ModelInfo::Lstm {
            implemented_as,
            sequence_length,
            degree,
        } => format!("sequence length {sequence_length}, degree {degree} ({implemented_as})"),
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();
        ui.label(format!("{} tables in memory", state.tables.len()));

        if let Some(msg) = &state.status_message {
            ui.separator();
            let color = if msg.starts_with("Error") {
                Color32::RED
            } else {
                Color32::GRAY
            };
            ui.label(RichText::new(msg).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open spreadsheet")
        .add_filter("Supported files", SUPPORTED_EXTENSIONS)
        .add_filter("Excel / ODS", &["xlsx", "xls", "xlsm", "xlsb", "ods"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        if let Err(e) = state.load_path(&path) {
            log::error!("Failed to load file: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
