use eframe::egui::Ui;
use egui_plot::{Legend, Line, Plot, PlotPoints, Points};

use crate::color::{DATA_COLOR, method_color};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Scatter + forecast plot (central panel)
// ---------------------------------------------------------------------------

/// Render the projected series and the forecast of the last prediction.
pub fn data_plot(ui: &mut Ui, state: &AppState) {
    let Some(data) = &state.plot else {
        ui.centered_and_justified(|ui: &mut Ui| {
            if state.active.is_none() {
                ui.heading("Open a file to plot it  (File → Open…)");
            } else {
                ui.heading("Choose numeric X and Y columns");
            }
        });
        return;
    };

    Plot::new("data_plot")
        .legend(Legend::default())
        .x_axis_label(data.x_label.as_str())
        .y_axis_label(data.y_label.as_str())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            let points = Points::new(PlotPoints::from(data.points()))
                .name(format!("{} vs {}", data.y_label, data.x_label))
                .color(DATA_COLOR)
                .radius(3.0);
            plot_ui.points(points);

            if let Some(result) = &state.prediction {
                // start the forecast at the last observed point so the line joins the data
                let anchor = data
                    .x_values
                    .last()
                    .zip(data.y_values.last())
                    .map(|(&x, &y)| [x, y]);
                let forecast: Vec<[f64; 2]> = anchor
                    .into_iter()
                    .chain(
                        result
                            .future_x
                            .iter()
                            .zip(&result.predictions)
                            .map(|(&x, &y)| [x, y]),
                    )
                    .collect();

                let line = Line::new(PlotPoints::from(forecast))
                    .name(format!("{} forecast", result.method.label()))
                    .color(method_color(result.method))
                    .width(2.0);
                plot_ui.line(line);
            }
        });
}
