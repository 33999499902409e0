use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use crate::state::AppState;

const ROW_HEIGHT: f32 = 20.0;

/// Floating grid editor for the active table. Edits stay local until saved.
pub fn editor_window(ctx: &egui::Context, state: &mut AppState) {
    let Some(editor) = state.editor.as_mut() else {
        return;
    };

    let mut open = true;
    let mut save = false;
    egui::Window::new("Data editor")
        .open(&mut open)
        .default_size([640.0, 400.0])
        .resizable(true)
        .show(ctx, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.button("Add row").clicked() {
                    editor.add_row();
                }
                if ui
                    .add_enabled(editor.dirty, egui::Button::new("Save"))
                    .clicked()
                {
                    save = true;
                }
                ui.label(format!("{} rows", editor.rows.len()));
            });
            ui.separator();

            let n_cols = editor.headers.len();
            let headers = editor.headers.clone();
            let rows = &mut editor.rows;
            let mut changed = false;

            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .columns(Column::auto().at_least(60.0), n_cols)
                .header(ROW_HEIGHT, |mut header| {
                    for h in &headers {
                        header.col(|ui: &mut Ui| {
                            ui.strong(h);
                        });
                    }
                })
                .body(|body| {
                    body.rows(ROW_HEIGHT, rows.len(), |mut row| {
                        let r = row.index();
                        for cell in rows[r].iter_mut() {
                            row.col(|ui: &mut Ui| {
                                changed |= ui.text_edit_singleline(cell).changed();
                            });
                        }
                    });
                });

            editor.dirty |= changed;
        });

    if save {
        state.commit_editor();
    } else if !open {
        state.editor = None;
    }
}
