use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use daplot::Daplot;
use daplot::data::filter::FilterSpec;
use daplot::data::model::CellValue;
use daplot::data::store::{TableId, TableSummary};
use daplot::data::table::Table;
use daplot::predict::{Method, PredictionResult};
use daplot::service::{PlotData, PredictRequest};

// ---------------------------------------------------------------------------
// Data editor buffer
// ---------------------------------------------------------------------------

/// Cells of the active table as editable text, committed with `save`.
pub struct Editor {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub dirty: bool,
    /// Values the text buffer was built from, row-major.
    original: Vec<Vec<CellValue>>,
}

impl Editor {
    fn from_table(table: &Table) -> Self {
        let original = table.to_rows();
        let rows = original
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.canonical_text().unwrap_or_default())
                    .collect()
            })
            .collect();
        Self {
            headers: table.column_names(),
            rows,
            dirty: false,
            original,
        }
    }

    pub fn add_row(&mut self) {
        self.rows.push(vec![String::new(); self.headers.len()]);
        self.dirty = true;
    }

    /// Untouched cells keep their loaded value. Edited and added cells are
    /// typed from their trimmed text; blank text becomes a missing value.
    fn typed_rows(&self) -> Vec<Vec<CellValue>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(r, row)| {
                row.iter()
                    .enumerate()
                    .map(|(c, text)| match self.original.get(r).and_then(|o| o.get(c)) {
                        Some(cell) if cell.canonical_text().unwrap_or_default() == *text => {
                            cell.clone()
                        }
                        _ => CellValue::guess(text.trim()),
                    })
                    .collect()
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub core: Daplot,

    /// Stored tables, refreshed after every store mutation.
    pub tables: Vec<TableSummary>,

    /// The table shown in the side panel, plot and editor.
    pub active: Option<TableId>,

    /// Distinct canonical text values per column of the active table.
    pub unique_values: BTreeMap<String, BTreeSet<String>>,

    /// Checked filter values per column. Nothing checked means no restriction.
    pub filters: FilterSpec,

    pub x_column: Option<String>,
    pub y_column: Option<String>,

    /// Rows passing the current filters.
    pub visible_rows: usize,

    /// Projected series of the current axes and filters.
    pub plot: Option<PlotData>,

    pub method: Method,
    pub steps: usize,
    pub prediction: Option<PredictionResult>,

    pub editor: Option<Editor>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(core: Daplot) -> Self {
        let method = core.config().default_method;
        let steps = core.config().default_steps;
        Self {
            core,
            tables: Vec::new(),
            active: None,
            unique_values: BTreeMap::new(),
            filters: FilterSpec::new(),
            x_column: None,
            y_column: None,
            visible_rows: 0,
            plot: None,
            method,
            steps,
            prediction: None,
            editor: None,
            status_message: None,
        }
    }

    /// Parse a spreadsheet file and store it as a new table.
    pub fn load_path(&mut self, path: &Path) -> anyhow::Result<()> {
        let table = daplot::data::loader::load_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let summary = self.core.upload(table, &filename);
        log::info!(
            "Loaded '{}' with columns {:?}",
            summary.filename,
            summary.headers
        );
        self.refresh_tables();
        self.select_table(summary.id)?;
        Ok(())
    }

    pub fn refresh_tables(&mut self) {
        self.tables = self.core.list_tables();
    }

    /// Make `id` the active table, resetting filters, axes and prediction.
    pub fn select_table(&mut self, id: TableId) -> anyhow::Result<()> {
        let table = self.core.store().get(&id)?;
        self.unique_values = unique_text_values(&table);
        self.filters = FilterSpec::new();

        let numeric = numeric_columns(&table);
        self.x_column = numeric.first().cloned();
        self.y_column = numeric.get(1).or(numeric.first()).cloned();

        self.editor = None;
        self.prediction = None;
        self.active = Some(id);
        self.status_message = None;
        self.refresh();
        Ok(())
    }

    pub fn delete_table(&mut self, id: &TableId) {
        if let Err(e) = self.core.delete_table(id) {
            self.status_message = Some(format!("Error: {e}"));
        }
        if self.active.as_ref() == Some(id) {
            self.clear_active();
        }
        self.refresh_tables();
    }

    pub fn clear_all(&mut self) {
        let removed = self.core.clear_all();
        self.clear_active();
        self.refresh_tables();
        self.status_message = Some(format!("Removed {removed} tables"));
    }

    fn clear_active(&mut self) {
        self.active = None;
        self.unique_values.clear();
        self.filters.clear();
        self.x_column = None;
        self.y_column = None;
        self.visible_rows = 0;
        self.plot = None;
        self.prediction = None;
        self.editor = None;
    }

    /// Recompute the visible row count and the plotted series.
    pub fn refresh(&mut self) {
        let Some(id) = self.active.clone() else {
            return;
        };
        match self.core.filtered_table(&id, &self.filters) {
            Ok(t) => self.visible_rows = t.row_count(),
            Err(e) => {
                self.status_message = Some(format!("Error: {e}"));
                return;
            }
        }
        self.plot = match (&self.x_column, &self.y_column) {
            (Some(x), Some(y)) => match self.core.project_for_plot(&id, &self.filters, x, y) {
                Ok(plot) => Some(plot),
                Err(e) => {
                    self.status_message = Some(format!("Error: {e}"));
                    None
                }
            },
            _ => None,
        };
        self.prediction = None;
    }

    pub fn set_x_column(&mut self, column: String) {
        self.x_column = Some(column);
        self.refresh();
    }

    pub fn set_y_column(&mut self, column: String) {
        self.y_column = Some(column);
        self.refresh();
    }

    /// Toggle a single value in a column's filter.
    pub fn toggle_filter_value(&mut self, column: &str, value: &str) {
        let selected = self.filters.entry(column.to_string()).or_default();
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        self.refresh();
    }

    /// Check every value of a column.
    pub fn select_all(&mut self, column: &str) {
        if let Some(all) = self.unique_values.get(column) {
            self.filters.insert(column.to_string(), all.clone());
            self.refresh();
        }
    }

    /// Uncheck every value of a column, lifting its restriction.
    pub fn select_none(&mut self, column: &str) {
        self.filters.remove(column);
        self.refresh();
    }

    /// Fit the selected method to the plotted series.
    pub fn run_prediction(&mut self) {
        let (Some(id), Some(x), Some(y)) = (&self.active, &self.x_column, &self.y_column) else {
            self.status_message = Some("Select a table and both axes first".into());
            return;
        };
        let request = PredictRequest::from_table(
            id.clone(),
            self.filters.clone(),
            x,
            y,
            self.method.tag(),
            self.steps,
        );
        match self.core.predict(&request) {
            Ok(result) => {
                self.prediction = Some(result);
                self.status_message = None;
            }
            Err(e) => {
                log::warn!("Prediction failed: {e}");
                self.prediction = None;
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Open the active table in the data editor.
    pub fn open_editor(&mut self) {
        let Some(id) = &self.active else {
            return;
        };
        match self.core.store().get(id) {
            Ok(table) => self.editor = Some(Editor::from_table(&table)),
            Err(e) => self.status_message = Some(format!("Error: {e}")),
        }
    }

    /// Write the editor contents back over the active table.
    pub fn commit_editor(&mut self) {
        let (Some(id), Some(editor)) = (self.active.clone(), &self.editor) else {
            return;
        };
        let headers = editor.headers.clone();
        match self.core.save_rows(id.clone(), headers, editor.typed_rows()) {
            Ok(summary) => {
                self.status_message = Some(format!(
                    "Saved {} rows × {} columns",
                    summary.rows, summary.columns
                ));
                self.refresh_tables();
                let filters = std::mem::take(&mut self.filters);
                let (x, y) = (self.x_column.take(), self.y_column.take());
                if self.select_table(id).is_ok() {
                    self.filters = filters
                        .into_iter()
                        .filter(|(col, _)| self.unique_values.contains_key(col))
                        .collect();
                    self.x_column = x.or(self.x_column.take());
                    self.y_column = y.or(self.y_column.take());
                    self.refresh();
                    self.open_editor();
                }
            }
            Err(e) => self.status_message = Some(format!("Error: {e}")),
        }
    }

    pub fn active_table(&self) -> Option<Arc<Table>> {
        self.active
            .as_ref()
            .and_then(|id| self.core.store().get(id).ok())
    }
}

/// Checkbox values per column: canonical text of every non-missing cell.
fn unique_text_values(table: &Table) -> BTreeMap<String, BTreeSet<String>> {
    table
        .columns()
        .iter()
        .map(|col| {
            let values = col.values.iter().filter_map(CellValue::canonical_text).collect();
            (col.name.clone(), values)
        })
        .collect()
}

/// Columns with at least one numeric reading, in table order.
fn numeric_columns(table: &Table) -> Vec<String> {
    table
        .columns()
        .iter()
        .filter(|col| col.values.iter().any(|v| v.coerce_f64().is_some()))
        .map(|col| col.name.clone())
        .collect()
}
