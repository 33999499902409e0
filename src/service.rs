//! The operations the viewer (or any other front end) calls: upload, fetch,
//! filter, plot projection, prediction, save and table management.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::config::AppConfig;
use crate::data::filter::{FilterSpec, apply_filters};
use crate::data::model::CellValue;
use crate::data::projector::{SeriesPair, project};
use crate::data::store::{TableId, TableStore, TableSummary};
use crate::data::table::{Record, Table};
use crate::error::{DaplotError, Result};
use crate::predict::{Method, PredictionEngine, PredictionResult};

/// Returned by [`Daplot::upload`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadSummary {
    pub id: TableId,
    pub filename: String,
    pub headers: Vec<String>,
    pub preview: Vec<Record>,
}

/// A whole stored table as records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableData {
    pub id: TableId,
    pub headers: Vec<String>,
    pub rows: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotData {
    pub x_values: Vec<f64>,
    pub y_values: Vec<f64>,
    pub x_label: String,
    pub y_label: String,
}

impl PlotData {
    pub fn points(&self) -> Vec<[f64; 2]> {
        self.x_values
            .iter()
            .zip(&self.y_values)
            .map(|(&x, &y)| [x, y])
            .collect()
    }
}

/// Orientation of the literal data passed to [`Daplot::save`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataLayout {
    /// `data[r][c]` is row `r`, column `c`.
    #[default]
    Rows,
    /// `data[c][r]` is column `c`, row `r`.
    Columns,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SaveSummary {
    pub rows: usize,
    pub columns: usize,
}

/// Input of [`Daplot::predict`].
///
/// Either `x_values` + `y_values` are given directly, or the series is
/// derived from `table_id` + `filters` + `x_column` + `y_column`. Direct
/// values win when both are present. `method` and `steps` fall back to the
/// configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PredictRequest {
    pub table_id: Option<TableId>,
    pub filters: FilterSpec,
    pub x_column: Option<String>,
    pub y_column: Option<String>,
    pub x_values: Option<Vec<f64>>,
    pub y_values: Option<Vec<f64>>,
    pub method: Option<String>,
    pub steps: Option<usize>,
}

impl PredictRequest {
    pub fn direct(x_values: Vec<f64>, y_values: Vec<f64>, method: &str, steps: usize) -> Self {
        Self {
            x_values: Some(x_values),
            y_values: Some(y_values),
            method: Some(method.to_string()),
            steps: Some(steps),
            ..Self::default()
        }
    }

    pub fn from_table(
        table_id: TableId,
        filters: FilterSpec,
        x_column: &str,
        y_column: &str,
        method: &str,
        steps: usize,
    ) -> Self {
        Self {
            table_id: Some(table_id),
            filters,
            x_column: Some(x_column.to_string()),
            y_column: Some(y_column.to_string()),
            method: Some(method.to_string()),
            steps: Some(steps),
            ..Self::default()
        }
    }
}

/// Shared application core. The table store is behind an `Arc` so several
/// front ends can share one process-wide store.
pub struct Daplot {
    store: Arc<TableStore>,
    config: AppConfig,
    engine: PredictionEngine,
}

impl Default for Daplot {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl Daplot {
    pub fn new(config: AppConfig) -> Self {
        Self::with_store(Arc::new(TableStore::new()), config)
    }

    pub fn with_store(store: Arc<TableStore>, config: AppConfig) -> Self {
        let mut engine = PredictionEngine::new().with_max_steps(config.max_steps);
        if let Some(limit) = config.fit_time_limit() {
            engine = engine.with_time_limit(limit);
        }
        Self {
            store,
            config,
            engine,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<TableStore> {
        &self.store
    }

    /// Store a parsed spreadsheet under a new id.
    pub fn upload(&self, table: Table, filename: &str) -> UploadSummary {
        let headers = table.column_names();
        let preview = table.head(self.config.preview_rows).records();
        let id = self.store.create(table);
        log::info!("Uploaded '{filename}' as {id}");
        UploadSummary {
            id,
            filename: filename.to_string(),
            headers,
            preview,
        }
    }

    pub fn fetch_table(&self, id: &TableId) -> Result<TableData> {
        let table = self.store.get(id)?;
        Ok(TableData {
            id: id.clone(),
            headers: table.column_names(),
            rows: table.records(),
        })
    }

    /// The stored table restricted to the rows passing `filters`.
    pub fn filtered_table(&self, id: &TableId, filters: &FilterSpec) -> Result<Table> {
        let table = self.store.get(id)?;
        apply_filters(&table, filters)
    }

    pub fn filter(&self, id: &TableId, filters: &FilterSpec) -> Result<Vec<Record>> {
        Ok(self.filtered_table(id, filters)?.records())
    }

    pub fn project_for_plot(
        &self,
        id: &TableId,
        filters: &FilterSpec,
        x_column: &str,
        y_column: &str,
    ) -> Result<PlotData> {
        let SeriesPair { x, y } = self.series(id, filters, x_column, y_column)?;
        Ok(PlotData {
            x_values: x,
            y_values: y,
            x_label: x_column.to_string(),
            y_label: y_column.to_string(),
        })
    }

    fn series(
        &self,
        id: &TableId,
        filters: &FilterSpec,
        x_column: &str,
        y_column: &str,
    ) -> Result<SeriesPair> {
        let filtered = self.filtered_table(id, filters)?;
        project(&filtered, x_column, y_column, self.config.plot_alignment)
    }

    /// Validate the request, derive the series if needed, then fit and forecast.
    pub fn predict(&self, request: &PredictRequest) -> Result<PredictionResult> {
        let method = match &request.method {
            Some(tag) => tag.parse::<Method>()?,
            None => self.config.default_method,
        };

        let steps = request.steps.unwrap_or(self.config.default_steps);
        if steps == 0 || steps > self.config.max_steps {
            return Err(DaplotError::InvalidFormat(format!(
                "steps must be between 1 and {}, got {steps}",
                self.config.max_steps
            )));
        }

        let series = match request {
            PredictRequest {
                x_values: Some(x),
                y_values: Some(y),
                ..
            } => {
                if x.len() != y.len() {
                    return Err(DaplotError::InvalidFormat(format!(
                        "x_values has {} entries but y_values has {}",
                        x.len(),
                        y.len()
                    )));
                }
                SeriesPair {
                    x: x.clone(),
                    y: y.clone(),
                }
            }
            PredictRequest {
                table_id: Some(id),
                x_column: Some(x_column),
                y_column: Some(y_column),
                ..
            } => self.series(id, &request.filters, x_column, y_column)?,
            _ => {
                return Err(DaplotError::InvalidFormat(
                    "provide x_values and y_values, or table_id with x_column and y_column"
                        .into(),
                ));
            }
        };

        self.engine.predict_with(&series.x, &series.y, method, steps)
    }

    /// Create or wholesale replace the table under `id` from literal data.
    ///
    /// `data` must be a JSON array of arrays, laid out per `layout`.
    pub fn save(
        &self,
        id: TableId,
        headers: Vec<String>,
        data: &JsonValue,
        layout: DataLayout,
    ) -> Result<SaveSummary> {
        if headers.is_empty() {
            return Err(DaplotError::InvalidFormat("headers must not be empty".into()));
        }
        let outer = data.as_array().ok_or_else(|| {
            DaplotError::InvalidFormat("data must be a sequence of sequences".into())
        })?;
        let nested = outer
            .iter()
            .enumerate()
            .map(|(i, inner)| {
                inner
                    .as_array()
                    .map(|cells| cells.iter().map(CellValue::from_json).collect())
                    .ok_or_else(|| {
                        DaplotError::InvalidFormat(format!("entry {i} of data is not a sequence"))
                    })
            })
            .collect::<Result<Vec<Vec<CellValue>>>>()?;

        let table = match layout {
            DataLayout::Rows => Table::from_rows(headers, nested)?,
            DataLayout::Columns => Table::from_columns(headers, nested)?,
        };
        Ok(self.save_table(id, table))
    }

    /// Like [`Daplot::save`] for rows that are already typed.
    pub fn save_rows(
        &self,
        id: TableId,
        headers: Vec<String>,
        rows: Vec<Vec<CellValue>>,
    ) -> Result<SaveSummary> {
        let table = Table::from_rows(headers, rows)?;
        Ok(self.save_table(id, table))
    }

    fn save_table(&self, id: TableId, table: Table) -> SaveSummary {
        let summary = SaveSummary {
            rows: table.row_count(),
            columns: table.column_count(),
        };
        self.store.replace(id, table);
        summary
    }

    pub fn list_tables(&self) -> Vec<TableSummary> {
        self.store.list()
    }

    pub fn delete_table(&self, id: &TableId) -> Result<()> {
        self.store.delete(id)
    }

    /// Remove every stored table, returning how many there were.
    pub fn clear_all(&self) -> usize {
        self.store.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn sample() -> Table {
        Table::from_rows(
            vec!["Project".into(), "t".into(), "v".into()],
            vec![
                vec!["A".into(), CellValue::Integer(0), CellValue::Float(0.0)],
                vec!["A".into(), CellValue::Integer(1), CellValue::Float(1.0)],
                vec!["B".into(), CellValue::Integer(2), CellValue::Float(9.0)],
                vec!["A".into(), CellValue::Integer(3), CellValue::Float(4.0)],
            ],
        )
        .unwrap()
    }

    fn only(column: &str, values: &[&str]) -> FilterSpec {
        let set: BTreeSet<String> = values.iter().map(|v| v.to_string()).collect();
        FilterSpec::from([(column.to_string(), set)])
    }

    #[test]
    fn upload_returns_preview() {
        let app = Daplot::new(AppConfig {
            preview_rows: 2,
            ..AppConfig::default()
        });
        let summary = app.upload(sample(), "data.xlsx");
        assert_eq!(summary.filename, "data.xlsx");
        assert_eq!(summary.headers, vec!["Project", "t", "v"]);
        assert_eq!(summary.preview.len(), 2);
        assert_eq!(app.list_tables().len(), 1);
    }

    #[test]
    fn unknown_table_is_not_found() {
        let app = Daplot::default();
        let id = TableId::from("missing");
        assert_eq!(
            app.filter(&id, &FilterSpec::new()).unwrap_err(),
            DaplotError::NotFound("missing".into())
        );
        assert!(matches!(app.fetch_table(&id), Err(DaplotError::NotFound(_))));
        assert!(matches!(app.delete_table(&id), Err(DaplotError::NotFound(_))));
    }

    #[test]
    fn plot_uses_filtered_rows() {
        let app = Daplot::default();
        let id = app.upload(sample(), "s.csv").id;
        let plot = app
            .project_for_plot(&id, &only("Project", &["A"]), "t", "v")
            .unwrap();
        assert_eq!(plot.x_values, vec![0.0, 1.0, 3.0]);
        assert_eq!(plot.y_values, vec![0.0, 1.0, 4.0]);
        assert_eq!(plot.x_label, "t");
        assert_eq!(plot.y_label, "v");
    }

    #[test]
    fn plot_with_unknown_axis_fails() {
        let app = Daplot::default();
        let id = app.upload(sample(), "s.csv").id;
        assert_eq!(
            app.project_for_plot(&id, &FilterSpec::new(), "t", "nope")
                .unwrap_err(),
            DaplotError::UnknownColumn("nope".into())
        );
    }

    #[test]
    fn predict_from_stored_table() {
        let app = Daplot::default();
        let id = app.upload(sample(), "s.csv").id;
        let request = PredictRequest::from_table(id, only("Project", &["A"]), "t", "v", "linear", 2);
        let result = app.predict(&request).unwrap();
        assert_eq!(result.future_x, vec![5.0, 7.0]);
        assert_eq!(result.metrics.training_samples, 3);
    }

    #[test]
    fn predict_uses_configured_defaults() {
        let app = Daplot::default();
        let request = PredictRequest {
            x_values: Some(vec![0.0, 1.0, 2.0]),
            y_values: Some(vec![0.0, 2.0, 4.0]),
            ..PredictRequest::default()
        };
        let result = app.predict(&request).unwrap();
        assert_eq!(result.method, Method::Linear);
        assert_eq!(result.steps, 10);
        assert_eq!(result.predictions.len(), 10);
    }

    #[test]
    fn predict_request_validation() {
        let app = Daplot::default();

        let too_many = PredictRequest::direct(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 2.0], "linear", 101);
        assert!(matches!(app.predict(&too_many), Err(DaplotError::InvalidFormat(_))));

        let mismatched = PredictRequest::direct(vec![0.0, 1.0, 2.0], vec![0.0, 1.0], "linear", 1);
        assert!(matches!(app.predict(&mismatched), Err(DaplotError::InvalidFormat(_))));

        let neither = PredictRequest {
            x_values: Some(vec![0.0, 1.0, 2.0]),
            ..PredictRequest::default()
        };
        assert!(matches!(app.predict(&neither), Err(DaplotError::InvalidFormat(_))));

        let bad_method = PredictRequest::direct(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 2.0], "arima", 1);
        assert_eq!(
            app.predict(&bad_method).unwrap_err(),
            DaplotError::UnsupportedMethod("arima".into())
        );
    }

    #[test]
    fn predict_request_deserializes_with_defaults() {
        let request: PredictRequest = serde_json::from_value(json!({
            "table_id": "abc",
            "filters": {"Project": ["A"]},
            "x_column": "t",
            "y_column": "v",
            "method": "svr"
        }))
        .unwrap();
        assert_eq!(request.table_id, Some(TableId::from("abc")));
        assert_eq!(request.steps, None);
        assert!(request.filters["Project"].contains("A"));
    }

    #[test]
    fn save_rows_then_fetch() {
        let app = Daplot::default();
        let id = TableId::from("t1");
        let summary = app
            .save(
                id.clone(),
                vec!["a".into(), "b".into()],
                &json!([[1, "x"], [2.5, null], [true, "y"]]),
                DataLayout::Rows,
            )
            .unwrap();
        assert_eq!(summary, SaveSummary { rows: 3, columns: 2 });

        let data = app.fetch_table(&id).unwrap();
        assert_eq!(data.headers, vec!["a", "b"]);
        assert_eq!(data.rows.len(), 3);
        assert_eq!(data.rows[1].get("a"), Some(&CellValue::Float(2.5)));
        assert_eq!(data.rows[1].get("b"), Some(&CellValue::Null));
    }

    #[test]
    fn save_columns_layout() {
        let app = Daplot::default();
        let summary = app
            .save(
                TableId::from("t2"),
                vec!["a".into(), "b".into()],
                &json!([[1, 2, 3], ["x", "y", "z"]]),
                DataLayout::Columns,
            )
            .unwrap();
        assert_eq!(summary, SaveSummary { rows: 3, columns: 2 });
    }

    #[test]
    fn save_replaces_existing_table() {
        let app = Daplot::default();
        let id = app.upload(sample(), "s.csv").id;
        app.save(id.clone(), vec!["only".into()], &json!([[1]]), DataLayout::Rows)
            .unwrap();
        let tables = app.list_tables();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].headers, vec!["only"]);
        assert_eq!(tables[0].rows, 1);
    }

    #[test]
    fn malformed_save_payloads() {
        let app = Daplot::default();
        let id = TableId::from("bad");
        let cases = [
            (vec![], json!([[1]])),
            (vec!["a".to_string()], json!({"a": 1})),
            (vec!["a".to_string()], json!([1, 2])),
            (vec!["a".to_string(), "b".to_string()], json!([[1]])),
            (vec!["a".to_string(), "a".to_string()], json!([[1, 2]])),
            (vec!["".to_string(), "b".to_string()], json!([[1, 2]])),
            (vec!["  ".to_string()], json!([[1]])),
        ];
        for (headers, data) in cases {
            assert!(matches!(
                app.save(id.clone(), headers, &data, DataLayout::Rows),
                Err(DaplotError::InvalidFormat(_))
            ));
        }
        assert!(app.list_tables().is_empty());
    }

    #[test]
    fn clear_all_counts_tables() {
        let app = Daplot::default();
        app.upload(sample(), "a.csv");
        app.upload(sample(), "b.csv");
        assert_eq!(app.clear_all(), 2);
        assert!(app.list_tables().is_empty());
    }
}
