use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use calamine::{Data, Reader, open_workbook_auto};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::CellValue;
use super::table::{Column, Table};

/// Extensions accepted by [`load_file`], for file dialogs.
pub const SUPPORTED_EXTENSIONS: &[&str] =
    &["xlsx", "xls", "xlsm", "xlsb", "ods", "csv", "json", "parquet", "pq"];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a table from a spreadsheet file.  Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xls` / `.xlsm` / `.xlsb` / `.ods` – first worksheet, first row is the header
/// * `.csv`     – header row, cell types guessed per value
/// * `.json`    – `[{ "col": value, ... }, ...]` or `{ "headers": [...], "rows": [[...], ...] }`
/// * `.parquet` – flat columns of strings, integers, floats and booleans
pub fn load_file(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => load_workbook(path),
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// Excel / ODS loader
// ---------------------------------------------------------------------------

fn load_workbook(path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path).context("opening workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("workbook has no worksheets")?
        .context("reading first worksheet")?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Table::default());
    };
    let headers = header_names(header_row.iter().map(|c| match c {
        Data::Empty => String::new(),
        other => other.to_string(),
    }));

    let mut columns: Vec<Column> = headers
        .into_iter()
        .map(|h| Column::new(h, Vec::new()))
        .collect();
    for row in rows {
        for (idx, col) in columns.iter_mut().enumerate() {
            col.values.push(row.get(idx).map_or(CellValue::Null, workbook_cell));
        }
    }
    for col in &mut columns {
        narrow_whole_floats(&mut col.values);
    }

    Table::new(columns).context("building table from worksheet")
}

fn workbook_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) if s.is_empty() => CellValue::Null,
        Data::String(s) => CellValue::Text(s.clone()),
        other => CellValue::Text(other.to_string()),
    }
}

/// Workbooks store every number as a float. A column whose numbers are all
/// whole is read back as integers.
fn narrow_whole_floats(values: &mut [CellValue]) {
    let all_whole = values.iter().all(|v| match v {
        CellValue::Float(f) => f.fract() == 0.0 && f.abs() < i64::MAX as f64,
        CellValue::Integer(_) | CellValue::Null => true,
        _ => false,
    });
    let any_float = values.iter().any(|v| matches!(v, CellValue::Float(_)));
    if all_whole && any_float {
        for v in values.iter_mut() {
            if let CellValue::Float(f) = v {
                *v = CellValue::Integer(*f as i64);
            }
        }
    }
}

/// Blank headers become `column_<n>`; repeated headers get a `.<k>` suffix.
fn header_names(raw: impl Iterator<Item = String>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for (idx, name) in raw.enumerate() {
        let base = if name.trim().is_empty() {
            format!("column_{}", idx + 1)
        } else {
            name
        };
        let mut candidate = base.clone();
        let mut k = 1;
        while names.contains(&candidate) {
            candidate = format!("{base}.{k}");
            k += 1;
        }
        names.push(candidate);
    }
    names
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

fn load_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    match &root {
        JsonValue::Array(records) => json_records(records),
        JsonValue::Object(obj) => {
            let headers: Vec<String> = serde_json::from_value(
                obj.get("headers").cloned().context("missing 'headers'")?,
            )
            .context("'headers' must be a list of strings")?;
            let rows: Vec<Vec<CellValue>> =
                serde_json::from_value(obj.get("rows").cloned().context("missing 'rows'")?)
                    .context("'rows' must be a list of lists")?;
            Table::from_rows(headers, rows).context("building table from JSON")
        }
        _ => bail!("Expected a JSON array of records or a headers/rows object"),
    }
}

/// Records-oriented JSON: an array of objects keyed by column name.
/// Keys missing from a record are null.
fn json_records(records: &[JsonValue]) -> Result<Table> {
    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let columns = headers
        .into_iter()
        .map(|h| {
            let values = records
                .iter()
                .map(|rec| rec.get(&h).map_or(CellValue::Null, CellValue::from_json))
                .collect();
            Column::new(h, values)
        })
        .collect();
    Table::new(columns).context("building table from JSON")
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers = header_names(
        reader
            .headers()
            .context("reading CSV headers")?
            .iter()
            .map(|h| h.to_string()),
    );

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let row: Vec<CellValue> = (0..headers.len())
            .map(|i| CellValue::guess(record.get(i).unwrap_or("")))
            .collect();
        rows.push(row);
    }

    Table::from_rows(headers, rows).context("building table from CSV")
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Flat columns only. Unsupported column types are read as their debug text.
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut columns: Vec<Column> = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        if columns.is_empty() {
            columns = schema
                .fields()
                .iter()
                .map(|f| Column::new(f.name().clone(), Vec::new()))
                .collect();
        }

        for (col_idx, column) in columns.iter_mut().enumerate() {
            let array = batch.column(col_idx);
            for row in 0..batch.num_rows() {
                column.values.push(extract_cell(array, row));
            }
        }
    }

    Table::new(columns).context("building table from parquet")
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => CellValue::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        other => CellValue::Text(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(ext: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(&format!(".{ext}"))
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn csv_guesses_cell_types() {
        let file = write_temp("csv", "Project,code,value\nA,1,0.5\nB,,2\n");
        let table = load_file(file.path()).unwrap();
        assert_eq!(table.column_names(), vec!["Project", "code", "value"]);
        assert_eq!(
            table.column("code").unwrap(),
            &[CellValue::Integer(1), CellValue::Null]
        );
        assert_eq!(
            table.column("value").unwrap(),
            &[CellValue::Float(0.5), CellValue::Integer(2)]
        );
    }

    #[test]
    fn json_records_fill_missing_keys() {
        let file = write_temp("json", r#"[{"a": 1, "b": "x"}, {"a": 2.5}]"#);
        let table = load_file(file.path()).unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(
            table.column("b").unwrap(),
            &[CellValue::Text("x".into()), CellValue::Null]
        );
    }

    #[test]
    fn json_headers_and_rows() {
        let file = write_temp("json", r#"{"headers": ["t", "v"], "rows": [[1, 2], [3, null]]}"#);
        let table = load_file(file.path()).unwrap();
        assert_eq!(table.column_names(), vec!["t", "v"]);
        assert_eq!(table.column("v").unwrap()[1], CellValue::Null);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let file = write_temp("txt", "hello");
        assert!(load_file(file.path()).is_err());
    }

    #[test]
    fn blank_and_repeated_headers_are_renamed() {
        let names = header_names(
            vec!["a".to_string(), String::new(), "a".to_string()].into_iter(),
        );
        assert_eq!(names, vec!["a", "column_2", "a.1"]);
    }

    #[test]
    fn whole_floats_become_integers() {
        let mut vals = vec![CellValue::Float(1.0), CellValue::Null, CellValue::Float(3.0)];
        narrow_whole_floats(&mut vals);
        assert_eq!(vals, vec![CellValue::Integer(1), CellValue::Null, CellValue::Integer(3)]);

        let mut mixed = vec![CellValue::Float(1.0), CellValue::Float(1.5)];
        narrow_whole_floats(&mut mixed);
        assert_eq!(mixed[0], CellValue::Float(1.0));
    }
}
