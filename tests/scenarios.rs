use std::collections::BTreeSet;

use daplot::data::filter::{FilterSpec, apply_filters};
use daplot::data::matcher::{MatchStrategy, match_column};
use daplot::data::model::CellValue;
use daplot::data::store::TableId;
use daplot::data::table::Table;
use daplot::predict::{Method, PredictionEngine};
use daplot::service::{DataLayout, PredictRequest};
use daplot::{Daplot, DaplotError};
use serde_json::json;

fn targets(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn filters(entries: Vec<(&str, Vec<&str>)>) -> FilterSpec {
    entries
        .into_iter()
        .map(|(col, vals)| (col.to_string(), targets(&vals)))
        .collect()
}

fn project_table() -> Table {
    Table::from_rows(
        vec!["Project".into(), "v".into()],
        vec![
            vec!["A".into(), CellValue::Integer(1)],
            vec!["A".into(), CellValue::Integer(2)],
            vec!["B".into(), CellValue::Integer(3)],
        ],
    )
    .unwrap()
}

#[test]
fn filter_by_project_keeps_matching_rows() {
    let app = Daplot::default();
    let id = app.upload(project_table(), "projects.xlsx").id;

    let rows = app.filter(&id, &filters(vec![("Project", vec!["A"])])).unwrap();
    assert_eq!(rows.len(), 2);
    for row in &rows {
        assert_eq!(row.get("Project"), Some(&CellValue::Text("A".into())));
    }
}

#[test]
fn numeric_column_matches_string_targets() {
    let values = vec![
        CellValue::Integer(1),
        CellValue::Integer(2),
        CellValue::Integer(3),
    ];
    let result = match_column(&values, &targets(&["1", "2"]));
    assert_eq!(result.direct.count, 0);
    assert_eq!(result.text.count, 2);
    assert_eq!(result.numeric.count, 2);
    assert_eq!(result.chosen, MatchStrategy::Numeric);
    assert_eq!(result.selected().rows, vec![true, true, false]);
}

#[test]
fn filtered_rows_are_a_matching_subset() {
    let table = Table::from_rows(
        vec!["code".into(), "label".into()],
        vec![
            vec![CellValue::Integer(1), "x".into()],
            vec!["1".into(), "y".into()],
            vec![CellValue::Float(2.0), "x".into()],
            vec![CellValue::Null, "z".into()],
            vec!["two".into(), "x".into()],
        ],
    )
    .unwrap();
    let spec = filters(vec![("code", vec!["1", "2"]), ("label", vec!["x", "y"])]);
    let out = apply_filters(&table, &spec).unwrap();

    assert!(out.row_count() <= table.row_count());
    let allowed = targets(&["1", "2"]);
    for cell in out.column("code").unwrap() {
        let m = match_column(std::slice::from_ref(cell), &allowed);
        assert!(m.direct.count + m.text.count + m.numeric.count > 0);
    }
    assert_eq!(out.row_count(), 3);
}

#[test]
fn empty_value_set_is_a_no_op() {
    let table = project_table();
    let with_empty = filters(vec![("Project", vec!["A"]), ("v", vec![])]);
    let without = filters(vec![("Project", vec!["A"])]);
    assert_eq!(
        apply_filters(&table, &with_empty).unwrap(),
        apply_filters(&table, &without).unwrap()
    );
}

#[test]
fn unknown_filter_column_always_fails() {
    let table = project_table();
    let spec = filters(vec![("Project", vec!["A"]), ("Missing", vec![])]);
    assert_eq!(
        apply_filters(&table, &spec).unwrap_err(),
        DaplotError::UnknownColumn("Missing".into())
    );
}

#[test]
fn two_points_fail_three_points_succeed() {
    let engine = PredictionEngine::new();
    for method in Method::ALL {
        assert!(matches!(
            engine.predict_with(&[0.0, 1.0], &[1.0, 2.0], method, 1),
            Err(DaplotError::InsufficientData {
                required: 3,
                actual: 2
            })
        ));
        let ok = engine.predict_with(&[0.0, 1.0, 2.0], &[1.0, 2.0, 2.5], method, 4);
        assert!(ok.is_ok(), "{method} failed: {:?}", ok.err());
    }
}

#[test]
fn future_x_is_evenly_spaced_from_last_interval() {
    let result = PredictionEngine::new()
        .predict(&[1.0, 2.0, 4.0, 6.5], &[1.0, 2.0, 3.0, 4.0], "polynomial", 4)
        .unwrap();
    assert_eq!(result.future_x, vec![9.0, 11.5, 14.0, 16.5]);
    assert!(result.future_x.windows(2).all(|w| w[1] > w[0]));
}

#[test]
fn linear_fit_of_quadratic_data() {
    let app = Daplot::default();
    let request = PredictRequest::direct(
        vec![0.0, 1.0, 2.0, 3.0, 4.0],
        vec![0.0, 1.0, 4.0, 9.0, 16.0],
        "linear",
        2,
    );
    let result = app.predict(&request).unwrap();
    assert_eq!(result.future_x, vec![5.0, 6.0]);
    assert!(result.metrics.r2_score > 0.0 && result.metrics.r2_score < 1.0);
}

#[test]
fn unknown_method_is_unsupported() {
    let app = Daplot::default();
    let request = PredictRequest::direct(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 2.0], "unknown", 1);
    assert_eq!(
        app.predict(&request).unwrap_err(),
        DaplotError::UnsupportedMethod("unknown".into())
    );
}

#[test]
fn save_then_list_reflects_headers_and_rows() {
    let app = Daplot::default();
    let id = TableId::from("edited");
    app.save(
        id.clone(),
        vec!["Month".into(), "Revenue".into()],
        &json!([[1, 10.5], [2, 11.0], [3, null]]),
        DataLayout::Rows,
    )
    .unwrap();

    let listed = app.list_tables();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);
    assert_eq!(listed[0].headers, vec!["Month", "Revenue"]);
    assert_eq!(listed[0].rows, 3);

    let fetched = app.fetch_table(&id).unwrap();
    assert_eq!(fetched.headers, vec!["Month", "Revenue"]);
    assert_eq!(fetched.rows.len(), 3);
}

#[test]
fn predict_through_filter_and_projection() {
    let app = Daplot::default();
    let table = Table::from_rows(
        vec!["Project".into(), "Month".into(), "Revenue".into()],
        (1..=6)
            .flat_map(|m| {
                [
                    vec!["A".into(), CellValue::Integer(m), CellValue::Float(10.0 * m as f64)],
                    vec!["B".into(), CellValue::Integer(m), CellValue::Text("n/a".into())],
                ]
            })
            .collect(),
    )
    .unwrap();
    let id = app.upload(table, "revenue.csv").id;

    let request = PredictRequest::from_table(
        id,
        filters(vec![("Project", vec!["A"])]),
        "Month",
        "Revenue",
        "linear",
        3,
    );
    let result = app.predict(&request).unwrap();
    assert_eq!(result.metrics.training_samples, 6);
    assert_eq!(result.future_x, vec![7.0, 8.0, 9.0]);
    for (x, y) in result.future_x.iter().zip(&result.predictions) {
        assert!((y - 10.0 * x).abs() < 1e-6);
    }
}
