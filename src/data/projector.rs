use serde::{Deserialize, Serialize};

use super::model::CellValue;
use super::table::Table;
use crate::error::Result;

/// How missing values are dropped when pairing two columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    /// Drop missing cells from each column on its own, then truncate both to
    /// the shorter length. Pairs can shift when the columns have gaps in
    /// different rows.
    #[default]
    Independent,
    /// Drop a row when either of its two cells is missing.
    Paired,
}

/// Two equal-length numeric sequences, in row order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeriesPair {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl SeriesPair {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn points(&self) -> Vec<[f64; 2]> {
        self.x.iter().zip(&self.y).map(|(&x, &y)| [x, y]).collect()
    }
}

/// Extract the `(x, y)` series from two columns of `table`.
///
/// Cells without a numeric reading (blank, boolean, non-numeric text) count
/// as missing.
pub fn project(
    table: &Table,
    x_column: &str,
    y_column: &str,
    alignment: Alignment,
) -> Result<SeriesPair> {
    let xs = table.require_column(x_column)?;
    let ys = table.require_column(y_column)?;

    let pair = match alignment {
        Alignment::Independent => {
            let mut x = numeric_values(xs);
            let mut y = numeric_values(ys);
            let n = x.len().min(y.len());
            x.truncate(n);
            y.truncate(n);
            SeriesPair { x, y }
        }
        Alignment::Paired => {
            let (x, y): (Vec<f64>, Vec<f64>) = xs
                .iter()
                .zip(ys)
                .filter_map(|(xv, yv)| Some((xv.coerce_f64()?, yv.coerce_f64()?)))
                .unzip();
            SeriesPair { x, y }
        }
    };

    let dropped = table.row_count() - pair.len();
    if dropped > 0 {
        log::debug!("Projected '{x_column}' vs '{y_column}': {dropped} rows dropped as missing");
    }
    Ok(pair)
}

fn numeric_values(values: &[CellValue]) -> Vec<f64> {
    values.iter().filter_map(CellValue::coerce_f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DaplotError;

    fn gappy() -> Table {
        Table::from_rows(
            vec!["t".into(), "v".into()],
            vec![
                vec![CellValue::Integer(1), CellValue::Float(10.0)],
                vec![CellValue::Null, CellValue::Float(20.0)],
                vec![CellValue::Integer(3), CellValue::Null],
                vec![CellValue::Text("4".into()), CellValue::Float(40.0)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn independent_drops_then_truncates() {
        let s = project(&gappy(), "t", "v", Alignment::Independent).unwrap();
        assert_eq!(s.x, vec![1.0, 3.0, 4.0]);
        assert_eq!(s.y, vec![10.0, 20.0, 40.0]);
    }

    #[test]
    fn independent_truncates_to_shorter() {
        let t = Table::from_rows(
            vec!["a".into(), "b".into()],
            vec![
                vec![CellValue::Integer(1), CellValue::Integer(5)],
                vec![CellValue::Integer(2), CellValue::Null],
                vec![CellValue::Integer(3), CellValue::Null],
            ],
        )
        .unwrap();
        let s = project(&t, "a", "b", Alignment::Independent).unwrap();
        assert_eq!(s.x, vec![1.0]);
        assert_eq!(s.y, vec![5.0]);
    }

    #[test]
    fn paired_keeps_rows_aligned() {
        let s = project(&gappy(), "t", "v", Alignment::Paired).unwrap();
        assert_eq!(s.x, vec![1.0, 4.0]);
        assert_eq!(s.y, vec![10.0, 40.0]);
        assert_eq!(s.points(), vec![[1.0, 10.0], [4.0, 40.0]]);
    }

    #[test]
    fn unknown_axis_fails() {
        assert_eq!(
            project(&gappy(), "t", "nope", Alignment::Independent).unwrap_err(),
            DaplotError::UnknownColumn("nope".into())
        );
    }
}
