use std::collections::{BTreeMap, BTreeSet};

use super::matcher::match_column;
use super::table::Table;
use crate::error::{DaplotError, Result};

// ---------------------------------------------------------------------------
// Filter specification: which values are allowed per column
// ---------------------------------------------------------------------------

/// Per-column selection: maps column_name → set of allowed values, as strings.
/// An empty set means "no restriction" for that column.
pub type FilterSpec = BTreeMap<String, BTreeSet<String>>;

/// Return indices of rows that pass all active filters, in table order.
///
/// Every key must name a column of `table`; this is checked before any
/// matching work starts. Columns with an empty value set are skipped.
pub fn filtered_indices(table: &Table, filters: &FilterSpec) -> Result<Vec<usize>> {
    if let Some(unknown) = filters.keys().find(|col| !table.has_column(col)) {
        return Err(DaplotError::UnknownColumn(unknown.clone()));
    }

    let mut keep = vec![true; table.row_count()];
    for (col, allowed) in filters {
        if allowed.is_empty() {
            continue;
        }
        let values = table.require_column(col)?;
        let matched = match_column(values, allowed);
        for (slot, hit) in keep.iter_mut().zip(&matched.selected().rows) {
            *slot &= *hit;
        }
        log::debug!(
            "filter '{col}' via {} strategy: {} rows remain",
            matched.chosen,
            keep.iter().filter(|&&k| k).count()
        );
    }

    Ok(keep
        .iter()
        .enumerate()
        .filter(|&(_, &k)| k)
        .map(|(i, _)| i)
        .collect())
}

/// Restrict `table` to the rows passing `filters`. Columns are unchanged and
/// surviving rows keep their original order.
pub fn apply_filters(table: &Table, filters: &FilterSpec) -> Result<Table> {
    let indices = filtered_indices(table, filters)?;
    log::info!(
        "Filtered {} rows down to {}",
        table.row_count(),
        indices.len()
    );
    Ok(table.take_rows(&indices))
}
