use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use super::model::CellValue;

// ---------------------------------------------------------------------------
// Match strategies
// ---------------------------------------------------------------------------

/// How a column's cells are compared against caller-supplied target strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Cell is a text value equal to a target.
    Direct,
    /// Cell's canonical text equals a target.
    Text,
    /// Cell and target both coerce to the same number.
    Numeric,
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStrategy::Direct => write!(f, "direct"),
            MatchStrategy::Text => write!(f, "text"),
            MatchStrategy::Numeric => write!(f, "numeric"),
        }
    }
}

/// One candidate row selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    pub rows: Vec<bool>,
    pub count: usize,
}

impl Mask {
    fn from_fn(values: &[CellValue], f: impl Fn(&CellValue) -> bool) -> Self {
        let rows: Vec<bool> = values.iter().map(f).collect();
        let count = rows.iter().filter(|&&m| m).count();
        Self { rows, count }
    }
}

/// All three candidate masks for one column, plus the one committed to.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMatch {
    pub direct: Mask,
    pub text: Mask,
    pub numeric: Mask,
    pub chosen: MatchStrategy,
}

impl ColumnMatch {
    /// The mask of the chosen strategy.
    pub fn selected(&self) -> &Mask {
        match self.chosen {
            MatchStrategy::Direct => &self.direct,
            MatchStrategy::Text => &self.text,
            MatchStrategy::Numeric => &self.numeric,
        }
    }
}

/// A target after numeric coercion. Targets that do not parse stay text and
/// can never equal a coerced cell.
#[derive(Debug, Clone, PartialEq)]
enum NumericTarget {
    Number(f64),
    Text(String),
}

impl NumericTarget {
    fn parse(s: &str) -> Self {
        match s.trim().parse::<f64>() {
            Ok(v) => NumericTarget::Number(v),
            Err(_) => NumericTarget::Text(s.to_string()),
        }
    }
}

/// Decide which cells of `values` match any of `targets`.
///
/// Three masks are computed and the most permissive one with the highest
/// count wins: numeric when it has matches and is not beaten, then text,
/// then direct. An all-missing column yields an empty direct mask.
pub fn match_column(values: &[CellValue], targets: &BTreeSet<String>) -> ColumnMatch {
    let direct = Mask::from_fn(values, |cell| match cell {
        CellValue::Text(s) => targets.contains(s),
        _ => false,
    });

    let text = Mask::from_fn(values, |cell| {
        cell.canonical_text()
            .is_some_and(|s| targets.contains(&s))
    });

    let numeric_targets: Vec<f64> = targets
        .iter()
        .map(|t| NumericTarget::parse(t))
        .filter_map(|t| match t {
            NumericTarget::Number(v) => Some(v),
            NumericTarget::Text(_) => None,
        })
        .collect();
    let numeric = Mask::from_fn(values, |cell| {
        cell.coerce_f64()
            .is_some_and(|v| numeric_targets.iter().any(|&t| t == v))
    });

    let chosen = choose_strategy(direct.count, text.count, numeric.count);
    log::debug!(
        "match counts direct={} text={} numeric={} -> {chosen}",
        direct.count,
        text.count,
        numeric.count
    );

    ColumnMatch {
        direct,
        text,
        numeric,
        chosen,
    }
}

/// Ties go to the more normalized strategy.
fn choose_strategy(n_direct: usize, n_text: usize, n_numeric: usize) -> MatchStrategy {
    if n_numeric > 0 && n_numeric >= n_direct.max(n_text) {
        MatchStrategy::Numeric
    } else if n_text > 0 && n_text >= n_direct {
        MatchStrategy::Text
    } else {
        MatchStrategy::Direct
    }
}
