//! Relative strength of instruments against a benchmark.
//!
//! Given a [`PriceTable`] and a benchmark label, [`compute_relative_strength`]
//! divides every other column by the benchmark column row by row, measures how
//! much each ratio moved between the first and last row, ranks the moves, and
//! exposes the instruments whose ratio rose as outperformers.
//!
//! ```rust
//! use sectorwatch_core::{compute_relative_strength, AnalysisParams, PriceTable, TradingDate};
//!
//! let dates = vec![
//!     TradingDate::parse("2024-01-02").unwrap(),
//!     TradingDate::parse("2024-01-03").unwrap(),
//! ];
//! let table = PriceTable::new(
//!     dates,
//!     vec![
//!         ("BENCH".to_owned(), vec![100.0, 110.0]),
//!         ("X".to_owned(), vec![50.0, 60.0]),
//!     ],
//! )
//! .unwrap();
//!
//! let report = compute_relative_strength(&table, &AnalysisParams::new("BENCH")).unwrap();
//! assert_eq!(report.outperformers().labels().collect::<Vec<_>>(), vec!["X"]);
//! ```
//!
//! Non-finite prices are data, not errors: a zero benchmark close produces an
//! infinite ratio in that cell and the affected change is NaN.

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{PriceTable, TradingDate};

/// Explicit inputs of a relative-strength run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisParams {
    pub benchmark: String,
}

impl AnalysisParams {
    pub fn new(benchmark: impl Into<String>) -> Self {
        Self {
            benchmark: benchmark.into(),
        }
    }
}

/// Why a price table could not be analysed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyTableReason {
    NoRows,
    NoComparableColumns,
}

impl Display for EmptyTableReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoRows => f.write_str("table has no rows"),
            Self::NoComparableColumns => f.write_str("table has no columns besides the benchmark"),
        }
    }
}

/// Precondition failures of the calculator. Both abort the whole run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("benchmark '{label}' is not a column of the price table")]
    MissingBenchmark { label: String },

    #[error("no usable price data: {reason}")]
    EmptyTable { reason: EmptyTableReason },
}

impl AnalysisError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingBenchmark { .. } => "analysis.missing_benchmark",
            Self::EmptyTable { .. } => "analysis.empty_table",
        }
    }
}

/// Instrument-to-benchmark price ratios, same date index as the price table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelativeStrengthTable {
    dates: Vec<TradingDate>,
    labels: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl RelativeStrengthTable {
    pub fn dates(&self) -> &[TradingDate] {
        &self.dates
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn column(&self, label: &str) -> Option<&[f64]> {
        self.labels
            .iter()
            .position(|candidate| candidate == label)
            .map(|index| self.columns[index].as_slice())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter().map(Vec::as_slice))
    }

    /// Ratios of one row in column order.
    pub fn row(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.dates.len() {
            return None;
        }
        Some(self.columns.iter().map(|column| column[index]).collect())
    }

    pub fn row_count(&self) -> usize {
        self.dates.len()
    }

    pub fn column_count(&self) -> usize {
        self.labels.len()
    }
}

/// Fractional change of one instrument's ratio over the window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeEntry {
    pub label: String,
    pub change: f64,
}

impl ChangeEntry {
    pub fn is_outperforming(&self) -> bool {
        self.change > 0.0
    }
}

/// Ratio changes ranked from strongest to weakest.
///
/// Ties keep price-table column order; NaN changes rank after every number.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RelativeStrengthChange {
    entries: Vec<ChangeEntry>,
}

impl RelativeStrengthChange {
    fn ranked(mut entries: Vec<ChangeEntry>) -> Self {
        entries.sort_by(|left, right| rank_descending(left.change, right.change));
        Self { entries }
    }

    pub fn entries(&self) -> &[ChangeEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChangeEntry> {
        self.entries.iter()
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|entry| entry.label == label)
            .map(|entry| entry.change)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Leading run of entries with a strictly positive change.
    pub fn outperformers(&self) -> Outperformers<'_> {
        let count = self.entries.partition_point(ChangeEntry::is_outperforming);
        Outperformers {
            entries: &self.entries[..count],
        }
    }
}

/// View over the positive prefix of a [`RelativeStrengthChange`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Outperformers<'a> {
    entries: &'a [ChangeEntry],
}

impl<'a> Outperformers<'a> {
    pub fn entries(&self) -> &'a [ChangeEntry] {
        self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'a, ChangeEntry> {
        self.entries.iter()
    }

    pub fn labels(&self) -> impl Iterator<Item = &'a str> {
        self.entries.iter().map(|entry| entry.label.as_str())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.entries.iter().any(|entry| entry.label == label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Output of one relative-strength run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelativeStrengthReport {
    pub benchmark: String,
    pub ratios: RelativeStrengthTable,
    pub changes: RelativeStrengthChange,
}

impl RelativeStrengthReport {
    pub fn outperformers(&self) -> Outperformers<'_> {
        self.changes.outperformers()
    }

    pub fn first_date(&self) -> Option<TradingDate> {
        self.ratios.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<TradingDate> {
        self.ratios.dates.last().copied()
    }
}

/// Compute ratios, ranked changes and outperformers of every non-benchmark column.
///
/// # Errors
///
/// - [`AnalysisError::MissingBenchmark`] when `params.benchmark` is not a column.
/// - [`AnalysisError::EmptyTable`] when the table has no rows or only the benchmark.
pub fn compute_relative_strength(
    table: &PriceTable,
    params: &AnalysisParams,
) -> Result<RelativeStrengthReport, AnalysisError> {
    let benchmark = table
        .column(&params.benchmark)
        .ok_or_else(|| AnalysisError::MissingBenchmark {
            label: params.benchmark.clone(),
        })?;

    if table.row_count() == 0 {
        return Err(AnalysisError::EmptyTable {
            reason: EmptyTableReason::NoRows,
        });
    }
    if table.column_count() < 2 {
        return Err(AnalysisError::EmptyTable {
            reason: EmptyTableReason::NoComparableColumns,
        });
    }

    let mut labels = Vec::with_capacity(table.column_count() - 1);
    let mut columns = Vec::with_capacity(table.column_count() - 1);
    let mut entries = Vec::with_capacity(table.column_count() - 1);

    for (label, prices) in table.columns() {
        if label == params.benchmark {
            continue;
        }

        let ratios: Vec<f64> = prices
            .iter()
            .zip(benchmark)
            .map(|(price, base)| price / base)
            .collect();

        entries.push(ChangeEntry {
            label: label.to_owned(),
            change: window_change(&ratios),
        });
        labels.push(label.to_owned());
        columns.push(ratios);
    }

    Ok(RelativeStrengthReport {
        benchmark: params.benchmark.clone(),
        ratios: RelativeStrengthTable {
            dates: table.dates().to_vec(),
            labels,
            columns,
        },
        changes: RelativeStrengthChange::ranked(entries),
    })
}

/// `last / first - 1`; NaN when either endpoint ratio is not finite.
fn window_change(ratios: &[f64]) -> f64 {
    match (ratios.first(), ratios.last()) {
        (Some(first), Some(last)) if first.is_finite() && last.is_finite() => last / first - 1.0,
        _ => f64::NAN,
    }
}

fn rank_descending(left: f64, right: f64) -> Ordering {
    match (left.is_nan(), right.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => right.partial_cmp(&left).unwrap_or(Ordering::Equal),
    }
}
