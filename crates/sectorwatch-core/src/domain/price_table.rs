use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::{Symbol, TradingDate, ValidationError};

/// Single daily close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClosePoint {
    pub date: TradingDate,
    pub close: f64,
}

/// Daily closing prices for one symbol, sorted by date with one close per date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloseSeries {
    pub symbol: Symbol,
    points: Vec<ClosePoint>,
}

impl CloseSeries {
    /// Sorts points by date. When a date repeats the later point wins, which
    /// matches how intraday snapshots of the current session are superseded.
    pub fn new(symbol: Symbol, points: Vec<ClosePoint>) -> Self {
        let mut by_date = BTreeMap::new();
        for point in points {
            by_date.insert(point.date, point.close);
        }
        let points = by_date
            .into_iter()
            .map(|(date, close)| ClosePoint { date, close })
            .collect();
        Self { symbol, points }
    }

    pub fn points(&self) -> &[ClosePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn close_on(&self, date: TradingDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |point| point.date)
            .ok()
            .map(|index| self.points[index].close)
    }
}

/// How rows are chosen when instruments trade on different dates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateAlignment {
    /// Keep only dates on which every instrument has a close.
    #[default]
    Intersection,
    /// Keep every date seen; missing closes become NaN.
    Union,
}

/// Date-indexed closing prices, one column per instrument label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceTable {
    dates: Vec<TradingDate>,
    labels: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl PriceTable {
    /// Build a table from labelled columns that share `dates`.
    pub fn new(
        dates: Vec<TradingDate>,
        columns: Vec<(String, Vec<f64>)>,
    ) -> Result<Self, ValidationError> {
        for (index, pair) in dates.windows(2).enumerate() {
            if pair[0] >= pair[1] {
                return Err(ValidationError::UnorderedDates {
                    index: index + 1,
                    date: pair[1].format_iso(),
                });
            }
        }

        let mut seen = HashSet::with_capacity(columns.len());
        let mut labels = Vec::with_capacity(columns.len());
        let mut values = Vec::with_capacity(columns.len());
        for (label, column) in columns {
            if label.trim().is_empty() {
                return Err(ValidationError::EmptyLabel);
            }
            if !seen.insert(label.clone()) {
                return Err(ValidationError::DuplicateLabel { label });
            }
            if column.len() != dates.len() {
                return Err(ValidationError::ColumnLengthMismatch {
                    label,
                    expected: dates.len(),
                    actual: column.len(),
                });
            }
            labels.push(label);
            values.push(column);
        }

        Ok(Self {
            dates,
            labels,
            columns: values,
        })
    }

    pub fn empty() -> Self {
        Self {
            dates: Vec::new(),
            labels: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Align labelled close series into one table, preserving the order of `series`.
    pub fn from_series(
        series: Vec<(String, CloseSeries)>,
        alignment: DateAlignment,
    ) -> Result<Self, ValidationError> {
        if series.is_empty() {
            return Ok(Self::empty());
        }

        let dates: Vec<TradingDate> = match alignment {
            DateAlignment::Union => series
                .iter()
                .flat_map(|(_, closes)| closes.points().iter().map(|point| point.date))
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
            DateAlignment::Intersection => {
                let mut shared: BTreeSet<TradingDate> = series[0]
                    .1
                    .points()
                    .iter()
                    .map(|point| point.date)
                    .collect();
                for (_, closes) in &series[1..] {
                    let dates: BTreeSet<TradingDate> =
                        closes.points().iter().map(|point| point.date).collect();
                    shared.retain(|date| dates.contains(date));
                }
                shared.into_iter().collect()
            }
        };

        let columns = series
            .into_iter()
            .map(|(label, closes)| {
                let column = dates
                    .iter()
                    .map(|date| closes.close_on(*date).unwrap_or(f64::NAN))
                    .collect();
                (label, column)
            })
            .collect();

        Self::new(dates, columns)
    }

    pub fn dates(&self) -> &[TradingDate] {
        &self.dates
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn column(&self, label: &str) -> Option<&[f64]> {
        self.column_index(label)
            .map(|index| self.columns[index].as_slice())
    }

    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|candidate| candidate == label)
    }

    pub fn has_column(&self, label: &str) -> bool {
        self.column_index(label).is_some()
    }

    /// Columns in table order as `(label, values)` pairs.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter().map(Vec::as_slice))
    }

    pub fn row_count(&self) -> usize {
        self.dates.len()
    }

    pub fn column_count(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() || self.labels.is_empty()
    }

    pub fn first_date(&self) -> Option<TradingDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<TradingDate> {
        self.dates.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(value: &str) -> TradingDate {
        TradingDate::parse(value).expect("valid date")
    }

    fn series(symbol: &str, points: &[(&str, f64)]) -> CloseSeries {
        CloseSeries::new(
            Symbol::parse(symbol).expect("valid symbol"),
            points
                .iter()
                .map(|(day, close)| ClosePoint {
                    date: date(day),
                    close: *close,
                })
                .collect(),
        )
    }

    #[test]
    fn rejects_unordered_dates() {
        let err = PriceTable::new(
            vec![date("2024-01-03"), date("2024-01-02")],
            vec![(String::from("A"), vec![1.0, 2.0])],
        )
        .expect_err("must fail");
        assert!(matches!(err, ValidationError::UnorderedDates { index: 1, .. }));
    }

    #[test]
    fn rejects_duplicate_dates() {
        let err = PriceTable::new(
            vec![date("2024-01-02"), date("2024-01-02")],
            vec![(String::from("A"), vec![1.0, 2.0])],
        )
        .expect_err("must fail");
        assert!(matches!(err, ValidationError::UnorderedDates { .. }));
    }

    #[test]
    fn rejects_ragged_columns() {
        let err = PriceTable::new(
            vec![date("2024-01-02"), date("2024-01-03")],
            vec![(String::from("A"), vec![1.0])],
        )
        .expect_err("must fail");
        assert!(matches!(
            err,
            ValidationError::ColumnLengthMismatch {
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn close_series_sorts_and_keeps_last_duplicate() {
        let closes = series(
            "^NSEI",
            &[("2024-01-03", 11.0), ("2024-01-02", 10.0), ("2024-01-03", 12.0)],
        );
        let values: Vec<f64> = closes.points().iter().map(|point| point.close).collect();
        assert_eq!(values, vec![10.0, 12.0]);
    }

    #[test]
    fn intersection_alignment_drops_partial_rows() {
        let table = PriceTable::from_series(
            vec![
                (
                    String::from("BENCH"),
                    series(
                        "^NSEI",
                        &[("2024-01-02", 100.0), ("2024-01-03", 101.0), ("2024-01-04", 102.0)],
                    ),
                ),
                (
                    String::from("IT"),
                    series("^CNXIT", &[("2024-01-02", 50.0), ("2024-01-04", 52.0)]),
                ),
            ],
            DateAlignment::Intersection,
        )
        .expect("valid table");

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column("IT"), Some(&[50.0, 52.0][..]));
        assert_eq!(table.column("BENCH"), Some(&[100.0, 102.0][..]));
    }

    #[test]
    fn union_alignment_fills_gaps_with_nan() {
        let table = PriceTable::from_series(
            vec![
                (
                    String::from("BENCH"),
                    series("^NSEI", &[("2024-01-02", 100.0), ("2024-01-03", 101.0)]),
                ),
                (String::from("IT"), series("^CNXIT", &[("2024-01-03", 51.0)])),
            ],
            DateAlignment::Union,
        )
        .expect("valid table");

        let it = table.column("IT").expect("IT column");
        assert_eq!(table.row_count(), 2);
        assert!(it[0].is_nan());
        assert_eq!(it[1], 51.0);
        assert_eq!(table.labels(), &["BENCH".to_owned(), "IT".to_owned()]);
    }
}
