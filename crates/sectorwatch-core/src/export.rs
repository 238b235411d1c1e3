//! CSV exports of relative-strength results.
//!
//! The change summary is written as `instrument,rs_change` with one row per
//! instrument in ranking order. Values are plain decimal fractions using the
//! shortest round-trip rendering (`0.1`, not `10%`); NaN and infinities are
//! written as `NaN`, `inf` and `-inf`.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::{RelativeStrengthChange, RelativeStrengthTable};

/// File name offered for the change summary download.
pub const DEFAULT_SUMMARY_FILE: &str = "relative_strength_summary.csv";

const SUMMARY_HEADER: [&str; 2] = ["instrument", "rs_change"];

/// Errors raised while writing exports.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to create export file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush csv output: {0}")]
    Flush(#[source] std::io::Error),
}

/// Write the ranked change mapping as `instrument,rs_change`.
pub fn write_change_csv<W: Write>(
    change: &RelativeStrengthChange,
    writer: W,
) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(SUMMARY_HEADER)?;
    for entry in change.iter() {
        wtr.write_record([entry.label.as_str(), entry.change.to_string().as_str()])?;
    }
    wtr.flush().map_err(ExportError::Flush)
}

/// Write the ratio table as `date,<label>...`, one row per trading date.
pub fn write_trend_csv<W: Write>(
    ratios: &RelativeStrengthTable,
    writer: W,
) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = Vec::with_capacity(ratios.column_count() + 1);
    header.push("date");
    header.extend(ratios.labels().iter().map(String::as_str));
    wtr.write_record(&header)?;

    for (index, date) in ratios.dates().iter().enumerate() {
        let mut record = Vec::with_capacity(ratios.column_count() + 1);
        record.push(date.format_iso());
        if let Some(row) = ratios.row(index) {
            record.extend(row.iter().map(f64::to_string));
        }
        wtr.write_record(&record)?;
    }
    wtr.flush().map_err(ExportError::Flush)
}

pub fn export_change_csv(
    change: &RelativeStrengthChange,
    path: impl AsRef<Path>,
) -> Result<(), ExportError> {
    let file = create(path.as_ref())?;
    write_change_csv(change, file)?;
    tracing::info!(path = %path.as_ref().display(), rows = change.len(), "wrote change summary");
    Ok(())
}

pub fn export_trend_csv(
    ratios: &RelativeStrengthTable,
    path: impl AsRef<Path>,
) -> Result<(), ExportError> {
    let file = create(path.as_ref())?;
    write_trend_csv(ratios, file)?;
    tracing::info!(path = %path.as_ref().display(), rows = ratios.row_count(), "wrote ratio trend");
    Ok(())
}

fn create(path: &Path) -> Result<File, ExportError> {
    File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compute_relative_strength, AnalysisParams, PriceTable, TradingDate};

    fn report() -> crate::RelativeStrengthReport {
        let table = PriceTable::new(
            vec![
                TradingDate::parse("2024-01-02").expect("date"),
                TradingDate::parse("2024-01-03").expect("date"),
            ],
            vec![
                ("BENCH".to_owned(), vec![100.0, 100.0]),
                ("UP".to_owned(), vec![50.0, 75.0]),
                ("DOWN".to_owned(), vec![40.0, 20.0]),
                ("ZERO".to_owned(), vec![0.0, 10.0]),
            ],
        )
        .expect("table");
        compute_relative_strength(&table, &AnalysisParams::new("BENCH")).expect("report")
    }

    #[test]
    fn change_csv_has_header_and_ranked_rows() {
        let mut out = Vec::new();
        write_change_csv(&report().changes, &mut out).expect("write");

        let text = String::from_utf8(out).expect("utf8");
        // ZERO starts at a zero close, so its change is infinite and ranks first.
        assert_eq!(text, "instrument,rs_change\nZERO,inf\nUP,0.5\nDOWN,-0.5\n");
    }

    #[test]
    fn trend_csv_has_one_column_per_ratio() {
        let mut out = Vec::new();
        write_trend_csv(&report().ratios, &mut out).expect("write");

        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "date,UP,DOWN,ZERO");
        assert_eq!(lines[1], "2024-01-02,0.5,0.4,0");
        assert_eq!(lines[2], "2024-01-03,0.75,0.2,0.1");
    }

    #[test]
    fn export_reports_unwritable_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing").join(DEFAULT_SUMMARY_FILE);
        let err = export_change_csv(&report().changes, &path).expect_err("must fail");
        assert!(matches!(err, ExportError::Io { .. }));
    }
}
