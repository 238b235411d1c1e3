use std::io::{self, Write};

use sectorwatch_core::{write_change_csv, ExportError};

use crate::cli::OutputFormat;
use crate::commands::{AnalysisResponse, CommandResult, InstrumentsResponse};
use crate::error::CliError;
use crate::metadata::Metadata;

pub fn render(result: &CommandResult, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    render_to(&mut out, result, format, pretty)?;
    out.flush()?;
    Ok(())
}

fn render_to<W: Write>(
    out: &mut W,
    result: &CommandResult,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    match (format, result) {
        (OutputFormat::Json, CommandResult::Analysis(response)) => {
            write_json(out, response.as_ref(), pretty)
        }
        (OutputFormat::Json, CommandResult::Instruments(response)) => {
            write_json(out, response, pretty)
        }
        (OutputFormat::Csv, CommandResult::Analysis(response)) => {
            write_change_csv(&response.report.changes, out)?;
            Ok(())
        }
        (OutputFormat::Csv, CommandResult::Instruments(response)) => {
            let mut wtr = csv::Writer::from_writer(out);
            wtr.write_record(["label", "symbol", "benchmark"])
                .map_err(ExportError::from)?;
            for instrument in &response.instruments {
                let is_benchmark = instrument.label == response.benchmark;
                wtr.write_record([
                    instrument.label.as_str(),
                    instrument.symbol.as_str(),
                    if is_benchmark { "true" } else { "false" },
                ])
                .map_err(ExportError::from)?;
            }
            wtr.flush()?;
            Ok(())
        }
        (OutputFormat::Table, CommandResult::Analysis(response)) => {
            render_analysis_table(out, response)
        }
        (OutputFormat::Table, CommandResult::Instruments(response)) => {
            render_instruments_table(out, response)
        }
    }
}

fn write_json<W: Write, T: serde::Serialize>(
    out: &mut W,
    value: &T,
    pretty: bool,
) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, value)?;
    } else {
        serde_json::to_writer(&mut *out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

fn render_meta<W: Write>(out: &mut W, meta: &Metadata) -> Result<(), CliError> {
    writeln!(out, "request_id  : {}", meta.request_id)?;
    writeln!(out, "generated_at: {}", meta.generated_at)?;
    writeln!(out, "source      : {}", meta.source)?;
    if let Some(window) = &meta.window {
        writeln!(out, "window      : {} .. {}", window.start, window.end)?;
    }
    writeln!(out, "latency_ms  : {}", meta.latency_ms)?;
    writeln!(out, "cache_hit   : {}", meta.cache_hit)?;

    if !meta.warnings.is_empty() {
        writeln!(out, "warnings:")?;
        for warning in &meta.warnings {
            writeln!(out, "  - {warning}")?;
        }
    }
    Ok(())
}

fn render_analysis_table<W: Write>(
    out: &mut W,
    response: &AnalysisResponse,
) -> Result<(), CliError> {
    let report = &response.report;
    render_meta(out, &response.meta)?;

    writeln!(out)?;
    writeln!(out, "Relative strength vs {}", report.benchmark)?;
    if let (Some(first), Some(last)) = (report.first_date(), report.last_date()) {
        writeln!(out, "({first} to {last}, {} sessions)", report.ratios.row_count())?;
    }

    let width = report
        .changes
        .iter()
        .map(|entry| entry.label.chars().count())
        .max()
        .unwrap_or(0)
        .max("instrument".len());
    writeln!(out, "  {:>4}  {:<width$}  {:>10}", "rank", "instrument", "rs_change")?;
    for (index, entry) in report.changes.iter().enumerate() {
        writeln!(
            out,
            "  {:>4}  {:<width$}  {:>10}",
            index + 1,
            entry.label,
            format_percent(entry.change)
        )?;
    }

    writeln!(out)?;
    if response.outperformers.is_empty() {
        writeln!(
            out,
            "No sectors are currently outperforming {} in this period.",
            report.benchmark
        )?;
    } else {
        writeln!(
            out,
            "Outperforming {}: {}",
            report.benchmark,
            response.outperformers.join(", ")
        )?;
    }

    if !response.meta.exports.is_empty() {
        writeln!(out, "exports:")?;
        for path in &response.meta.exports {
            writeln!(out, "  - {path}")?;
        }
    }
    Ok(())
}

fn render_instruments_table<W: Write>(
    out: &mut W,
    response: &InstrumentsResponse,
) -> Result<(), CliError> {
    writeln!(out, "benchmark   : {}", response.benchmark)?;
    writeln!(out, "lookback    : {} days", response.lookback_days)?;
    writeln!(
        out,
        "presets     : {}",
        response
            .lookback_presets
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    )?;
    writeln!(out, "instruments:")?;
    for instrument in &response.instruments {
        let marker = if instrument.label == response.benchmark {
            " (benchmark)"
        } else {
            ""
        };
        writeln!(out, "  - {:<10} {}{marker}", instrument.label, instrument.symbol)?;
    }
    Ok(())
}

/// `0.0909` as `9.09%`; NaN as `n/a`.
fn format_percent(value: f64) -> String {
    if value.is_nan() {
        String::from("n/a")
    } else if value.is_infinite() {
        String::from(if value > 0.0 { "+inf" } else { "-inf" })
    } else {
        format!("{:.2}%", value * 100.0)
    }
}
