//! Property tests for the relative-strength calculator over generated tables.

use proptest::prelude::*;
use sectorwatch_core::{compute_relative_strength, AnalysisParams, PriceTable, TradingDate};

const BENCHMARK: &str = "BENCH";

fn price() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => 0.01_f64..10_000.0,
        1 => Just(0.0),
        1 => Just(f64::NAN),
    ]
}

/// Benchmark in a random position among 1..=5 other columns, 1..30 rows.
fn price_table() -> impl Strategy<Value = PriceTable> {
    (1_usize..=5, 1_usize..30)
        .prop_flat_map(|(others, rows)| {
            (
                prop::collection::vec(prop::collection::vec(price(), rows), others + 1),
                0..=others,
            )
        })
        .prop_map(|(columns, benchmark_at)| {
            let rows = columns[0].len();
            let start = TradingDate::parse("2024-01-01").expect("valid date");
            let dates = (0..rows as u32)
                .map(|offset| start.saturating_add_days(offset))
                .collect();
            let labelled = columns
                .into_iter()
                .enumerate()
                .map(|(index, values)| {
                    let label = if index == benchmark_at {
                        BENCHMARK.to_owned()
                    } else {
                        format!("S{index}")
                    };
                    (label, values)
                })
                .collect();
            PriceTable::new(dates, labelled).expect("generated table is valid")
        })
}

proptest! {
    #[test]
    fn ratio_table_has_one_column_per_non_benchmark_instrument(table in price_table()) {
        let report = compute_relative_strength(&table, &AnalysisParams::new(BENCHMARK))
            .expect("generated tables are analysable");

        prop_assert_eq!(report.ratios.column_count(), table.column_count() - 1);
        prop_assert!(report.ratios.column(BENCHMARK).is_none());
        prop_assert_eq!(report.ratios.row_count(), table.row_count());
        prop_assert_eq!(report.changes.len(), table.column_count() - 1);
    }

    #[test]
    fn changes_are_sorted_descending_with_nan_last(table in price_table()) {
        let report = compute_relative_strength(&table, &AnalysisParams::new(BENCHMARK))
            .expect("generated tables are analysable");

        let values: Vec<f64> = report.changes.iter().map(|entry| entry.change).collect();
        let first_nan = values.iter().position(|value| value.is_nan()).unwrap_or(values.len());
        prop_assert!(values[first_nan..].iter().all(|value| value.is_nan()));
        for pair in values[..first_nan].windows(2) {
            prop_assert!(pair[0] >= pair[1], "{} ranked before {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn outperformers_are_exactly_the_positive_changes(table in price_table()) {
        let report = compute_relative_strength(&table, &AnalysisParams::new(BENCHMARK))
            .expect("generated tables are analysable");

        let expected: Vec<&str> = report
            .changes
            .iter()
            .filter(|entry| entry.change > 0.0)
            .map(|entry| entry.label.as_str())
            .collect();
        let actual: Vec<&str> = report.outperformers().labels().collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn analysis_is_bit_identical_across_runs(table in price_table()) {
        let params = AnalysisParams::new(BENCHMARK);
        let first = compute_relative_strength(&table, &params).expect("first run");
        let second = compute_relative_strength(&table, &params).expect("second run");

        let bits = |report: &sectorwatch_core::RelativeStrengthReport| -> Vec<(String, u64)> {
            report
                .changes
                .iter()
                .map(|entry| (entry.label.clone(), entry.change.to_bits()))
                .collect()
        };
        prop_assert_eq!(bits(&first), bits(&second));

        for ((_, left), (_, right)) in first.ratios.columns().zip(second.ratios.columns()) {
            let left: Vec<u64> = left.iter().map(|value| value.to_bits()).collect();
            let right: Vec<u64> = right.iter().map(|value| value.to_bits()).collect();
            prop_assert_eq!(left, right);
        }
    }
}
