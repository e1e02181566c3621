//! Property-based tests: the outcome of a load does not depend on how the file is chunked.

use proptest::prelude::*;

use fixed_width_loader::{LoadOutcome, LoadResult};

use crate::workspace::{Row, Workspace};

const FILE: &str = "testformat1_2015-06-28.txt";
const DATE: &str = "2015-06-28";

/// A line of the sample format, occasionally blank or with a rejected field
fn line_strategy() -> impl Strategy<Value = String> {
    let name = "[A-Za-z]{1,10}";
    let valid = prop_oneof![4 => Just("1"), 4 => Just("0"), 1 => Just("x")];
    let count = prop_oneof![
        4 => (-99i64..999).prop_map(|n| format!("{n:>3}")),
        1 => Just("   ".to_string()),
        1 => Just("1a2".to_string()),
    ];
    prop_oneof![
        12 => (name, valid, count).prop_map(|(n, v, c)| format!("{n:<10}{v}{c}")),
        1 => Just(String::new()),
    ]
}

fn run_load(content: &str, chunk_size: usize, skip_error_lines: bool) -> (LoadResult, Vec<Row>) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build runtime");
    runtime.block_on(async {
        let mut ws = Workspace::new();
        ws.write(FILE, content);
        let options = ws.options(chunk_size, skip_error_lines);
        let result = ws.load(FILE, options).await.expect("load failed");
        let rows = ws.rows(DATE);
        (result, rows)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn chunk_size_does_not_change_the_outcome(
        lines in prop::collection::vec(line_strategy(), 0..40),
        chunk_size in 2usize..50,
        skip_error_lines in any::<bool>(),
    ) {
        let content: String = lines.iter().map(|l| format!("{l}\n")).collect();

        let (single, single_rows) = run_load(&content, 1, skip_error_lines);
        let (chunked, chunked_rows) = run_load(&content, chunk_size, skip_error_lines);

        prop_assert_eq!(single.lines_processed, chunked.lines_processed);
        prop_assert_eq!(single.lines_saved, chunked.lines_saved);
        prop_assert_eq!(single.outcome, chunked.outcome);
        let single_errors: Vec<_> = single.line_errors().collect();
        let chunked_errors: Vec<_> = chunked.line_errors().collect();
        prop_assert_eq!(single_errors, chunked_errors);
        prop_assert_eq!(single_rows, chunked_rows);
    }

    #[test]
    fn every_line_is_saved_or_rejected(
        lines in prop::collection::vec(line_strategy(), 0..40),
        chunk_size in 1usize..10,
    ) {
        let content: String = lines.iter().map(|l| format!("{l}\n")).collect();
        let blank = lines.iter().filter(|l| l.is_empty()).count();

        let (result, rows) = run_load(&content, chunk_size, true);

        prop_assert_eq!(result.lines_processed, lines.len());
        prop_assert_eq!(result.outcome, LoadOutcome::Committed);
        prop_assert_eq!(result.lines_saved, rows.len());
        prop_assert_eq!(result.lines_saved + result.line_errors().count() + blank, lines.len());
    }
}
