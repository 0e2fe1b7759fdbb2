//! Human-readable run summary.
//!
//! Status lines go to stderr only; stdout is reserved for JSONL records when
//! the report targets `-`. `--quiet` silences everything here.

use crate::report::{Action, Record};
use crate::run::RunState;
use colored::Colorize;

/// One short stderr line per finished record, for interactive runs.
pub fn print_item(record: &Record) {
    let action = record.action.as_str();
    let label = match record.action {
        Action::Error => action.red().bold(),
        Action::Blocked | Action::WouldBlock => action.red(),
        Action::Skipped | Action::Excluded | Action::WouldSkip => action.dimmed(),
        _ => action.green(),
    };
    if record.warnings.is_empty() {
        eprintln!("  {label:>22}  {}", record.input_path);
    } else {
        eprintln!(
            "  {label:>22}  {} ({} warning{})",
            record.input_path,
            record.warnings.len(),
            if record.warnings.len() == 1 { "" } else { "s" }
        );
    }
}

/// Final totals after the report is complete.
pub fn print_summary(state: &RunState, exit_code: i32) {
    let files = state.files_seen;
    let warnings = state.warning_count;
    let errors = state.error_count;

    let headline = format!(
        "{files} input{} processed, {warnings} warning{}, {errors} error{}",
        if files == 1 { "" } else { "s" },
        if warnings == 1 { "" } else { "s" },
        if errors == 1 { "" } else { "s" },
    );
    if errors > 0 || exit_code == 2 {
        eprintln!("{}", headline.red());
    } else if warnings > 0 {
        eprintln!("{}", headline.yellow());
    } else {
        eprintln!("{}", headline.green());
    }

    for (action, count) in &state.counts {
        eprintln!("  {action:>22}  {count}");
    }
}
