//! Human-facing run summaries.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use rota_validate::format_report;

use crate::commands::Suggestion;
use rota_cli::pipeline::RunOutcome;

pub fn print_outcome(outcome: &RunOutcome, max_issues: usize) {
    println!("Input: {}", outcome.input.display());
    if outcome.outputs_written {
        println!("Output: {}", outcome.output_dir.display());
    }
    println!(
        "Change: {} ({} rows, delta {:+})",
        outcome.change.reason.as_str(),
        outcome.row_count,
        outcome.change.row_delta
    );
    if outcome.skipped_unchanged {
        println!("Content unchanged since the last successful run; nothing written.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![header_cell("Metric"), header_cell("Count")]);
    if let Some(column) = table.column_mut(1) {
        column.set_cell_alignment(CellAlignment::Right);
    }
    table.add_row(vec![Cell::new("Rows"), Cell::new(outcome.row_count)]);
    if let Some(report) = &outcome.report {
        table.add_row(vec![Cell::new("Rows OK"), Cell::new(report.success_rows)]);
        table.add_row(vec![
            Cell::new("Errors"),
            count_cell(report.error_count(), Color::Red),
        ]);
        table.add_row(vec![
            Cell::new("Warnings"),
            count_cell(report.warning_count(), Color::Yellow),
        ]);
    }
    table.add_row(vec![
        Cell::new("Row annotations"),
        Cell::new(outcome.annotation_count),
    ]);
    table.add_row(vec![
        Cell::new("Unmapped columns"),
        Cell::new(outcome.unmapped_columns.len()),
    ]);
    table.add_row(vec![
        Cell::new("New people"),
        Cell::new(outcome.new_people.len()),
    ]);
    if let Some(sync) = &outcome.alias_sync {
        table.add_row(vec![
            Cell::new("Aliases updated"),
            Cell::new(sync.updated),
        ]);
        table.add_row(vec![
            Cell::new("Aliases appended"),
            Cell::new(sync.appended),
        ]);
    }
    println!("{table}");

    if !outcome.unmapped_columns.is_empty() {
        println!("Unmapped columns: {}", outcome.unmapped_columns.join(", "));
    }
    if !outcome.new_columns.is_empty() {
        println!("New columns detected: {}", outcome.new_columns.join(", "));
    }
    if !outcome.new_people.is_empty() {
        println!("New people: {}", outcome.new_people.join(", "));
    }
    if let Some(report) = &outcome.report {
        print!("{}", format_report(report, max_issues));
    }
}

pub fn print_suggestions(suggestions: &[Suggestion]) {
    if suggestions.is_empty() {
        println!("All source columns are mapped.");
        return;
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        header_cell("Source column"),
        header_cell("Suggested field"),
    ]);
    for suggestion in suggestions {
        table.add_row(vec![
            Cell::new(&suggestion.label),
            Cell::new(&suggestion.suggested),
        ]);
    }
    println!("{table}");
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count == 0 {
        Cell::new(count)
    } else {
        Cell::new(count).fg(color)
    }
}
