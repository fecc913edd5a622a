use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use dq_cli::runner::{CheckOutcome, Outcome, RunResult};
use dq_validate::{FailureReport, MAX_SAMPLE_ROWS};

use crate::types::InspectResult;

pub fn print_run_summary(result: &RunResult) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Suite"),
        header_cell("Check"),
        header_cell("Tags"),
        header_cell("Status"),
        header_cell("Rows"),
        header_cell("Details"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Center);
    align_column(&mut table, 4, CellAlignment::Right);

    for suite in &result.suites {
        for check in &suite.checks {
            table.add_row(vec![
                Cell::new(&suite.suite)
                    .fg(Color::Blue)
                    .add_attribute(Attribute::Bold),
                Cell::new(&check.name),
                tags_cell(&check.tags),
                status_cell(&check.outcome),
                rows_cell(&check.outcome),
                details_cell(&check.outcome),
            ]);
        }
    }

    let (passed, failed, errored) = result.counts();
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(format!("{} checks", passed + failed + errored)).add_attribute(Attribute::Bold),
        dim_cell("-"),
        Cell::new(format!("{passed} / {failed} / {errored}")).add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("passed / failed / errors"),
    ]);
    println!("{table}");

    for check in result.outcomes() {
        if let Outcome::Failed(report) = &check.outcome {
            print_failure(check, report);
        }
    }
}

fn print_failure(check: &CheckOutcome, report: &FailureReport) {
    println!();
    println!("{}: {}", check.name, report.summary());
    match report {
        FailureReport::SchemaMismatch {
            missing,
            unexpected,
        } => {
            let mut table = Table::new();
            table.set_header(vec![header_cell("Missing"), header_cell("Unexpected")]);
            apply_table_style(&mut table);
            let rows = missing.len().max(unexpected.len());
            for idx in 0..rows {
                table.add_row(vec![
                    optional_cell(missing.get(idx)),
                    optional_cell(unexpected.get(idx)),
                ]);
            }
            println!("{table}");
        }
        _ => {
            let Some(evidence) = report.evidence() else {
                return;
            };
            let mut table = Table::new();
            table.set_header(evidence.headers.iter().map(|h| header_cell(h)));
            apply_table_style(&mut table);
            for row in evidence.rows.iter().take(MAX_SAMPLE_ROWS) {
                table.add_row(row.iter().map(Cell::new));
            }
            println!("{table}");
            let hidden = evidence.rows.len().saturating_sub(MAX_SAMPLE_ROWS);
            if hidden > 0 {
                println!("... {hidden} more row(s); use --report-format json for all rows");
            }
        }
    }
}

pub fn print_run_json(result: &RunResult) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}

pub fn print_inspect(result: &InspectResult) {
    println!("Dataset: {}", result.path.display());
    println!("Rows: {}", result.rows);
    println!("Columns: {}", result.columns.len());
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Type"),
        header_cell("Nulls"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for column in &result.columns {
        let nulls = if column.nulls > 0 {
            Cell::new(column.nulls).fg(Color::Yellow)
        } else {
            dim_cell(column.nulls)
        };
        table.add_row(vec![Cell::new(&column.name), Cell::new(&column.dtype), nulls]);
    }
    println!("{table}");
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(160);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn status_cell(outcome: &Outcome) -> Cell {
    let cell = Cell::new(outcome.label()).add_attribute(Attribute::Bold);
    match outcome {
        Outcome::Passed(_) => cell.fg(Color::Green),
        Outcome::Failed(_) => cell.fg(Color::Red),
        Outcome::Error { .. } => cell.fg(Color::Magenta),
    }
}

fn rows_cell(outcome: &Outcome) -> Cell {
    match outcome {
        Outcome::Passed(pass) => Cell::new(pass.rows_examined),
        _ => dim_cell("-"),
    }
}

fn details_cell(outcome: &Outcome) -> Cell {
    match outcome {
        Outcome::Passed(_) => dim_cell("-"),
        Outcome::Failed(report) => Cell::new(report.summary()),
        Outcome::Error { message } => Cell::new(message).fg(Color::Magenta),
    }
}

fn tags_cell(tags: &[String]) -> Cell {
    if tags.is_empty() {
        dim_cell("-")
    } else {
        Cell::new(tags.join(", "))
    }
}

fn optional_cell(value: Option<&String>) -> Cell {
    match value {
        Some(value) => Cell::new(value),
        None => dim_cell("-"),
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
