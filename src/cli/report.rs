use std::path::PathBuf;

use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::{open_store, FilterArgs};
use crate::error::Result;
use crate::fmt::{currency, hours, money, short_date};
use crate::pdf::export_report;
use crate::reports::{
    detail_rows, generate_report, get_detailed_entries, DetailRow, ReportFilters, ReportSummary,
};
use crate::settings::{load_settings, shellexpand_path};

fn right(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

/// Detail rows for the filters, newest first.
fn sorted_rows(account: Option<&str>, filters: &ReportFilters) -> Result<Vec<DetailRow>> {
    let store = open_store(account)?;
    let mut rows = detail_rows(&get_detailed_entries(&store, filters)?);
    rows.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(rows)
}

pub fn show(account: Option<&str>, args: &FilterArgs, json: bool) -> Result<()> {
    let filters = args.resolve();
    let store = open_store(account)?;
    let summary = generate_report(&store, &filters)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", format_summary(&summary, &filters));
    }
    Ok(())
}

pub fn entries(account: Option<&str>, args: &FilterArgs) -> Result<()> {
    let filters = args.resolve();
    let rows = sorted_rows(account, &filters)?;
    println!("{}", format_details(&rows, &filters));
    Ok(())
}

pub fn export(account: Option<&str>, args: &FilterArgs, output_dir: Option<String>) -> Result<()> {
    let filters = args.resolve();
    let store = open_store(account)?;
    let summary = generate_report(&store, &filters)?;
    let rows = detail_rows(&get_detailed_entries(&store, &filters)?);
    let dir = match output_dir {
        Some(d) => PathBuf::from(shellexpand_path(&d)),
        None => load_settings().exports_dir(),
    };
    let path = export_report(&summary, &filters, &rows, &dir)?;
    println!("Exported {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Pure formatting functions (report data -> String)
// ---------------------------------------------------------------------------

pub fn format_summary(summary: &ReportSummary, filters: &ReportFilters) -> String {
    let mut out = format!(
        "{}\n",
        format!("Time Report: {}", filters.period_label()).bold()
    );

    let mut totals = Table::new();
    totals.set_header(vec!["Metric", "Value"]);
    totals.add_row(vec![Cell::new("Total Hours".bold()), Cell::new(hours(summary.total_hours))]);
    totals.add_row(vec![Cell::new("Total Amount".bold()), Cell::new(money(summary.total_amount))]);
    totals.add_row(vec![
        Cell::new("Number of Entries".bold()),
        Cell::new(summary.entries_count),
    ]);
    out.push_str(&format!("Summary\n{totals}"));

    if !summary.client_reports.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Client", "Hours", "Amount", "Entries"]);
        for c in &summary.client_reports {
            table.add_row(vec![
                Cell::new(&c.client_name),
                right(hours(c.total_hours)),
                right(currency(c.total_amount, &c.currency)),
                right(c.entries_count.to_string()),
            ]);
        }
        out.push_str(&format!("\n\nClient Breakdown\n{table}"));
    }

    let active: Vec<_> = summary
        .monthly_reports
        .iter()
        .filter(|m| m.total_hours > 0.0)
        .collect();
    if !active.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Month", "Hours", "Amount", "Entries"]);
        for m in active {
            table.add_row(vec![
                Cell::new(&m.month_name),
                right(hours(m.total_hours)),
                right(money(m.total_amount)),
                right(m.entries_count.to_string()),
            ]);
        }
        out.push_str(&format!("\n\nMonthly Breakdown\n{table}"));
    }

    if summary.entries_count == 0 {
        out.push_str(&format!("\n\n{}", "No time entries for this period.".dimmed()));
    }
    out
}

pub fn format_details(rows: &[DetailRow], filters: &ReportFilters) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Date", "Client", "Description", "Hours", "Amount"]);
    let mut total_hours = 0.0;
    for r in rows {
        total_hours += r.hours;
        table.add_row(vec![
            Cell::new(short_date(r.date)),
            Cell::new(&r.client_name),
            Cell::new(textwrap::fill(&r.description, 40)),
            right(hours(r.hours)),
            right(currency(r.amount, &r.currency)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(""),
        Cell::new(format!("{} entries", rows.len())),
        right(hours(total_hours)),
        Cell::new(""),
    ]);
    format!("Detailed Time Entries: {}\n{table}", filters.period_label())
}
