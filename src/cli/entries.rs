use chrono::{Local, NaiveDate};
use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::open_store;
use crate::error::{Result, TallyError};
use crate::fmt::{currency, hours as fmt_hours, short_date};
use crate::models::{NewTimeEntry, Page, TimeEntry, TimeEntryUpdate, DEFAULT_CURRENCY};
use crate::store::RecordStore;

pub fn add(
    account: Option<&str>,
    client_id: i64,
    hours: f64,
    description: String,
    date: Option<NaiveDate>,
) -> Result<()> {
    let store = open_store(account)?;
    let entry = store.create_time_entry(NewTimeEntry {
        client_id,
        date: date.unwrap_or_else(|| Local::now().date_naive()),
        hours,
        description,
    })?;
    let client = entry.client.as_ref().map(|c| c.name.as_str()).unwrap_or("");
    println!(
        "Logged entry #{}: {}h for {} on {}",
        entry.id,
        fmt_hours(entry.hours),
        client,
        short_date(entry.date)
    );
    Ok(())
}

pub fn list(account: Option<&str>, page: u32, per_page: u32) -> Result<()> {
    let store = open_store(account)?;
    let result = store.fetch_time_entries(page, per_page)?;
    println!("{}", format_entries_page(&result));
    Ok(())
}

pub fn update(account: Option<&str>, id: i64, update: TimeEntryUpdate) -> Result<()> {
    if update.is_empty() {
        return Err(TallyError::Validation(
            "nothing to update; pass at least one field".to_string(),
        ));
    }
    let store = open_store(account)?;
    let entry = store.update_time_entry(id, update)?;
    println!("Updated entry #{} ({}h on {})", entry.id, fmt_hours(entry.hours), short_date(entry.date));
    Ok(())
}

pub fn delete(account: Option<&str>, id: i64) -> Result<()> {
    let store = open_store(account)?;
    store.delete_time_entry(id)?;
    println!("Deleted entry #{id}");
    Ok(())
}

pub fn format_entries_page(page: &Page<TimeEntry>) -> String {
    if page.total_count == 0 {
        return "No time entries yet. Log one with `tally entries add`.".to_string();
    }
    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Client", "Description", "Hours", "Amount"]);
    for e in &page.rows {
        let (client, code) = match &e.client {
            Some(c) => (c.name.as_str(), c.currency.as_str()),
            None => ("", DEFAULT_CURRENCY),
        };
        table.add_row(vec![
            Cell::new(e.id),
            Cell::new(short_date(e.date)),
            Cell::new(client),
            Cell::new(textwrap::fill(&e.description, 40)),
            Cell::new(fmt_hours(e.hours)).set_alignment(CellAlignment::Right),
            Cell::new(currency(e.amount(), code)).set_alignment(CellAlignment::Right),
        ]);
    }
    let mut out = format!("Time Entries\n{table}\n");
    out.push_str(&format!(
        "Page {} of {} ({} entries)",
        page.page,
        page.total_pages.max(1),
        page.total_count
    ));
    if page.has_more() {
        out.push_str(&format!("  next: --page {}", page.page + 1));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::tests::{client, entry};

    #[test]
    fn test_format_entries_page_footer() {
        let c = client(1, "TechCorp", 85.0);
        let rows = vec![entry(7, "2024-01-15", 8.0, Some(c), 1)];
        let page = Page::new(rows, 37, 2, 10);
        let out = format_entries_page(&page);
        assert!(out.contains("Jan 15, 2024"));
        assert!(out.contains("$680.00"));
        assert!(out.contains("Page 2 of 4 (37 entries)"));
        assert!(out.contains("next: --page 3"));
    }

    #[test]
    fn test_format_last_page_has_no_next_hint() {
        let page = Page::new(vec![entry(1, "2024-01-15", 1.0, None, 9)], 1, 1, 10);
        let out = format_entries_page(&page);
        assert!(out.contains("Page 1 of 1 (1 entries)"));
        assert!(!out.contains("next:"));
        assert!(out.contains("$0.00"));
    }

    #[test]
    fn test_format_empty_page() {
        let page: Page<TimeEntry> = Page::new(vec![], 0, 1, 10);
        assert!(format_entries_page(&page).contains("No time entries yet"));
    }
}
