use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, TallyError};
use crate::fmt::month_name;
use crate::models::{TimeEntry, DEFAULT_CURRENCY};
use crate::store::{collect_pages, RecordStore};

/// Rows requested per page while materialising an account's entries.
pub const PAGE_SIZE: u32 = 100;

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportFilters {
    /// Empty means every client.
    pub client_ids: Vec<i64>,
    pub year: i32,
    /// 1..=12; `None` reports the whole year.
    pub month: Option<u32>,
}

impl ReportFilters {
    pub fn for_year(year: i32) -> Self {
        Self {
            client_ids: Vec::new(),
            year,
            month: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=9999).contains(&self.year) {
            return Err(TallyError::InvalidFilters(format!(
                "year must be between 1 and 9999, got {}",
                self.year
            )));
        }
        if let Some(m) = self.month {
            if !(1..=12).contains(&m) {
                return Err(TallyError::InvalidFilters(format!(
                    "month must be between 1 and 12, got {m}"
                )));
            }
        }
        Ok(())
    }

    /// `[year-01-01, year+1-01-01)`
    fn year_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = NaiveDate::from_ymd_opt(self.year, 1, 1)?;
        let end = NaiveDate::from_ymd_opt(self.year + 1, 1, 1)?;
        Some((start, end))
    }

    /// Date-range, client and month predicates; all must pass.
    pub fn matches(&self, entry: &TimeEntry) -> bool {
        let in_range = self
            .year_range()
            .is_some_and(|(start, end)| entry.date >= start && entry.date < end);
        let in_clients = self.client_ids.is_empty() || self.client_ids.contains(&entry.client_id);
        let in_month = self.month.map_or(true, |m| entry.date.month() == m);
        in_range && in_clients && in_month
    }

    /// "2024" or "June 2024".
    pub fn period_label(&self) -> String {
        match self.month {
            Some(m) => format!("{} {}", month_name(m), self.year),
            None => self.year.to_string(),
        }
    }

    /// `time-report-2024.pdf` or `time-report-2024-06.pdf`.
    pub fn file_name(&self) -> String {
        match self.month {
            Some(m) => format!("time-report-{}-{m:02}.pdf", self.year),
            None => format!("time-report-{}.pdf", self.year),
        }
    }
}

// ---------------------------------------------------------------------------
// Summary types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyReport {
    pub month: u32,
    pub month_name: String,
    pub total_hours: f64,
    pub total_amount: f64,
    pub entries_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientReport {
    pub client_id: i64,
    pub client_name: String,
    pub currency: String,
    pub total_hours: f64,
    pub total_amount: f64,
    pub entries_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub total_hours: f64,
    pub total_amount: f64,
    pub entries_count: usize,
    /// Twelve months for yearly reports, empty when a month was requested.
    pub monthly_reports: Vec<MonthlyReport>,
    /// Sorted by amount, largest first.
    pub client_reports: Vec<ClientReport>,
}

/// One line of the detailed entries table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailRow {
    pub date: NaiveDate,
    pub client_name: String,
    pub description: String,
    pub hours: f64,
    pub amount: f64,
    pub currency: String,
}

// ---------------------------------------------------------------------------
// Retrieval
// ---------------------------------------------------------------------------

/// Page through every time entry the store exposes, strictly in order.
///
/// Whether another page exists is only known once the current one returns,
/// so requests are sequential. Any failure discards what was collected.
pub fn fetch_all_time_entries(store: &dyn RecordStore) -> Result<Vec<TimeEntry>> {
    fetch_all_with(store, PAGE_SIZE)
}

/// [`fetch_all_time_entries`] with an explicit page size.
pub fn fetch_all_with(store: &dyn RecordStore, page_size: u32) -> Result<Vec<TimeEntry>> {
    let mut requests = 0u32;
    let entries = collect_pages(page_size, |page, size| {
        requests = page;
        store.fetch_time_entries(page, size).map_err(|e| {
            warn!(page, error = %e, "time entry page fetch failed");
            TallyError::RetrievalFailed {
                page,
                reason: e.to_string(),
            }
        })
    })?;
    debug!(pages = requests, page_size, entries = entries.len(), "materialised time entries");
    Ok(entries)
}

/// Apply the report filters to an already-materialised entry list.
pub fn filter_entries(entries: Vec<TimeEntry>, filters: &ReportFilters) -> Vec<TimeEntry> {
    entries.into_iter().filter(|e| filters.matches(e)).collect()
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

fn monthly_breakdown(entries: &[TimeEntry]) -> Vec<MonthlyReport> {
    (1..=12u32)
        .map(|month| {
            let mut report = MonthlyReport {
                month,
                month_name: month_name(month).to_string(),
                total_hours: 0.0,
                total_amount: 0.0,
                entries_count: 0,
            };
            for e in entries.iter().filter(|e| e.date.month() == month) {
                report.total_hours += e.hours;
                report.total_amount += e.amount();
                report.entries_count += 1;
            }
            report
        })
        .collect()
}

fn client_breakdown(entries: &[TimeEntry]) -> Vec<ClientReport> {
    let mut reports: Vec<ClientReport> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();
    for e in entries {
        let Some(client) = &e.client else { continue };
        let slot = *index.entry(e.client_id).or_insert_with(|| {
            reports.push(ClientReport {
                client_id: e.client_id,
                client_name: client.name.clone(),
                currency: client.currency.clone(),
                total_hours: 0.0,
                total_amount: 0.0,
                entries_count: 0,
            });
            reports.len() - 1
        });
        let report = &mut reports[slot];
        report.total_hours += e.hours;
        report.total_amount += e.hours * client.hourly_rate;
        report.entries_count += 1;
    }
    // Stable: equal amounts keep first-seen order.
    reports.sort_by(|a, b| b.total_amount.total_cmp(&a.total_amount));
    reports
}

/// Roll filtered entries up into a summary. Entries without a joined client
/// count toward hours but not amount, and are left out of the client list.
pub fn summarize(entries: &[TimeEntry], filters: &ReportFilters) -> ReportSummary {
    let total_hours = entries.iter().map(|e| e.hours).sum();
    let total_amount = entries.iter().map(TimeEntry::amount).sum();
    let monthly_reports = if filters.month.is_none() {
        monthly_breakdown(entries)
    } else {
        Vec::new()
    };
    ReportSummary {
        total_hours,
        total_amount,
        entries_count: entries.len(),
        monthly_reports,
        client_reports: client_breakdown(entries),
    }
}

#[instrument(skip(store), fields(year = filters.year, month = ?filters.month))]
pub fn generate_report(store: &dyn RecordStore, filters: &ReportFilters) -> Result<ReportSummary> {
    filters.validate()?;
    let entries = filter_entries(fetch_all_time_entries(store)?, filters);
    let summary = summarize(&entries, filters);
    info!(
        entries = summary.entries_count,
        clients = summary.client_reports.len(),
        "generated report"
    );
    Ok(summary)
}

/// Filtered entries in store order; callers sort when they need to.
#[instrument(skip(store), fields(year = filters.year, month = ?filters.month))]
pub fn get_detailed_entries(
    store: &dyn RecordStore,
    filters: &ReportFilters,
) -> Result<Vec<TimeEntry>> {
    filters.validate()?;
    let entries = filter_entries(fetch_all_time_entries(store)?, filters);
    debug!(entries = entries.len(), "fetched detailed entries");
    Ok(entries)
}

/// Flatten entries into renderer rows with pre-computed amounts.
pub fn detail_rows(entries: &[TimeEntry]) -> Vec<DetailRow> {
    entries
        .iter()
        .map(|e| DetailRow {
            date: e.date,
            client_name: e.client.as_ref().map(|c| c.name.clone()).unwrap_or_default(),
            description: e.description.clone(),
            hours: e.hours,
            amount: e.amount(),
            currency: e
                .client
                .as_ref()
                .map(|c| c.currency.clone())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        })
        .collect()
}
