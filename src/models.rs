use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{Result, TallyError};

pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Client {
    pub id: i64,
    pub owner_id: String,
    pub name: String,
    pub hourly_rate: f64,
    pub currency: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeEntry {
    pub id: i64,
    pub owner_id: String,
    pub client_id: i64,
    pub date: NaiveDate,
    pub hours: f64,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
    /// Joined client snapshot; `None` when the join produced no row.
    pub client: Option<Client>,
}

impl TimeEntry {
    /// Billable amount at the joined client's rate, zero without a client.
    pub fn amount(&self) -> f64 {
        match &self.client {
            Some(c) => self.hours * c.hourly_rate,
            None => 0.0,
        }
    }
}

/// One page of rows as returned by a `RecordStore`.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(rows: Vec<T>, total_count: u64, page: u32, page_size: u32) -> Self {
        let total_pages = total_count.div_ceil(u64::from(page_size)) as u32;
        Self {
            rows,
            total_count,
            page,
            page_size,
            total_pages,
        }
    }

    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewClient {
    pub name: String,
    pub hourly_rate: f64,
    pub currency: String,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl NewClient {
    /// Checks the input and normalises the currency code in place.
    pub fn validate(&mut self) -> Result<()> {
        self.name = validate_name(&self.name)?;
        validate_rate(self.hourly_rate)?;
        self.currency = normalize_currency(&self.currency)?;
        Ok(())
    }
}

/// Sparse update: `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ClientUpdate {
    pub name: Option<String>,
    pub hourly_rate: Option<f64>,
    pub currency: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

impl ClientUpdate {
    pub fn validate(&mut self) -> Result<()> {
        if let Some(name) = &self.name {
            self.name = Some(validate_name(name)?);
        }
        if let Some(rate) = self.hourly_rate {
            validate_rate(rate)?;
        }
        if let Some(code) = &self.currency {
            self.currency = Some(normalize_currency(code)?);
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.hourly_rate.is_none()
            && self.currency.is_none()
            && self.email.is_none()
            && self.address.is_none()
            && self.is_active.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct NewTimeEntry {
    pub client_id: i64,
    pub date: NaiveDate,
    pub hours: f64,
    pub description: String,
}

impl NewTimeEntry {
    pub fn validate(&mut self) -> Result<()> {
        validate_hours(self.hours)?;
        self.description = validate_description(&self.description)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct TimeEntryUpdate {
    pub client_id: Option<i64>,
    pub date: Option<NaiveDate>,
    pub hours: Option<f64>,
    pub description: Option<String>,
}

impl TimeEntryUpdate {
    pub fn validate(&mut self) -> Result<()> {
        if let Some(hours) = self.hours {
            validate_hours(hours)?;
        }
        if let Some(desc) = &self.description {
            self.description = Some(validate_description(desc)?);
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.client_id.is_none()
            && self.date.is_none()
            && self.hours.is_none()
            && self.description.is_none()
    }
}

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(TallyError::Validation("client name is required".into()));
    }
    Ok(trimmed.to_string())
}

fn validate_rate(rate: f64) -> Result<()> {
    if !rate.is_finite() || rate < 0.0 {
        return Err(TallyError::Validation(format!(
            "hourly rate must be zero or more, got {rate}"
        )));
    }
    Ok(())
}

fn validate_hours(hours: f64) -> Result<()> {
    if !hours.is_finite() || hours <= 0.0 {
        return Err(TallyError::Validation(format!(
            "hours must be greater than zero, got {hours}"
        )));
    }
    Ok(())
}

fn validate_description(desc: &str) -> Result<String> {
    let trimmed = desc.trim();
    if trimmed.is_empty() {
        return Err(TallyError::Validation("description is required".into()));
    }
    Ok(trimmed.to_string())
}

/// Three ASCII letters, upper-cased: "usd" -> "USD".
pub fn normalize_currency(code: &str) -> Result<String> {
    let code = code.trim();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(TallyError::Validation(format!(
            "currency must be a three-letter code, got '{code}'"
        )));
    }
    Ok(code.to_ascii_uppercase())
}
