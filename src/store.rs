use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::debug;

use crate::error::{Result, TallyError};
use crate::models::{
    Client, ClientUpdate, NewClient, NewTimeEntry, Page, TimeEntry, TimeEntryUpdate,
};

const DATE_FMT: &str = "%Y-%m-%d";
const NOW: &str = "strftime('%Y-%m-%dT%H:%M:%f', 'now')";

/// Paginated read access to one account's records.
///
/// Pages are 1-based. Implementations must reject `page == 0` and
/// `page_size == 0` with [`TallyError::InvalidPage`].
pub trait RecordStore {
    /// Time entries joined with their client, newest first.
    fn fetch_time_entries(&self, page: u32, page_size: u32) -> Result<Page<TimeEntry>>;

    /// Clients ordered by name, inactive ones included.
    fn fetch_clients(&self, page: u32, page_size: u32) -> Result<Page<Client>>;
}

pub(crate) fn check_page(page: u32, page_size: u32) -> Result<()> {
    if page == 0 || page_size == 0 {
        return Err(TallyError::InvalidPage { page, page_size });
    }
    Ok(())
}

/// Request pages 1, 2, ... in order until the last one reports no more,
/// concatenating rows. The first error aborts and nothing is returned.
pub fn collect_pages<T>(
    page_size: u32,
    mut fetch: impl FnMut(u32, u32) -> Result<Page<T>>,
) -> Result<Vec<T>> {
    let mut rows = Vec::new();
    let mut page = 1u32;
    loop {
        let result = fetch(page, page_size)?;
        let has_more = result.has_more();
        rows.extend(result.rows);
        if !has_more {
            return Ok(rows);
        }
        page += 1;
    }
}

/// Every client the store exposes, in name order.
pub fn fetch_all_clients(store: &dyn RecordStore, page_size: u32) -> Result<Vec<Client>> {
    collect_pages(page_size, |page, size| store.fetch_clients(page, size))
}

fn offset(page: u32, page_size: u32) -> i64 {
    i64::from(page - 1) * i64::from(page_size)
}

/// SQLite-backed store scoped to a single owner.
pub struct SqliteStore {
    conn: Connection,
    owner_id: String,
}

const CLIENT_COLS: &str =
    "c.id, c.owner_id, c.name, c.hourly_rate, c.currency, c.email, c.address, c.is_active, c.created_at, c.updated_at";

const ENTRY_SELECT: &str = "SELECT t.id, t.owner_id, t.client_id, t.date, t.hours, t.description, \
     t.created_at, t.updated_at, \
     c.id, c.owner_id, c.name, c.hourly_rate, c.currency, c.email, c.address, c.is_active, c.created_at, c.updated_at \
     FROM time_entries t \
     LEFT JOIN clients c ON c.id = t.client_id AND c.owner_id = t.owner_id";

fn client_from_row(row: &Row, at: usize) -> rusqlite::Result<Client> {
    Ok(Client {
        id: row.get(at)?,
        owner_id: row.get(at + 1)?,
        name: row.get(at + 2)?,
        hourly_rate: row.get(at + 3)?,
        currency: row.get(at + 4)?,
        email: row.get(at + 5)?,
        address: row.get(at + 6)?,
        is_active: row.get(at + 7)?,
        created_at: row.get(at + 8)?,
        updated_at: row.get(at + 9)?,
    })
}

fn entry_from_row(row: &Row) -> rusqlite::Result<TimeEntry> {
    let raw_date: String = row.get(3)?;
    let date = NaiveDate::parse_from_str(&raw_date, DATE_FMT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
    let joined: Option<i64> = row.get(8)?;
    let client = match joined {
        Some(_) => Some(client_from_row(row, 8)?),
        None => None,
    };
    Ok(TimeEntry {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        client_id: row.get(2)?,
        date,
        hours: row.get(4)?,
        description: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
        client,
    })
}

fn empty_to_null(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let v = v.trim().to_string();
        if v.is_empty() {
            None
        } else {
            Some(v)
        }
    })
}

impl SqliteStore {
    pub fn new(conn: Connection, owner_id: impl Into<String>) -> Self {
        Self {
            conn,
            owner_id: owner_id.into(),
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // -----------------------------------------------------------------------
    // Clients
    // -----------------------------------------------------------------------

    pub fn create_client(&self, mut input: NewClient) -> Result<Client> {
        input.validate()?;
        self.conn.execute(
            "INSERT INTO clients (owner_id, name, hourly_rate, currency, email, address) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                self.owner_id,
                input.name,
                input.hourly_rate,
                input.currency,
                empty_to_null(input.email),
                empty_to_null(input.address),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(client_id = id, owner = %self.owner_id, "created client");
        self.get_client(id)
    }

    pub fn get_client(&self, id: i64) -> Result<Client> {
        let sql = format!("SELECT {CLIENT_COLS} FROM clients c WHERE c.id = ?1 AND c.owner_id = ?2");
        self.conn
            .query_row(&sql, rusqlite::params![id, self.owner_id], |row| {
                client_from_row(row, 0)
            })
            .optional()?
            .ok_or(TallyError::NotFound { kind: "Client", id })
    }

    pub fn list_clients(&self, include_inactive: bool) -> Result<Vec<Client>> {
        let filter = if include_inactive { "" } else { " AND c.is_active = 1" };
        let sql = format!(
            "SELECT {CLIENT_COLS} FROM clients c WHERE c.owner_id = ?1{filter} ORDER BY c.name, c.id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([&self.owner_id], |row| client_from_row(row, 0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn update_client(&self, id: i64, mut update: ClientUpdate) -> Result<Client> {
        update.validate()?;
        let mut client = self.get_client(id)?;
        if let Some(name) = update.name {
            client.name = name;
        }
        if let Some(rate) = update.hourly_rate {
            client.hourly_rate = rate;
        }
        if let Some(currency) = update.currency {
            client.currency = currency;
        }
        if update.email.is_some() {
            client.email = empty_to_null(update.email);
        }
        if update.address.is_some() {
            client.address = empty_to_null(update.address);
        }
        if let Some(active) = update.is_active {
            client.is_active = active;
        }
        self.conn.execute(
            &format!(
                "UPDATE clients SET name = ?1, hourly_rate = ?2, currency = ?3, email = ?4, \
                 address = ?5, is_active = ?6, updated_at = {NOW} WHERE id = ?7 AND owner_id = ?8"
            ),
            rusqlite::params![
                client.name,
                client.hourly_rate,
                client.currency,
                client.email,
                client.address,
                client.is_active,
                id,
                self.owner_id,
            ],
        )?;
        debug!(client_id = id, "updated client");
        self.get_client(id)
    }

    /// Soft delete: the row stays so historical entries keep their rate.
    pub fn deactivate_client(&self, id: i64) -> Result<()> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE clients SET is_active = 0, updated_at = {NOW} WHERE id = ?1 AND owner_id = ?2"
            ),
            rusqlite::params![id, self.owner_id],
        )?;
        if changed == 0 {
            return Err(TallyError::NotFound { kind: "Client", id });
        }
        debug!(client_id = id, "deactivated client");
        Ok(())
    }

    fn ensure_client(&self, client_id: i64) -> Result<()> {
        match self.get_client(client_id) {
            Ok(_) => Ok(()),
            Err(TallyError::NotFound { .. }) => Err(TallyError::UnknownClient(client_id)),
            Err(e) => Err(e),
        }
    }

    // -----------------------------------------------------------------------
    // Time entries
    // -----------------------------------------------------------------------

    pub fn create_time_entry(&self, mut input: NewTimeEntry) -> Result<TimeEntry> {
        input.validate()?;
        self.ensure_client(input.client_id)?;
        self.conn.execute(
            "INSERT INTO time_entries (owner_id, client_id, date, hours, description) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                self.owner_id,
                input.client_id,
                input.date.format(DATE_FMT).to_string(),
                input.hours,
                input.description,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(entry_id = id, client_id = input.client_id, "created time entry");
        self.get_time_entry(id)
    }

    pub fn get_time_entry(&self, id: i64) -> Result<TimeEntry> {
        let sql = format!("{ENTRY_SELECT} WHERE t.id = ?1 AND t.owner_id = ?2");
        self.conn
            .query_row(&sql, rusqlite::params![id, self.owner_id], entry_from_row)
            .optional()?
            .ok_or(TallyError::NotFound { kind: "Time entry", id })
    }

    pub fn update_time_entry(&self, id: i64, mut update: TimeEntryUpdate) -> Result<TimeEntry> {
        update.validate()?;
        let mut entry = self.get_time_entry(id)?;
        if let Some(client_id) = update.client_id {
            self.ensure_client(client_id)?;
            entry.client_id = client_id;
        }
        if let Some(date) = update.date {
            entry.date = date;
        }
        if let Some(hours) = update.hours {
            entry.hours = hours;
        }
        if let Some(description) = update.description {
            entry.description = description;
        }
        self.conn.execute(
            &format!(
                "UPDATE time_entries SET client_id = ?1, date = ?2, hours = ?3, description = ?4, \
                 updated_at = {NOW} WHERE id = ?5 AND owner_id = ?6"
            ),
            rusqlite::params![
                entry.client_id,
                entry.date.format(DATE_FMT).to_string(),
                entry.hours,
                entry.description,
                id,
                self.owner_id,
            ],
        )?;
        debug!(entry_id = id, "updated time entry");
        self.get_time_entry(id)
    }

    pub fn delete_time_entry(&self, id: i64) -> Result<()> {
        let changed = self.conn.execute(
            "DELETE FROM time_entries WHERE id = ?1 AND owner_id = ?2",
            rusqlite::params![id, self.owner_id],
        )?;
        if changed == 0 {
            return Err(TallyError::NotFound { kind: "Time entry", id });
        }
        debug!(entry_id = id, "deleted time entry");
        Ok(())
    }

    /// Remove every entry for this owner; returns how many went.
    pub fn delete_all_time_entries(&self) -> Result<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM time_entries WHERE owner_id = ?1", [&self.owner_id])?;
        debug!(removed, owner = %self.owner_id, "cleared time entries");
        Ok(removed)
    }

    pub fn count_clients(&self) -> Result<u64> {
        let n: i64 = self.conn.query_row(
            "SELECT count(*) FROM clients WHERE owner_id = ?1",
            [&self.owner_id],
            |r| r.get(0),
        )?;
        Ok(n as u64)
    }

    pub fn count_time_entries(&self) -> Result<u64> {
        let n: i64 = self.conn.query_row(
            "SELECT count(*) FROM time_entries WHERE owner_id = ?1",
            [&self.owner_id],
            |r| r.get(0),
        )?;
        Ok(n as u64)
    }
}

impl RecordStore for SqliteStore {
    fn fetch_time_entries(&self, page: u32, page_size: u32) -> Result<Page<TimeEntry>> {
        check_page(page, page_size)?;
        let total = self.count_time_entries()?;
        let sql = format!(
            "{ENTRY_SELECT} WHERE t.owner_id = ?1 \
             ORDER BY t.date DESC, t.created_at DESC, t.id DESC LIMIT ?2 OFFSET ?3"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                rusqlite::params![self.owner_id, page_size, offset(page, page_size)],
                entry_from_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(page, page_size, rows = rows.len(), total, "fetched time entry page");
        Ok(Page::new(rows, total, page, page_size))
    }

    fn fetch_clients(&self, page: u32, page_size: u32) -> Result<Page<Client>> {
        check_page(page, page_size)?;
        let total = self.count_clients()?;
        let sql = format!(
            "SELECT {CLIENT_COLS} FROM clients c WHERE c.owner_id = ?1 \
             ORDER BY c.name, c.id LIMIT ?2 OFFSET ?3"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                rusqlite::params![self.owner_id, page_size, offset(page, page_size)],
                |row| client_from_row(row, 0),
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Page::new(rows, total, page, page_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db};

    fn test_store(owner: &str) -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, SqliteStore::new(conn, owner))
    }

    fn add_client(store: &SqliteStore, name: &str, rate: f64) -> Client {
        store
            .create_client(NewClient {
                name: name.into(),
                hourly_rate: rate,
                currency: "usd".into(),
                ..Default::default()
            })
            .unwrap()
    }

    fn add_entry(store: &SqliteStore, client_id: i64, date: &str, hours: f64) -> TimeEntry {
        store
            .create_time_entry(NewTimeEntry {
                client_id,
                date: NaiveDate::parse_from_str(date, DATE_FMT).unwrap(),
                hours,
                description: "Work".into(),
            })
            .unwrap()
    }

    #[test]
    fn test_create_client_roundtrip() {
        let (_dir, store) = test_store("acme");
        let c = add_client(&store, "TechCorp", 85.0);
        assert_eq!(c.name, "TechCorp");
        assert_eq!(c.currency, "USD");
        assert!(c.is_active);
        assert_eq!(c.owner_id, "acme");
        assert_eq!(store.get_client(c.id).unwrap(), c);
    }

    #[test]
    fn test_create_client_rejects_negative_rate() {
        let (_dir, store) = test_store("acme");
        let result = store.create_client(NewClient {
            name: "Bad".into(),
            hourly_rate: -5.0,
            currency: "USD".into(),
            ..Default::default()
        });
        assert!(matches!(result, Err(TallyError::Validation(_))));
    }

    #[test]
    fn test_deactivate_is_soft() {
        let (_dir, store) = test_store("acme");
        let c = add_client(&store, "TechCorp", 85.0);
        store.deactivate_client(c.id).unwrap();
        assert!(store.list_clients(false).unwrap().is_empty());
        let all = store.list_clients(true).unwrap();
        assert_eq!(all.len(), 1);
        assert!(!all[0].is_active);
    }

    #[test]
    fn test_update_client_merges_fields() {
        let (_dir, store) = test_store("acme");
        let c = add_client(&store, "TechCorp", 85.0);
        let updated = store
            .update_client(
                c.id,
                ClientUpdate {
                    hourly_rate: Some(95.0),
                    email: Some("billing@techcorp.com".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "TechCorp");
        assert_eq!(updated.hourly_rate, 95.0);
        assert_eq!(updated.email.as_deref(), Some("billing@techcorp.com"));
    }

    #[test]
    fn test_rows_are_scoped_to_owner() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let conn = get_connection(&path).unwrap();
        init_db(&conn).unwrap();
        let alice = SqliteStore::new(conn, "alice");
        let bob = SqliteStore::new(get_connection(&path).unwrap(), "bob");

        let c = add_client(&alice, "TechCorp", 85.0);
        add_entry(&alice, c.id, "2024-01-15", 8.0);

        assert!(bob.list_clients(true).unwrap().is_empty());
        assert_eq!(bob.fetch_time_entries(1, 100).unwrap().total_count, 0);
        assert!(matches!(bob.get_client(c.id), Err(TallyError::NotFound { .. })));
        assert!(matches!(bob.deactivate_client(c.id), Err(TallyError::NotFound { .. })));
    }

    #[test]
    fn test_entry_requires_own_client() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let conn = get_connection(&path).unwrap();
        init_db(&conn).unwrap();
        let alice = SqliteStore::new(conn, "alice");
        let bob = SqliteStore::new(get_connection(&path).unwrap(), "bob");
        let c = add_client(&alice, "TechCorp", 85.0);

        let result = bob.create_time_entry(NewTimeEntry {
            client_id: c.id,
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            hours: 1.0,
            description: "Sneaky".into(),
        });
        assert!(matches!(result, Err(TallyError::UnknownClient(id)) if id == c.id));
    }

    #[test]
    fn test_entry_joins_client_snapshot() {
        let (_dir, store) = test_store("acme");
        let c = add_client(&store, "TechCorp", 85.0);
        let e = add_entry(&store, c.id, "2024-01-15", 7.5);
        assert_eq!(e.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(e.client.as_ref().map(|c| c.name.as_str()), Some("TechCorp"));
        assert_eq!(e.amount(), 637.5);
    }

    #[test]
    fn test_update_and_delete_entry() {
        let (_dir, store) = test_store("acme");
        let a = add_client(&store, "TechCorp", 85.0);
        let b = add_client(&store, "StartupXYZ", 90.0);
        let e = add_entry(&store, a.id, "2024-01-15", 8.0);

        let updated = store
            .update_time_entry(
                e.id,
                TimeEntryUpdate {
                    client_id: Some(b.id),
                    hours: Some(6.0),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.client_id, b.id);
        assert_eq!(updated.hours, 6.0);
        assert_eq!(updated.description, "Work");

        store.delete_time_entry(e.id).unwrap();
        assert!(matches!(store.get_time_entry(e.id), Err(TallyError::NotFound { .. })));
        assert!(matches!(store.delete_time_entry(e.id), Err(TallyError::NotFound { .. })));
    }

    #[test]
    fn test_fetch_time_entries_pages_newest_first() {
        let (_dir, store) = test_store("acme");
        let c = add_client(&store, "TechCorp", 85.0);
        for day in 1..=25 {
            add_entry(&store, c.id, &format!("2024-03-{day:02}"), 1.0);
        }

        let first = store.fetch_time_entries(1, 10).unwrap();
        assert_eq!(first.total_count, 25);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.rows.len(), 10);
        assert_eq!(first.rows[0].date, NaiveDate::from_ymd_opt(2024, 3, 25).unwrap());

        let last = store.fetch_time_entries(3, 10).unwrap();
        assert_eq!(last.rows.len(), 5);
        assert_eq!(last.rows[4].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!(!last.has_more());
    }

    #[test]
    fn test_fetch_rejects_page_zero() {
        let (_dir, store) = test_store("acme");
        assert!(matches!(
            store.fetch_time_entries(0, 10),
            Err(TallyError::InvalidPage { page: 0, .. })
        ));
        assert!(matches!(
            store.fetch_clients(1, 0),
            Err(TallyError::InvalidPage { page_size: 0, .. })
        ));
    }

    #[test]
    fn test_fetch_all_clients_walks_every_page() {
        let (_dir, store) = test_store("acme");
        for name in ["Delta", "Alpha", "Echo", "Charlie", "Bravo"] {
            add_client(&store, name, 10.0);
        }
        let inactive = add_client(&store, "Foxtrot", 10.0);
        store.deactivate_client(inactive.id).unwrap();

        for size in [1, 2, 100] {
            let all = fetch_all_clients(&store, size).unwrap();
            let names: Vec<&str> = all.iter().map(|c| c.name.as_str()).collect();
            assert_eq!(names, vec!["Alpha", "Bravo", "Charlie", "Delta", "Echo", "Foxtrot"]);
        }
    }

    #[test]
    fn test_collect_pages_stops_on_first_error() {
        let mut calls = 0;
        let result: Result<Vec<i32>> = collect_pages(2, |page, size| {
            calls += 1;
            if page == 2 {
                return Err(TallyError::Other("boom".into()));
            }
            Ok(Page::new(vec![1, 2], 10, page, size))
        });
        assert!(result.is_err());
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_fetch_clients_orders_by_name() {
        let (_dir, store) = test_store("acme");
        add_client(&store, "Zeta", 10.0);
        add_client(&store, "Alpha", 10.0);
        let page = store.fetch_clients(1, 10).unwrap();
        let names: Vec<&str> = page.rows.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
    }
}
