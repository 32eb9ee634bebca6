use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::open_store;
use crate::error::{Result, TallyError};
use crate::fmt::currency;
use crate::models::{Client, ClientUpdate, NewClient};
use crate::store::fetch_all_clients;

const LIST_PAGE_SIZE: u32 = 100;

/// Active clients only, unless `all`.
fn visible_clients(clients: Vec<Client>, all: bool) -> Vec<Client> {
    clients.into_iter().filter(|c| all || c.is_active).collect()
}

pub fn add(
    account: Option<&str>,
    name: String,
    rate: f64,
    currency_code: String,
    email: Option<String>,
    address: Option<String>,
) -> Result<()> {
    let store = open_store(account)?;
    let client = store.create_client(NewClient {
        name,
        hourly_rate: rate,
        currency: currency_code,
        email,
        address,
    })?;
    println!(
        "Added client #{}: {} at {}/h",
        client.id,
        client.name,
        currency(client.hourly_rate, &client.currency)
    );
    Ok(())
}

pub fn list(account: Option<&str>, all: bool) -> Result<()> {
    let store = open_store(account)?;
    let clients = visible_clients(fetch_all_clients(&store, LIST_PAGE_SIZE)?, all);
    println!("{}", format_clients(&clients));
    Ok(())
}

pub fn update(account: Option<&str>, id: i64, update: ClientUpdate) -> Result<()> {
    if update.is_empty() {
        return Err(TallyError::Validation(
            "nothing to update; pass at least one field".to_string(),
        ));
    }
    let store = open_store(account)?;
    let client = store.update_client(id, update)?;
    println!("Updated client #{}: {}", client.id, client.name);
    Ok(())
}

pub fn deactivate(account: Option<&str>, id: i64) -> Result<()> {
    let store = open_store(account)?;
    store.deactivate_client(id)?;
    println!("Deactivated client #{id}. Existing entries are kept.");
    Ok(())
}

pub fn format_clients(clients: &[Client]) -> String {
    if clients.is_empty() {
        return "No clients yet. Add one with `tally clients add`.".to_string();
    }
    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Rate", "Currency", "Email", "Status"]);
    for c in clients {
        let status = if c.is_active {
            "active".green()
        } else {
            "inactive".dimmed()
        };
        table.add_row(vec![
            Cell::new(c.id),
            Cell::new(&c.name),
            Cell::new(currency(c.hourly_rate, &c.currency)).set_alignment(CellAlignment::Right),
            Cell::new(&c.currency),
            Cell::new(c.email.as_deref().unwrap_or("")),
            Cell::new(status),
        ]);
    }
    format!("Clients\n{table}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::tests::client;

    #[test]
    fn test_format_clients_lists_rate_in_currency() {
        let mut euro = client(2, "Berlin GmbH", 70.0);
        euro.currency = "EUR".into();
        euro.is_active = false;
        let out = format_clients(&[client(1, "TechCorp", 85.0), euro]);
        assert!(out.starts_with("Clients"));
        assert!(out.contains("TechCorp"));
        assert!(out.contains("$85.00"));
        assert!(out.contains("\u{20ac}70.00"));
        assert!(out.contains("inactive"));
    }

    #[test]
    fn test_visible_clients_hides_inactive() {
        let mut gone = client(2, "Gone", 50.0);
        gone.is_active = false;
        let clients = vec![client(1, "Kept", 85.0), gone];
        assert_eq!(visible_clients(clients.clone(), false).len(), 1);
        assert_eq!(visible_clients(clients, true).len(), 2);
    }

    #[test]
    fn test_format_clients_empty() {
        assert!(format_clients(&[]).contains("No clients yet"));
    }
}
