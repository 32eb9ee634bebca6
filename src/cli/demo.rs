use chrono::{Datelike, Local, Months, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;

use crate::cli::open_store;
use crate::db::set_metadata;
use crate::error::{Result, TallyError};
use crate::models::{Client, NewClient, NewTimeEntry};
use crate::store::SqliteStore;

const ENTRY_COUNT: usize = 40;
const DATES_PER_MONTH: usize = 20;
/// Below this many entries the demo data is considered incomplete and reseeded.
const MIN_SEEDED_ENTRIES: u64 = 30;

struct DemoClient {
    name: &'static str,
    email: &'static str,
    rate: f64,
    address: &'static str,
}

const CLIENTS: &[DemoClient] = &[
    DemoClient {
        name: "TechCorp Solutions",
        email: "contact@techcorp.com",
        rate: 85.0,
        address: "123 Tech Street, San Francisco, CA 94105",
    },
    DemoClient {
        name: "StartupXYZ",
        email: "hello@startupxyz.com",
        rate: 95.0,
        address: "456 Innovation Ave, Austin, TX 73301",
    },
    DemoClient {
        name: "Marketing Plus",
        email: "info@marketingplus.com",
        rate: 75.0,
        address: "789 Brand Blvd, New York, NY 10001",
    },
    DemoClient {
        name: "E-commerce Hub",
        email: "support@ecommercehub.com",
        rate: 90.0,
        address: "321 Commerce Lane, Seattle, WA 98101",
    },
];

const DESCRIPTIONS: &[&str] = &[
    "Frontend development - React components",
    "Backend API development",
    "Database optimization and queries",
    "Bug fixes and testing",
    "Code review and documentation",
    "Client meeting and project planning",
    "UI/UX design implementation",
    "Performance optimization",
    "Security audit and fixes",
    "Feature development - user authentication",
    "Mobile responsive design",
    "Third-party API integration",
    "Unit testing and test coverage",
    "Deploy to production environment",
    "Research and technical analysis",
    "Debugging production issues",
    "Data migration scripts",
    "Setting up CI/CD pipeline",
    "Code refactoring and cleanup",
    "Technical documentation writing",
    "Mentoring junior developers",
    "Architecture planning meeting",
    "Database schema design",
    "API endpoint development",
    "Frontend state management",
    "Cross-browser compatibility testing",
    "SEO optimization implementation",
    "Analytics integration",
    "Error handling improvements",
    "User feedback implementation",
];

fn days_in_month(year: i32, month: u32) -> u32 {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .map_or(28, |last| last.day())
}

/// 0.5 to 8.5 in half-hour steps.
fn random_hours(rng: &mut impl Rng) -> f64 {
    f64::from(rng.gen_range(1..=17u32)) * 0.5
}

/// Twenty random days in the previous month and twenty in the current one,
/// never later than today (capped at the 28th).
fn candidate_dates(rng: &mut impl Rng, today: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(DATES_PER_MONTH * 2);

    let prev = today - Months::new(1);
    let prev_days = days_in_month(prev.year(), prev.month());
    for _ in 0..DATES_PER_MONTH {
        let day = rng.gen_range(1..=prev_days);
        if let Some(d) = NaiveDate::from_ymd_opt(prev.year(), prev.month(), day) {
            dates.push(d);
        }
    }

    let current_days = today.day().min(28);
    for _ in 0..DATES_PER_MONTH {
        let day = rng.gen_range(1..=current_days);
        if let Some(d) = NaiveDate::from_ymd_opt(today.year(), today.month(), day) {
            dates.push(d);
        }
    }
    dates
}

fn seed_clients(store: &SqliteStore) -> Result<Vec<Client>> {
    let existing = store.list_clients(false)?;
    if !existing.is_empty() {
        return Ok(existing);
    }
    CLIENTS
        .iter()
        .map(|c| {
            store.create_client(NewClient {
                name: c.name.to_string(),
                hourly_rate: c.rate,
                currency: "USD".to_string(),
                email: Some(c.email.to_string()),
                address: Some(c.address.to_string()),
            })
        })
        .collect()
}

/// Seed clients and a fresh batch of entries. Returns (clients, entries).
fn insert_demo_data(
    store: &SqliteStore,
    rng: &mut impl Rng,
    today: NaiveDate,
) -> Result<(usize, usize)> {
    let clients = seed_clients(store)?;
    store.delete_all_time_entries()?;

    let dates = candidate_dates(rng, today);
    let mut entries = Vec::with_capacity(ENTRY_COUNT);
    for _ in 0..ENTRY_COUNT {
        let (Some(client), Some(date), Some(description)) = (
            clients.choose(rng),
            dates.choose(rng),
            DESCRIPTIONS.choose(rng),
        ) else {
            return Err(TallyError::Other("no demo data to choose from".to_string()));
        };
        entries.push(NewTimeEntry {
            client_id: client.id,
            date: *date,
            hours: random_hours(rng),
            description: description.to_string(),
        });
    }
    entries.sort_by(|a, b| b.date.cmp(&a.date));
    for entry in entries {
        store.create_time_entry(entry)?;
    }
    Ok((clients.len(), ENTRY_COUNT))
}

pub fn run(account: Option<&str>) -> Result<()> {
    let store = open_store(account)?;
    if store.count_time_entries()? >= MIN_SEEDED_ENTRIES {
        println!(
            "Demo data already loaded ({MIN_SEEDED_ENTRIES}+ entries for account '{}').",
            store.owner_id()
        );
        return Ok(());
    }

    let today = Local::now().date_naive();
    let (clients, entries) = insert_demo_data(&store, &mut rand::thread_rng(), today)?;
    set_metadata(store.conn(), "demo_seeded_at", &today.to_string())?;
    info!(clients, entries, owner = %store.owner_id(), "seeded demo data");

    println!("Demo data loaded!");
    println!("  Account:  {}", store.owner_id());
    println!("  Clients:  {clients}");
    println!("  Entries:  {entries}");
    println!();
    println!("Try these next:");
    println!("  tally clients list");
    println!("  tally entries list");
    println!("  tally report show");
    println!("  tally report export");
    Ok(())
}
