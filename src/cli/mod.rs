pub mod clients;
pub mod demo;
pub mod entries;
pub mod init;
pub mod report;
pub mod status;

use chrono::{Datelike, Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use crate::db::{get_connection, init_db};
use crate::error::{Result, TallyError};
use crate::reports::ReportFilters;
use crate::settings::load_settings;
use crate::store::SqliteStore;

/// Open the configured database, scoped to `account` or the configured one.
pub(crate) fn open_store(account: Option<&str>) -> Result<SqliteStore> {
    let settings = load_settings();
    let db_path = settings.db_path();
    if !db_path.exists() {
        return Err(TallyError::Other(
            "No database found. Run `tally init` first.".to_string(),
        ));
    }
    let conn = get_connection(&db_path)?;
    init_db(&conn)?;
    let owner = account.map(str::to_string).unwrap_or(settings.account);
    debug!(db = %db_path.display(), owner = %owner, "opened store");
    Ok(SqliteStore::new(conn, owner))
}

#[derive(Parser)]
#[command(
    name = "tally",
    version,
    about = "Time tracking and client billing reports for freelancers."
)]
pub struct Cli {
    /// Account to act as (overrides the configured account)
    #[arg(long, global = true)]
    pub account: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up Tally: choose a data directory and initialize the database.
    Init {
        /// Path for Tally data (default: ~/Documents/tally)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Manage clients.
    Clients {
        #[command(subcommand)]
        command: ClientsCommands,
    },
    /// Record and browse time entries.
    Entries {
        #[command(subcommand)]
        command: EntriesCommands,
    },
    /// Summaries, line items and PDF exports.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Load sample clients and time entries to explore Tally.
    Demo,
    /// Show the current account, database and row counts.
    Status,
}

#[derive(Subcommand)]
pub enum ClientsCommands {
    /// Add a client.
    Add {
        /// Client name, e.g. 'TechCorp Solutions'
        name: String,
        /// Hourly rate
        #[arg(long)]
        rate: f64,
        /// Three-letter currency code
        #[arg(long, default_value = "USD")]
        currency: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    /// List clients.
    List {
        /// Include deactivated clients
        #[arg(long)]
        all: bool,
    },
    /// Update a client.
    Update {
        /// Client ID (shown in `tally clients list`)
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        rate: Option<f64>,
        #[arg(long)]
        currency: Option<String>,
        /// New email (empty string clears it)
        #[arg(long)]
        email: Option<String>,
        /// New address (empty string clears it)
        #[arg(long)]
        address: Option<String>,
        /// Reactivate or deactivate
        #[arg(long)]
        active: Option<bool>,
    },
    /// Deactivate a client. Its entries are kept.
    Deactivate {
        /// Client ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum EntriesCommands {
    /// Log time against a client.
    Add {
        /// Client ID
        #[arg(long)]
        client: i64,
        #[arg(long)]
        hours: f64,
        #[arg(long)]
        description: String,
        /// Work date: YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List entries, newest first.
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long = "per-page", default_value_t = 10)]
        per_page: u32,
    },
    /// Update an entry.
    Update {
        /// Entry ID (shown in `tally entries list`)
        id: i64,
        #[arg(long)]
        client: Option<i64>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        hours: Option<f64>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete an entry.
    Delete {
        /// Entry ID
        id: i64,
    },
}

#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Report year (default: current year)
    #[arg(long)]
    pub year: Option<i32>,
    /// Month 1-12; omit for the whole year
    #[arg(long)]
    pub month: Option<u32>,
    /// Restrict to a client; repeat for several
    #[arg(long = "client")]
    pub clients: Vec<i64>,
}

impl FilterArgs {
    pub fn to_filters(&self, today: NaiveDate) -> ReportFilters {
        let mut client_ids = self.clients.clone();
        client_ids.sort_unstable();
        client_ids.dedup();
        ReportFilters {
            client_ids,
            year: self.year.unwrap_or_else(|| today.year()),
            month: self.month,
        }
    }

    pub fn resolve(&self) -> ReportFilters {
        self.to_filters(Local::now().date_naive())
    }
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Totals with client and monthly breakdowns.
    Show {
        #[command(flatten)]
        filters: FilterArgs,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Line items for the period, newest first.
    Entries {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Write the report as a PDF.
    Export {
        #[command(flatten)]
        filters: FilterArgs,
        /// Output directory (default: <data_dir>/exports)
        #[arg(long = "output-dir")]
        output_dir: Option<String>,
    },
}
