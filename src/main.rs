mod cli;
mod db;
mod error;
mod fmt;
mod models;
mod pdf;
mod reports;
mod settings;
mod store;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{ClientsCommands, Cli, Commands, EntriesCommands, ReportCommands};
use models::{ClientUpdate, TimeEntryUpdate};

/// Logs go to stderr so report output on stdout stays pipeable.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let account = cli.account.as_deref();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir, cli.account.clone()),
        Commands::Clients { command } => match command {
            ClientsCommands::Add {
                name,
                rate,
                currency,
                email,
                address,
            } => cli::clients::add(account, name, rate, currency, email, address),
            ClientsCommands::List { all } => cli::clients::list(account, all),
            ClientsCommands::Update {
                id,
                name,
                rate,
                currency,
                email,
                address,
                active,
            } => cli::clients::update(
                account,
                id,
                ClientUpdate {
                    name,
                    hourly_rate: rate,
                    currency,
                    email,
                    address,
                    is_active: active,
                },
            ),
            ClientsCommands::Deactivate { id } => cli::clients::deactivate(account, id),
        },
        Commands::Entries { command } => match command {
            EntriesCommands::Add {
                client,
                hours,
                description,
                date,
            } => cli::entries::add(account, client, hours, description, date),
            EntriesCommands::List { page, per_page } => cli::entries::list(account, page, per_page),
            EntriesCommands::Update {
                id,
                client,
                date,
                hours,
                description,
            } => cli::entries::update(
                account,
                id,
                TimeEntryUpdate {
                    client_id: client,
                    date,
                    hours,
                    description,
                },
            ),
            EntriesCommands::Delete { id } => cli::entries::delete(account, id),
        },
        Commands::Report { command } => match command {
            ReportCommands::Show { filters, json } => cli::report::show(account, &filters, json),
            ReportCommands::Entries { filters } => cli::report::entries(account, &filters),
            ReportCommands::Export {
                filters,
                output_dir,
            } => cli::report::export(account, &filters, output_dir),
        },
        Commands::Demo => cli::demo::run(account),
        Commands::Status => cli::status::run(account),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
