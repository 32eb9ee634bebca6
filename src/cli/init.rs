use colored::Colorize;
use tracing::info;

use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};

pub fn run(data_dir: Option<String>, account: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    if let Some(account) = account {
        settings.account = account;
    }

    std::fs::create_dir_all(settings.data_dir())?;
    std::fs::create_dir_all(settings.exports_dir())?;

    let db_path = settings.db_path();
    let conn = get_connection(&db_path)?;
    init_db(&conn)?;
    save_settings(&settings)?;
    info!(db = %db_path.display(), account = %settings.account, "initialized");

    println!("{}", "Tally is ready.".green().bold());
    println!("  Data dir: {}", settings.data_dir);
    println!("  Database: {}", db_path.display());
    println!("  Account:  {}", settings.account);
    println!();
    println!("Try these next:");
    println!("  tally clients add \"TechCorp Solutions\" --rate 85");
    println!("  tally demo");
    Ok(())
}
