use crate::db::{get_connection, get_metadata};
use crate::error::Result;
use crate::settings::{load_settings, settings_path};
use crate::store::SqliteStore;

pub fn run(account: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();
    let owner = account.unwrap_or(&settings.account);

    println!("Account:    {owner}");
    println!("Settings:   {}", settings_path().display());
    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {size} bytes");

        let conn = get_connection(&db_path)?;
        let schema = get_metadata(&conn, "schema_version");
        println!("Schema:     v{}", schema.as_deref().unwrap_or("?"));
        if let Some(seeded) = get_metadata(&conn, "demo_seeded_at") {
            println!("Demo data:  seeded {seeded}");
        }

        let store = SqliteStore::new(conn, owner);
        println!();
        println!("Clients:       {}", store.count_clients()?);
        println!("Time entries:  {}", store.count_time_entries()?);
    } else {
        println!();
        println!("Database not found. Run `tally init` to set up.");
    }

    Ok(())
}
