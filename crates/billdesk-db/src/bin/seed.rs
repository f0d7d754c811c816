//! # Seed Data Loader
//!
//! Loads the default catalog into a BillDesk database.
//!
//! ## Usage
//! ```bash
//! cargo run -p billdesk-db --bin seed
//!
//! # Specify database path
//! cargo run -p billdesk-db --bin seed -- --db ./data/billdesk.db
//! ```

use std::env;

use billdesk_db::seed::seed_default_catalog;
use billdesk_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./billdesk_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Usage: seed [--db PATH]");
                return Ok(());
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                std::process::exit(2);
            }
        }
        i += 1;
    }

    println!("Seeding {}", db_path);

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let written = seed_default_catalog(&db.catalog()).await?;
    db.close().await;

    println!("Wrote {} products", written);
    Ok(())
}
