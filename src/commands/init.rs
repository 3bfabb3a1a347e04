use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use ticketflow::config::{Config, CONFIG_FILE};
use ticketflow::db::SqliteMedium;
use ticketflow::AppContext;

pub const DATA_DIR: &str = ".ticketflow";
pub const STORE_FILE: &str = "store.db";

pub fn run(data_dir: &Path, force: bool) -> Result<()> {
    let exists = data_dir.join(STORE_FILE).exists();

    if exists && !force {
        println!("Already initialized at {}", data_dir.display());
        println!("Use --force to rewrite the default config.");
        return Ok(());
    }

    fs::create_dir_all(data_dir).context("Failed to create data directory")?;

    let config_exists = data_dir.join(CONFIG_FILE).exists();
    if !config_exists || force {
        Config::default().save(data_dir)?;
        println!("Wrote {}", data_dir.join(CONFIG_FILE).display());
    }

    if !exists {
        let config = Config::load(data_dir)?;
        let medium = SqliteMedium::open(&data_dir.join(STORE_FILE))?;
        // Opening the stores seeds the demo tickets.
        let ctx = AppContext::open(Arc::new(medium), config);
        println!(
            "Created {} with {} demo tickets",
            data_dir.display(),
            ctx.tickets.stats().total
        );
    }

    println!("TicketFlow initialized successfully!");
    println!("\nNext steps:");
    println!("  ticketflow signup you@example.com -p <password> -c <password>");
    println!("  ticketflow dashboard");

    Ok(())
}
