//! Initialize command.

use console::style;

use crate::config::Settings;
use crate::repository::migrations::run_migrations;

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    run_migrations(&settings.database_url()).await?;

    println!(
        "{} Initialized manifesto in {}",
        style("✓").green(),
        settings.data_dir.display()
    );
    println!("  Database: {}", settings.database_url());
    println!("  Tenant:   {}", settings.default_tenant);

    Ok(())
}
