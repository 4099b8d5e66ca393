//! Store status command.

use anyhow::Result;
use console::style;

use strongroom_infra::sql::Dialect;

use crate::state::Settings;

/// Display the data directory, configuration file and selected store.
///
/// Never prints the connection string, which may carry credentials.
pub async fn status(settings: &Settings, json: bool) -> Result<()> {
    let config_path = settings.config_path();
    let config_exists = tokio::fs::try_exists(&config_path).await.unwrap_or(false);
    let dialect = Dialect::for_kind(settings.store.database_kind);
    let custom_store = settings.config.connection_string.is_some();

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": settings.data_dir.display().to_string(),
            "config_file": config_path.display().to_string(),
            "config_file_exists": config_exists,
            "database_kind": settings.store.database_kind,
            "dialect": dialect.to_string(),
            "schema_action": settings.store.schema_action,
            "embedded_store": !custom_store,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Strongroom v{}",
        style("🔐").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("  {:<14} {}", style("Data dir").bold(), settings.data_dir.display());
    let note = if config_exists { "" } else { "(not found, using defaults)" };
    println!(
        "  {:<14} {} {}",
        style("Config").bold(),
        config_path.display(),
        style(note).dim()
    );
    println!(
        "  {:<14} {}{}",
        style("Store").bold(),
        style(settings.store.database_kind).cyan(),
        if custom_store { "" } else { " (embedded)" }
    );
    println!("  {:<14} {}", style("Dialect").bold(), dialect);
    println!(
        "  {:<14} {:?}",
        style("Schema").bold(),
        settings.store.schema_action
    );
    println!();

    Ok(())
}
