//! `kathor config`: show, locate, or initialize the configuration file.

use std::path::Path;

use console::style;

use kathor_infra::config::{config_path, load_config};
use kathor_types::config::KathorConfig;

/// Print the effective configuration. API keys are never part of it.
pub async fn show(data_dir: &Path, json: bool) -> anyhow::Result<()> {
    let config = load_config(data_dir).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        println!("{}", toml::to_string_pretty(&config)?);
    }
    Ok(())
}

pub fn path(data_dir: &Path) {
    println!("{}", config_path(data_dir).display());
}

/// Write the default configuration. Returns `false` if a file already
/// exists and `force` is not set.
pub async fn init(data_dir: &Path, force: bool) -> anyhow::Result<bool> {
    let path = config_path(data_dir);
    if !force && tokio::fs::try_exists(&path).await? {
        println!(
            "  {} {} already exists (use --force to overwrite)",
            style("!").yellow().bold(),
            path.display()
        );
        return Ok(false);
    }

    tokio::fs::create_dir_all(data_dir).await?;
    let content = toml::to_string_pretty(&KathorConfig::default())?;
    tokio::fs::write(&path, content).await?;
    println!("  {} Wrote {}", style("*").cyan().bold(), path.display());
    Ok(true)
}
