use anyhow::{Context, Result};
use calgrid_core::config::CalgridConfig;
use owo_colors::OwoColorize;

pub fn run(config: &CalgridConfig, changes: &[String]) -> Result<()> {
    let config_path = CalgridConfig::config_path()?;

    let mut config = config.clone();
    if !changes.is_empty() {
        for change in changes {
            let (key, value) = change
                .split_once('=')
                .with_context(|| format!("Expected KEY=VALUE, got \"{change}\""))?;
            config.set(key.trim(), value)?;
        }
        config.save(&config_path)?;
        println!("{}", format!("Saved {}", config_path.display()).green());
        println!();
    }

    println!("{}", "Paths".bold());
    println!("  Config:     {}", config_path.display());

    println!();
    println!("{}", "Settings".bold());
    println!("  Server:     {}", config.server_url);
    println!("  Timeout:    {}s", config.timeout_secs);
    println!("  Week start: {}", config.week_start()?);
    println!("  Time zone:  {}", config.timezone()?);
    println!(
        "  Scrolling:  {} months per batch, {} month margin, {} months resident",
        config.batch_size, config.edge_margin, config.resident_months
    );

    Ok(())
}
