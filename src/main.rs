mod cli;

use anyhow::{Context, Result};
use tally::config::Config;

fn main() -> Result<()> {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();
    let config = Config::from_env().context("Failed to read configuration")?;
    let mut ledger = config
        .open_ledger()
        .with_context(|| format!("Failed to open ledger in {}", config.data_dir.display()))?;
    cli::run(&args, ledger.as_mut())
}
