use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::store::ensure_ledger_home;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub forecast: ForecastSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ForecastSection {
    /// Balance to forecast from when --balance is not passed. Left unset,
    /// the balance is derived by summing the ledger.
    pub starting_balance: Option<f64>,
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_ledger_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&raw).context("parse config.toml")
}

pub fn save_config(config: &Config) -> Result<()> {
    let path = config_path()?;
    let raw = toml::to_string_pretty(config).context("serialize config")?;
    fs::write(&path, raw).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let path = config_path()?;
    if path.exists() {
        println!("Config already exists: {}", path.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", path.display());
    Ok(())
}
