use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::GridStandards;

pub const DEFAULT_CONFIG_FILE: &str = "config/default.toml";
pub const ENV_PREFIX: &str = "GPA__";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub reports: ReportsConfig,
    pub standards: GridStandards,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Measurement CSV
    pub path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self { path: PathBuf::from("power_system_data.csv") }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportsConfig {
    pub dir: PathBuf,
    /// Also write `analysis_report.json` next to the CSV tables
    pub json: bool,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("analysis_outputs/reports"),
            json: true,
        }
    }
}

impl ReportsConfig {
    pub fn json_path(&self) -> PathBuf {
        self.dir.join("analysis_report.json")
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Ok(Self::figment(DEFAULT_CONFIG_FILE).extract()?)
    }

    /// Defaults, then the TOML file (if present), then `GPA__` env vars
    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}
