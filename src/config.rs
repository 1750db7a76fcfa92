use std::fmt::{Display, Formatter};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::sessions::state_dir;

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    TomlDecode(toml::de::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "io error: {err}"),
            ConfigError::TomlDecode(err) => write!(f, "failed to parse config: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub owner_name: Option<String>,
    pub planned_hours: Option<u32>,
    pub quotes_file: Option<PathBuf>,
    pub export_file: Option<PathBuf>,
}

pub fn load_config() -> Result<PlannerConfig, ConfigError> {
    load_config_from(&config_path())
}

fn load_config_from(path: &Path) -> Result<PlannerConfig, ConfigError> {
    let raw = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(PlannerConfig::default()),
        Err(err) => return Err(ConfigError::Io(err)),
    };

    parse_config(&raw)
}

pub fn config_path() -> PathBuf {
    state_dir().join(CONFIG_FILE)
}

fn parse_config(raw: &str) -> Result<PlannerConfig, ConfigError> {
    toml::from_str(raw).map_err(ConfigError::TomlDecode)
}
