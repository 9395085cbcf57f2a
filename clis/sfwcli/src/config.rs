use std::{fs::File, path::Path, str::FromStr};

use serde::{de, Deserialize, Deserializer};
use sfw::SfwConfig;
use tracing::level_filters::LevelFilter;

use crate::CliError;

/// Contents of the optional JSON configuration file
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LevelFilter,
    /// Log to this file instead of stderr
    pub log_file_path: Option<String>,
    /// Number of rotated log files kept, 0 disables rotation
    pub log_file_count: usize,
    pub sfw: SfwConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: LevelFilter::INFO,
            log_file_path: None,
            log_file_count: 0,
            sfw: SfwConfig::default(),
        }
    }
}

impl CliConfig {
    pub fn from_file(path: &Path) -> Result<Self, CliError> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LevelFilter, D::Error>
where
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).and_then(|s: String| {
        LevelFilter::from_str(&s).map_err(|_| {
            de::Error::unknown_variant(&s, &["error", "warn", "info", "debug", "trace", "off"])
        })
    })
}
