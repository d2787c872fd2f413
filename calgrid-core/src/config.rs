//! Global calgrid configuration.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Weekday;
use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_EDGE_MARGIN, DEFAULT_RESIDENT_MONTHS, DEFAULT_SERVER_URL,
    DEFAULT_TIMEOUT_SECS,
};
use crate::error::{CalGridError, CalGridResult};
use crate::window::WindowConfig;

static DEFAULT_WEEK_START: &str = "sunday";

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_week_start() -> String {
    DEFAULT_WEEK_START.to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_edge_margin() -> usize {
    DEFAULT_EDGE_MARGIN
}

fn default_resident_months() -> usize {
    DEFAULT_RESIDENT_MONTHS
}

/// Configuration at ~/.config/calgrid/config.toml
///
/// Every key can be overridden from the environment as `CALGRID_<KEY>`,
/// e.g. `CALGRID_SERVER_URL`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CalgridConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_week_start")]
    pub week_start: String,

    /// IANA zone name. Falls back to the system zone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_edge_margin")]
    pub edge_margin: usize,

    #[serde(default = "default_resident_months")]
    pub resident_months: usize,
}

impl Default for CalgridConfig {
    fn default() -> Self {
        CalgridConfig {
            server_url: default_server_url(),
            timeout_secs: default_timeout_secs(),
            week_start: default_week_start(),
            timezone: None,
            batch_size: default_batch_size(),
            edge_margin: default_edge_margin(),
            resident_months: default_resident_months(),
        }
    }
}

impl CalgridConfig {
    pub fn config_path() -> CalGridResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CalGridError::Config("Could not determine config directory".into()))?
            .join("calgrid");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, writing a commented template first
    /// if there is no file yet.
    pub fn load() -> CalGridResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> CalGridResult<Self> {
        let config: CalgridConfig = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("CALGRID").try_parsing(true))
            .build()
            .map_err(|e| CalGridError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CalGridError::Config(e.to_string()))?;

        config.window()?;
        Ok(config)
    }

    /// Change one setting by its file key. Nothing changes unless the new
    /// value parses and leaves the config valid.
    pub fn set(&mut self, key: &str, value: &str) -> CalGridResult<()> {
        let value = value.trim();
        let number = |value: &str| {
            value
                .parse::<usize>()
                .map_err(|_| CalGridError::Config(format!("'{value}' is not a number for {key}")))
        };

        let mut next = self.clone();
        match key {
            "server_url" => next.server_url = value.to_string(),
            "timeout_secs" => next.timeout_secs = number(value)? as u64,
            "week_start" => {
                next.week_start = value.to_string();
                next.week_start()?;
            }
            "timezone" if value.is_empty() => next.timezone = None,
            "timezone" => {
                next.timezone = Some(value.to_string());
                next.timezone()?;
            }
            "batch_size" => next.batch_size = number(value)?,
            "edge_margin" => next.edge_margin = number(value)?,
            "resident_months" => next.resident_months = number(value)?,
            _ => return Err(CalGridError::Config(format!("Unknown setting '{key}'"))),
        }
        next.window()?;

        *self = next;
        Ok(())
    }

    pub fn save(&self, path: &Path) -> CalGridResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| CalGridError::Serialization(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
            .map_err(|e| CalGridError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> CalGridResult<()> {
        let contents = format!(
            "\
# calgrid configuration

# Events service:
# server_url = \"{DEFAULT_SERVER_URL}\"
# timeout_secs = {DEFAULT_TIMEOUT_SECS}

# First column of the month grid:
# week_start = \"{DEFAULT_WEEK_START}\"

# Time zone used to place events on days (defaults to the system zone):
# timezone = \"Europe/Oslo\"

# Months added when scrolling near either end, and how near is near:
# batch_size = {DEFAULT_BATCH_SIZE}
# edge_margin = {DEFAULT_EDGE_MARGIN}

# Months of events kept in memory while scrolling:
# resident_months = {DEFAULT_RESIDENT_MONTHS}
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CalGridError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| CalGridError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    pub fn week_start(&self) -> CalGridResult<Weekday> {
        Weekday::from_str(self.week_start.trim()).map_err(|_| {
            CalGridError::Config(format!("Unknown week_start '{}'", self.week_start))
        })
    }

    /// The configured zone, else the system zone, else UTC.
    pub fn timezone(&self) -> CalGridResult<Tz> {
        if let Some(name) = &self.timezone {
            return Tz::from_str(name)
                .map_err(|_| CalGridError::Config(format!("Unknown timezone '{name}'")));
        }

        match iana_time_zone::get_timezone() {
            Ok(name) => Ok(Tz::from_str(&name).unwrap_or_else(|_| {
                warn!("System time zone '{}' is not in the tz database, using UTC", name);
                Tz::UTC
            })),
            Err(e) => {
                warn!("Could not determine system time zone ({}), using UTC", e);
                Ok(Tz::UTC)
            }
        }
    }

    pub fn window(&self) -> CalGridResult<WindowConfig> {
        let window = WindowConfig {
            batch_size: self.batch_size,
            edge_margin: self.edge_margin,
            resident_months: self.resident_months,
        };
        window.validate()?;
        Ok(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commented_template_loads_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calgrid/config.toml");

        CalgridConfig::create_default_config(&path).unwrap();
        let config = CalgridConfig::load_from(&path).unwrap();

        assert_eq!(config, CalgridConfig::default());
        assert_eq!(config.week_start().unwrap(), Weekday::Sun);
    }

    #[test]
    fn reads_values_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "server_url = \"http://calendar.local:8080\"\n\
             week_start = \"Monday\"\n\
             timezone = \"Asia/Tokyo\"\n\
             batch_size = 4\n",
        )
        .unwrap();

        let config = CalgridConfig::load_from(&path).unwrap();
        assert_eq!(config.server_url, "http://calendar.local:8080");
        assert_eq!(config.week_start().unwrap(), Weekday::Mon);
        assert_eq!(config.timezone().unwrap(), chrono_tz::Asia::Tokyo);
        assert_eq!(config.window().unwrap().batch_size, 4);
        assert_eq!(config.edge_margin, DEFAULT_EDGE_MARGIN);
    }

    #[test]
    fn rejects_window_that_cannot_outrun_its_margin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "batch_size = 1\nedge_margin = 2\n").unwrap();

        assert!(matches!(
            CalgridConfig::load_from(&path),
            Err(CalGridError::Config(_))
        ));
    }

    #[test]
    fn unknown_names_are_config_errors() {
        let config = CalgridConfig {
            week_start: "someday".into(),
            timezone: Some("Mars/Olympus".into()),
            ..CalgridConfig::default()
        };
        assert!(config.week_start().is_err());
        assert!(config.timezone().is_err());
    }

    #[test]
    fn set_changes_one_valid_setting() {
        let mut config = CalgridConfig::default();

        config.set("week_start", "monday").unwrap();
        config.set("timezone", "Europe/Oslo").unwrap();
        config.set("resident_months", "24").unwrap();
        assert_eq!(config.week_start().unwrap(), Weekday::Mon);
        assert_eq!(config.timezone().unwrap(), chrono_tz::Europe::Oslo);
        assert_eq!(config.resident_months, 24);

        config.set("timezone", "").unwrap();
        assert_eq!(config.timezone, None);
    }

    #[test]
    fn set_leaves_config_alone_on_bad_values() {
        let mut config = CalgridConfig::default();

        assert!(config.set("week_start", "someday").is_err());
        assert!(config.set("timezone", "Mars/Olympus").is_err());
        assert!(config.set("batch_size", "1").is_err());
        assert!(config.set("timeout_secs", "soon").is_err());
        assert!(config.set("color", "blue").is_err());
        assert_eq!(config, CalgridConfig::default());
    }

    #[test]
    fn save_round_trips_through_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = CalgridConfig {
            timeout_secs: 3,
            resident_months: 24,
            ..CalgridConfig::default()
        };

        config.save(&path).unwrap();
        assert_eq!(CalgridConfig::load_from(&path).unwrap(), config);
    }
}
