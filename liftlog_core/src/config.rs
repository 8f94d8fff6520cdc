//! Configuration file support for liftlog.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/liftlog/config.toml`.

use crate::calendar::{CalendarPolicy, WeekStart};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub calendar: CalendarConfig,

    #[serde(default)]
    pub progression: ProgressionConfig,

    #[serde(default)]
    pub insights: InsightsConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Day boundary and week rule
///
/// When `utc_offset_minutes` is unset the machine's local offset is used.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct CalendarConfig {
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,

    #[serde(default)]
    pub week_starts_on: WeekStart,
}

impl CalendarConfig {
    pub fn policy(&self) -> Result<CalendarPolicy> {
        match self.utc_offset_minutes {
            Some(minutes) => CalendarPolicy::with_offset_minutes(minutes, self.week_starts_on),
            None => Ok(CalendarPolicy::system_local(self.week_starts_on)),
        }
    }
}

/// Progression classifier thresholds
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProgressionConfig {
    /// Relative volume change treated as flat (0.10 = ±10%)
    #[serde(default = "default_volume_tolerance")]
    pub volume_tolerance: f64,

    #[serde(default = "default_one_rep_max_tolerance")]
    pub one_rep_max_tolerance: f64,

    /// Absolute kg difference treated as the same top weight
    #[serde(default = "default_weight_tolerance")]
    pub weight_tolerance: f64,

    #[serde(default = "default_window_sessions")]
    pub window_sessions: usize,

    #[serde(default = "default_consecutive_hits")]
    pub consecutive_hits: usize,

    #[serde(default = "default_upper_body_increment")]
    pub upper_body_increment: f64,

    #[serde(default = "default_lower_body_increment")]
    pub lower_body_increment: f64,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            volume_tolerance: default_volume_tolerance(),
            one_rep_max_tolerance: default_one_rep_max_tolerance(),
            weight_tolerance: default_weight_tolerance(),
            window_sessions: default_window_sessions(),
            consecutive_hits: default_consecutive_hits(),
            upper_body_increment: default_upper_body_increment(),
            lower_body_increment: default_lower_body_increment(),
        }
    }
}

/// Insights display parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InsightsConfig {
    /// Categories listed individually before the rest merge into "Other"
    #[serde(default = "default_breakdown_top_n")]
    pub breakdown_top_n: usize,

    #[serde(default = "default_recent_pr_limit")]
    pub recent_pr_limit: usize,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            breakdown_top_n: default_breakdown_top_n(),
            recent_pr_limit: default_recent_pr_limit(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|_| PathBuf::from("."))
    });
    base.join("liftlog")
}

fn default_volume_tolerance() -> f64 {
    0.10
}

fn default_one_rep_max_tolerance() -> f64 {
    0.05
}

fn default_weight_tolerance() -> f64 {
    0.1
}

fn default_window_sessions() -> usize {
    4
}

fn default_consecutive_hits() -> usize {
    2
}

fn default_upper_body_increment() -> f64 {
    2.5
}

fn default_lower_body_increment() -> f64 {
    5.0
}

fn default_breakdown_top_n() -> usize {
    6
}

fn default_recent_pr_limit() -> usize {
    10
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject thresholds the classifier can't work with
    pub fn validate(&self) -> Result<()> {
        let p = &self.progression;
        let tolerances = [
            ("volume_tolerance", p.volume_tolerance),
            ("one_rep_max_tolerance", p.one_rep_max_tolerance),
            ("weight_tolerance", p.weight_tolerance),
            ("upper_body_increment", p.upper_body_increment),
            ("lower_body_increment", p.lower_body_increment),
        ];
        for (name, value) in tolerances {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!(
                    "progression.{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if p.window_sessions < 2 {
            return Err(Error::Config(
                "progression.window_sessions must be at least 2".into(),
            ));
        }
        if p.consecutive_hits < 2 || p.consecutive_hits > p.window_sessions {
            return Err(Error::Config(format!(
                "progression.consecutive_hits must be between 2 and {}",
                p.window_sessions
            )));
        }
        self.calendar.policy()?;
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|_| PathBuf::from("."))
        });
        base.join("liftlog").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
