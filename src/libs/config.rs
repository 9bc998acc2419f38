//! Application configuration.
//!
//! Stored as pretty-printed JSON (`config.json`) in the data directory. Each
//! section is optional so a fresh installation works with defaults:
//!
//! - `backend`: project URL and anon key of the hosted backend
//! - `groups`: the known task groups
//! - `analytics`: trend window settings
//!
//! `TASKPIN_URL` and `TASKPIN_ANON_KEY` override the backend section; they
//! are also read from a `.env` file in the working directory.
//!
//! ```rust,no_run
//! use taskpin::libs::config::Config;
//!
//! let mut config = Config::read()?;
//! config.groups_mut().add("Errands")?;
//! config.save()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::data_storage::DataStorage;
use super::task::Groups;
use crate::api::supabase::SupabaseConfig;
use crate::libs::messages::Message;
use crate::msg_print;
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Input, MultiSelect};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

pub const CONFIG_FILE_NAME: &str = "config.json";

pub const ENV_URL: &str = "TASKPIN_URL";
pub const ENV_ANON_KEY: &str = "TASKPIN_ANON_KEY";

/// A section offered by the interactive setup.
#[derive(Debug, Clone)]
pub struct ConfigModule {
    pub key: String,
    pub name: String,
}

/// Trend window of the analytics view.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AnalyticsConfig {
    /// Number of days in the trend.
    pub trend_days: u32,
    /// How many days before today the trend starts.
    pub trend_lead_days: u32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            trend_days: 7,
            trend_lead_days: 4,
        }
    }
}

impl AnalyticsConfig {
    pub fn module() -> ConfigModule {
        ConfigModule {
            key: "analytics".to_string(),
            name: "Analytics".to_string(),
        }
    }

    pub fn init(config: &Option<AnalyticsConfig>) -> Result<Self> {
        let default = config.clone().unwrap_or_default();
        msg_print!(Message::ConfigModuleAnalytics);
        Ok(Self {
            trend_days: Input::with_theme(&ColorfulTheme::default())
                .with_prompt(Message::PromptTrendDays.to_string())
                .default(default.trend_days)
                .validate_with(|days: &u32| if *days > 0 { Ok(()) } else { Err("must be at least 1") })
                .interact_text()?,
            trend_lead_days: Input::with_theme(&ColorfulTheme::default())
                .with_prompt(Message::PromptTrendLeadDays.to_string())
                .default(default.trend_lead_days)
                .interact_text()?,
        })
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<SupabaseConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Groups>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub analytics: Option<AnalyticsConfig>,
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        DataStorage::new().get_path(CONFIG_FILE_NAME)
    }

    /// Reads the stored configuration and applies environment overrides.
    ///
    /// A missing file yields the defaults; a corrupt one is an error.
    pub fn read() -> Result<Config> {
        let _ = dotenv::dotenv();
        let mut config = Self::read_file()?;
        config.apply_env();
        Ok(config)
    }

    fn read_file() -> Result<Config> {
        let path = Self::path()?;
        if !path.exists() {
            return Ok(Config::default());
        }
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn apply_env(&mut self) {
        let url = env::var(ENV_URL).ok().filter(|v| !v.trim().is_empty());
        let anon_key = env::var(ENV_ANON_KEY).ok().filter(|v| !v.trim().is_empty());
        if url.is_none() && anon_key.is_none() {
            return;
        }

        let current = self.backend.clone();
        let url = url.or_else(|| current.as_ref().map(|b| b.url.clone()));
        let anon_key = anon_key.or_else(|| current.as_ref().map(|b| b.anon_key.clone()));
        if let (Some(url), Some(anon_key)) = (url, anon_key) {
            self.backend = Some(SupabaseConfig { url, anon_key });
        }
    }

    /// Writes the configuration file. Environment overrides are not
    /// persisted.
    pub fn save(&self) -> Result<()> {
        let mut stored = Self::read_file().unwrap_or_default();
        stored.groups = self.groups.clone();
        stored.analytics = self.analytics.clone();
        if env::var(ENV_URL).is_err() && env::var(ENV_ANON_KEY).is_err() {
            stored.backend = self.backend.clone();
        }

        let raw = serde_json::to_string_pretty(&stored)?;
        fs::write(Self::path()?, raw)?;
        Ok(())
    }

    pub fn groups(&self) -> Groups {
        self.groups.clone().unwrap_or_default()
    }

    pub fn groups_mut(&mut self) -> &mut Groups {
        self.groups.get_or_insert_with(Groups::default)
    }

    pub fn analytics(&self) -> AnalyticsConfig {
        self.analytics.clone().unwrap_or_default()
    }

    /// Interactive setup of the selected sections.
    pub fn init() -> Result<Self> {
        let mut config = Self::read_file().unwrap_or_default();
        let modules = [SupabaseConfig::module(), AnalyticsConfig::module()];

        let selected = MultiSelect::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptSelectModules.to_string())
            .items(&modules.iter().map(|m| &m.name).collect::<Vec<_>>())
            .defaults(&[true, false])
            .interact()?;

        for index in selected {
            match modules[index].key.as_str() {
                "backend" => config.backend = Some(SupabaseConfig::init(&config.backend)?),
                "analytics" => config.analytics = Some(AnalyticsConfig::init(&config.analytics)?),
                _ => {}
            }
        }
        Ok(config)
    }
}
