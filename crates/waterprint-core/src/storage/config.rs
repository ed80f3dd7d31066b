//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Challenge length
//! - Trailing window for the daily savings chart
//! - Reminder settings
//! - Ledger behavior
//! - Category cap overrides and extra categories
//!
//! Configuration is stored at `~/.config/waterprint/config.toml`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::catalog::{CategoryCatalog, CategoryId, CategoryInfo};
use crate::challenge::{ChallengeProgressTracker, DEFAULT_DURATION_DAYS, MAX_DURATION_DAYS};
use crate::error::{ConfigError, Result};
use crate::ledger::{LedgerConfig, WaterFootprintLedger, MAX_WINDOW_DAYS};

/// Challenge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeConfig {
    #[serde(default = "default_duration_days")]
    pub duration_days: u32,
}

/// History chart configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_trailing_days")]
    pub trailing_days: u32,
}

/// Reminder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Remind once at least this many tasks are pending.
    #[serde(default = "default_min_pending_tasks")]
    pub min_pending_tasks: usize,
}

/// Override or addition for one catalog category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryOverride {
    pub daily_cap: f64,
    pub descriptor: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/waterprint/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub challenge: ChallengeConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub catalog: BTreeMap<String, CategoryOverride>,
}

fn default_duration_days() -> u32 {
    DEFAULT_DURATION_DAYS
}
fn default_trailing_days() -> u32 {
    7
}
fn default_true() -> bool {
    true
}
fn default_min_pending_tasks() -> usize {
    1
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            duration_days: default_duration_days(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            trailing_days: default_trailing_days(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_pending_tasks: default_min_pending_tasks(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            challenge: ChallengeConfig::default(),
            history: HistoryConfig::default(),
            notifications: NotificationsConfig::default(),
            ledger: LedgerConfig::default(),
            catalog: BTreeMap::new(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return (and write) the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                ConfigError::LoadFailed {
                    path,
                    message: e.to_string(),
                }
                .into()
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Update a value in memory by dot-separated key, keeping its type.
    ///
    /// Day counts are range-checked; a rejected value leaves `self` as is.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let next: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        next.validate()?;
        *self = next;
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let duration = self.challenge.duration_days;
        if !(1..=MAX_DURATION_DAYS).contains(&duration) {
            return Err(ConfigError::InvalidValue {
                key: "challenge.duration_days".into(),
                message: format!("{duration} is outside 1..={MAX_DURATION_DAYS}"),
            });
        }
        let trailing = self.history.trailing_days;
        if trailing > MAX_WINDOW_DAYS {
            return Err(ConfigError::InvalidValue {
                key: "history.trailing_days".into(),
                message: format!("{trailing} exceeds {MAX_WINDOW_DAYS}"),
            });
        }
        Ok(())
    }

    /// Set a config value by key and save. Returns error if key is unknown.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.apply(key, value)?;
        self.save()
    }

    /// Built-in catalog with this config's overrides merged in.
    pub fn catalog(&self) -> CategoryCatalog {
        CategoryCatalog::builtin().with_overrides(self.catalog.iter().map(|(id, o)| {
            (
                CategoryId::from(id.as_str()),
                CategoryInfo::new(o.daily_cap, o.descriptor.clone()),
            )
        }))
    }

    pub fn tracker(&self) -> ChallengeProgressTracker {
        ChallengeProgressTracker::new(self.catalog(), self.challenge.duration_days)
    }

    pub fn ledger(&self) -> WaterFootprintLedger {
        WaterFootprintLedger::with_config(self.ledger.clone())
    }

    /// Whether the notification layer should remind the user.
    pub fn reminder_due(&self, pending_tasks: usize) -> bool {
        self.notifications.enabled && pending_tasks >= self.notifications.min_pending_tasks.max(1)
    }
}
