use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::window::TimeWindow;

/// The user's frequency and level targets.
///
/// `*_per_week` targets are scaled by `days / 7`, `*_per_month` by
/// `days / 30`. The remaining targets are absolute levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoalTargets {
    pub family_contact_days_per_week: f64,
    pub friend_contact_days_per_week: f64,
    pub social_events_per_month: f64,
    pub new_contacts_per_month: f64,
    pub meditation_days_per_week: f64,
    pub gratitude_days_per_week: f64,
    pub journal_days_per_week: f64,
    pub mood_target: f64,
    pub energy_target: f64,
    pub sleep_hours_target: f64,
    pub alcohol_free_days_per_week: f64,
    pub strength_days_per_week: f64,
    pub cardio_days_per_week: f64,
    pub weekly_cardio_load_target: f64,
    pub deep_work_days_per_week: f64,
    pub reading_days_per_week: f64,
    pub learning_days_per_week: f64,
}

impl Default for GoalTargets {
    fn default() -> Self {
        Self {
            family_contact_days_per_week: 3.0,
            friend_contact_days_per_week: 2.0,
            social_events_per_month: 2.0,
            new_contacts_per_month: 4.0,
            meditation_days_per_week: 5.0,
            gratitude_days_per_week: 5.0,
            journal_days_per_week: 4.0,
            mood_target: 7.0,
            energy_target: 7.0,
            sleep_hours_target: 8.0,
            alcohol_free_days_per_week: 5.0,
            strength_days_per_week: 3.0,
            cardio_days_per_week: 3.0,
            weekly_cardio_load_target: 150.0,
            deep_work_days_per_week: 5.0,
            reading_days_per_week: 4.0,
            learning_days_per_week: 3.0,
        }
    }
}

/// Application configuration, stored as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub targets: GoalTargets,
    /// Window used when none is given on the command line.
    pub default_window: String,
    /// Dataset export to read when `--data` is not given.
    pub data_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            targets: GoalTargets::default(),
            default_window: "30d".to_string(),
            data_path: None,
        }
    }
}

impl Config {
    /// Directory holding the config and default dataset (`~/.lifetrack`).
    pub fn home_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| Error::Config("cannot determine home directory".into()))?
            .join(".lifetrack"))
    }

    /// Default config path (`~/.lifetrack/config.json`).
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join("config.json"))
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw)?;
        config.window()?;
        Ok(config)
    }

    /// Write to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// The configured default window.
    pub fn window(&self) -> Result<TimeWindow> {
        TimeWindow::parse(&self.default_window)
    }

    /// Resolved dataset path: the configured one, else `~/.lifetrack/data.json`.
    pub fn data_path(&self) -> Result<PathBuf> {
        match &self.data_path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Ok(Self::home_dir()?.join("data.json")),
        }
    }

    /// Every setting as a dotted key and its display value, sorted by key.
    pub fn list(&self) -> Result<Vec<(String, String)>> {
        let mut out = Vec::new();
        flatten("", &serde_json::to_value(self)?, &mut out);
        out.sort();
        Ok(out)
    }

    /// Value of a dotted key (e.g. `targets.mood_target`), `None` when unset.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let root = serde_json::to_value(self)?;
        match lookup(&root, key) {
            Some(Value::Null) => Ok(None),
            Some(v) => Ok(Some(display_value(v))),
            None => Err(Error::Config(format!("unknown config key: {key}"))),
        }
    }

    /// Set a dotted key, validating the value against the key's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut root = serde_json::to_value(&*self)?;
        let slot = lookup_mut(&mut root, key)
            .ok_or_else(|| Error::Config(format!("unknown config key: {key}")))?;

        let replacement = match &*slot {
            Value::Number(_) => {
                let n: f64 = value
                    .trim()
                    .parse()
                    .map_err(|_| Error::Config(format!("{key} expects a number, got '{value}'")))?;
                if !n.is_finite() || n < 0.0 {
                    return Err(Error::Config(format!(
                        "{key} must be a non-negative number, got '{value}'"
                    )));
                }
                Value::from(n)
            }
            Value::Object(_) => {
                return Err(Error::Config(format!("{key} is a section, not a value")));
            }
            _ if key == "data_path" && value.trim().is_empty() => Value::Null,
            _ => Value::String(value.to_string()),
        };
        *slot = replacement;

        let updated: Config = serde_json::from_value(root)?;
        updated.window()?;
        *self = updated;
        Ok(())
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                let key = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{prefix}.{k}")
                };
                flatten(&key, v, out);
            }
        }
        other => out.push((prefix.to_string(), display_value(other))),
    }
}

fn lookup<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.').try_fold(root, |node, part| node.get(part))
}

fn lookup_mut<'a>(root: &'a mut Value, key: &str) -> Option<&'a mut Value> {
    key.split('.').try_fold(root, |node, part| node.get_mut(part))
}

fn display_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
