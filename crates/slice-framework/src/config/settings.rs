//! Application settings.
//!
//! Applications may define their own settings (a session secret, a database
//! URL, ...). Each one is read from the upper-cased environment variable of the
//! same name when the settings are loaded, coerced by its constructor, and
//! exposed through the `settings` container key.

use crate::config::{env::string_value, Configuration, Env, Setting, Value};
use crate::error::{ConfigurationError, FrameworkError};
use serde::de::DeserializeOwned;

/// The declared settings of an application, before any value is loaded.
#[derive(Clone, Debug, Default)]
pub struct SettingsDefinition {
    settings: Vec<Setting>,
}

impl SettingsDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a setting read from the env var `NAME.to_uppercase()`.
    pub fn setting(mut self, setting: Setting) -> Self {
        let var = setting.name().to_uppercase();
        self.settings.push(setting.env(var, string_value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    /// Loads values from `env`.
    pub fn load(&self, env: &Env) -> Settings {
        let mut config = Configuration::with_env("settings", env);
        for setting in &self.settings {
            config.declare(setting.clone());
        }
        config.finalize();
        Settings { config }
    }
}

/// Loaded application settings.
#[derive(Clone, Debug)]
pub struct Settings {
    config: Configuration,
}

impl Settings {
    pub fn get(&self, name: &str) -> Result<&Value, ConfigurationError> {
        self.config.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.config.settings()
    }

    /// Deserializes all values into a typed struct.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, FrameworkError> {
        let map: serde_json::Map<String, serde_json::Value> = self
            .config
            .values()
            .map(|(name, value)| (name.to_string(), value.to_json()))
            .collect();
        serde_json::from_value(serde_json::Value::Object(map)).map_err(|e| {
            FrameworkError::Configuration(ConfigurationError::Invalid {
                scope: "settings".into(),
                name: std::any::type_name::<T>().into(),
                reason: e.to_string(),
            })
        })
    }
}
