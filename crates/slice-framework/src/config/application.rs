//! Application-level configuration: the root of the configuration tree.

use crate::config::{ActionsConfiguration, Env, SettingsDefinition, SlicesConfiguration};
use crate::error::ConfigurationError;
use crate::inflector::{Inflector, SliceName};

pub const ENV_VAR: &str = "HANAMI_ENV";
pub const DEFAULT_ENV: &str = "development";

/// Logger settings consumed by the standard `logger` provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfiguration {
    /// One of `trace`, `debug`, `info`, `warn`, `error`.
    pub level: String,
}

impl LoggerConfiguration {
    fn for_env(env: &str) -> Self {
        let level = if env == "production" { "info" } else { "debug" };
        Self {
            level: level.to_string(),
        }
    }
}

/// The root configuration owned by an [`Application`](crate::Application).
///
/// Writable until the application is prepared; [`finalize`](Self::finalize)
/// freezes the nested scopes.
#[derive(Debug, Clone)]
pub struct ApplicationConfiguration {
    pub app_name: SliceName,
    pub env: String,
    pub slices: SlicesConfiguration,
    pub actions: ActionsConfiguration,
    pub logger: LoggerConfiguration,
    pub settings: Option<SettingsDefinition>,
    pub inflector: Inflector,
    source_env: Env,
    finalized: bool,
}

impl ApplicationConfiguration {
    pub fn new(app_name: &str, env: &Env) -> Self {
        let inflector = Inflector::new();
        let app_env = env.get(ENV_VAR).unwrap_or(DEFAULT_ENV).to_string();
        Self {
            app_name: SliceName::new(app_name, &inflector),
            logger: LoggerConfiguration::for_env(&app_env),
            env: app_env,
            slices: SlicesConfiguration::new(env),
            actions: ActionsConfiguration::new(),
            settings: None,
            inflector,
            source_env: env.clone(),
            finalized: false,
        }
    }

    /// The environment snapshot the configuration was built from.
    pub fn source_env(&self) -> &Env {
        &self.source_env
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub(crate) fn ensure_writable(&self, name: &str) -> Result<(), ConfigurationError> {
        if self.finalized {
            return Err(ConfigurationError::Finalized {
                scope: "application".into(),
                name: name.into(),
            });
        }
        Ok(())
    }

    pub fn finalize(&mut self) {
        self.actions.finalize();
        self.slices.finalize();
        self.finalized = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_defaults_to_development() {
        let config = ApplicationConfiguration::new("Bookshelf::App", &Env::default());
        assert_eq!(config.env, "development");
        assert_eq!(config.logger.level, "debug");
        assert_eq!(config.app_name.as_str(), "bookshelf");
    }

    #[test]
    fn production_logs_at_info() {
        let env = Env::from_pairs([(ENV_VAR, "production")]);
        let config = ApplicationConfiguration::new("bookshelf", &env);
        assert_eq!(config.logger.level, "info");
    }

    #[test]
    fn finalize_freezes_nested_scopes() {
        let mut config = ApplicationConfiguration::new("bookshelf", &Env::default());
        config.finalize();
        assert!(config.actions.set_default_charset("latin1").is_err());
        assert!(config.slices.set_load_slices(Some(vec!["main"])).is_err());
        assert!(config.ensure_writable("settings").is_err());
    }
}
