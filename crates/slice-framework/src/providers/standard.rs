//! The standard providers every application starts with.
//!
//! They are registered when the application is prepared, unless a provider of
//! the same name was registered first, in which case the custom one is kept.

use crate::config::{ApplicationConfiguration, Env, LoggerConfiguration, SettingsDefinition};
use crate::inflector::Inflector;
use crate::providers::{Logger, Monitor, Provider};

pub const LOGGER: &str = "logger";
pub const INFLECTOR: &str = "inflector";
pub const SETTINGS: &str = "settings";
pub const RACK_MONITOR: &str = "rack.monitor";
pub const ROUTES_HELPER: &str = "routes_helper";

pub fn logger(app_name: String, config: LoggerConfiguration) -> Provider {
    Provider::new(LOGGER).start(move |target| {
        let logger = Logger::from_config(&app_name, &config)?;
        target.register(LOGGER, logger)
    })
}

pub fn inflector(inflector: Inflector) -> Provider {
    Provider::new(INFLECTOR).start(move |target| target.register(INFLECTOR, inflector.clone()))
}

pub fn settings(definition: SettingsDefinition, env: Env) -> Provider {
    Provider::new(SETTINGS).start(move |target| target.register(SETTINGS, definition.load(&env)))
}

pub fn rack_monitor() -> Provider {
    Provider::new(RACK_MONITOR).start(|target| target.register(RACK_MONITOR, Monitor::new()))
}

/// Standard providers for `config`, in boot order. `settings` is included only
/// when the application defines settings.
pub fn all(config: &ApplicationConfiguration) -> Vec<Provider> {
    let mut providers = vec![
        logger(config.app_name.to_string(), config.logger.clone()),
        inflector(config.inflector.clone()),
    ];
    if let Some(definition) = config.settings.as_ref().filter(|d| !d.is_empty()) {
        providers.push(settings(definition.clone(), config.source_env().clone()));
    }
    providers.push(rack_monitor());
    providers
}
