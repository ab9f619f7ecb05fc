//! Slice load/skip lists.

use crate::config::env::comma_list_value;
use crate::config::{Configuration, Env, Setting, Value};
use crate::error::ConfigurationError;

pub const LOAD_SLICES_ENV: &str = "HANAMI_LOAD_SLICES";
pub const SKIP_SLICES_ENV: &str = "HANAMI_SKIP_SLICES";

fn name_list(value: Value) -> Result<Value, String> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Str(raw) => Ok(comma_list_value(&raw)),
        Value::List(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Str(name) => Ok(Value::Str(name.trim().to_string())),
                other => Err(format!("expected a slice name, got {other:?}")),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        other => Err(format!("expected a list of slice names, got {other:?}")),
    }
}

/// The application's `config.slices` scope.
///
/// Both lists are plain names; nothing here checks them against the slices
/// that actually get registered.
#[derive(Clone, Debug)]
pub struct SlicesConfiguration {
    config: Configuration,
}

impl SlicesConfiguration {
    pub fn new(env: &Env) -> Self {
        let mut config = Configuration::with_env("slices", env);
        config
            .declare(
                Setting::new("load_slices")
                    .env(LOAD_SLICES_ENV, comma_list_value)
                    .constructor(name_list),
            )
            .declare(
                Setting::new("skip_slices")
                    .env(SKIP_SLICES_ENV, comma_list_value)
                    .constructor(name_list),
            );
        Self { config }
    }

    pub fn load_slices(&self) -> Option<Vec<String>> {
        self.config.value_or_null("load_slices").to_string_list()
    }

    pub fn skip_slices(&self) -> Option<Vec<String>> {
        self.config.value_or_null("skip_slices").to_string_list()
    }

    pub fn set_load_slices<S: Into<String>>(
        &mut self,
        names: Option<Vec<S>>,
    ) -> Result<(), ConfigurationError> {
        let value = names.map_or(Value::Null, |names| {
            Value::list(names.into_iter().map(Into::into).collect::<Vec<String>>())
        });
        self.config.set("load_slices", value)
    }

    pub fn set_skip_slices<S: Into<String>>(
        &mut self,
        names: Option<Vec<S>>,
    ) -> Result<(), ConfigurationError> {
        let value = names.map_or(Value::Null, |names| {
            Value::list(names.into_iter().map(Into::into).collect::<Vec<String>>())
        });
        self.config.set("skip_slices", value)
    }

    /// Whether a slice with this name should load.
    ///
    /// A name must be in `load_slices` when that list is set, and must not be in
    /// `skip_slices`. A name in both lists is skipped.
    pub fn is_loadable(&self, name: &str) -> bool {
        let listed = self
            .load_slices()
            .map_or(true, |names| names.iter().any(|n| n == name));
        let skipped = self
            .skip_slices()
            .is_some_and(|names| names.iter().any(|n| n == name));
        listed && !skipped
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn finalize(&mut self) {
        self.config.finalize();
    }
}
