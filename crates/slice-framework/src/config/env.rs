//! Environment snapshots.
//!
//! Configuration never reads `std::env` lazily. An [`Env`] is captured once and
//! handed to the configuration objects when they are built, so env-backed
//! defaults are resolved exactly once and tests can inject their own values.

use crate::config::Value;
use std::collections::HashMap;

/// A snapshot of environment variables.
#[derive(Debug, Clone, Default)]
pub struct Env {
    vars: HashMap<String, String>,
}

impl Env {
    /// Captures the current process environment.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Builds a snapshot from explicit pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, var: &str) -> Option<&str> {
        self.vars.get(var).map(String::as_str)
    }
}

/// Parses a comma separated list, trimming each entry.
///
/// Empty entries are dropped and a blank variable counts as unset.
pub fn comma_list(raw: &str) -> Option<Vec<String>> {
    if raw.trim().is_empty() {
        return None;
    }
    Some(
        raw.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// [`comma_list`] as a setting value.
pub fn comma_list_value(raw: &str) -> Value {
    comma_list(raw).map_or(Value::Null, Value::list)
}

/// Env var parser that keeps the raw string.
pub fn string_value(raw: &str) -> Value {
    Value::Str(raw.to_string())
}
