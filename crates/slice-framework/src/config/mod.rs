//! # Configuration Tree
//!
//! Layered settings objects. The application owns the root scopes
//! ([`ApplicationConfiguration`]); each slice layers its own action overrides
//! over the application's actions configuration, and each action base keeps a
//! [`Configuration`] snapshot copied down from that layered scope.
//!
//! ## Layering
//!
//! A setting's initial value is resolved once, when it is declared:
//!
//! 1. the environment variable named by [`Setting::env`], if present and parseable,
//! 2. otherwise the compiled-in default.
//!
//! An explicit [`Configuration::set`] always wins over both.
//!
//! ## Copy-down
//!
//! [`Configuration::copy_from`] builds a new scope from a template and a parent.
//! Values are cloned, never shared, so mutating the child leaves the parent untouched.
//!
//! ## Overlays
//!
//! A scope remembers which settings were explicitly [`set`](Configuration::set).
//! [`Configuration::overlay`] applies only those assignments on top of another
//! scope, so unassigned settings keep following the base.

pub mod actions;
pub mod application;
pub mod env;
pub mod settings;
pub mod slices;
pub mod value;

pub use actions::{ActionConfiguration, ActionsConfiguration, ACTION_SETTINGS};
pub use application::{ApplicationConfiguration, LoggerConfiguration};
pub use env::Env;
pub use settings::{Settings, SettingsDefinition};
pub use slices::SlicesConfiguration;
pub use value::Value;

use crate::error::ConfigurationError;
use indexmap::{IndexMap, IndexSet};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Coercion/validation applied to every value written with [`Configuration::set`].
pub type Constructor = Arc<dyn Fn(Value) -> Result<Value, String> + Send + Sync>;

/// Parser for an environment-backed default.
pub type EnvParser = fn(&str) -> Value;

/// A declared setting: name, default, optional constructor and env source.
#[derive(Clone)]
pub struct Setting {
    name: String,
    default: Value,
    constructor: Option<Constructor>,
    env: Option<(String, EnvParser)>,
}

impl Setting {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: Value::Null,
            constructor: None,
            env: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self
    }

    pub fn constructor(
        mut self,
        f: impl Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    ) -> Self {
        self.constructor = Some(Arc::new(f));
        self
    }

    /// Reads the initial value from `var` when it is set.
    pub fn env(mut self, var: impl Into<String>, parse: EnvParser) -> Self {
        self.env = Some((var.into(), parse));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    fn initial_value(&self, scope: &str, env: &Env) -> Value {
        let from_env = self
            .env
            .as_ref()
            .and_then(|(var, parse)| env.get(var).map(parse))
            .filter(|v| !v.is_null());

        let Some(raw) = from_env else {
            return self.default.clone();
        };
        match &self.constructor {
            None => raw,
            Some(construct) => construct(raw).unwrap_or_else(|reason| {
                warn!(scope, setting = %self.name, %reason, "Ignoring invalid env value");
                self.default.clone()
            }),
        }
    }
}

impl fmt::Debug for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setting")
            .field("name", &self.name)
            .field("default", &self.default)
            .field("env", &self.env.as_ref().map(|(var, _)| var))
            .finish()
    }
}

/// An ordered set of declared settings and their current values.
#[derive(Clone, Debug)]
pub struct Configuration {
    scope: String,
    env: Arc<Env>,
    settings: IndexMap<String, Setting>,
    values: IndexMap<String, Value>,
    assigned: IndexSet<String>,
    finalized: bool,
}

impl Configuration {
    /// A scope with no environment layer.
    pub fn new(scope: impl Into<String>) -> Self {
        Self::with_env(scope, &Env::default())
    }

    /// A scope whose env-backed settings resolve against `env`.
    pub fn with_env(scope: impl Into<String>, env: &Env) -> Self {
        Self {
            scope: scope.into(),
            env: Arc::new(env.clone()),
            settings: IndexMap::new(),
            values: IndexMap::new(),
            assigned: IndexSet::new(),
            finalized: false,
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Declares (or redeclares) a setting and resolves its initial value.
    pub fn declare(&mut self, setting: Setting) -> &mut Self {
        let value = setting.initial_value(&self.scope, &self.env);
        self.values.insert(setting.name.clone(), value);
        self.settings.insert(setting.name.clone(), setting);
        self
    }

    pub fn declare_setting(&mut self, name: &str, default: impl Into<Value>) -> &mut Self {
        self.declare(Setting::new(name).with_default(default))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.settings.contains_key(name)
    }

    /// Declared setting names, in declaration order.
    pub fn settings(&self) -> impl Iterator<Item = &str> {
        self.settings.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Result<&Value, ConfigurationError> {
        self.values.get(name).ok_or_else(|| ConfigurationError::Undeclared {
            scope: self.scope.clone(),
            name: name.to_string(),
        })
    }

    /// Like [`get`](Self::get) for names the caller declared itself.
    pub(crate) fn value_or_null(&self, name: &str) -> &Value {
        const NULL: &Value = &Value::Null;
        self.values.get(name).unwrap_or(NULL)
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ConfigurationError> {
        let setting = self
            .settings
            .get(name)
            .ok_or_else(|| ConfigurationError::Undeclared {
                scope: self.scope.clone(),
                name: name.to_string(),
            })?;
        if self.finalized {
            return Err(ConfigurationError::Finalized {
                scope: self.scope.clone(),
                name: name.to_string(),
            });
        }

        let value = value.into();
        let value = match &setting.constructor {
            Some(construct) => construct(value).map_err(|reason| ConfigurationError::Invalid {
                scope: self.scope.clone(),
                name: name.to_string(),
                reason,
            })?,
            None => value,
        };
        self.values.insert(name.to_string(), value);
        self.assigned.insert(name.to_string());
        Ok(())
    }

    /// True once `name` has been written with [`set`](Self::set) in this scope.
    pub fn is_assigned(&self, name: &str) -> bool {
        self.assigned.contains(name)
    }

    /// Builds a new scope with this template's declarations and the parent's
    /// values for every name both declare. Settings only the template declares
    /// keep their own current value. The copy is never finalized.
    pub fn copy_from(&self, parent: &Configuration) -> Configuration {
        let mut child = self.clone();
        child.finalized = false;
        child.assigned.clear();
        for name in self.settings.keys() {
            if let Some(value) = parent.values.get(name) {
                child.values.insert(name.clone(), value.clone());
            }
        }
        child
    }

    /// A copy of this scope with every value `overrides` assigned explicitly
    /// applied on top. Names this scope does not declare are ignored. The
    /// applied names count as assigned in the result.
    pub fn overlay(&self, overrides: &Configuration) -> Configuration {
        let mut layered = self.clone();
        layered.assigned.clear();
        for name in overrides.assigned.iter().filter(|name| self.contains(name)) {
            if let Some(value) = overrides.values.get(name) {
                layered.values.insert(name.clone(), value.clone());
                layered.assigned.insert(name.clone());
            }
        }
        layered
    }

    /// Freezes the values. Further `set` calls fail.
    pub fn finalize(&mut self) {
        self.finalized = true;
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Current `(name, value)` pairs in declaration order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}
