//! Actions configuration.
//!
//! [`ActionsConfiguration`] is the application-level `config.actions` scope.
//! It declares every generic action setting ([`ACTION_SETTINGS`]) plus the
//! application-only toggles (`sessions`, `csrf_protection`) and the view
//! inference bases.
//!
//! [`ActionConfiguration`] is the per-slice snapshot held by an action base. It
//! declares only the generic settings and is filled field by field from the
//! actions scope by [`ActionConfiguration::inherit`].

use crate::action::{StandardViewNameInferrer, ViewNameInferrer};
use crate::config::{Configuration, Setting, Value};
use crate::error::ConfigurationError;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Settings declared on the generic action configuration template, in order.
pub const ACTION_SETTINGS: [&str; 8] = [
    "formats",
    "default_request_format",
    "default_response_format",
    "default_charset",
    "default_headers",
    "cookies",
    "view_name_inferrer",
    "view_context_identifier",
];

/// Default container key of the view context.
pub const DEFAULT_VIEW_CONTEXT_IDENTIFIER: &str = "view.context";

macro_rules! setting_accessors {
    ($($name:ident),* $(,)?) => {
        paste::paste! {
            $(
                #[doc = concat!("Current value of `", stringify!($name), "`.")]
                pub fn $name(&self) -> &Value {
                    self.config.value_or_null(stringify!($name))
                }

                #[doc = concat!("Sets `", stringify!($name), "`.")]
                pub fn [<set_ $name>](
                    &mut self,
                    value: impl Into<Value>,
                ) -> Result<(), ConfigurationError> {
                    self.config.set(stringify!($name), value)
                }
            )*
        }
    };
}

fn string_list(value: Value) -> Result<Value, String> {
    match value {
        Value::Str(s) => Ok(Value::list([s])),
        Value::List(items) if items.iter().all(|v| v.as_str().is_some()) => Ok(Value::List(items)),
        other => Err(format!("expected a list of strings, got {other:?}")),
    }
}

fn optional_string(value: Value) -> Result<Value, String> {
    match value {
        Value::Null | Value::Str(_) => Ok(value),
        other => Err(format!("expected a string, got {other:?}")),
    }
}

fn headers(value: Value) -> Result<Value, String> {
    match value {
        Value::Null => Ok(Value::empty_map()),
        Value::Map(map) if map.values().all(|v| v.as_str().is_some()) => Ok(Value::Map(map)),
        other => Err(format!("expected a map of header strings, got {other:?}")),
    }
}

/// `nil`/`false` disable cookies, `true` enables them with no options.
fn cookie_options(value: Value) -> Result<Value, String> {
    match value {
        Value::Null | Value::Bool(false) => Ok(Value::Null),
        Value::Bool(true) => Ok(Value::empty_map()),
        Value::Map(map) => Ok(Value::Map(map)),
        other => Err(format!("expected cookie options, got {other:?}")),
    }
}

/// A store name (`"cookie"`) or a map with a `store` entry enables sessions.
fn session_options(value: Value) -> Result<Value, String> {
    match value {
        Value::Null | Value::Bool(false) => Ok(Value::Null),
        Value::Str(store) => {
            let mut map = BTreeMap::new();
            map.insert("store".to_string(), Value::Str(store));
            Ok(Value::Map(map))
        }
        Value::Map(map) if map.get("store").and_then(Value::as_str).is_some() => Ok(Value::Map(map)),
        other => Err(format!("expected a session store, got {other:?}")),
    }
}

fn tri_state(value: Value) -> Result<Value, String> {
    match value {
        Value::Null | Value::Bool(_) => Ok(value),
        other => Err(format!("expected true, false or nil, got {other:?}")),
    }
}

fn inferrer(value: Value) -> Result<Value, String> {
    match value {
        Value::Inferrer(_) => Ok(value),
        other => Err(format!("expected a view name inferrer, got {other:?}")),
    }
}

fn declare_generic(config: &mut Configuration) {
    let default_inferrer: Arc<dyn ViewNameInferrer> = Arc::new(StandardViewNameInferrer);
    config
        .declare(
            Setting::new("formats")
                .with_default(Value::list(["html", "json"]))
                .constructor(string_list),
        )
        .declare(Setting::new("default_request_format").constructor(optional_string))
        .declare(Setting::new("default_response_format").constructor(optional_string))
        .declare(
            Setting::new("default_charset")
                .with_default("utf-8")
                .constructor(optional_string),
        )
        .declare(
            Setting::new("default_headers")
                .with_default(Value::empty_map())
                .constructor(headers),
        )
        .declare(
            Setting::new("cookies")
                .with_default(Value::empty_map())
                .constructor(cookie_options),
        )
        .declare(
            Setting::new("view_name_inferrer")
                .with_default(default_inferrer)
                .constructor(inferrer),
        )
        .declare(
            Setting::new("view_context_identifier")
                .with_default(DEFAULT_VIEW_CONTEXT_IDENTIFIER)
                .constructor(optional_string),
        );
}

/// The application's `config.actions` scope.
#[derive(Clone, Debug)]
pub struct ActionsConfiguration {
    config: Configuration,
}

impl Default for ActionsConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionsConfiguration {
    pub fn new() -> Self {
        Self::with_scope("actions")
    }

    pub(crate) fn with_scope(scope: impl Into<String>) -> Self {
        let mut config = Configuration::new(scope);
        declare_generic(&mut config);
        config
            .declare(Setting::new("sessions").constructor(session_options))
            .declare(Setting::new("csrf_protection").constructor(tri_state))
            .declare_setting("name_inference_base", "actions")
            .declare_setting("view_name_inference_base", "views");
        Self { config }
    }

    setting_accessors!(
        formats,
        default_request_format,
        default_response_format,
        default_charset,
        default_headers,
        cookies,
        view_name_inferrer,
        view_context_identifier,
        sessions,
        csrf_protection,
        name_inference_base,
        view_name_inference_base,
    );

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Configuration {
        &mut self.config
    }

    pub fn sessions_enabled(&self) -> bool {
        !self.sessions().is_null()
    }

    /// An unset value follows [`sessions_enabled`](Self::sessions_enabled).
    pub fn csrf_protection_enabled(&self) -> bool {
        self.csrf_protection()
            .as_bool()
            .unwrap_or_else(|| self.sessions_enabled())
    }

    pub fn cookies_enabled(&self) -> bool {
        !self.cookies().is_null()
    }

    /// A writable child scope starting from a snapshot of this one.
    ///
    /// Slices use this to override application-wide action settings without
    /// touching the application's own scope.
    pub fn child(&self, scope: impl Into<String>) -> Self {
        let template = Self::with_scope(scope);
        Self {
            config: template.config.copy_from(&self.config),
        }
    }

    /// A child scope named `scope` with the settings `overrides` assigned
    /// explicitly applied on top. Everything else follows this scope's current
    /// values. The result is finalized when this scope is.
    pub fn layered(&self, scope: impl Into<String>, overrides: &ActionsConfiguration) -> Self {
        let mut config = self.child(scope).config.overlay(&overrides.config);
        if self.is_finalized() {
            config.finalize();
        }
        Self { config }
    }

    pub fn is_finalized(&self) -> bool {
        self.config.is_finalized()
    }

    pub fn finalize(&mut self) {
        self.config.finalize();
    }
}

/// The per-slice action configuration held by an action base.
#[derive(Clone, Debug)]
pub struct ActionConfiguration {
    config: Configuration,
}

impl ActionConfiguration {
    /// The generic template with compiled-in defaults.
    pub fn template(scope: impl Into<String>) -> Self {
        let mut config = Configuration::new(scope);
        declare_generic(&mut config);
        Self { config }
    }

    /// Copies every template setting from the actions scope, one field at a time.
    pub fn inherit(
        scope: impl Into<String>,
        actions: &ActionsConfiguration,
    ) -> Result<Self, ConfigurationError> {
        let mut inherited = Self::template(scope);
        let names: Vec<String> = inherited.config.settings().map(str::to_string).collect();
        for name in names {
            let value = actions.config.get(&name)?.clone();
            inherited.config.set(&name, value)?;
        }
        Ok(inherited)
    }

    setting_accessors!(
        formats,
        default_request_format,
        default_response_format,
        default_charset,
        default_headers,
        cookies,
        view_name_inferrer,
        view_context_identifier,
    );

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn inferrer(&self) -> Arc<dyn ViewNameInferrer> {
        self.view_name_inferrer()
            .as_inferrer()
            .unwrap_or_else(|| Arc::new(StandardViewNameInferrer))
    }

    pub fn context_identifier(&self) -> Option<&str> {
        self.view_context_identifier().as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csrf_follows_sessions_until_set() {
        let mut actions = ActionsConfiguration::new();
        assert!(!actions.csrf_protection_enabled());

        actions.set_sessions("cookie").unwrap();
        assert!(actions.sessions_enabled());
        assert!(actions.csrf_protection_enabled());

        actions.set_csrf_protection(false).unwrap();
        assert!(!actions.csrf_protection_enabled());
    }

    #[test]
    fn child_scope_is_independent_and_keeps_csrf_unset() {
        let mut actions = ActionsConfiguration::new();
        actions.set_default_charset("latin1").unwrap();
        actions.finalize();
        assert!(actions.set_sessions(Value::Null).is_err());

        let mut child = actions.child("actions.admin");
        assert_eq!(child.default_charset(), &Value::from("latin1"));
        child.set_sessions("cookie").unwrap();
        assert!(child.csrf_protection_enabled());
        assert!(!actions.sessions_enabled());
    }

    #[test]
    fn layered_scope_follows_parent_until_overridden() {
        let mut actions = ActionsConfiguration::new();
        let mut overrides = ActionsConfiguration::with_scope("actions.admin");
        overrides.set_default_charset("latin1").unwrap();

        actions.set_sessions("cookie").unwrap();
        actions.set_default_charset("utf-16").unwrap();
        let layered = actions.layered("actions.admin", &overrides);
        assert!(layered.sessions_enabled());
        assert_eq!(layered.default_charset(), &Value::from("latin1"));
        assert!(!layered.is_finalized());

        actions.finalize();
        assert!(actions.layered("actions.admin", &overrides).is_finalized());
    }

    #[test]
    fn cookies_enabled_by_default_and_disabled_by_false() {
        let mut actions = ActionsConfiguration::new();
        assert!(actions.cookies_enabled());
        actions.set_cookies(false).unwrap();
        assert!(!actions.cookies_enabled());
    }

    #[test]
    fn invalid_session_store_is_rejected() {
        let mut actions = ActionsConfiguration::new();
        let err = actions.set_sessions(Value::Int(1)).unwrap_err();
        assert!(matches!(err, ConfigurationError::Invalid { .. }));
    }

    #[test]
    fn inherit_snapshots_generic_settings_only() {
        let mut actions = ActionsConfiguration::new();
        actions.set_default_response_format("json").unwrap();
        actions.set_sessions("cookie").unwrap();

        let inherited = ActionConfiguration::inherit("actions.main", &actions).unwrap();
        assert_eq!(inherited.default_response_format(), &Value::from("json"));
        assert!(inherited.config().get("sessions").is_err());

        actions.set_default_response_format("html").unwrap();
        assert_eq!(inherited.default_response_format(), &Value::from("json"));
    }
}
