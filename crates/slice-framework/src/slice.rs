//! # Slices
//!
//! A [`Slice`] is an independently configurable sub-application. It owns:
//!
//! - its own [`Container`], whose parent is the application container, so
//!   anything the application registers is reachable through the slice while
//!   slice registrations (and slice-supplied providers) take precedence;
//! - its own action overrides, layered over the application's live
//!   `config.actions`. Settings the slice never overrides keep following the
//!   application, and overrides made here never touch the application scope.
//!
//! The [`SliceRegistry`] tracks registered slices by name and remembers which
//! ones were skipped by the load/skip lists.

use crate::config::{ActionsConfiguration, ApplicationConfiguration};
use crate::container::{Component, Container};
use crate::error::{ConfigurationError, FrameworkError};
use crate::inflector::{Inflector, SliceName};
use crate::providers::Provider;
use crate::view::{RoutesHelper, View, ViewContext};
use indexmap::IndexMap;
use parking_lot::{RwLock, RwLockReadGuard};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::info;

fn actions_scope(name: &SliceName) -> String {
    format!("actions.{}", name.as_str())
}

/// State every slice shares with its application.
pub(crate) struct AppShared {
    pub(crate) config: RwLock<ApplicationConfiguration>,
    pub(crate) container: Arc<Container>,
}

pub struct Slice {
    name: SliceName,
    container: Arc<Container>,
    overrides: RwLock<ActionsConfiguration>,
    app: Arc<AppShared>,
}

impl Slice {
    pub(crate) fn new(name: SliceName, app: Arc<AppShared>) -> Self {
        let container = Arc::new(Container::with_parent(
            name.as_str(),
            Arc::clone(&app.container),
        ));
        let overrides = ActionsConfiguration::with_scope(actions_scope(&name));
        Self {
            name,
            container,
            overrides: RwLock::new(overrides),
            app,
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn slice_name(&self) -> &SliceName {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        self.name.namespace()
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    pub fn app_container(&self) -> &Arc<Container> {
        &self.app.container
    }

    pub fn application_config(&self) -> RwLockReadGuard<'_, ApplicationConfiguration> {
        self.app.config.read()
    }

    pub fn inflector(&self) -> Inflector {
        self.app.config.read().inflector.clone()
    }

    // --- Actions configuration ---

    /// The slice's effective actions configuration: the application's
    /// current `config.actions` with this slice's overrides on top.
    pub fn actions_config(&self) -> ActionsConfiguration {
        let app = self.app.config.read();
        app.actions
            .layered(actions_scope(&self.name), &self.overrides.read())
    }

    /// Overrides action settings for this slice only. Action bases already
    /// built keep the values they snapshotted. Fails once the application
    /// configuration is finalized, and leaves the overrides untouched when
    /// `configure` fails.
    pub fn configure_actions<F>(&self, configure: F) -> Result<(), FrameworkError>
    where
        F: FnOnce(&mut ActionsConfiguration) -> Result<(), ConfigurationError>,
    {
        let scope = actions_scope(&self.name);
        let app = self.app.config.read();
        app.ensure_writable(&scope)?;

        let mut overrides = self.overrides.write();
        let mut layered = app.actions.layered(scope, &overrides);
        configure(&mut layered)?;
        *overrides = layered;
        Ok(())
    }

    // --- Container ---

    /// True only for keys this slice's own container knows about.
    pub fn key(&self, key: &str) -> bool {
        self.container.key(key)
    }

    pub fn resolve(&self, key: &str) -> Result<Component, FrameworkError> {
        self.container.resolve(key)
    }

    pub fn get<T: Any + Send + Sync + Clone>(&self, key: &str) -> Result<T, FrameworkError> {
        self.container.get(key)
    }

    pub fn register<T: Any + Send + Sync>(
        &self,
        key: impl Into<String>,
        value: T,
    ) -> Result<(), FrameworkError> {
        self.container.register(key, value)
    }

    pub fn register_view(&self, key: impl Into<String>, view: impl View + 'static) -> Result<(), FrameworkError> {
        self.container.register(key, Arc::new(view) as Arc<dyn View>)
    }

    pub fn register_view_context(
        &self,
        key: impl Into<String>,
        context: impl ViewContext + 'static,
    ) -> Result<(), FrameworkError> {
        self.container
            .register(key, Arc::new(context) as Arc<dyn ViewContext>)
    }

    pub fn register_routes(&self, key: impl Into<String>, routes: impl RoutesHelper + 'static) -> Result<(), FrameworkError> {
        self.container
            .register(key, Arc::new(routes) as Arc<dyn RoutesHelper>)
    }

    /// A provider registered here shadows an application provider of the same
    /// name for lookups through this slice.
    pub fn register_provider(&self, provider: Provider) -> Result<(), FrameworkError> {
        self.container.register_provider(provider)
    }

    pub fn boot(&self) -> Result<(), FrameworkError> {
        self.container.boot()
    }

    pub fn shutdown(&self) -> Result<(), FrameworkError> {
        self.container.shutdown()
    }
}

impl fmt::Debug for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<Slice[{}]>", self.name)
    }
}

/// Registered slices, in registration order.
#[derive(Default)]
pub struct SliceRegistry {
    slices: RwLock<IndexMap<String, Arc<Slice>>>,
    skipped: RwLock<Vec<String>>,
}

impl SliceRegistry {
    pub(crate) fn insert(&self, slice: Slice) -> Result<Arc<Slice>, FrameworkError> {
        let mut slices = self.slices.write();
        if slices.contains_key(slice.name()) {
            return Err(FrameworkError::SliceAlreadyRegistered(slice.name().to_string()));
        }
        let slice = Arc::new(slice);
        info!(slice = slice.name(), namespace = slice.namespace(), "Slice registered");
        slices.insert(slice.name().to_string(), Arc::clone(&slice));
        Ok(slice)
    }

    pub(crate) fn skip(&self, name: &str) {
        info!(slice = name, "Slice skipped");
        let mut skipped = self.skipped.write();
        if !skipped.iter().any(|s| s == name) {
            skipped.push(name.to_string());
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Slice>> {
        self.slices.read().get(name).cloned()
    }

    pub fn fetch(&self, name: &str) -> Result<Arc<Slice>, FrameworkError> {
        self.get(name)
            .ok_or_else(|| FrameworkError::SliceNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slices.read().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.slices.read().keys().cloned().collect()
    }

    pub fn skipped(&self) -> Vec<String> {
        self.skipped.read().clone()
    }

    pub fn all(&self) -> Vec<Arc<Slice>> {
        self.slices.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.slices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.read().is_empty()
    }
}

impl fmt::Debug for SliceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SliceRegistry")
            .field("slices", &self.names())
            .field("skipped", &self.skipped())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Env, Value};

    fn shared() -> Arc<AppShared> {
        Arc::new(AppShared {
            config: RwLock::new(ApplicationConfiguration::new("bookshelf", &Env::default())),
            container: Arc::new(Container::new("bookshelf")),
        })
    }

    fn slice(name: &str, app: &Arc<AppShared>) -> Slice {
        Slice::new(SliceName::new(name, &Inflector::new()), Arc::clone(app))
    }

    #[test]
    fn slice_container_falls_back_to_application() {
        let app = shared();
        app.container.register("routes_helper", 1_u8).unwrap();
        let main = slice("main", &app);

        assert!(!main.key("routes_helper"));
        assert_eq!(main.get::<u8>("routes_helper").unwrap(), 1);
    }

    #[test]
    fn slice_overrides_do_not_leak_into_application() {
        let app = shared();
        let admin = slice("admin", &app);
        admin
            .configure_actions(|actions| actions.set_sessions("cookie"))
            .unwrap();

        assert!(admin.actions_config().sessions_enabled());
        assert!(!app.config.read().actions.sessions_enabled());
    }

    #[test]
    fn later_application_settings_reach_registered_slices() {
        let app = shared();
        let main = slice("main", &app);
        let admin = slice("admin", &app);
        admin
            .configure_actions(|actions| actions.set_default_charset("latin1"))
            .unwrap();

        {
            let mut config = app.config.write();
            config.actions.set_sessions("cookie").unwrap();
            config.actions.set_default_charset("utf-16").unwrap();
        }

        assert!(main.actions_config().sessions_enabled());
        assert!(admin.actions_config().sessions_enabled());
        assert_eq!(main.actions_config().default_charset(), &Value::from("utf-16"));
        assert_eq!(admin.actions_config().default_charset(), &Value::from("latin1"));
    }

    #[test]
    fn failed_configure_leaves_overrides_untouched() {
        let app = shared();
        let admin = slice("admin", &app);
        let err = admin
            .configure_actions(|actions| {
                actions.set_sessions("cookie")?;
                actions.set_sessions(Value::Int(1))
            })
            .unwrap_err();

        assert!(err.is_misconfiguration());
        assert!(!admin.actions_config().sessions_enabled());
    }

    #[test]
    fn slice_actions_are_read_only_once_application_is_finalized() {
        let app = shared();
        let admin = slice("admin", &app);
        app.config.write().finalize();

        let err = admin
            .configure_actions(|actions| actions.set_sessions("cookie"))
            .unwrap_err();
        assert!(matches!(
            err,
            FrameworkError::Configuration(ConfigurationError::Finalized { .. })
        ));
        assert!(!admin.actions_config().sessions_enabled());
        assert!(admin.actions_config().is_finalized());
    }

    #[test]
    fn slice_provider_shadows_application_provider() {
        let app = shared();
        app.container
            .register_provider(Provider::new("logger").start(|c| c.register("logger", "app".to_string())))
            .unwrap();
        let admin = slice("admin", &app);
        admin
            .register_provider(Provider::new("logger").start(|c| c.register("logger", "admin".to_string())))
            .unwrap();

        assert_eq!(admin.get::<String>("logger").unwrap(), "admin");
        assert_eq!(app.container.get::<String>("logger").unwrap(), "app");
    }

    #[test]
    fn registry_rejects_duplicates() {
        let app = shared();
        let registry = SliceRegistry::default();
        registry.insert(slice("main", &app)).unwrap();
        assert!(matches!(
            registry.insert(slice("main", &app)),
            Err(FrameworkError::SliceAlreadyRegistered(_))
        ));
        assert!(matches!(
            registry.fetch("admin"),
            Err(FrameworkError::SliceNotFound(_))
        ));
        assert_eq!(format!("{:?}", registry.fetch("main").unwrap()), "#<Slice[main]>");
    }
}
