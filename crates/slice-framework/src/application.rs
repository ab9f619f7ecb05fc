//! # Application
//!
//! The [`Application`] is the root of a composed app. It owns the
//! configuration tree, the application container, the slice registry and the
//! action base registry, and it sequences start-up:
//!
//! ```text
//! configure → register providers/slices → prepare → boot → shutdown
//! ```
//!
//! - **prepare** finalizes configuration and registers the standard providers
//!   (`logger`, `inflector`, `settings` when defined, `rack.monitor`), keeping
//!   any provider of the same name registered earlier. Providers stay lazy:
//!   each one starts on first resolution of a key it owns.
//! - **boot** prepares if needed, then starts every provider eagerly, in
//!   registration order, for the application and then each slice.
//! - **shutdown** stops started providers in reverse order.
//!
//! All three are idempotent.
//!
//! Slices layer their own action overrides over the live `config.actions`, so
//! application-wide action settings reach every slice until `prepare`
//! finalizes them. Action bases built before a change keep their snapshot
//! until [`Application::reset_action_base`].

use crate::action::{ActionBase, ActionBaseRegistry, ActionBuilder, ActionHandler};
use crate::config::{ApplicationConfiguration, Env, Settings};
use crate::container::{Component, Container};
use crate::error::{ConfigurationError, FrameworkError};
use crate::inflector::SliceName;
use crate::providers::{standard, Provider};
use crate::slice::{AppShared, Slice, SliceRegistry};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootState {
    Configuring,
    Prepared,
    Booted,
    Stopped,
}

pub struct Application {
    shared: Arc<AppShared>,
    slices: SliceRegistry,
    action_bases: ActionBaseRegistry,
    state: Mutex<BootState>,
}

impl Application {
    /// An application configured from the process environment.
    pub fn new(name: &str) -> Self {
        Self::with_env(name, Env::from_process())
    }

    pub fn with_env(name: &str, env: Env) -> Self {
        let config = ApplicationConfiguration::new(name, &env);
        let container = Arc::new(Container::new(config.app_name.as_str()));
        info!(app = %config.app_name, env = %config.env, "Application created");
        Self {
            shared: Arc::new(AppShared {
                config: RwLock::new(config),
                container,
            }),
            slices: SliceRegistry::default(),
            action_bases: ActionBaseRegistry::default(),
            state: Mutex::new(BootState::Configuring),
        }
    }

    pub fn name(&self) -> SliceName {
        self.shared.config.read().app_name.clone()
    }

    pub fn state(&self) -> BootState {
        *self.state.lock()
    }

    // --- Configuration ---

    pub fn config(&self) -> RwLockReadGuard<'_, ApplicationConfiguration> {
        self.shared.config.read()
    }

    /// Edits configuration. Fails once the application is prepared.
    pub fn configure<F>(&self, configure: F) -> Result<(), FrameworkError>
    where
        F: FnOnce(&mut ApplicationConfiguration) -> Result<(), ConfigurationError>,
    {
        let mut config = self.shared.config.write();
        config.ensure_writable("configuration")?;
        configure(&mut config)?;
        Ok(())
    }

    // --- Container ---

    pub fn container(&self) -> &Arc<Container> {
        &self.shared.container
    }

    pub fn key(&self, key: &str) -> bool {
        self.shared.container.key(key)
    }

    pub fn resolve(&self, key: &str) -> Result<Component, FrameworkError> {
        self.shared.container.resolve(key)
    }

    pub fn get<T: Any + Send + Sync + Clone>(&self, key: &str) -> Result<T, FrameworkError> {
        self.shared.container.get(key)
    }

    pub fn register<T: Any + Send + Sync>(
        &self,
        key: impl Into<String>,
        value: T,
    ) -> Result<(), FrameworkError> {
        self.shared.container.register(key, value)
    }

    pub fn register_factory<T, F>(&self, key: impl Into<String>, factory: F) -> Result<(), FrameworkError>
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> Result<T, FrameworkError> + Send + Sync + 'static,
    {
        self.shared.container.register_factory(key, factory)
    }

    /// Registers a provider. The last registration for a name wins, including
    /// over the standard providers.
    pub fn register_provider(&self, provider: Provider) -> Result<(), FrameworkError> {
        self.shared.container.register_provider(provider)
    }

    /// The loaded settings, when the application defines any.
    pub fn settings(&self) -> Result<Settings, FrameworkError> {
        self.get(standard::SETTINGS)
    }

    // --- Slices ---

    /// Registers a slice unless the load/skip lists exclude it, in which case
    /// `Ok(None)` is returned and the name is recorded as skipped.
    pub fn register_slice(&self, name: &str) -> Result<Option<Arc<Slice>>, FrameworkError> {
        let (slice_name, loadable) = {
            let config = self.shared.config.read();
            let slice_name = SliceName::new(name, &config.inflector);
            let loadable = config.slices.is_loadable(slice_name.as_str());
            (slice_name, loadable)
        };
        if !loadable {
            self.slices.skip(slice_name.as_str());
            return Ok(None);
        }
        let slice = Slice::new(slice_name, Arc::clone(&self.shared));
        self.slices.insert(slice).map(Some)
    }

    pub fn slice(&self, name: &str) -> Result<Arc<Slice>, FrameworkError> {
        self.slices.fetch(name)
    }

    pub fn slices(&self) -> &SliceRegistry {
        &self.slices
    }

    // --- Actions ---

    /// The slice's action base, built on first use.
    pub fn action_base(&self, slice: &str) -> Result<Arc<ActionBase>, FrameworkError> {
        let slice = self.slice(slice)?;
        self.action_bases.fetch_or_build(&slice)
    }

    /// Starts building an action for `handler` in `slice`.
    pub fn action<H: ActionHandler>(&self, slice: &str, handler: H) -> Result<ActionBuilder<H>, FrameworkError> {
        Ok(ActionBuilder::new(handler, self.action_base(slice)?))
    }

    pub fn action_bases(&self) -> &ActionBaseRegistry {
        &self.action_bases
    }

    /// Forgets a slice's action base; the next action rebuilds it from the
    /// slice's current configuration.
    pub fn reset_action_base(&self, slice: &str) {
        debug!(slice, "Action base reset");
        self.action_bases.reset(slice);
    }

    // --- Lifecycle ---

    pub fn prepare(&self) -> Result<(), FrameworkError> {
        let mut state = self.state.lock();
        if *state != BootState::Configuring {
            return Ok(());
        }

        let providers = {
            let mut config = self.shared.config.write();
            config.finalize();
            standard::all(&config)
        };
        let container = &self.shared.container;
        for provider in providers {
            if container.providers().contains(provider.name()) {
                debug!(provider = provider.name(), "Keeping custom provider");
                continue;
            }
            container.register_provider(provider)?;
        }

        if let Some(load) = self.shared.config.read().slices.load_slices() {
            for name in load.iter().filter(|name| !self.slices.contains(name)) {
                warn!(slice = %name, "Slice listed in load_slices is not registered");
            }
        }

        *state = BootState::Prepared;
        info!(
            app = %self.shared.container.name(),
            slices = ?self.slices.names(),
            skipped = ?self.slices.skipped(),
            "Prepared"
        );
        Ok(())
    }

    pub fn boot(&self) -> Result<(), FrameworkError> {
        self.prepare()?;
        let mut state = self.state.lock();
        if *state != BootState::Prepared {
            return Ok(());
        }
        self.shared.container.boot()?;
        for slice in self.slices.all() {
            slice.boot()?;
        }
        *state = BootState::Booted;
        info!(app = %self.shared.container.name(), "Booted");
        Ok(())
    }

    pub fn shutdown(&self) -> Result<(), FrameworkError> {
        let mut state = self.state.lock();
        if *state == BootState::Stopped {
            return Ok(());
        }
        let mut first_error = None;
        for slice in self.slices.all().into_iter().rev() {
            if let Err(e) = slice.shutdown() {
                first_error.get_or_insert(e);
            }
        }
        if let Err(e) = self.shared.container.shutdown() {
            first_error.get_or_insert(e);
        }
        *state = BootState::Stopped;
        info!(app = %self.shared.container.name(), "Shut down");
        first_error.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("name", &self.shared.container.name())
            .field("state", &self.state())
            .field("slices", &self.slices)
            .finish()
    }
}
