//! # Containers
//!
//! A [`Container`] maps string keys to components. Components are either
//! registered instances or memoized factories that run on first resolution.
//!
//! Every slice container has the application container as its parent:
//! [`Container::resolve`] falls back to the parent when a key is missing
//! locally, while [`Container::key`] only answers for this container.
//!
//! ## Lazy providers
//!
//! A container also owns a [`ProviderRegistry`]. When a key is missing and a
//! provider that has not started yet owns it (the provider's name equals the
//! key or is a dotted prefix of it), resolution starts that provider first.
//! Provider start-up and memoized factories are both single-flight: concurrent
//! first resolutions run the hook exactly once. A key registered by a provider
//! that is still starting is not handed out until the start completes, and a
//! start hook that fails has its registrations dropped so a retry starts clean.

use crate::error::FrameworkError;
use crate::providers::{Provider, ProviderRegistry};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A resolved component.
pub type Component = Arc<dyn Any + Send + Sync>;

type FactoryFn = dyn Fn(&Container) -> Result<Component, FrameworkError> + Send + Sync;

enum Registration {
    Instance(Component),
    Memoized {
        factory: Box<FactoryFn>,
        instance: Mutex<Option<Component>>,
    },
}

/// A key → component registry with parent fallback.
pub struct Container {
    name: String,
    registrations: RwLock<IndexMap<String, Arc<Registration>>>,
    providers: ProviderRegistry,
    parent: Option<Arc<Container>>,
}

impl Container {
    /// A root container.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registrations: RwLock::new(IndexMap::new()),
            providers: ProviderRegistry::default(),
            parent: None,
        }
    }

    /// A container that falls back to `parent` for missing keys.
    pub fn with_parent(name: impl Into<String>, parent: Arc<Container>) -> Self {
        Self {
            parent: Some(parent),
            ..Self::new(name)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<Container>> {
        self.parent.as_ref()
    }

    /// Registers a ready-made instance.
    pub fn register<T: Any + Send + Sync>(
        &self,
        key: impl Into<String>,
        value: T,
    ) -> Result<(), FrameworkError> {
        self.insert(key.into(), Registration::Instance(Arc::new(value)))
    }

    /// Registers a factory that runs once, on first resolution.
    pub fn register_factory<T, F>(&self, key: impl Into<String>, factory: F) -> Result<(), FrameworkError>
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> Result<T, FrameworkError> + Send + Sync + 'static,
    {
        let factory: Box<FactoryFn> =
            Box::new(move |container| factory(container).map(|value| Arc::new(value) as Component));
        self.insert(
            key.into(),
            Registration::Memoized {
                factory,
                instance: Mutex::new(None),
            },
        )
    }

    fn insert(&self, key: String, registration: Registration) -> Result<(), FrameworkError> {
        let mut registrations = self.registrations.write();
        if registrations.contains_key(&key) {
            return Err(FrameworkError::AlreadyRegistered(key));
        }
        debug!(container = %self.name, %key, "Registered");
        registrations.insert(key, Arc::new(registration));
        Ok(())
    }

    /// True when `key` is registered here, or a provider of this container that
    /// has not started yet owns it. Never consults the parent and never starts
    /// a provider.
    pub fn key(&self, key: &str) -> bool {
        self.registrations.read().contains_key(key)
            || self
                .providers
                .owner_of(key)
                .is_some_and(|slot| slot.is_pending())
    }

    /// Keys registered here so far, in registration order.
    pub fn keys(&self) -> Vec<String> {
        self.registrations.read().keys().cloned().collect()
    }

    /// Drops registrations added since `before` was taken, except keys owned
    /// by another provider that has started meanwhile. Returns the dropped
    /// keys in registration order.
    pub(crate) fn roll_back_to(&self, before: &[String], provider: &str) -> Vec<String> {
        let before: HashSet<&str> = before.iter().map(String::as_str).collect();
        let mut registrations = self.registrations.write();
        let dropped: Vec<String> = registrations
            .keys()
            .filter(|key| !before.contains(key.as_str()))
            .filter(|key| {
                self.providers
                    .owner_of(key)
                    .map_or(true, |slot| slot.name() == provider || slot.is_pending())
            })
            .cloned()
            .collect();
        for key in &dropped {
            registrations.shift_remove(key);
        }
        dropped
    }

    /// Resolves `key` here, then in the parent chain.
    pub fn resolve(&self, key: &str) -> Result<Component, FrameworkError> {
        if let Some(component) = self.resolve_here(key)? {
            return Ok(component);
        }
        match &self.parent {
            Some(parent) => parent.resolve(key),
            None => Err(FrameworkError::MissingCollaborator(key.to_string())),
        }
    }

    /// Resolves `key` in this container only.
    pub fn resolve_local(&self, key: &str) -> Result<Component, FrameworkError> {
        self.resolve_here(key)?
            .ok_or_else(|| FrameworkError::MissingCollaborator(key.to_string()))
    }

    /// Resolves and downcasts, cloning the stored value.
    pub fn get<T: Any + Send + Sync + Clone>(&self, key: &str) -> Result<T, FrameworkError> {
        downcast(key, self.resolve(key)?)
    }

    /// Like [`get`](Self::get), without the parent fallback.
    pub fn get_local<T: Any + Send + Sync + Clone>(&self, key: &str) -> Result<T, FrameworkError> {
        downcast(key, self.resolve_local(key)?)
    }

    fn lookup(&self, key: &str) -> Option<Arc<Registration>> {
        self.registrations.read().get(key).cloned()
    }

    fn resolve_here(&self, key: &str) -> Result<Option<Component>, FrameworkError> {
        // A key owned by a pending provider only resolves once that provider
        // has started, except from inside the provider's own hooks.
        if let Some(slot) = self.providers.owner_of(key).filter(|slot| slot.is_pending()) {
            if !(slot.is_starting_here() && self.lookup(key).is_some()) {
                debug!(container = %self.name, %key, provider = slot.name(), "Starting provider lazily");
                slot.start(self)?;
            }
        }
        match self.lookup(key) {
            Some(registration) => self.instantiate(&registration).map(Some),
            None => Ok(None),
        }
    }

    fn instantiate(&self, registration: &Registration) -> Result<Component, FrameworkError> {
        match registration {
            Registration::Instance(component) => Ok(Arc::clone(component)),
            Registration::Memoized { factory, instance } => {
                let mut instance = instance.lock();
                if let Some(component) = instance.as_ref() {
                    return Ok(Arc::clone(component));
                }
                let component = factory(self)?;
                *instance = Some(Arc::clone(&component));
                Ok(component)
            }
        }
    }

    // --- Providers ---

    /// Registers a provider. A provider with the same name is replaced.
    pub fn register_provider(&self, provider: Provider) -> Result<(), FrameworkError> {
        self.providers.register(provider)
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Starts every provider in registration order. Already-started providers
    /// are skipped, so calling this twice is harmless.
    pub fn boot(&self) -> Result<(), FrameworkError> {
        for slot in self.providers.slots() {
            slot.start(self)?;
        }
        info!(container = %self.name, keys = self.registrations.read().len(), "Booted");
        Ok(())
    }

    /// Stops started providers in reverse registration order.
    pub fn shutdown(&self) -> Result<(), FrameworkError> {
        let mut first_error = None;
        for slot in self.providers.slots().into_iter().rev() {
            if let Err(e) = slot.stop(self) {
                warn!(container = %self.name, provider = slot.name(), error = %e, "Stop failed");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

fn downcast<T: Any + Send + Sync + Clone>(key: &str, component: Component) -> Result<T, FrameworkError> {
    component
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| FrameworkError::TypeMismatch {
            key: key.to_string(),
            expected: std::any::type_name::<T>(),
        })
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.name)
            .field("keys", &self.keys())
            .field("providers", &self.providers.names())
            .field("parent", &self.parent.as_ref().map(|p| p.name().to_string()))
            .finish()
    }
}
