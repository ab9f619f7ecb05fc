//! # Providers & Boot Sequencing
//!
//! A [`Provider`] is a named unit of start-up logic that registers one or more
//! keys into a container. It mirrors the block-style contract:
//!
//! ```rust
//! use slice_framework::{Container, Provider};
//!
//! let container = Container::new("app");
//! container
//!     .register_provider(Provider::new("logger").start(|target| {
//!         target.register("logger", "custom logger".to_string())
//!     }))
//!     .unwrap();
//!
//! assert_eq!(container.get::<String>("logger").unwrap(), "custom logger");
//! ```
//!
//! ## Lifecycle
//!
//! `Registered → Prepared → Started → Stopped`. The `prepare` hook runs right
//! before `start`. Both run under a per-provider lock, so a provider starts
//! exactly once no matter how many callers race to resolve its keys.
//!
//! A hook that fails has the keys it registered dropped again, and the
//! provider stays startable. A hook that resolves a key its own provider owns
//! before registering it fails with [`FrameworkError::ProviderFailed`].
//!
//! ## Replacement
//!
//! Registering a provider whose name is already taken replaces the earlier one
//! in place (it keeps the boot position of the provider it replaced). A
//! provider that has already started cannot be replaced.

pub mod logger;
pub mod monitor;
pub mod standard;

pub use logger::Logger;
pub use monitor::Monitor;

use crate::container::Container;
use crate::error::FrameworkError;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::{debug, info, warn};

type Hook = Arc<dyn Fn(&Container) -> Result<(), FrameworkError> + Send + Sync>;

/// A named, bootable component.
#[derive(Clone)]
pub struct Provider {
    name: String,
    prepare: Option<Hook>,
    start: Option<Hook>,
    stop: Option<Hook>,
}

impl Provider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prepare: None,
            start: None,
            stop: None,
        }
    }

    pub fn prepare(
        mut self,
        hook: impl Fn(&Container) -> Result<(), FrameworkError> + Send + Sync + 'static,
    ) -> Self {
        self.prepare = Some(Arc::new(hook));
        self
    }

    pub fn start(
        mut self,
        hook: impl Fn(&Container) -> Result<(), FrameworkError> + Send + Sync + 'static,
    ) -> Self {
        self.start = Some(Arc::new(hook));
        self
    }

    pub fn stop(
        mut self,
        hook: impl Fn(&Container) -> Result<(), FrameworkError> + Send + Sync + 'static,
    ) -> Self {
        self.stop = Some(Arc::new(hook));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `logger` owns `logger` and `logger.audit`, but not `loggers`.
    pub fn owns(&self, key: &str) -> bool {
        key == self.name
            || key
                .strip_prefix(self.name.as_str())
                .is_some_and(|rest| rest.starts_with('.'))
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider").field("name", &self.name).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderState {
    Registered,
    Prepared,
    Started,
    Stopped,
}

/// A registered provider and its lifecycle state.
pub(crate) struct ProviderSlot {
    provider: Provider,
    state: RwLock<ProviderState>,
    transition: Mutex<()>,
    starter: Mutex<Option<ThreadId>>,
}

/// Marks a slot as being started by the current thread until dropped.
struct Starting<'a>(&'a Mutex<Option<ThreadId>>);

impl<'a> Starting<'a> {
    fn enter(starter: &'a Mutex<Option<ThreadId>>) -> Self {
        *starter.lock() = Some(thread::current().id());
        Self(starter)
    }
}

impl Drop for Starting<'_> {
    fn drop(&mut self) {
        *self.0.lock() = None;
    }
}

impl ProviderSlot {
    fn new(provider: Provider) -> Self {
        Self {
            provider,
            state: RwLock::new(ProviderState::Registered),
            transition: Mutex::new(()),
            starter: Mutex::new(None),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.provider.name
    }

    pub(crate) fn state(&self) -> ProviderState {
        *self.state.read()
    }

    pub(crate) fn is_pending(&self) -> bool {
        matches!(
            self.state(),
            ProviderState::Registered | ProviderState::Prepared
        )
    }

    /// True while this thread is inside the slot's prepare or start hook.
    pub(crate) fn is_starting_here(&self) -> bool {
        *self.starter.lock() == Some(thread::current().id())
    }

    fn run(&self, hook: Option<&Hook>, target: &Container) -> Result<(), FrameworkError> {
        let Some(hook) = hook else {
            return Ok(());
        };
        hook(target).map_err(|e| match e {
            FrameworkError::ProviderFailed { .. } => e,
            other => FrameworkError::ProviderFailed {
                provider: self.provider.name.clone(),
                reason: other.to_string(),
            },
        })
    }

    /// Runs a start-up hook, dropping whatever it registered if it fails.
    fn run_or_roll_back(&self, hook: Option<&Hook>, target: &Container) -> Result<(), FrameworkError> {
        let before = target.keys();
        self.run(hook, target).map_err(|e| {
            let dropped = target.roll_back_to(&before, &self.provider.name);
            if !dropped.is_empty() {
                warn!(
                    container = target.name(),
                    provider = %self.provider.name,
                    keys = ?dropped,
                    "Dropped keys registered by failed hook"
                );
            }
            e
        })
    }

    pub(crate) fn start(&self, target: &Container) -> Result<(), FrameworkError> {
        if self.is_starting_here() {
            return Err(FrameworkError::ProviderFailed {
                provider: self.provider.name.clone(),
                reason: "resolved a key it owns before registering it".into(),
            });
        }
        let _guard = self.transition.lock();
        if !self.is_pending() {
            return Ok(());
        }

        let _starting = Starting::enter(&self.starter);
        if self.state() == ProviderState::Registered {
            self.run_or_roll_back(self.provider.prepare.as_ref(), target)?;
            *self.state.write() = ProviderState::Prepared;
        }
        self.run_or_roll_back(self.provider.start.as_ref(), target)?;
        *self.state.write() = ProviderState::Started;
        info!(container = target.name(), provider = %self.provider.name, "Provider started");
        Ok(())
    }

    pub(crate) fn stop(&self, target: &Container) -> Result<(), FrameworkError> {
        let _guard = self.transition.lock();
        if self.state() != ProviderState::Started {
            return Ok(());
        }
        self.run(self.provider.stop.as_ref(), target)?;
        *self.state.write() = ProviderState::Stopped;
        debug!(container = target.name(), provider = %self.provider.name, "Provider stopped");
        Ok(())
    }
}

/// The ordered providers of one container.
#[derive(Default)]
pub struct ProviderRegistry {
    slots: RwLock<Vec<Arc<ProviderSlot>>>,
}

impl ProviderRegistry {
    pub(crate) fn register(&self, provider: Provider) -> Result<(), FrameworkError> {
        let mut slots = self.slots.write();
        let existing = slots.iter().position(|slot| slot.name() == provider.name());
        match existing {
            Some(index) => {
                if slots[index].state() != ProviderState::Registered {
                    return Err(FrameworkError::ProviderStarted(provider.name.clone()));
                }
                debug!(provider = %provider.name, "Provider replaced");
                slots[index] = Arc::new(ProviderSlot::new(provider));
            }
            None => {
                debug!(provider = %provider.name, "Provider registered");
                slots.push(Arc::new(ProviderSlot::new(provider)));
            }
        }
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.read().iter().any(|slot| slot.name() == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.slots
            .read()
            .iter()
            .map(|slot| slot.name().to_string())
            .collect()
    }

    pub fn state(&self, name: &str) -> Option<ProviderState> {
        self.slots
            .read()
            .iter()
            .find(|slot| slot.name() == name)
            .map(|slot| slot.state())
    }

    pub(crate) fn slots(&self) -> Vec<Arc<ProviderSlot>> {
        self.slots.read().clone()
    }

    /// The provider with the longest name owning `key`.
    pub(crate) fn owner_of(&self, key: &str) -> Option<Arc<ProviderSlot>> {
        self.slots
            .read()
            .iter()
            .filter(|slot| slot.provider.owns(key))
            .max_by_key(|slot| slot.name().len())
            .cloned()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(name: &str, calls: &Arc<AtomicUsize>) -> Provider {
        let calls = Arc::clone(calls);
        let key = name.to_string();
        Provider::new(name).start(move |target| {
            calls.fetch_add(1, Ordering::SeqCst);
            target.register(key.clone(), key.clone())
        })
    }

    #[test]
    fn ownership_is_by_dotted_prefix() {
        let provider = Provider::new("rack.monitor");
        assert!(provider.owns("rack.monitor"));
        assert!(provider.owns("rack.monitor.events"));
        assert!(!provider.owns("rack"));
        assert!(!Provider::new("logger").owns("loggers"));
    }

    #[test]
    fn boot_is_idempotent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let container = Container::new("app");
        container.register_provider(counting("logger", &calls)).unwrap();

        container.boot().unwrap();
        container.boot().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(container.providers().state("logger"), Some(ProviderState::Started));
    }

    #[test]
    fn last_registration_wins_and_keeps_position() {
        let container = Container::new("app");
        container.register_provider(Provider::new("logger")).unwrap();
        container.register_provider(Provider::new("inflector")).unwrap();
        container
            .register_provider(
                Provider::new("logger").start(|c| c.register("logger", "custom".to_string())),
            )
            .unwrap();

        assert_eq!(container.providers().names(), ["logger", "inflector"]);
        container.boot().unwrap();
        assert_eq!(container.get::<String>("logger").unwrap(), "custom");
    }

    #[test]
    fn started_provider_cannot_be_replaced() {
        let calls = Arc::new(AtomicUsize::new(0));
        let container = Container::new("app");
        container.register_provider(counting("logger", &calls)).unwrap();
        container.boot().unwrap();

        assert!(matches!(
            container.register_provider(Provider::new("logger")),
            Err(FrameworkError::ProviderStarted(_))
        ));
    }

    #[test]
    fn failing_start_names_the_provider_and_can_retry() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&attempts);
        let container = Container::new("app");
        container
            .register_provider(Provider::new("db").start(move |c| {
                if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                    return Err(FrameworkError::MissingCollaborator("database_url".into()));
                }
                c.register("db", "connected".to_string())
            }))
            .unwrap();

        let err = container.boot().unwrap_err();
        assert!(err.to_string().contains("\"db\""));
        assert_eq!(container.get::<String>("db").unwrap(), "connected");
    }

    #[test]
    fn shutdown_stops_in_reverse_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let container = Container::new("app");
        for name in ["first", "second"] {
            let order = Arc::clone(&order);
            container
                .register_provider(Provider::new(name).start(|_| Ok(())).stop(move |_| {
                    order.lock().push(name);
                    Ok(())
                }))
                .unwrap();
        }
        container.boot().unwrap();
        container.shutdown().unwrap();
        assert_eq!(*order.lock(), ["second", "first"]);
    }
}
