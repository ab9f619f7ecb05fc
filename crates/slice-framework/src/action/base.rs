//! # Action Bases
//!
//! Every slice gets exactly one [`ActionBase`]: the per-slice template all of
//! its actions are built from. Building a base does two things:
//!
//! 1. **Configure from the actions configuration.** Every setting declared on
//!    the generic action configuration is copied, field by field, from the
//!    slice's actions configuration. The copy is a snapshot, so later changes
//!    to the slice do not reach an already-built base.
//! 2. **Extend behavior.** The sessions, CSRF protection and cookies toggles
//!    select [`Capability`] tags. Actions compose one behavior object per tag.
//!
//! Bases are kept in an explicit [`ActionBaseRegistry`] keyed by slice name.
//! [`ActionBaseRegistry::reset`] drops a base so the next action re-evaluates
//! the slice's current configuration.

use crate::action::behavior::{Behavior, CookieBehavior, CsrfProtection, SessionBehavior};
use crate::config::{ActionConfiguration, ActionsConfiguration};
use crate::error::FrameworkError;
use crate::slice::Slice;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// A cross-cutting behavior an action base may carry. The derived order is
/// the order behaviors run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    Sessions,
    CsrfProtection,
    Cookies,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet(BTreeSet<Capability>);

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, capability: Capability) {
        self.0.insert(capability);
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The per-slice action template.
pub struct ActionBase {
    slice: Arc<Slice>,
    config: ActionConfiguration,
    capabilities: CapabilitySet,
}

impl ActionBase {
    pub fn build(slice: Arc<Slice>) -> Result<Self, FrameworkError> {
        let (config, capabilities) = {
            let actions = slice.actions_config();
            (
                configure_from_actions_config(slice.name(), &actions)?,
                extend_behavior(&actions),
            )
        };
        info!(slice = slice.name(), capabilities = ?capabilities, "Action base built");
        Ok(Self {
            slice,
            config,
            capabilities,
        })
    }

    pub fn slice(&self) -> &Arc<Slice> {
        &self.slice
    }

    pub fn config(&self) -> &ActionConfiguration {
        &self.config
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(capability)
    }

    /// One behavior object per capability, in capability order.
    pub fn behaviors(&self) -> Vec<Box<dyn Behavior>> {
        self.capabilities
            .iter()
            .map(|capability| -> Box<dyn Behavior> {
                match capability {
                    Capability::Sessions => Box::new(SessionBehavior),
                    Capability::CsrfProtection => Box::new(CsrfProtection),
                    Capability::Cookies => {
                        let options = self
                            .config
                            .cookies()
                            .as_map()
                            .map(|map| map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
                            .unwrap_or_default();
                        Box::new(CookieBehavior::new(options))
                    }
                }
            })
            .collect()
    }
}

impl fmt::Debug for ActionBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionBase")
            .field("slice", &self.slice.name())
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

fn configure_from_actions_config(
    slice: &str,
    actions: &ActionsConfiguration,
) -> Result<ActionConfiguration, FrameworkError> {
    Ok(ActionConfiguration::inherit(format!("action.{slice}"), actions)?)
}

fn extend_behavior(actions: &ActionsConfiguration) -> CapabilitySet {
    let mut capabilities = CapabilitySet::new();
    if actions.sessions_enabled() {
        capabilities.insert(Capability::Sessions);
    }
    if actions.csrf_protection_enabled() {
        capabilities.insert(Capability::CsrfProtection);
    }
    if actions.cookies_enabled() {
        capabilities.insert(Capability::Cookies);
    }
    capabilities
}

/// Built action bases, one per slice.
#[derive(Default)]
pub struct ActionBaseRegistry {
    bases: Mutex<HashMap<String, Arc<ActionBase>>>,
}

impl ActionBaseRegistry {
    /// The slice's base, building it on first use.
    pub fn fetch_or_build(&self, slice: &Arc<Slice>) -> Result<Arc<ActionBase>, FrameworkError> {
        let mut bases = self.bases.lock();
        if let Some(base) = bases.get(slice.name()) {
            return Ok(Arc::clone(base));
        }
        let base = Arc::new(ActionBase::build(Arc::clone(slice))?);
        bases.insert(slice.name().to_string(), Arc::clone(&base));
        Ok(base)
    }

    pub fn get(&self, slice: &str) -> Option<Arc<ActionBase>> {
        self.bases.lock().get(slice).cloned()
    }

    pub fn reset(&self, slice: &str) {
        self.bases.lock().remove(slice);
    }

    pub fn reset_all(&self) {
        self.bases.lock().clear();
    }
}

impl fmt::Debug for ActionBaseRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.bases.lock().keys().cloned().collect();
        names.sort();
        f.debug_struct("ActionBaseRegistry").field("slices", &names).finish()
    }
}
