//! Collaborator resolution for action instances.
//!
//! None of these fail: a missing view, view context or routes helper is a
//! valid configuration (an API-only action has no view). A key registered
//! with the wrong type is logged and treated as absent.

use crate::action::ActionBase;
use crate::container::Container;
use crate::providers::standard::{RACK_MONITOR, ROUTES_HELPER};
use crate::providers::Monitor;
use crate::view::{RoutesHelper, View, ViewContext};
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves the first candidate for which `present` holds. Candidates after
/// the first hit are never looked at.
pub fn first_match<I, S, T>(
    candidates: I,
    present: impl Fn(&str) -> bool,
    resolve: impl FnOnce(&str) -> Option<T>,
) -> Option<T>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let hit = candidates.into_iter().find(|c| present(c.as_ref()))?;
    resolve(hit.as_ref())
}

fn typed<T: Any + Send + Sync + Clone>(container: &Container, key: &str) -> Option<T> {
    match container.get::<T>(key) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(container = container.name(), %key, error = %e, "Ignoring collaborator");
            None
        }
    }
}

pub fn resolve_view(base: &ActionBase, action_name: &str) -> Option<Arc<dyn View>> {
    let slice = base.slice();
    let candidates = base.config().inferrer().call(action_name, slice);
    let view = first_match(
        &candidates,
        |key| slice.key(key),
        |key| {
            debug!(slice = slice.name(), action = action_name, view = %key, "View resolved");
            typed::<Arc<dyn View>>(slice.container(), key)
        },
    );
    if view.is_none() {
        debug!(slice = slice.name(), action = action_name, ?candidates, "No view");
    }
    view
}

pub fn resolve_view_context(base: &ActionBase) -> Option<Arc<dyn ViewContext>> {
    let identifier = base.config().context_identifier()?;
    let slice = base.slice();
    if slice.key(identifier) {
        typed(slice.container(), identifier)
    } else if slice.app_container().key(identifier) {
        typed(slice.app_container(), identifier)
    } else {
        None
    }
}

pub fn resolve_routes(base: &ActionBase) -> Option<Arc<dyn RoutesHelper>> {
    let app = base.slice().app_container();
    if app.key(ROUTES_HELPER) {
        typed(app, ROUTES_HELPER)
    } else {
        None
    }
}

/// The monitor reachable from the slice, if any.
pub(crate) fn resolve_monitor(base: &ActionBase) -> Option<Monitor> {
    let slice = base.slice();
    (slice.key(RACK_MONITOR) || slice.app_container().key(RACK_MONITOR))
        .then(|| typed(slice.container(), RACK_MONITOR))
        .flatten()
}
