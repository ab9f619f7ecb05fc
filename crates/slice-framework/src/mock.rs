//! # Test Doubles
//!
//! In-memory stand-ins for the collaborators an action resolves, so action
//! logic can be tested without a rendering engine or a router.
//!
//! | Double | Stands in for | Inspect with |
//! |--------|---------------|--------------|
//! | [`MockView`] | a view registered under an inferred key | `expect_render`, `calls`, `verify` |
//! | [`StaticInferrer`] | the view name inferrer | n/a |
//! | [`RecordingViewContext`] | the slice view context | `received` |
//! | [`StaticRoutes`] | the `routes_helper` component | n/a |
//!
//! ## Example
//!
//! ```rust
//! use slice_framework::mock::MockView;
//! use slice_framework::view::View;
//! use slice_framework::Params;
//!
//! let view = MockView::new();
//! view.expect_render().return_ok("<h1>Books</h1>");
//!
//! assert_eq!(view.call(None, &Params::new()).unwrap(), "<h1>Books</h1>");
//! view.verify();
//! ```
//!
//! Clones share state: register one clone in a container and keep another in
//! the test to set expectations and inspect calls.

use crate::action::ViewNameInferrer;
use crate::error::FrameworkError;
use crate::http::Params;
use crate::slice::Slice;
use crate::view::{ContextOptions, RoutesHelper, StandardViewContext, View, ViewContext};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

// =============================================================================
// VIEWS
// =============================================================================

/// One recorded render.
#[derive(Debug, Clone)]
pub struct RenderCall {
    pub params: Params,
    pub context: Option<ContextOptions>,
}

/// A view that answers from queued expectations.
#[derive(Clone, Default)]
pub struct MockView {
    expectations: Arc<Mutex<VecDeque<Result<String, FrameworkError>>>>,
    calls: Arc<Mutex<Vec<RenderCall>>>,
}

impl MockView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the outcome of the next render.
    pub fn expect_render(&self) -> RenderExpectationBuilder {
        RenderExpectationBuilder {
            expectations: Arc::clone(&self.expectations),
        }
    }

    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Panics unless every queued expectation was consumed.
    pub fn verify(&self) {
        let remaining = self.expectations.lock().len();
        if remaining > 0 {
            panic!("Not all render expectations were met. {remaining} remaining");
        }
    }
}

impl View for MockView {
    fn call(
        &self,
        context: Option<&Arc<dyn ViewContext>>,
        params: &Params,
    ) -> Result<String, FrameworkError> {
        self.calls.lock().push(RenderCall {
            params: params.clone(),
            context: context.and_then(|ctx| ctx.options().cloned()),
        });
        match self.expectations.lock().pop_front() {
            Some(outcome) => outcome,
            None => panic!("Unexpected render: no expectation queued"),
        }
    }
}

/// Builder for render expectations.
pub struct RenderExpectationBuilder {
    expectations: Arc<Mutex<VecDeque<Result<String, FrameworkError>>>>,
}

impl RenderExpectationBuilder {
    pub fn return_ok(self, body: impl Into<String>) {
        self.expectations.lock().push_back(Ok(body.into()));
    }

    pub fn return_err(self, error: FrameworkError) {
        self.expectations.lock().push_back(Err(error));
    }
}

// =============================================================================
// INFERENCE, CONTEXT, ROUTES
// =============================================================================

/// An inferrer that always proposes the same candidates.
#[derive(Debug, Clone)]
pub struct StaticInferrer(pub Vec<String>);

impl StaticInferrer {
    pub fn new<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(candidates.into_iter().map(Into::into).collect())
    }
}

impl ViewNameInferrer for StaticInferrer {
    fn call(&self, _action_name: &str, _slice: &Slice) -> Vec<String> {
        self.0.clone()
    }
}

/// A view context that records every specialization.
#[derive(Clone, Default)]
pub struct RecordingViewContext {
    received: Arc<Mutex<Vec<ContextOptions>>>,
}

impl RecordingViewContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received(&self) -> Vec<ContextOptions> {
        self.received.lock().clone()
    }
}

impl ViewContext for RecordingViewContext {
    fn with(&self, options: ContextOptions) -> Arc<dyn ViewContext> {
        self.received.lock().push(options.clone());
        StandardViewContext::new().with(options)
    }
}

/// Routes from a fixed `name → pattern` table. `:segment` placeholders are
/// filled from params.
#[derive(Debug, Clone, Default)]
pub struct StaticRoutes {
    routes: HashMap<String, String>,
}

impl StaticRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.routes.insert(name.into(), pattern.into());
        self
    }
}

impl RoutesHelper for StaticRoutes {
    fn path(&self, name: &str, params: &Params) -> Result<String, FrameworkError> {
        let pattern = self
            .routes
            .get(name)
            .ok_or_else(|| FrameworkError::RouteNotFound(name.to_string()))?;
        Ok(pattern
            .split('/')
            .map(|segment| match segment.strip_prefix(':') {
                Some(key) => params
                    .get(key)
                    .map(|value| match value {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .unwrap_or_else(|| segment.to_string()),
                None => segment.to_string(),
            })
            .collect::<Vec<_>>()
            .join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "Not all render expectations were met")]
    fn verify_panics_on_leftovers() {
        let view = MockView::new();
        view.expect_render().return_ok("unused");
        view.verify();
    }

    #[test]
    fn mock_view_returns_queued_errors() {
        let view = MockView::new();
        view.expect_render()
            .return_err(FrameworkError::Render("template missing".into()));
        assert!(matches!(
            view.call(None, &Params::new()),
            Err(FrameworkError::Render(_))
        ));
        assert_eq!(view.call_count(), 1);
    }

    #[test]
    fn static_routes_fill_placeholders() {
        let routes = StaticRoutes::new().route("book", "/books/:id");
        let mut params = Params::new();
        params.insert("id".into(), 42.into());
        assert_eq!(routes.path("book", &params).unwrap(), "/books/42");
        assert!(matches!(
            routes.path("author", &params),
            Err(FrameworkError::RouteNotFound(_))
        ));
    }
}
