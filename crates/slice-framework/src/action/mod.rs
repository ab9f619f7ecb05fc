//! # Actions
//!
//! An action is the per-request handling unit of a slice. Application code
//! implements [`ActionHandler`]; the framework wraps it in an [`Action`] bound
//! to the slice's [`ActionBase`].
//!
//! ## Construction
//!
//! [`ActionBuilder`] accepts explicit `view`, `view_context` and `routes`
//! collaborators plus arbitrary named dependencies. Collaborators left
//! unspecified are resolved when the action is built:
//!
//! - **view**: the configured view name inferrer produces candidate keys from
//!   the handler's name; the first key the slice container knows wins.
//! - **view context**: the configured identifier, looked up in the slice
//!   container, then the application container.
//! - **routes**: `routes_helper` in the application container only.
//!
//! Missing collaborators are left unset; none of this is an error.
//!
//! ## Calling
//!
//! [`Action::call`] builds a response from the action settings (default
//! headers, format, charset), runs capability behaviors, the handler and the
//! finish step, which auto-renders when [`ActionHandler::render`] says so:
//! by default iff a view is present and the body is still empty.

pub mod base;
pub mod behavior;
pub mod inferrer;
pub mod resolve;

pub use base::{ActionBase, ActionBaseRegistry, Capability, CapabilitySet};
pub use inferrer::{StandardViewNameInferrer, ViewNameInferrer};

use crate::container::Component;
use crate::error::FrameworkError;
use crate::http::{Request, Response};
use crate::providers::monitor::Event;
use crate::providers::Monitor;
use crate::view::{ContextOptions, RoutesHelper, View, ViewContext};
use async_trait::async_trait;
use behavior::Behavior;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info_span, Instrument};

/// Application-defined request handling.
///
/// Only [`name`](Self::name) and [`handle`](Self::handle) are required. The
/// provided hooks can be overridden per handler:
/// - [`render`](Self::render) decides whether the finish step auto-renders.
/// - [`view_context_options`](Self::view_context_options) decides what the view
///   context is specialized with before rendering.
#[async_trait]
pub trait ActionHandler: Send + Sync + 'static {
    /// Fully-qualified name, e.g. `Main::Actions::Books::Index`. Drives view
    /// name inference.
    fn name(&self) -> &str;

    async fn handle(
        &self,
        collaborators: &Collaborators,
        req: &mut Request,
        res: &mut Response,
    ) -> Result<(), FrameworkError>;

    fn render(&self, collaborators: &Collaborators, res: &Response) -> bool {
        collaborators.view.is_some() && res.body().is_empty()
    }

    fn view_context_options(&self, req: &Request, res: &Response) -> ContextOptions {
        ContextOptions::new(req, res)
    }
}

/// What an action resolved at construction time.
#[derive(Clone, Default)]
pub struct Collaborators {
    pub view: Option<Arc<dyn View>>,
    pub view_context: Option<Arc<dyn ViewContext>>,
    pub routes: Option<Arc<dyn RoutesHelper>>,
    dependencies: HashMap<String, Component>,
}

impl Collaborators {
    /// A named dependency passed to the builder.
    pub fn dependency<T: Any + Send + Sync + Clone>(&self, name: &str) -> Result<T, FrameworkError> {
        let component = self
            .dependencies
            .get(name)
            .ok_or_else(|| FrameworkError::MissingCollaborator(name.to_string()))?;
        component
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| FrameworkError::TypeMismatch {
                key: name.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    pub fn has_dependency(&self, name: &str) -> bool {
        self.dependencies.contains_key(name)
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dependencies: Vec<&String> = self.dependencies.keys().collect();
        dependencies.sort();
        f.debug_struct("Collaborators")
            .field("view", &self.view.is_some())
            .field("view_context", &self.view_context.is_some())
            .field("routes", &self.routes.is_some())
            .field("dependencies", &dependencies)
            .finish()
    }
}

enum Choice<T> {
    Resolve,
    Given(Option<T>),
}

impl<T> Choice<T> {
    fn or_resolve(self, resolve: impl FnOnce() -> Option<T>) -> Option<T> {
        match self {
            Choice::Resolve => resolve(),
            Choice::Given(value) => value,
        }
    }
}

pub struct ActionBuilder<H> {
    handler: H,
    base: Arc<ActionBase>,
    view: Choice<Arc<dyn View>>,
    view_context: Choice<Arc<dyn ViewContext>>,
    routes: Choice<Arc<dyn RoutesHelper>>,
    dependencies: HashMap<String, Component>,
}

impl<H: ActionHandler> ActionBuilder<H> {
    pub fn new(handler: H, base: Arc<ActionBase>) -> Self {
        Self {
            handler,
            base,
            view: Choice::Resolve,
            view_context: Choice::Resolve,
            routes: Choice::Resolve,
            dependencies: HashMap::new(),
        }
    }

    pub fn view(mut self, view: impl View + 'static) -> Self {
        self.view = Choice::Given(Some(Arc::new(view)));
        self
    }

    pub fn no_view(mut self) -> Self {
        self.view = Choice::Given(None);
        self
    }

    pub fn view_context(mut self, context: impl ViewContext + 'static) -> Self {
        self.view_context = Choice::Given(Some(Arc::new(context)));
        self
    }

    pub fn no_view_context(mut self) -> Self {
        self.view_context = Choice::Given(None);
        self
    }

    pub fn routes(mut self, routes: impl RoutesHelper + 'static) -> Self {
        self.routes = Choice::Given(Some(Arc::new(routes)));
        self
    }

    pub fn no_routes(mut self) -> Self {
        self.routes = Choice::Given(None);
        self
    }

    pub fn dependency<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
        self.dependencies.insert(name.into(), Arc::new(value));
        self
    }

    pub fn build(self) -> Action<H> {
        let base = self.base;
        let name = self.handler.name().to_string();
        let collaborators = Collaborators {
            view: self.view.or_resolve(|| resolve::resolve_view(&base, &name)),
            view_context: self
                .view_context
                .or_resolve(|| resolve::resolve_view_context(&base)),
            routes: self.routes.or_resolve(|| resolve::resolve_routes(&base)),
            dependencies: self.dependencies,
        };
        Action {
            behaviors: base.behaviors(),
            monitor: resolve::resolve_monitor(&base),
            handler: self.handler,
            base,
            collaborators,
        }
    }
}

/// A handler bound to its slice's action base and resolved collaborators.
pub struct Action<H> {
    handler: H,
    base: Arc<ActionBase>,
    collaborators: Collaborators,
    behaviors: Vec<Box<dyn Behavior>>,
    monitor: Option<Monitor>,
}

impl<H: ActionHandler> Action<H> {
    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn base(&self) -> &Arc<ActionBase> {
        &self.base
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    pub fn view(&self) -> Option<&Arc<dyn View>> {
        self.collaborators.view.as_ref()
    }

    pub fn view_context(&self) -> Option<&Arc<dyn ViewContext>> {
        self.collaborators.view_context.as_ref()
    }

    pub fn routes(&self) -> Option<&Arc<dyn RoutesHelper>> {
        self.collaborators.routes.as_ref()
    }

    pub async fn call(&self, mut req: Request) -> Result<Response, FrameworkError> {
        let span = info_span!(
            "action",
            slice = self.base.slice().name(),
            action = self.handler.name()
        );
        let started = Instant::now();
        let result = self.run(&mut req).instrument(span).await;
        self.instrument(&result, started.elapsed());
        result
    }

    async fn run(&self, req: &mut Request) -> Result<Response, FrameworkError> {
        let mut res = self.build_response();
        for behavior in &self.behaviors {
            behavior.before(req, &mut res)?;
        }
        if !res.is_halted() {
            self.handler
                .handle(&self.collaborators, req, &mut res)
                .await?;
        }
        self.finish(req, &mut res)?;
        for behavior in self.behaviors.iter().rev() {
            behavior.after(req, &mut res)?;
        }
        res.finalize();
        debug!(status = res.status(), "Finished");
        Ok(res)
    }

    fn build_response(&self) -> Response {
        let config = self.base.config();
        let mut res = Response::new();
        if let Some(headers) = config.default_headers().as_map() {
            for (name, value) in headers {
                if let Some(value) = value.as_str() {
                    res.set_header(name, value);
                }
            }
        }
        let charset = config.default_charset().as_str().map(str::to_string);
        if let Some(format) = config.default_response_format().as_str() {
            let content_type = match charset.as_deref() {
                Some(charset) => format!("{}; charset={charset}", mime_type(format)),
                None => mime_type(format).to_string(),
            };
            res.set_header("Content-Type", content_type);
            res.set_format(format);
        }
        res.set_charset(charset);
        res
    }

    fn finish(&self, req: &Request, res: &mut Response) -> Result<(), FrameworkError> {
        if res.is_halted() || !self.handler.render(&self.collaborators, res) {
            return Ok(());
        }
        let Some(view) = self.collaborators.view.as_ref() else {
            return Ok(());
        };
        let options = self.handler.view_context_options(req, res);
        res.render(
            view.as_ref(),
            self.collaborators.view_context.as_ref(),
            options,
            &req.params,
        )
    }

    fn instrument(&self, result: &Result<Response, FrameworkError>, elapsed: Duration) {
        let Some(monitor) = &self.monitor else {
            return;
        };
        let event = Event::new("action.call")
            .with("slice", self.base.slice().name())
            .with("action", self.handler.name())
            .elapsed(elapsed);
        let event = match result {
            Ok(res) => event.with("status", res.status()),
            Err(e) => event.with("error", e.to_string()),
        };
        monitor.instrument(event);
    }
}

fn mime_type(format: &str) -> &'static str {
    match format {
        "html" => "text/html",
        "json" => "application/json",
        "text" => "text/plain",
        "xml" => "application/xml",
        "csv" => "text/csv",
        _ => "application/octet-stream",
    }
}

impl<H: ActionHandler> fmt::Debug for Action<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<{}[{}]>", self.handler.name(), self.base.slice().name())
    }
}
