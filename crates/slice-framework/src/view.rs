//! The collaborator seams an action renders through: views, view contexts and
//! the routes helper. Rendering engines live outside this crate; they plug in
//! by implementing these traits and registering in a container.

use crate::error::FrameworkError;
use crate::http::{Params, Request, Response};
use std::sync::Arc;

/// Renders a response body.
pub trait View: Send + Sync {
    fn call(
        &self,
        context: Option<&Arc<dyn ViewContext>>,
        params: &Params,
    ) -> Result<String, FrameworkError>;
}

impl<F> View for F
where
    F: Fn(Option<&Arc<dyn ViewContext>>, &Params) -> Result<String, FrameworkError> + Send + Sync,
{
    fn call(
        &self,
        context: Option<&Arc<dyn ViewContext>>,
        params: &Params,
    ) -> Result<String, FrameworkError> {
        self(context, params)
    }
}

/// What an action hands its view context before rendering.
#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
    pub request: Option<Request>,
    pub response: Option<Response>,
    pub extra: Params,
}

impl ContextOptions {
    pub fn new(request: &Request, response: &Response) -> Self {
        Self {
            request: Some(request.clone()),
            response: Some(response.clone()),
            extra: Params::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Rendering context shared by the views of a slice.
pub trait ViewContext: Send + Sync {
    /// A copy of this context specialized for one request.
    fn with(&self, options: ContextOptions) -> Arc<dyn ViewContext>;

    fn options(&self) -> Option<&ContextOptions> {
        None
    }
}

/// A view context that only remembers the options it was given.
#[derive(Debug, Clone, Default)]
pub struct StandardViewContext {
    options: Option<ContextOptions>,
}

impl StandardViewContext {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ViewContext for StandardViewContext {
    fn with(&self, options: ContextOptions) -> Arc<dyn ViewContext> {
        Arc::new(Self {
            options: Some(options),
        })
    }

    fn options(&self) -> Option<&ContextOptions> {
        self.options.as_ref()
    }
}

/// Named-route path generation.
pub trait RoutesHelper: Send + Sync {
    fn path(&self, name: &str, params: &Params) -> Result<String, FrameworkError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_context_carries_request() {
        let base: Arc<dyn ViewContext> = Arc::new(StandardViewContext::new());
        assert!(base.options().is_none());

        let request = Request::get("/books");
        let scoped = base.with(ContextOptions::new(&request, &Response::new()).with("title", "Books"));
        let options = scoped.options().unwrap();
        assert_eq!(options.request.as_ref().unwrap().path, "/books");
        assert_eq!(options.extra["title"], "Books");
    }

    #[test]
    fn closures_are_views() {
        let view = |_: Option<&Arc<dyn ViewContext>>, params: &Params| -> Result<String, FrameworkError> {
            Ok(format!("{} books", params.len()))
        };
        assert_eq!(View::call(&view, None, &Params::new()).unwrap(), "0 books");
    }
}
