//! # Slices
//!
//! The bookshelf is split into two slices:
//!
//! - **main**: the public catalog. Cookies only; no sessions, so no CSRF.
//! - **admin**: the back office. Sessions enabled, which turns CSRF
//!   protection on for it alone.
//!
//! Both share the application's `books.repository` and `routes_helper`. The
//! main slice registers its own `view.context`; admin falls back to the
//! application's.

pub mod admin;
pub mod main;

use slice_framework::view::{ContextOptions, ViewContext};
use std::sync::Arc;

/// A view context that stamps a site title into the render options.
#[derive(Debug, Clone)]
pub struct PageContext {
    title: String,
    options: Option<ContextOptions>,
}

impl PageContext {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            options: None,
        }
    }
}

impl ViewContext for PageContext {
    fn with(&self, options: ContextOptions) -> Arc<dyn ViewContext> {
        Arc::new(Self {
            title: self.title.clone(),
            options: Some(options.with("site_title", self.title.clone())),
        })
    }

    fn options(&self) -> Option<&ContextOptions> {
        self.options.as_ref()
    }
}

/// The site title a view was rendered with, if its context carried one.
pub fn site_title(context: Option<&Arc<dyn ViewContext>>) -> String {
    context
        .and_then(|ctx| ctx.options())
        .and_then(|options| options.extra.get("site_title"))
        .and_then(serde_json::Value::as_str)
        .unwrap_or("Bookshelf")
        .to_string()
}

/// Minimal HTML escaping for interpolated text.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
