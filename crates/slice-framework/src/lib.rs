//! # Slice Framework
//!
//! This crate provides the composition layer for building a monolithic web
//! application out of independently configurable **slices**: bounded
//! sub-applications, each with its own dependency container, action base,
//! view resolution and configuration overrides.
//!
//! ## Architecture Overview
//!
//! Leaf first:
//!
//! 1. **Containers** ([`Container`]) - key → lazily constructed, memoized
//!    components, with the application container as every slice's parent.
//! 2. **Configuration tree** ([`config`]) - declared settings with defaults,
//!    environment overrides and snapshot copy-down from parent to child.
//! 3. **Slice registry** ([`SliceRegistry`]) - registered slices and which ones
//!    the `HANAMI_LOAD_SLICES` / `HANAMI_SKIP_SLICES` lists skipped.
//! 4. **Action bases** ([`ActionBase`]) - one per slice: a snapshot of the
//!    slice's action settings plus a capability set (sessions, CSRF, cookies).
//! 5. **Actions** ([`Action`]) - per-request units that resolve their view,
//!    view context and routes helper when built.
//! 6. **Providers** ([`Provider`]) - named start-up units, booted eagerly or
//!    started lazily on first resolution.
//!
//! ## Quick Start
//!
//! ```rust
//! use slice_framework::{Application, Env, Provider};
//!
//! let app = Application::with_env("bookshelf", Env::default());
//! app.register_provider(Provider::new("logger").start(|container| {
//!     container.register("logger", "custom logger".to_string())
//! }))
//! .unwrap();
//! let main = app.register_slice("main").unwrap().unwrap();
//!
//! // Lazy: nothing has started yet, but the key is claimed.
//! app.prepare().unwrap();
//! assert!(app.key("logger"));
//! assert_eq!(main.get::<String>("logger").unwrap(), "custom logger");
//! ```
//!
//! ## Missing collaborators
//!
//! A slice without a view for some action, without a view context or without
//! a routes helper is valid. Explicit container lookups fail with
//! [`FrameworkError::MissingCollaborator`]; the action resolvers never do.
//!
//! ## Testing
//!
//! The [`mock`] module has in-memory views, inferrers, view contexts and
//! routes for unit-testing actions.

pub mod action;
pub mod application;
pub mod config;
pub mod container;
pub mod error;
pub mod http;
pub mod inflector;
pub mod mock;
pub mod providers;
pub mod slice;
pub mod view;

// Re-export core types for convenience
pub use action::{Action, ActionBase, ActionBuilder, ActionHandler, Capability, Collaborators};
pub use application::{Application, BootState};
pub use config::{ApplicationConfiguration, Env, Setting, Settings, SettingsDefinition, Value};
pub use container::{Component, Container};
pub use error::{ConfigurationError, FrameworkError};
pub use http::{Method, Params, Request, Response, Session};
pub use inflector::{Inflector, SliceName};
pub use providers::{Logger, Monitor, Provider};
pub use slice::{Slice, SliceRegistry};
