//! # Slice Recipe
//!
//! A small bookshelf application assembled from slices with
//! [`slice_framework`].
//!
//! ## Core Components
//!
//! - **[slices]**: the `main` catalog slice and the `admin` back-office
//!   slice, each with its own actions, views and action settings.
//! - **[repository]**: the in-memory [`BookRepository`], started lazily by the
//!   `books` provider.
//! - **[routes]**: request recognition and the `routes_helper` component.
//! - **[lifecycle]**: the [`Bookshelf`] assembly plus tracing setup.
//!
//! ## Quick Start
//!
//! The binary entry point (`src/main.rs`) demonstrates:
//! 1. Configuring and booting a [`Bookshelf`].
//! 2. Browsing and adding books through the `main` slice.
//! 3. Using the session-backed `admin` slice with its CSRF token.
//!
//! ## Testing
//!
//! See [`slice_framework::mock`] for view, inferrer and routes doubles, and
//! `tests/integration_test.rs` for end-to-end requests.

pub mod lifecycle;
pub mod model;
pub mod repository;
pub mod routes;
pub mod slices;

pub use lifecycle::Bookshelf;
pub use model::{Book, BookCreate};
pub use repository::{BookError, BookRepository};
