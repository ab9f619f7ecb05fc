//! The public catalog slice.

pub mod actions;
pub mod views;

use crate::slices::PageContext;
use slice_framework::{Application, FrameworkError, Slice};
use std::sync::Arc;

pub const NAME: &str = "main";

/// Registers the slice with its views and view context. `None` when the
/// slice load/skip lists exclude it.
pub fn register(app: &Application) -> Result<Option<Arc<Slice>>, FrameworkError> {
    let Some(slice) = app.register_slice(NAME)? else {
        return Ok(None);
    };
    slice.register_view("views.home.show", views::home_show)?;
    slice.register_view("views.books.index", views::books_index)?;
    slice.register_view("views.books.show", views::books_show)?;
    slice.register_view("views.books.new", views::books_new)?;
    slice.register_view_context("view.context", PageContext::new("Bookshelf Catalog"))?;
    Ok(Some(slice))
}
