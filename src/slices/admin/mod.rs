//! The back-office slice. It enables sessions for itself only and has no
//! view context of its own, so its views get the application's.

pub mod actions;
pub mod views;

use slice_framework::{Application, FrameworkError, Slice};
use std::sync::Arc;

pub const NAME: &str = "admin";

/// Registers the slice, enables cookie sessions for it and adds its views.
/// `None` when the slice load/skip lists exclude it.
pub fn register(app: &Application) -> Result<Option<Arc<Slice>>, FrameworkError> {
    let Some(slice) = app.register_slice(NAME)? else {
        return Ok(None);
    };
    slice.configure_actions(|actions| actions.set_sessions("cookie"))?;
    slice.register_view("views.dashboard.show", views::dashboard_show)?;
    Ok(Some(slice))
}
