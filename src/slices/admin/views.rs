use crate::slices::{escape, site_title};
use serde_json::Value as Json;
use slice_framework::action::behavior::CSRF_TOKEN;
use slice_framework::view::ViewContext;
use slice_framework::{FrameworkError, Params};
use std::sync::Arc;

pub fn dashboard_show(
    context: Option<&Arc<dyn ViewContext>>,
    params: &Params,
) -> Result<String, FrameworkError> {
    let number = |name: &str| params.get(name).and_then(Json::as_u64).unwrap_or(0);
    let token = params.get(CSRF_TOKEN).and_then(Json::as_str).unwrap_or_default();
    Ok(format!(
        "<h1>{} Admin</h1><p>{} books</p><p>Visit #{}</p>\
         <input type=\"hidden\" name=\"{CSRF_TOKEN}\" value=\"{}\">",
        escape(&site_title(context)),
        number("book_count"),
        number("visits"),
        escape(token)
    ))
}
