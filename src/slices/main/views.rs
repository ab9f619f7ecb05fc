//! HTML views of the main slice. Each reads what its action put into the
//! request params.

use crate::slices::{escape, site_title};
use serde_json::Value as Json;
use slice_framework::view::ViewContext;
use slice_framework::{FrameworkError, Params};
use std::sync::Arc;

fn text<'a>(value: Option<&'a Json>, field: &str) -> &'a str {
    value
        .and_then(|v| v.get(field))
        .and_then(Json::as_str)
        .unwrap_or_default()
}

pub fn home_show(
    context: Option<&Arc<dyn ViewContext>>,
    params: &Params,
) -> Result<String, FrameworkError> {
    let theme = params.get("theme").and_then(Json::as_str).unwrap_or("light");
    Ok(format!(
        "<h1>{}</h1><p class=\"theme-{}\">Welcome!</p><a href=\"/books\">Browse books</a>",
        escape(&site_title(context)),
        escape(theme)
    ))
}

pub fn books_index(
    context: Option<&Arc<dyn ViewContext>>,
    params: &Params,
) -> Result<String, FrameworkError> {
    let books = params
        .get("books")
        .and_then(Json::as_array)
        .ok_or_else(|| FrameworkError::Render("books index needs `books`".into()))?;
    let items: String = books
        .iter()
        .map(|book| {
            format!(
                "<li><a href=\"{}\">{}</a> by {}</li>",
                escape(text(Some(book), "path")),
                escape(text(Some(book), "title")),
                escape(text(Some(book), "author"))
            )
        })
        .collect();
    Ok(format!(
        "<h1>{}</h1><ul>{items}</ul>",
        escape(&site_title(context))
    ))
}

pub fn books_show(
    _context: Option<&Arc<dyn ViewContext>>,
    params: &Params,
) -> Result<String, FrameworkError> {
    let book = params.get("book");
    Ok(format!(
        "<h1>{}</h1><p>by {}</p>",
        escape(text(book, "title")),
        escape(text(book, "author"))
    ))
}

/// The new-book form, re-rendered with errors when a create fails.
pub fn books_new(
    _context: Option<&Arc<dyn ViewContext>>,
    params: &Params,
) -> Result<String, FrameworkError> {
    let errors: String = params
        .get("errors")
        .and_then(Json::as_array)
        .map(|errors| {
            errors
                .iter()
                .filter_map(Json::as_str)
                .map(|field| format!("<li>{} can't be blank</li>", escape(field)))
                .collect()
        })
        .unwrap_or_default();
    let value = |field: &str| escape(params.get(field).and_then(Json::as_str).unwrap_or_default());
    Ok(format!(
        "<h1>New book</h1><ul class=\"errors\">{errors}</ul>\
         <form action=\"/books\" method=\"post\">\
         <input name=\"title\" value=\"{}\"><input name=\"author\" value=\"{}\"></form>",
        value("title"),
        value("author")
    ))
}
