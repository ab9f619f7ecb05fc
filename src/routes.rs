//! Route table for the bookshelf: recognition of incoming requests and named
//! path generation for actions (registered as `routes_helper`).

use slice_framework::view::RoutesHelper;
use slice_framework::{FrameworkError, Method, Params};

/// A recognized endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    BooksIndex,
    BooksNew,
    BooksCreate,
    BookShow(u32),
    AdminDashboard,
    AdminBookDestroy(u32),
}

impl Route {
    pub fn recognize(method: Method, path: &str) -> Option<Self> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let route = match (method, segments.as_slice()) {
            (Method::Get, []) => Route::Home,
            (Method::Get, ["books"]) => Route::BooksIndex,
            (Method::Get, ["books", "new"]) => Route::BooksNew,
            (Method::Post, ["books"]) => Route::BooksCreate,
            (Method::Get, ["books", id]) => Route::BookShow(id.parse().ok()?),
            (Method::Get, ["admin"]) => Route::AdminDashboard,
            (Method::Post, ["admin", "books", id, "delete"]) => {
                Route::AdminBookDestroy(id.parse().ok()?)
            }
            _ => return None,
        };
        Some(route)
    }

    /// The slice serving this route.
    pub fn slice(self) -> &'static str {
        match self {
            Route::AdminDashboard | Route::AdminBookDestroy(_) => "admin",
            _ => "main",
        }
    }
}

const NAMED_ROUTES: [(&str, &str); 6] = [
    ("root", "/"),
    ("books", "/books"),
    ("new_book", "/books/new"),
    ("book", "/books/:id"),
    ("admin", "/admin"),
    ("delete_admin_book", "/admin/books/:id/delete"),
];

/// Named path generation over the bookshelf route table.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppRoutes;

impl RoutesHelper for AppRoutes {
    fn path(&self, name: &str, params: &Params) -> Result<String, FrameworkError> {
        let (_, pattern) = NAMED_ROUTES
            .iter()
            .find(|(route, _)| *route == name)
            .ok_or_else(|| FrameworkError::RouteNotFound(name.to_string()))?;
        let segments = pattern
            .split('/')
            .map(|segment| match segment.strip_prefix(':') {
                Some(key) => match params.get(key) {
                    Some(serde_json::Value::String(value)) => Ok(value.clone()),
                    Some(value) => Ok(value.to_string()),
                    None => Err(FrameworkError::RouteNotFound(format!("{name} (missing :{key})"))),
                },
                None => Ok(segment.to_string()),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(segments.join("/"))
    }
}
