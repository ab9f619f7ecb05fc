use crate::model::BookCreate;
use crate::repository::{self, BookRepository, REPOSITORY_KEY};
use crate::routes::{AppRoutes, Route};
use crate::slices::main::actions::{books, home, PER_PAGE, REPOSITORY};
use crate::slices::{admin, main, PageContext};
use serde::Deserialize;
use slice_framework::config::actions::DEFAULT_VIEW_CONTEXT_IDENTIFIER;
use slice_framework::providers::standard::{RACK_MONITOR, ROUTES_HELPER};
use slice_framework::view::{RoutesHelper, ViewContext};
use slice_framework::{
    ActionHandler, Application, Env, FrameworkError, Monitor, Request, Response, Setting,
    SettingsDefinition, Value,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

pub const APP_NAME: &str = "bookshelf";
pub const DEFAULT_PER_PAGE: i64 = 20;

/// Typed view of the application settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BookshelfSettings {
    pub per_page: usize,
    pub session_secret: Option<String>,
}

/// The assembled bookshelf application.
///
/// `Bookshelf` is responsible for:
/// - **Configuration**: settings, default headers and per-slice overrides
/// - **Wiring**: the `books` provider, the routes helper and the application
///   view context
/// - **Dispatch**: recognizing a request and running one fresh action for it
///
/// # Example
///
/// ```no_run
/// # async fn demo() -> Result<(), slice_framework::FrameworkError> {
/// use slice_recipe::lifecycle::Bookshelf;
/// use slice_framework::{Env, Request};
///
/// let shelf = Bookshelf::new(Env::from_process())?;
/// shelf.boot()?;
/// let res = shelf.call(Request::get("/books")).await?;
/// assert_eq!(res.status(), 200);
/// shelf.shutdown()?;
/// # Ok(())
/// # }
/// ```
pub struct Bookshelf {
    app: Application,
}

impl Bookshelf {
    /// Configures and prepares the application. Providers stay lazy until
    /// [`boot`](Self::boot) or first use.
    pub fn new(env: Env) -> Result<Self, FrameworkError> {
        Self::with_books(env, seed_books())
    }

    /// Like [`new`](Self::new), with a custom starting catalog.
    pub fn with_books(env: Env, books: Vec<BookCreate>) -> Result<Self, FrameworkError> {
        let app = Application::with_env(APP_NAME, env);

        // 1. Application-wide configuration
        app.configure(|config| {
            config.settings = Some(settings_definition());
            config.actions.set_default_response_format("html")?;
            let mut headers = BTreeMap::new();
            headers.insert("X-Frame-Options".to_string(), Value::from("DENY"));
            config.actions.set_default_headers(Value::Map(headers))
        })?;

        // 2. Shared components
        app.register_provider(repository::provider(books))?;
        app.register(ROUTES_HELPER, Arc::new(AppRoutes) as Arc<dyn RoutesHelper>)?;
        app.register(
            DEFAULT_VIEW_CONTEXT_IDENTIFIER,
            Arc::new(PageContext::new("Bookshelf")) as Arc<dyn ViewContext>,
        )?;

        // 3. Slices (either may be skipped by HANAMI_LOAD_SLICES / HANAMI_SKIP_SLICES)
        main::register(&app)?;
        admin::register(&app)?;

        app.prepare()?;

        // Starts only the monitor provider.
        let monitor: Monitor = app.get(RACK_MONITOR)?;
        monitor.subscribe("action.call", |event| {
            info!(
                action = event.payload.get("action").and_then(|a| a.as_str()).unwrap_or_default(),
                status = event.payload.get("status").and_then(|s| s.as_u64()).unwrap_or_default(),
                elapsed_us = event.elapsed.as_micros() as u64,
                "Handled"
            );
        });

        info!(slices = ?app.slices().names(), "Bookshelf ready");
        Ok(Self { app })
    }

    pub fn app(&self) -> &Application {
        &self.app
    }

    pub fn settings(&self) -> Result<BookshelfSettings, FrameworkError> {
        self.app.settings()?.deserialize()
    }

    /// Starts every provider eagerly.
    pub fn boot(&self) -> Result<(), FrameworkError> {
        self.app.boot()
    }

    /// Dispatches one request. Unknown paths and paths of skipped slices
    /// answer 404 without building an action.
    pub async fn call(&self, mut req: Request) -> Result<Response, FrameworkError> {
        let Some(route) = Route::recognize(req.method, &req.path) else {
            debug!(path = %req.path, "No route");
            return Ok(not_found());
        };
        if !self.app.slices().contains(route.slice()) {
            debug!(path = %req.path, slice = route.slice(), "Slice not loaded");
            return Ok(not_found());
        }
        if let Route::BookShow(id) | Route::AdminBookDestroy(id) = route {
            req.params.insert("id".into(), id.into());
        }

        let slice = route.slice();
        match route {
            Route::Home => self.run(slice, home::Show, req).await,
            Route::BooksIndex => self.run(slice, books::Index, req).await,
            Route::BooksNew => self.run(slice, books::New, req).await,
            Route::BooksCreate => self.run(slice, books::Create, req).await,
            Route::BookShow(_) => self.run(slice, books::Show, req).await,
            Route::AdminDashboard => {
                self.run(slice, admin::actions::dashboard::Show, req).await
            }
            Route::AdminBookDestroy(_) => {
                self.run(slice, admin::actions::books::Destroy, req).await
            }
        }
    }

    async fn run<H: ActionHandler>(
        &self,
        slice: &str,
        handler: H,
        req: Request,
    ) -> Result<Response, FrameworkError> {
        let repository: BookRepository = self.app.slice(slice)?.get(REPOSITORY_KEY)?;
        let settings = self.settings()?;
        let action = self
            .app
            .action(slice, handler)?
            .dependency(REPOSITORY, repository)
            .dependency(PER_PAGE, settings.per_page)
            .build();
        action.call(req).await
    }

    /// Stops started providers, slices first.
    pub fn shutdown(&self) -> Result<(), FrameworkError> {
        info!("Shutting down bookshelf");
        self.app.shutdown()
    }
}

fn not_found() -> Response {
    let mut res = Response::new();
    res.halt(404, "Not Found");
    res
}

fn settings_definition() -> SettingsDefinition {
    SettingsDefinition::new()
        .setting(
            Setting::new("per_page")
                .with_default(DEFAULT_PER_PAGE)
                .constructor(positive_int),
        )
        .setting(Setting::new("session_secret"))
}

fn positive_int(value: Value) -> Result<Value, String> {
    let n = match &value {
        Value::Int(n) => *n,
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| format!("expected a number, got {s:?}: {e}"))?,
        other => return Err(format!("expected a number, got {other:?}")),
    };
    if n > 0 {
        Ok(Value::Int(n))
    } else {
        Err(format!("expected a positive number, got {n}"))
    }
}

fn seed_books() -> Vec<BookCreate> {
    vec![
        BookCreate::new("Dune", "Frank Herbert"),
        BookCreate::new("The Left Hand of Darkness", "Ursula K. Le Guin"),
        BookCreate::new("Solaris", "Stanislaw Lem"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_int_parses_env_strings() {
        assert_eq!(positive_int(Value::from("5")).unwrap().as_int(), Some(5));
        assert!(positive_int(Value::from("0")).is_err());
        assert!(positive_int(Value::from("many")).is_err());
        assert!(positive_int(Value::Bool(true)).is_err());
    }

    #[test]
    fn settings_come_from_env_with_defaults() {
        let shelf = Bookshelf::new(Env::from_pairs([("SESSION_SECRET", "s3cret")])).unwrap();
        assert_eq!(
            shelf.settings().unwrap(),
            BookshelfSettings {
                per_page: 20,
                session_secret: Some("s3cret".into()),
            }
        );

        let shelf = Bookshelf::new(Env::from_pairs([("PER_PAGE", "abc")])).unwrap();
        assert_eq!(shelf.settings().unwrap().per_page, 20);
        assert_eq!(shelf.settings().unwrap().session_secret, None);
    }
}
