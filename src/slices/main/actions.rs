//! Actions of the main slice.
//!
//! Each handler expects the `repository` dependency; the index also expects
//! `per_page`. [`Bookshelf`](crate::lifecycle::Bookshelf) supplies both when
//! building an action.

use crate::model::{Book, BookCreate};
use crate::repository::{BookError, BookRepository};
use async_trait::async_trait;
use serde_json::{json, Value as Json};
use slice_framework::{ActionHandler, Collaborators, FrameworkError, Params, Request, Response};
use tracing::debug;

pub const REPOSITORY: &str = "repository";
pub const PER_PAGE: &str = "per_page";

pub(crate) fn book_id(req: &Request) -> Result<u32, FrameworkError> {
    req.params
        .get("id")
        .and_then(Json::as_u64)
        .and_then(|id| u32::try_from(id).ok())
        .ok_or_else(|| FrameworkError::handler(BookError::InvalidId))
}

fn id_params(id: u32) -> Params {
    let mut params = Params::new();
    params.insert("id".into(), id.into());
    params
}

/// The book as JSON, with its `path` when a routes helper is available.
fn book_entry(book: &Book, collaborators: &Collaborators) -> Result<Json, FrameworkError> {
    let mut entry = serde_json::to_value(book).map_err(FrameworkError::handler)?;
    if let (Some(routes), Json::Object(map)) = (&collaborators.routes, &mut entry) {
        map.insert("path".into(), routes.path("book", &id_params(book.id))?.into());
    }
    Ok(entry)
}

pub mod home {
    use super::*;

    /// Landing page. Remembers a `theme` param in a cookie.
    pub struct Show;

    #[async_trait]
    impl ActionHandler for Show {
        fn name(&self) -> &str {
            "Main::Actions::Home::Show"
        }

        async fn handle(
            &self,
            _collaborators: &Collaborators,
            req: &mut Request,
            res: &mut Response,
        ) -> Result<(), FrameworkError> {
            let requested = req.params.get("theme").and_then(Json::as_str).map(str::to_string);
            let theme = match requested {
                Some(theme) => {
                    res.cookies_mut()?.set("theme", theme.clone());
                    theme
                }
                None => req.cookies()?.get("theme").unwrap_or("light").to_string(),
            };
            req.params.insert("theme".into(), theme.into());
            Ok(())
        }
    }
}

pub mod books {
    use super::*;

    pub struct Index;

    #[async_trait]
    impl ActionHandler for Index {
        fn name(&self) -> &str {
            "Main::Actions::Books::Index"
        }

        async fn handle(
            &self,
            collaborators: &Collaborators,
            req: &mut Request,
            _res: &mut Response,
        ) -> Result<(), FrameworkError> {
            let repository: BookRepository = collaborators.dependency(REPOSITORY)?;
            let per_page: usize = collaborators.dependency(PER_PAGE)?;
            let books = repository.list(per_page).await;
            debug!(count = books.len(), per_page, "Listing books");
            let entries = books
                .iter()
                .map(|book| book_entry(book, collaborators))
                .collect::<Result<Vec<_>, _>>()?;
            req.params.insert("books".into(), Json::Array(entries));
            Ok(())
        }
    }

    pub struct Show;

    #[async_trait]
    impl ActionHandler for Show {
        fn name(&self) -> &str {
            "Main::Actions::Books::Show"
        }

        async fn handle(
            &self,
            collaborators: &Collaborators,
            req: &mut Request,
            res: &mut Response,
        ) -> Result<(), FrameworkError> {
            let repository: BookRepository = collaborators.dependency(REPOSITORY)?;
            match repository.get(book_id(req)?).await {
                Ok(book) => {
                    req.params.insert("book".into(), book_entry(&book, collaborators)?);
                    Ok(())
                }
                Err(BookError::NotFound(_)) => {
                    res.halt(404, "Book not found");
                    Ok(())
                }
                Err(e) => Err(FrameworkError::handler(e)),
            }
        }
    }

    /// The empty form; rendered by `views.books.new`.
    pub struct New;

    #[async_trait]
    impl ActionHandler for New {
        fn name(&self) -> &str {
            "Main::Actions::Books::New"
        }

        async fn handle(
            &self,
            _collaborators: &Collaborators,
            _req: &mut Request,
            _res: &mut Response,
        ) -> Result<(), FrameworkError> {
            Ok(())
        }
    }

    /// Adds a book and redirects to it. Invalid input re-renders the form:
    /// no `views.books.create` exists, so the inferred `views.books.new` is
    /// used, but only for the 422 case.
    pub struct Create;

    #[async_trait]
    impl ActionHandler for Create {
        fn name(&self) -> &str {
            "Main::Actions::Books::Create"
        }

        async fn handle(
            &self,
            collaborators: &Collaborators,
            req: &mut Request,
            res: &mut Response,
        ) -> Result<(), FrameworkError> {
            let repository: BookRepository = collaborators.dependency(REPOSITORY)?;
            match repository.create(BookCreate::from_params(&req.params)).await {
                Ok(book) => {
                    let location = match &collaborators.routes {
                        Some(routes) => routes.path("book", &id_params(book.id))?,
                        None => format!("/books/{}", book.id),
                    };
                    res.set_status(302);
                    res.set_header("Location", location);
                    Ok(())
                }
                Err(BookError::Invalid(fields)) => {
                    res.set_status(422);
                    req.params.insert("errors".into(), json!(fields));
                    Ok(())
                }
                Err(e) => Err(FrameworkError::handler(e)),
            }
        }

        fn render(&self, collaborators: &Collaborators, res: &Response) -> bool {
            res.status() == 422 && collaborators.view.is_some() && res.body().is_empty()
        }
    }
}
