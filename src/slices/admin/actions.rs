//! Actions of the admin slice. Sessions are on here, so every request has a
//! session and every POST must carry the session's CSRF token.

use crate::repository::{BookError, BookRepository};
use crate::slices::main::actions::{book_id, REPOSITORY};
use async_trait::async_trait;
use serde_json::Value as Json;
use slice_framework::action::behavior::CSRF_TOKEN;
use slice_framework::{ActionHandler, Collaborators, FrameworkError, Params, Request, Response};
use tracing::info;

pub mod dashboard {
    use super::*;

    /// Counts visits in the session and exposes the CSRF token to the view.
    pub struct Show;

    #[async_trait]
    impl ActionHandler for Show {
        fn name(&self) -> &str {
            "Admin::Actions::Dashboard::Show"
        }

        async fn handle(
            &self,
            collaborators: &Collaborators,
            req: &mut Request,
            _res: &mut Response,
        ) -> Result<(), FrameworkError> {
            let repository: BookRepository = collaborators.dependency(REPOSITORY)?;
            let (visits, token) = {
                let session = req.session()?;
                let visits = session.get("visits").and_then(|v| v.as_u64()).unwrap_or(0) + 1;
                session.insert("visits", visits);
                (visits, session.get(CSRF_TOKEN).unwrap_or(Json::Null))
            };
            req.params.insert("visits".into(), visits.into());
            req.params.insert("book_count".into(), repository.count().await.into());
            req.params.insert(CSRF_TOKEN.into(), token);
            Ok(())
        }
    }
}

pub mod books {
    use super::*;

    /// Removes a book and redirects to the dashboard.
    pub struct Destroy;

    #[async_trait]
    impl ActionHandler for Destroy {
        fn name(&self) -> &str {
            "Admin::Actions::Books::Destroy"
        }

        async fn handle(
            &self,
            collaborators: &Collaborators,
            req: &mut Request,
            res: &mut Response,
        ) -> Result<(), FrameworkError> {
            let repository: BookRepository = collaborators.dependency(REPOSITORY)?;
            match repository.delete(book_id(req)?).await {
                Ok(book) => {
                    info!(book_id = book.id, title = %book.title, "Book removed by admin");
                    let location = match &collaborators.routes {
                        Some(routes) => routes.path("admin", &Params::new())?,
                        None => "/admin".to_string(),
                    };
                    res.set_status(302);
                    res.set_header("Location", location);
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
}
