use slice_framework::action::behavior::CSRF_TOKEN;
use slice_framework::{Env, Request, Session};
use slice_recipe::lifecycle::tracing::setup_tracing;
use slice_recipe::Bookshelf;
use tracing::{info, warn, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    // Setup tracing once for the entire application
    setup_tracing();

    info!("Starting bookshelf");

    let shelf = Bookshelf::new(Env::from_process()).map_err(|e| e.to_string())?;
    shelf.boot().map_err(|e| e.to_string())?;

    // Browse the catalog
    let span = tracing::info_span!("request", path = "/books");
    let res = async {
        shelf
            .call(Request::get("/books"))
            .await
            .map_err(|e| e.to_string())
    }
    .instrument(span)
    .await?;
    info!(status = res.status(), body = res.body(), "Catalog");

    // Add a book
    let span = tracing::info_span!("request", path = "/books");
    let res = async {
        shelf
            .call(
                Request::post("/books")
                    .with_param("title", "Kindred")
                    .with_param("author", "Octavia E. Butler"),
            )
            .await
            .map_err(|e| e.to_string())
    }
    .instrument(span)
    .await?;
    info!(status = res.status(), location = ?res.header("Location"), "Book added");

    // Admin: the first visit issues a CSRF token, the delete must send it back
    let session = Session::new();
    let span = tracing::info_span!("request", path = "/admin");
    let res = async {
        shelf
            .call(Request::get("/admin").with_session(session.clone()))
            .await
            .map_err(|e| e.to_string())
    }
    .instrument(span)
    .await;
    match res {
        Ok(res) => info!(status = res.status(), body = res.body(), "Dashboard"),
        Err(e) => warn!(error = %e, "Admin slice unavailable"),
    }

    if let Some(token) = session.get(CSRF_TOKEN).and_then(|t| t.as_str().map(str::to_string)) {
        let span = tracing::info_span!("request", path = "/admin/books/1/delete");
        let res = async {
            shelf
                .call(
                    Request::post("/admin/books/1/delete")
                        .with_session(session.clone())
                        .with_param(CSRF_TOKEN, token),
                )
                .await
                .map_err(|e| e.to_string())
        }
        .instrument(span)
        .await?;
        info!(status = res.status(), "Book deleted");
    }

    shelf.shutdown().map_err(|e| e.to_string())?;
    info!("Application finished");

    Ok(())
}
