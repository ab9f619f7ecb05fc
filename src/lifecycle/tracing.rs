//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing` subscriber for the whole
//! application. Every action call runs inside an `action` span carrying its
//! slice and action name, so log lines read as a request path:
//!
//! ```text
//! INFO request:action: Created book_id=4 size=4
//! INFO Handled action="Main::Actions::Books::Create" status=302 elapsed_us=87
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Compact logs (default)
//! RUST_LOG=info cargo run
//!
//! # Provider starts, view resolution and behavior details
//! RUST_LOG=debug cargo run
//!
//! # Only the framework
//! RUST_LOG=slice_framework=debug cargo run
//! ```
//!
//! The framework's own `logger` component is separate: it is what actions and
//! providers resolve from the container, and it forwards to these same
//! subscribers with the application name attached.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
