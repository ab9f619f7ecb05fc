//! # Framework Errors
//!
//! This module defines the error types shared by the configuration tree, the
//! containers, the boot sequencer and the action layer.
//!
//! Two families exist:
//!
//! - [`ConfigurationError`] covers programmer/operator misconfiguration of a
//!   settings scope. It always names the scope and the setting involved.
//! - [`FrameworkError`] is everything else. Configuration errors convert into it
//!   through `#[from]`, so `?` works across both.
//!
//! Missing views, view contexts and routes helpers are *not* errors: the
//! action resolvers treat absence as a valid configuration.

/// Errors raised while reading or writing a [`Configuration`](crate::config::Configuration).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Undeclared setting `{name}` in {scope} configuration")]
    Undeclared { scope: String, name: String },
    #[error("Invalid value for setting `{name}` in {scope} configuration: {reason}")]
    Invalid {
        scope: String,
        name: String,
        reason: String,
    },
    #[error("Cannot set `{name}`: {scope} configuration is finalized")]
    Finalized { scope: String, name: String },
}

/// Errors that can occur within the framework itself.
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("Nothing registered with key {0:?}")]
    MissingCollaborator(String),
    #[error("There is already an item registered with key {0:?}")]
    AlreadyRegistered(String),
    #[error("Component {key:?} is not a {expected}")]
    TypeMismatch { key: String, expected: &'static str },
    #[error("To use `{method}`, please enable sessions for the current slice")]
    MissingSession { method: &'static str },
    #[error("To use `{method}`, please enable cookies for the current slice")]
    MissingCookies { method: &'static str },
    #[error("Invalid CSRF token")]
    InvalidCsrfToken,
    #[error("Slice {0:?} is already registered")]
    SliceAlreadyRegistered(String),
    #[error("Slice not found: {0}")]
    SliceNotFound(String),
    #[error("Provider {provider:?} failed: {reason}")]
    ProviderFailed { provider: String, reason: String },
    #[error("Provider {0:?} has already started and cannot be replaced")]
    ProviderStarted(String),
    #[error("Rendering failed: {0}")]
    Render(String),
    #[error("No route named {0:?}")]
    RouteNotFound(String),
    #[error("Handler error: {0}")]
    Handler(Box<dyn std::error::Error + Send + Sync>),
}

impl FrameworkError {
    /// Wraps an arbitrary handler error.
    pub fn handler(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        FrameworkError::Handler(Box::new(e))
    }

    /// True for errors that represent misconfiguration rather than a request-time fault.
    pub fn is_misconfiguration(&self) -> bool {
        matches!(
            self,
            FrameworkError::Configuration(_)
                | FrameworkError::MissingSession { .. }
                | FrameworkError::MissingCookies { .. }
                | FrameworkError::SliceAlreadyRegistered(_)
                | FrameworkError::ProviderStarted(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_session_message_tells_operator_what_to_do() {
        let err = FrameworkError::MissingSession { method: "session" };
        assert_eq!(
            err.to_string(),
            "To use `session`, please enable sessions for the current slice"
        );
        assert!(err.is_misconfiguration());
    }

    #[test]
    fn configuration_errors_convert() {
        let err: FrameworkError = ConfigurationError::Undeclared {
            scope: "actions".into(),
            name: "nope".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Undeclared setting `nope` in actions configuration"
        );
    }
}
