//! Capability objects composed into an action by its base's capability set.
//!
//! Each behavior touches one concern (session storage, CSRF verification,
//! the cookie jar). `before` hooks run in capability order ahead of the
//! handler, `after` hooks run in reverse once the response is complete.

use crate::action::base::Capability;
use crate::error::FrameworkError;
use crate::http::{CookieJar, Request, Response};
use rand::RngCore;
use serde_json::Value as Json;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Session key holding the CSRF token.
pub const CSRF_TOKEN: &str = "_csrf_token";

pub trait Behavior: Send + Sync {
    fn capability(&self) -> Capability;

    fn before(&self, _req: &mut Request, _res: &mut Response) -> Result<(), FrameworkError> {
        Ok(())
    }

    fn after(&self, _req: &Request, _res: &mut Response) -> Result<(), FrameworkError> {
        Ok(())
    }
}

/// Exposes the transport's session (or a fresh one) on request and response.
#[derive(Debug, Default)]
pub struct SessionBehavior;

impl Behavior for SessionBehavior {
    fn capability(&self) -> Capability {
        Capability::Sessions
    }

    fn before(&self, req: &mut Request, res: &mut Response) -> Result<(), FrameworkError> {
        let session = req.open_session();
        res.attach_session(session);
        Ok(())
    }
}

/// Keeps a per-session token and checks it on state-changing requests.
#[derive(Debug, Default)]
pub struct CsrfProtection;

impl CsrfProtection {
    fn generate_token() -> String {
        let mut bytes = [0_u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl Behavior for CsrfProtection {
    fn capability(&self) -> Capability {
        Capability::CsrfProtection
    }

    fn before(&self, req: &mut Request, _res: &mut Response) -> Result<(), FrameworkError> {
        let session = req.session().map_err(|_| FrameworkError::MissingSession {
            method: "csrf_token",
        })?;
        let expected = match session.get(CSRF_TOKEN) {
            Some(Json::String(token)) => token,
            _ => {
                let token = Self::generate_token();
                session.insert(CSRF_TOKEN, token.clone());
                token
            }
        };

        if req.method.is_safe() {
            return Ok(());
        }
        match req.params.get(CSRF_TOKEN).and_then(Json::as_str) {
            Some(given) if given == expected => Ok(()),
            _ => {
                warn!(path = %req.path, "Invalid CSRF token");
                Err(FrameworkError::InvalidCsrfToken)
            }
        }
    }
}

/// Parses the `Cookie` header into a jar and writes changes back as
/// `Set-Cookie`.
#[derive(Debug, Default)]
pub struct CookieBehavior {
    options: BTreeMap<String, Json>,
}

impl CookieBehavior {
    pub fn new(options: BTreeMap<String, Json>) -> Self {
        Self { options }
    }
}

impl Behavior for CookieBehavior {
    fn capability(&self) -> Capability {
        Capability::Cookies
    }

    fn before(&self, req: &mut Request, res: &mut Response) -> Result<(), FrameworkError> {
        let jar = CookieJar::parse(req.header("cookie"), self.options.clone());
        req.attach_cookies(jar.clone());
        res.attach_cookies(jar);
        Ok(())
    }

    fn after(&self, _req: &Request, res: &mut Response) -> Result<(), FrameworkError> {
        let headers = res.cookies()?.set_cookie_headers();
        if !headers.is_empty() {
            debug!(count = headers.len(), "Writing cookies");
            res.set_header("Set-Cookie", headers.join("\n"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Method, Session};

    fn with_session(method: Method) -> (Request, Response) {
        let mut req = Request::new(method, "/books");
        let mut res = Response::new();
        SessionBehavior.before(&mut req, &mut res).unwrap();
        (req, res)
    }

    #[test]
    fn session_is_shared_between_request_and_response() {
        let session = Session::new();
        session.insert("user_id", 7);
        let mut req = Request::get("/").with_session(session);
        let mut res = Response::new();
        SessionBehavior.before(&mut req, &mut res).unwrap();

        res.session().unwrap().insert("flash", "saved");
        assert_eq!(req.session().unwrap().get("flash"), Some(Json::from("saved")));
        assert_eq!(res.session().unwrap().get("user_id"), Some(Json::from(7)));
    }

    #[test]
    fn csrf_token_is_generated_for_safe_requests() {
        let (mut req, mut res) = with_session(Method::Get);
        CsrfProtection.before(&mut req, &mut res).unwrap();
        let token = req.session().unwrap().get(CSRF_TOKEN).unwrap();
        assert_eq!(token.as_str().unwrap().len(), 64);
    }

    #[test]
    fn csrf_rejects_post_without_matching_token() {
        let (mut req, mut res) = with_session(Method::Post);
        let err = CsrfProtection.before(&mut req, &mut res).unwrap_err();
        assert!(matches!(err, FrameworkError::InvalidCsrfToken));
    }

    #[test]
    fn csrf_accepts_post_with_matching_token() {
        let session = Session::new();
        session.insert(CSRF_TOKEN, "abc");
        let mut req = Request::post("/books")
            .with_session(session)
            .with_param(CSRF_TOKEN, "abc");
        let mut res = Response::new();
        SessionBehavior.before(&mut req, &mut res).unwrap();
        CsrfProtection.before(&mut req, &mut res).unwrap();
    }

    #[test]
    fn csrf_without_sessions_is_a_misconfiguration() {
        let mut req = Request::get("/");
        let err = CsrfProtection
            .before(&mut req, &mut Response::new())
            .unwrap_err();
        assert!(err.is_misconfiguration());
    }

    #[test]
    fn cookie_changes_become_set_cookie_header() {
        let mut req = Request::get("/").with_header("Cookie", "theme=dark");
        let mut res = Response::new();
        let cookies = CookieBehavior::default();
        cookies.before(&mut req, &mut res).unwrap();
        assert_eq!(req.cookies().unwrap().get("theme"), Some("dark"));

        res.cookies_mut().unwrap().set("theme", "light");
        cookies.after(&req, &mut res).unwrap();
        assert_eq!(res.header("set-cookie"), Some("theme=light"));
    }
}
