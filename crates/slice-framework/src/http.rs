//! Minimal request/response primitives the action layer runs on.
//!
//! Sessions and cookie jars are only reachable once the owning slice has the
//! matching capability; until then the accessors fail with
//! [`FrameworkError::MissingSession`] / [`FrameworkError::MissingCookies`].

use crate::error::FrameworkError;
use crate::view::{ContextOptions, View, ViewContext};
use parking_lot::RwLock;
use serde_json::Value as Json;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Request parameters.
pub type Params = serde_json::Map<String, Json>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Options,
    Trace,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Safe methods never change server state and skip CSRF verification.
    pub fn is_safe(self) -> bool {
        matches!(self, Method::Get | Method::Head | Method::Options | Method::Trace)
    }
}

/// A shared session store. Clones point at the same data.
#[derive(Debug, Clone, Default)]
pub struct Session {
    data: Arc<RwLock<Params>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Json> {
        self.data.read().get(key).cloned()
    }

    pub fn insert(&self, key: impl Into<String>, value: impl Into<Json>) {
        self.data.write().insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<Json> {
        self.data.write().remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    pub fn clear(&self) {
        self.data.write().clear();
    }

    pub fn snapshot(&self) -> Params {
        self.data.read().clone()
    }
}

/// Request cookies plus pending changes for the response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CookieJar {
    cookies: BTreeMap<String, String>,
    changes: BTreeMap<String, Option<String>>,
    options: BTreeMap<String, Json>,
}

impl CookieJar {
    /// Parses a `Cookie` header (`a=1; b=2`).
    pub fn parse(header: Option<&str>, options: BTreeMap<String, Json>) -> Self {
        let cookies = header
            .into_iter()
            .flat_map(|h| h.split(';'))
            .filter_map(|pair| {
                let (name, value) = pair.split_once('=')?;
                let name = name.trim();
                (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
            })
            .collect();
        Self {
            cookies,
            changes: BTreeMap::new(),
            options,
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        match self.changes.get(name) {
            Some(change) => change.as_deref(),
            None => self.cookies.get(name).map(String::as_str),
        }
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.changes.insert(name.into(), Some(value.into()));
    }

    pub fn delete(&mut self, name: &str) {
        self.changes.insert(name.to_string(), None);
    }

    pub fn is_changed(&self) -> bool {
        !self.changes.is_empty()
    }

    /// One `Set-Cookie` value per changed cookie, with the default options.
    pub fn set_cookie_headers(&self) -> Vec<String> {
        let attributes = cookie_attributes(&self.options);
        self.changes
            .iter()
            .map(|(name, change)| match change {
                Some(value) => format!("{name}={value}{attributes}"),
                None => format!("{name}=; max-age=0; expires=Thu, 01 Jan 1970 00:00:00 GMT"),
            })
            .collect()
    }
}

fn cookie_attributes(options: &BTreeMap<String, Json>) -> String {
    options
        .iter()
        .filter_map(|(key, value)| match (key.as_str(), value) {
            ("http_only", Json::Bool(true)) => Some("; HttpOnly".to_string()),
            ("secure", Json::Bool(true)) => Some("; Secure".to_string()),
            (_, Json::Bool(_) | Json::Null) => None,
            (_, Json::String(s)) => Some(format!("; {}={s}", key.replace('_', "-"))),
            (_, other) => Some(format!("; {}={other}", key.replace('_', "-"))),
        })
        .collect()
}

/// An incoming request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub params: Params,
    headers: BTreeMap<String, String>,
    incoming_session: Option<Session>,
    session: Option<Session>,
    cookies: Option<CookieJar>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Params::new(),
            headers: BTreeMap::new(),
            incoming_session: None,
            session: None,
            cookies: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Json>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Header names are case-insensitive.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Session data carried in by the transport. Only reachable through
    /// [`session`](Self::session) when sessions are enabled.
    pub fn with_session(mut self, session: Session) -> Self {
        self.incoming_session = Some(session);
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn session(&self) -> Result<&Session, FrameworkError> {
        self.session
            .as_ref()
            .ok_or(FrameworkError::MissingSession { method: "session" })
    }

    pub fn cookies(&self) -> Result<&CookieJar, FrameworkError> {
        self.cookies
            .as_ref()
            .ok_or(FrameworkError::MissingCookies { method: "cookies" })
    }

    pub(crate) fn open_session(&mut self) -> Session {
        let session = self.incoming_session.take().unwrap_or_default();
        self.session = Some(session.clone());
        session
    }

    pub(crate) fn attach_cookies(&mut self, jar: CookieJar) {
        self.cookies = Some(jar);
    }
}

/// The response under construction.
///
/// Starts render-pending; [`finalize`](Self::finalize) marks it finished and
/// further renders are ignored.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    body: String,
    headers: BTreeMap<String, String>,
    format: Option<String>,
    charset: Option<String>,
    session: Option<Session>,
    cookies: Option<CookieJar>,
    halted: bool,
    finalized: bool,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn new() -> Self {
        Self {
            status: 200,
            body: String::new(),
            headers: BTreeMap::new(),
            format: None,
            charset: None,
            session: None,
            cookies: None,
            halted: false,
            finalized: false,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub fn set_format(&mut self, format: impl Into<String>) {
        self.format = Some(format.into());
    }

    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    pub(crate) fn set_charset(&mut self, charset: Option<String>) {
        self.charset = charset;
    }

    pub fn session(&self) -> Result<&Session, FrameworkError> {
        self.session
            .as_ref()
            .ok_or(FrameworkError::MissingSession { method: "session" })
    }

    pub fn cookies(&self) -> Result<&CookieJar, FrameworkError> {
        self.cookies
            .as_ref()
            .ok_or(FrameworkError::MissingCookies { method: "cookies" })
    }

    pub fn cookies_mut(&mut self) -> Result<&mut CookieJar, FrameworkError> {
        self.cookies
            .as_mut()
            .ok_or(FrameworkError::MissingCookies { method: "cookies" })
    }

    pub(crate) fn attach_session(&mut self, session: Session) {
        self.session = Some(session);
    }

    pub(crate) fn attach_cookies(&mut self, jar: CookieJar) {
        self.cookies = Some(jar);
    }

    /// Stops the action: remaining handler logic and auto-rendering are skipped.
    pub fn halt(&mut self, status: u16, body: impl Into<String>) {
        self.status = status;
        self.body = body.into();
        self.halted = true;
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub(crate) fn finalize(&mut self) {
        self.finalized = true;
    }

    /// Renders `view` into the body. The context, when given, is specialized
    /// with `options` first.
    pub fn render(
        &mut self,
        view: &dyn View,
        context: Option<&Arc<dyn ViewContext>>,
        options: ContextOptions,
        params: &Params,
    ) -> Result<(), FrameworkError> {
        if self.finalized {
            return Ok(());
        }
        let context = context.map(|ctx| ctx.with(options));
        self.body = view.call(context.as_ref(), params)?;
        Ok(())
    }
}
