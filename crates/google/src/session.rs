//! Authenticated per-surface sessions
//!
//! A [`Session`] is bound to one API surface and version. It borrows a
//! fresh bearer token from the [`AuthManager`] on every request, so a token
//! that expires mid-session is refreshed transparently.
//! Uses synchronous HTTP (ureq) to be executor-agnostic.

use log::{debug, error};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use ureq::http::Response;
use ureq::typestate::WithBody;
use ureq::{Agent, Body, RequestBuilder};

use crate::auth::AuthManager;
use crate::config::Endpoints;
use crate::error::{ApiError, Error, Result};

/// One of the remote Google services this crate talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiSurface {
    Drive,
    Docs,
    Gmail,
    Calendar,
}

impl ApiSurface {
    pub fn name(&self) -> &'static str {
        match self {
            ApiSurface::Drive => "drive",
            ApiSurface::Docs => "docs",
            ApiSurface::Gmail => "gmail",
            ApiSurface::Calendar => "calendar",
        }
    }

    /// API version string each surface is pinned to
    pub fn version(&self) -> &'static str {
        match self {
            ApiSurface::Drive => "v3",
            ApiSurface::Docs => "v1",
            ApiSurface::Gmail => "v1",
            ApiSurface::Calendar => "v3",
        }
    }

    pub fn base_url<'a>(&self, endpoints: &'a Endpoints) -> &'a str {
        match self {
            ApiSurface::Drive => &endpoints.drive,
            ApiSurface::Docs => &endpoints.docs,
            ApiSurface::Gmail => &endpoints.gmail,
            ApiSurface::Calendar => &endpoints.calendar,
        }
    }
}

impl fmt::Display for ApiSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.version())
    }
}

/// HTTP methods that carry a request body
#[derive(Debug, Clone, Copy)]
pub(crate) enum BodyMethod {
    Post,
    Put,
    Patch,
}

/// Query parameters as (name, value) pairs; names may repeat
pub(crate) type Query<'a> = [(&'a str, String)];

/// Authenticated handle bound to one API surface
#[derive(Clone)]
pub struct Session {
    surface: ApiSurface,
    base_url: String,
    upload_url: Option<String>,
    auth: Arc<AuthManager>,
    agent: Agent,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("surface", &self.surface)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub(crate) fn new(surface: ApiSurface, auth: Arc<AuthManager>) -> Self {
        let endpoints = &auth.config().endpoints;
        let base_url = surface.base_url(endpoints).trim_end_matches('/').to_string();
        let upload_url = (surface == ApiSurface::Drive)
            .then(|| endpoints.drive_upload.trim_end_matches('/').to_string());
        // Shares the manager's connection pool
        let agent = auth.agent().clone();

        Self {
            surface,
            base_url,
            upload_url,
            auth,
            agent,
        }
    }

    pub fn surface(&self) -> ApiSurface {
        self.surface
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// URL on the media upload endpoint (Drive only)
    pub(crate) fn upload_url(&self, path: &str) -> String {
        let base = self.upload_url.as_deref().unwrap_or(&self.base_url);
        format!("{}/{}", base, path.trim_start_matches('/'))
    }

    fn bearer(&self) -> Result<String> {
        Ok(format!("Bearer {}", self.auth.access_token()?))
    }

    /// GET a JSON resource
    pub(crate) fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &Query,
        context: &str,
    ) -> Result<T> {
        let response = self.get_raw(&self.url(path), query, context)?;
        self.read_json(response, context)
    }

    /// GET returning the raw successful response (media downloads)
    pub(crate) fn get_raw(
        &self,
        url: &str,
        query: &Query,
        context: &str,
    ) -> Result<Response<Body>> {
        debug!("GET {} ({})", url, self.surface);
        let request = query
            .iter()
            .fold(self.agent.get(url), |req, (name, value)| req.query(*name, value));
        let result = request.header("Authorization", &self.bearer()?).call();
        self.check(result, context)
    }

    /// Send a JSON body and parse the JSON reply
    pub(crate) fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: BodyMethod,
        path: &str,
        query: &Query,
        body: &B,
        context: &str,
    ) -> Result<T> {
        let url = self.url(path);
        let result = self
            .body_request(method, &url, query)?
            .send_json(body);
        let response = self.check(result, context)?;
        self.read_json(response, context)
    }

    /// POST without a body (e.g. Gmail trash)
    pub(crate) fn post_empty<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &Query,
        context: &str,
    ) -> Result<T> {
        let url = self.url(path);
        let result = self
            .body_request(BodyMethod::Post, &url, query)?
            .send_empty();
        let response = self.check(result, context)?;
        self.read_json(response, context)
    }

    /// Send raw bytes with extra headers to an absolute URL
    pub(crate) fn send_bytes(
        &self,
        method: BodyMethod,
        url: &str,
        query: &Query,
        headers: &[(&str, String)],
        bytes: &[u8],
        context: &str,
    ) -> Result<Response<Body>> {
        let request = headers
            .iter()
            .fold(self.body_request(method, url, query)?, |req, (name, value)| {
                req.header(*name, value)
            });
        self.check(request.send(bytes), context)
    }

    /// Send a JSON body with extra headers to an absolute URL, returning the raw response
    pub(crate) fn send_json_raw<B: Serialize>(
        &self,
        method: BodyMethod,
        url: &str,
        query: &Query,
        headers: &[(&str, String)],
        body: &B,
        context: &str,
    ) -> Result<Response<Body>> {
        let request = headers
            .iter()
            .fold(self.body_request(method, url, query)?, |req, (name, value)| {
                req.header(*name, value)
            });
        self.check(request.send_json(body), context)
    }

    /// DELETE a resource; the body of a successful reply is ignored
    pub(crate) fn delete(&self, path: &str, query: &Query, context: &str) -> Result<()> {
        let url = self.url(path);
        debug!("DELETE {} ({})", url, self.surface);
        let request = query
            .iter()
            .fold(self.agent.delete(&url), |req, (name, value)| req.query(*name, value));
        let result = request.header("Authorization", &self.bearer()?).call();
        self.check(result, context)?;
        Ok(())
    }

    fn body_request(
        &self,
        method: BodyMethod,
        url: &str,
        query: &Query,
    ) -> Result<RequestBuilder<WithBody>> {
        debug!("{:?} {} ({})", method, url, self.surface);
        let request = match method {
            BodyMethod::Post => self.agent.post(url),
            BodyMethod::Put => self.agent.put(url),
            BodyMethod::Patch => self.agent.patch(url),
        };
        let request = query
            .iter()
            .fold(request, |req, (name, value)| req.query(*name, value));
        Ok(request.header("Authorization", &self.bearer()?))
    }

    /// Turn transport failures and non-2xx statuses into errors, logging both
    fn check(
        &self,
        result: std::result::Result<Response<Body>, ureq::Error>,
        context: &str,
    ) -> Result<Response<Body>> {
        match result {
            Ok(response) if response.status().is_success() => Ok(response),
            Ok(mut response) => {
                let status = response.status().as_u16();
                let body = response.body_mut().read_to_string().unwrap_or_default();
                let err = ApiError {
                    surface: self.surface,
                    status,
                    message: extract_error_message(&body, status),
                };
                error!("{}: {}", context, err);
                Err(err.into())
            }
            Err(e) => {
                error!("{}: {}", context, e);
                Err(Error::Transport(e))
            }
        }
    }

    pub(crate) fn read_json<T: DeserializeOwned>(
        &self,
        mut response: Response<Body>,
        context: &str,
    ) -> Result<T> {
        let body = response.body_mut().read_to_string().map_err(|e| {
            error!("{}: failed to read response body: {}", context, e);
            Error::Transport(e)
        })?;
        // Some endpoints answer 204/empty on success
        let body = if body.trim().is_empty() { "{}" } else { body.as_str() };
        serde_json::from_str(body).map_err(|e| {
            error!("{}: failed to parse response: {}", context, e);
            Error::Json(e)
        })
    }
}

/// Pull the human-readable message out of Google's error envelope
///
/// Google APIs return errors as `{"error": {"code": 404, "message": "..."}}`;
/// the OAuth endpoints use `{"error": "invalid_grant", "error_description": "..."}`.
pub(crate) fn extract_error_message(body: &str, status: u16) -> String {
    let Ok(parsed) = serde_json::from_str::<serde_json::Value>(body) else {
        return if body.trim().is_empty() {
            format!("HTTP {status}")
        } else {
            format!("HTTP {status}: {}", body.trim())
        };
    };

    match parsed.get("error") {
        Some(serde_json::Value::Object(obj)) => obj
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {status}")),
        Some(serde_json::Value::String(code)) => match parsed
            .get("error_description")
            .and_then(|d| d.as_str())
        {
            Some(description) => format!("{code}: {description}"),
            None => code.clone(),
        },
        _ => format!("HTTP {status}"),
    }
}

/// Lifecycle of the session a service client holds for one surface
enum SlotState {
    Unauthenticated,
    Authenticated(Session),
}

/// Lazily acquired session for one API surface
///
/// Starts `Unauthenticated`; the first accessor call authenticates through
/// the auth manager and caches the session for the client's lifetime.
pub(crate) struct SessionSlot {
    surface: ApiSurface,
    state: Mutex<SlotState>,
}

impl SessionSlot {
    pub(crate) fn new(surface: ApiSurface) -> Self {
        Self {
            surface,
            state: Mutex::new(SlotState::Unauthenticated),
        }
    }

    pub(crate) fn session(&self, auth: &Arc<AuthManager>) -> Result<Session> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let SlotState::Authenticated(session) = &*state {
            return Ok(session.clone());
        }

        let session = auth.session(self.surface)?;
        *state = SlotState::Authenticated(session.clone());
        Ok(session)
    }

    pub(crate) fn is_authenticated(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        matches!(*state, SlotState::Authenticated(_))
    }
}
