//! Explicit configuration for the auth manager and the API endpoints
//!
//! Everything that used to be implicit (scope list, file locations, base
//! URLs) is carried in an [`AuthConfig`] built once at startup.

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// OAuth scopes requested up front
pub mod scopes {
    pub const DRIVE: &str = "https://www.googleapis.com/auth/drive";
    pub const DOCUMENTS: &str = "https://www.googleapis.com/auth/documents";
    pub const GMAIL_READONLY: &str = "https://www.googleapis.com/auth/gmail.readonly";
    pub const GMAIL_SEND: &str = "https://www.googleapis.com/auth/gmail.send";
    pub const GMAIL_MODIFY: &str = "https://www.googleapis.com/auth/gmail.modify";
    pub const CALENDAR: &str = "https://www.googleapis.com/auth/calendar";

    /// The full superset requested by default
    pub const ALL: &[&str] = &[
        DRIVE,
        DOCUMENTS,
        GMAIL_READONLY,
        GMAIL_SEND,
        GMAIL_MODIFY,
        CALENDAR,
    ];
}

/// Base URLs for every remote surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub drive: String,
    pub drive_upload: String,
    pub docs: String,
    pub gmail: String,
    pub calendar: String,
}

impl Endpoints {
    /// Google's production endpoints
    pub fn google() -> Self {
        Self {
            drive: "https://www.googleapis.com/drive/v3".to_string(),
            drive_upload: "https://www.googleapis.com/upload/drive/v3".to_string(),
            docs: "https://docs.googleapis.com/v1".to_string(),
            gmail: "https://gmail.googleapis.com/gmail/v1".to_string(),
            calendar: "https://www.googleapis.com/calendar/v3".to_string(),
        }
    }

    /// Rebase every surface under a single root (proxies, local test servers)
    ///
    /// `root` = `http://127.0.0.1:1234` yields `http://127.0.0.1:1234/drive/v3`,
    /// `.../upload/drive/v3`, `.../docs/v1`, `.../gmail/v1`, `.../calendar/v3`.
    pub fn with_root(root: &str) -> Self {
        let root = root.trim_end_matches('/');
        Self {
            drive: format!("{root}/drive/v3"),
            drive_upload: format!("{root}/upload/drive/v3"),
            docs: format!("{root}/docs/v1"),
            gmail: format!("{root}/gmail/v1"),
            calendar: format!("{root}/calendar/v3"),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::google()
    }
}

/// Configuration handed to [`crate::AuthManager`] at construction
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Client-secret JSON downloaded from the Google Cloud Console
    pub client_secrets_path: PathBuf,
    /// Where the OAuth token is persisted
    pub token_path: PathBuf,
    /// Scopes requested during authorization
    pub scopes: BTreeSet<String>,
    pub endpoints: Endpoints,
}

impl AuthConfig {
    /// Build a config with explicit file locations and the default scopes
    pub fn new(client_secrets_path: impl Into<PathBuf>, token_path: impl Into<PathBuf>) -> Self {
        Self {
            client_secrets_path: client_secrets_path.into(),
            token_path: token_path.into(),
            scopes: scopes::ALL.iter().map(|s| s.to_string()).collect(),
            endpoints: Endpoints::google(),
        }
    }

    /// Resolve the default locations in the satchel config directory
    /// (~/.config/satchel/credentials.json and token.json)
    pub fn from_default_paths() -> Result<Self> {
        let secrets = config::config_path(config::CLIENT_SECRETS_FILE);
        let token = config::config_path(config::TOKEN_FILE);
        match (secrets, token) {
            (Some(secrets), Some(token)) => Ok(Self::new(secrets, token)),
            _ => Err(Error::Configuration(
                "Could not determine config directory".to_string(),
            )),
        }
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }
}
