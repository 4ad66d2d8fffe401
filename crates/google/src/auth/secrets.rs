//! Client-secret file loading
//!
//! Parses the JSON downloaded from the Google Cloud Console. Both the
//! "installed" (desktop) and "web" shapes are accepted.

use serde::Deserialize;
use std::path::Path;

use super::credential::DEFAULT_TOKEN_URI;
use crate::error::{Error, Result};

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

/// OAuth client identity used for the authorization code exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uris: Vec<String>,
    pub auth_uri: String,
    pub token_uri: String,
}

/// Google Cloud Console credential file format
#[derive(Deserialize)]
struct ClientSecretFile {
    installed: Option<InstalledSecrets>,
    web: Option<InstalledSecrets>,
}

#[derive(Deserialize)]
struct InstalledSecrets {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
    auth_uri: Option<String>,
    token_uri: Option<String>,
}

impl ClientSecrets {
    /// Load client secrets from a JSON file
    ///
    /// A missing or malformed file is a configuration error.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::Configuration(format!(
                "Client secrets file not found at {}. Download it from the Google Cloud Console.",
                path.display()
            )));
        }
        let file: ClientSecretFile =
            config::load_json_file(path).map_err(|e| Error::Configuration(format!("{e:#}")))?;
        Self::from_secret_file(file)
    }

    /// Parse client secrets from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let file: ClientSecretFile = serde_json::from_str(json).map_err(|e| {
            Error::Configuration(format!("Failed to parse client secrets JSON: {e}"))
        })?;
        Self::from_secret_file(file)
    }

    fn from_secret_file(file: ClientSecretFile) -> Result<Self> {
        let installed = file.installed.or(file.web).ok_or_else(|| {
            Error::Configuration(
                "Client secrets file missing 'installed' or 'web' section".to_string(),
            )
        })?;

        Ok(Self {
            client_id: installed.client_id,
            client_secret: installed.client_secret,
            redirect_uris: installed.redirect_uris,
            auth_uri: installed
                .auth_uri
                .unwrap_or_else(|| DEFAULT_AUTH_URI.to_string()),
            token_uri: installed
                .token_uri
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
        })
    }
}
