//! Persisted OAuth2 credential and its file store

use chrono::{DateTime, Duration, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default token endpoint written into credentials that don't carry one
pub(crate) const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens expiring within this window are treated as already expired
const EXPIRY_SKEW_SECS: i64 = 300;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// OAuth2 token bundle as stored in the token file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    /// Access token
    pub token: String,
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    /// Granted scopes
    #[serde(default)]
    pub scopes: BTreeSet<String>,
    /// Access token expiry; absent means the provider never reported one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl Credential {
    /// Whether the access token is expired (or about to be) at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry
            .is_some_and(|expiry| expiry <= now + Duration::seconds(EXPIRY_SKEW_SECS))
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Usable without any network round-trip
    pub fn is_valid(&self) -> bool {
        !self.token.is_empty() && !self.is_expired()
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Whether every requested scope was granted
    pub fn covers_scopes(&self, requested: &BTreeSet<String>) -> bool {
        requested.is_subset(&self.scopes)
    }
}

/// Reads and writes the credential JSON file
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the stored credential, `None` when no file exists
    pub fn load(&self) -> Result<Option<Credential>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let credential = serde_json::from_str(&content).map_err(|e| {
            Error::Configuration(format!(
                "Failed to parse credential file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        debug!("Loaded credential from {}", self.path.display());
        Ok(Some(credential))
    }

    /// Save the credential, creating the parent directory if needed
    pub fn save(&self, credential: &Credential) -> Result<()> {
        config::save_json_file(&self.path, credential)
            .map_err(|e| Error::Configuration(format!("{e:#}")))?;
        debug!("Saved credential to {}", self.path.display());
        Ok(())
    }

    /// Delete the stored credential; returns whether a file was removed
    pub fn remove(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_credential(expiry: Option<DateTime<Utc>>) -> Credential {
        Credential {
            token: "ya29.access".to_string(),
            refresh_token: Some("1//refresh".to_string()),
            token_uri: DEFAULT_TOKEN_URI.to_string(),
            client_id: "client.apps.googleusercontent.com".to_string(),
            client_secret: "secret".to_string(),
            scopes: ["https://www.googleapis.com/auth/drive".to_string()]
                .into_iter()
                .collect(),
            expiry,
        }
    }

    #[test]
    fn test_expiry_window() {
        let now = Utc::now();
        assert!(!make_credential(Some(now + Duration::hours(1))).is_expired_at(now));
        assert!(make_credential(Some(now + Duration::seconds(60))).is_expired_at(now));
        assert!(make_credential(Some(now - Duration::hours(1))).is_expired_at(now));
    }

    #[test]
    fn test_missing_expiry_is_not_expired() {
        let credential = make_credential(None);
        assert!(!credential.is_expired());
        assert!(credential.is_valid());
    }

    #[test]
    fn test_covers_scopes() {
        let credential = make_credential(None);
        let mut requested: BTreeSet<String> =
            ["https://www.googleapis.com/auth/drive".to_string()].into();
        assert!(credential.covers_scopes(&requested));

        requested.insert("https://www.googleapis.com/auth/calendar".to_string());
        assert!(!credential.covers_scopes(&requested));
    }

    #[test]
    fn test_parse_authorized_user_file_without_expiry() {
        let json = r#"{
            "token": "ya29.abc",
            "refresh_token": "1//xyz",
            "token_uri": "https://oauth2.googleapis.com/token",
            "client_id": "id",
            "client_secret": "secret",
            "scopes": ["https://www.googleapis.com/auth/drive"]
        }"#;
        let credential: Credential = serde_json::from_str(json).unwrap();
        assert_eq!(credential.token, "ya29.abc");
        assert!(credential.expiry.is_none());
        assert!(credential.can_refresh());
    }

    #[test]
    fn test_store_round_trip_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("token.json"));
        assert_eq!(store.load().unwrap(), None);

        let credential = make_credential(Some(Utc::now() + Duration::hours(1)));
        store.save(&credential).unwrap();
        assert_eq!(store.load().unwrap(), Some(credential));

        assert!(store.remove().unwrap());
        assert!(!store.remove().unwrap());
        assert!(!store.exists());
    }

    #[test]
    fn test_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, "not json").unwrap();
        let err = CredentialStore::new(path).load().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
