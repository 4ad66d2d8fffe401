//! Shared fixtures: a mock Google server plus temp secrets/token files
#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use google::{AuthConfig, AuthManager, Credential, CredentialStore, Endpoints, scopes};
use mockito::ServerGuard;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub const ACCESS_TOKEN: &str = "ya29.valid-token";
pub const REFRESH_TOKEN: &str = "1//refresh-token";
pub const CLIENT_ID: &str = "client-123.apps.googleusercontent.com";
pub const CLIENT_SECRET: &str = "shh";

pub struct Fixture {
    pub server: ServerGuard,
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            server: mockito::Server::new(),
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.dir.path().join("credentials.json")
    }

    pub fn token_path(&self) -> PathBuf {
        self.dir.path().join("token.json")
    }

    pub fn token_uri(&self) -> String {
        format!("{}/token", self.server.url())
    }

    pub fn config(&self) -> AuthConfig {
        AuthConfig::new(self.secrets_path(), self.token_path())
            .with_endpoints(Endpoints::with_root(&self.server.url()))
    }

    pub fn manager(&self) -> Arc<AuthManager> {
        Arc::new(AuthManager::new(self.config()))
    }

    pub fn store(&self) -> CredentialStore {
        CredentialStore::new(self.token_path())
    }

    /// Credential for every default scope, token endpoint on the mock server
    pub fn credential(&self, expiry: Option<DateTime<Utc>>) -> Credential {
        Credential {
            token: ACCESS_TOKEN.to_string(),
            refresh_token: Some(REFRESH_TOKEN.to_string()),
            token_uri: self.token_uri(),
            client_id: CLIENT_ID.to_string(),
            client_secret: CLIENT_SECRET.to_string(),
            scopes: scopes::ALL.iter().map(|s| s.to_string()).collect(),
            expiry,
        }
    }

    /// Store a credential that stays valid for an hour
    pub fn write_valid_token(&self) -> Credential {
        let credential = self.credential(Some(Utc::now() + Duration::hours(1)));
        self.store().save(&credential).unwrap();
        credential
    }

    /// Store a credential that expired ten minutes ago
    pub fn write_expired_token(&self) -> Credential {
        let credential = self.credential(Some(Utc::now() - Duration::minutes(10)));
        self.store().save(&credential).unwrap();
        credential
    }

    pub fn write_secrets(&self) {
        let secrets = serde_json::json!({
            "installed": {
                "client_id": CLIENT_ID,
                "client_secret": CLIENT_SECRET,
                "redirect_uris": ["http://localhost"],
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": self.token_uri(),
            }
        });
        std::fs::write(self.secrets_path(), secrets.to_string()).unwrap();
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {ACCESS_TOKEN}")
    }
}
