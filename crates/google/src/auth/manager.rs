//! OAuth2 auth manager
//!
//! Implements the installed-app authorization code flow:
//! load the stored credential, refresh it when expired, otherwise run the
//! interactive flow through an [`AuthorizationTransport`].
//! Uses synchronous HTTP (ureq) to be executor-agnostic.

use chrono::{Duration, Utc};
use log::{debug, error, info, warn};
use serde::Deserialize;
use std::sync::{Arc, Mutex, PoisonError};
use ureq::Agent;

use super::credential::{Credential, CredentialStore};
use super::secrets::ClientSecrets;
use super::transport::{AuthorizationTransport, LoopbackTransport, ManualTransport};
use crate::config::AuthConfig;
use crate::error::{Error, Result};
use crate::session::{ApiSurface, Session, extract_error_message};

/// Lifecycle of the credential held by an [`AuthManager`]
enum AuthState {
    Unauthenticated,
    Authenticated(Credential),
}

/// Token response from Google
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    /// Space-delimited granted scopes
    scope: Option<String>,
}

/// Obtains and maintains one valid credential and hands out sessions
///
/// Share it between service clients through an `Arc`.
pub struct AuthManager {
    config: AuthConfig,
    store: CredentialStore,
    agent: Agent,
    state: Mutex<AuthState>,
    transport: Mutex<Option<Box<dyn AuthorizationTransport + Send>>>,
}

impl AuthManager {
    /// Create a manager for the given configuration
    pub fn new(config: AuthConfig) -> Self {
        let store = CredentialStore::new(config.token_path.clone());
        // Non-2xx statuses are read back as API errors with the body's message
        let agent = Agent::new_with_config(
            Agent::config_builder().http_status_as_error(false).build(),
        );

        Self {
            config,
            store,
            agent,
            state: Mutex::new(AuthState::Unauthenticated),
            transport: Mutex::new(None),
        }
    }

    /// Create a manager using ~/.config/satchel/credentials.json and token.json
    pub fn from_default_paths() -> Result<Self> {
        Ok(Self::new(AuthConfig::from_default_paths()?))
    }

    /// Use a fixed transport for the interactive flow instead of picking
    /// loopback-or-console at authentication time
    pub fn with_transport(self, transport: impl AuthorizationTransport + Send + 'static) -> Self {
        *self.transport.lock().unwrap_or_else(PoisonError::into_inner) = Some(Box::new(transport));
        self
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// HTTP agent shared by the token endpoint and every session
    pub(crate) fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Get a valid credential, refreshing or re-authorizing as needed
    ///
    /// A valid credential (in memory or on disk) is returned without any
    /// network traffic. An expired one with a refresh token is refreshed
    /// once and persisted. Anything else runs the interactive flow.
    pub fn authenticate(&self) -> Result<Credential> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let current = match &*state {
            AuthState::Authenticated(credential) => Some(credential.clone()),
            AuthState::Unauthenticated => self.load_stored()?,
        };

        let credential = match current {
            Some(credential) if credential.is_valid() => credential,
            Some(credential) if credential.can_refresh() => {
                info!("Refreshing expired credentials...");
                let refreshed = self.refresh(credential)?;
                self.store.save(&refreshed)?;
                refreshed
            }
            _ => {
                let credential = self.authorize_interactively()?;
                self.store.save(&credential)?;
                info!("Credentials saved to {}", self.store.path().display());
                credential
            }
        };

        *state = AuthState::Authenticated(credential.clone());
        Ok(credential)
    }

    /// Bearer token for the next request
    pub fn access_token(&self) -> Result<String> {
        Ok(self.authenticate()?.token)
    }

    /// Authenticated session bound to one API surface
    pub fn session(self: &Arc<Self>, surface: ApiSurface) -> Result<Session> {
        self.authenticate()?;
        debug!("Opening {} session", surface);
        Ok(Session::new(surface, Arc::clone(self)))
    }

    /// Delete the stored credential and forget the in-memory one
    ///
    /// Calling it again when nothing is stored is not an error.
    pub fn revoke(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if self.store.remove()? {
            info!("Credentials removed from {}", self.store.path().display());
        }
        *state = AuthState::Unauthenticated;
        Ok(())
    }

    /// Whether a usable credential is available without the interactive flow
    ///
    /// Makes no network calls: an expired credential with a refresh token counts.
    pub fn is_authenticated(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let credential = match &*state {
            AuthState::Authenticated(credential) => Some(credential.clone()),
            AuthState::Unauthenticated => self.load_stored().ok().flatten(),
        };
        credential.is_some_and(|c| c.is_valid() || c.can_refresh())
    }

    /// The credential currently held in memory
    pub fn credential(&self) -> Option<Credential> {
        match &*self.state.lock().unwrap_or_else(PoisonError::into_inner) {
            AuthState::Authenticated(credential) => Some(credential.clone()),
            AuthState::Unauthenticated => None,
        }
    }

    /// Load the stored credential, discarding one granted for other scopes
    fn load_stored(&self) -> Result<Option<Credential>> {
        match self.store.load()? {
            Some(credential) if !credential.covers_scopes(&self.config.scopes) => {
                warn!(
                    "Stored credential at {} lacks requested scopes; re-authorization required",
                    self.store.path().display()
                );
                Ok(None)
            }
            other => Ok(other),
        }
    }

    /// Refresh an access token using its refresh token
    fn refresh(&self, mut credential: Credential) -> Result<Credential> {
        let refresh_token = credential.refresh_token.clone().unwrap_or_default();
        let token = self.post_token_form(
            &credential.token_uri,
            &[
                ("client_id", credential.client_id.as_str()),
                ("client_secret", credential.client_secret.as_str()),
                ("refresh_token", refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ],
            "Failed to refresh access token",
        )?;

        credential.token = token.access_token;
        credential.expiry = token.expires_in.map(|secs| Utc::now() + Duration::seconds(secs));
        // Google usually omits the refresh token on refresh; keep the old one
        if let Some(new_refresh) = token.refresh_token {
            credential.refresh_token = Some(new_refresh);
        }
        if let Some(scope) = token.scope {
            credential.scopes = scope.split_whitespace().map(str::to_string).collect();
        }
        Ok(credential)
    }

    /// Run the authorization code flow and exchange the code for tokens
    fn authorize_interactively(&self) -> Result<Credential> {
        let secrets = ClientSecrets::from_file(&self.config.client_secrets_path)?;
        info!("Starting OAuth flow...");

        let mut injected = self.transport.lock().unwrap_or_else(PoisonError::into_inner);
        let (code, redirect_uri) = match injected.as_deref_mut() {
            Some(transport) => self.receive_code(&secrets, transport)?,
            None => match LoopbackTransport::bind() {
                Ok(mut loopback) => self.receive_code(&secrets, &mut loopback)?,
                Err(e) => {
                    warn!("Could not start local callback listener: {}", e);
                    self.receive_code(&secrets, &mut ManualTransport::stdio())?
                }
            },
        };

        info!("Exchanging authorization code for tokens...");
        let token = self.post_token_form(
            &secrets.token_uri,
            &[
                ("code", code.as_str()),
                ("client_id", secrets.client_id.as_str()),
                ("client_secret", secrets.client_secret.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ],
            "Failed to exchange authorization code",
        )?;

        let scopes = match token.scope {
            Some(scope) => scope.split_whitespace().map(str::to_string).collect(),
            None => self.config.scopes.clone(),
        };

        info!("Authentication successful");
        Ok(Credential {
            token: token.access_token,
            refresh_token: token.refresh_token,
            token_uri: secrets.token_uri,
            client_id: secrets.client_id,
            client_secret: secrets.client_secret,
            scopes,
            expiry: token.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
        })
    }

    fn receive_code(
        &self,
        secrets: &ClientSecrets,
        transport: &mut dyn AuthorizationTransport,
    ) -> Result<(String, String)> {
        let redirect_uri = transport.redirect_uri(secrets);
        let url = self.authorization_url(secrets, &redirect_uri);
        let code = transport.receive_code(&url)?;
        Ok((code, redirect_uri))
    }

    /// Consent page URL requesting offline access for every configured scope
    pub(crate) fn authorization_url(&self, secrets: &ClientSecrets, redirect_uri: &str) -> String {
        let scope = self
            .config
            .scopes
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");

        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
            secrets.auth_uri,
            urlencoding::encode(&secrets.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scope),
        )
    }

    fn post_token_form(
        &self,
        token_uri: &str,
        form: &[(&str, &str)],
        action: &str,
    ) -> Result<TokenResponse> {
        let mut response = self
            .agent
            .post(token_uri)
            .send_form(form.iter().copied())
            .map_err(|e| {
                error!("{}: {}", action, e);
                Error::Auth(format!("{}: {}", action, e))
            })?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| Error::Auth(format!("{}: {}", action, e)))?;

        if !(200..300).contains(&status) {
            let message = extract_error_message(&body, status);
            error!("{}: {}", action, message);
            return Err(Error::Auth(format!("{}: {}", action, message)));
        }

        serde_json::from_str(&body)
            .map_err(|e| Error::Auth(format!("Failed to parse token response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_url_requests_offline_consent() {
        let manager = AuthManager::new(
            AuthConfig::new("secrets.json", "token.json")
                .with_scopes(["https://www.googleapis.com/auth/drive"]),
        );
        let secrets = ClientSecrets::from_json(
            r#"{"installed": {"client_id": "abc.apps.googleusercontent.com", "client_secret": "s"}}"#,
        )
        .unwrap();

        let url = manager.authorization_url(&secrets, "http://localhost:8080/");
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/auth?"));
        assert!(url.contains("client_id=abc.apps.googleusercontent.com"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080%2F"));
        assert!(url.contains("scope=https%3A%2F%2Fwww.googleapis.com%2Fauth%2Fdrive"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
    }

    #[test]
    fn test_revoke_without_stored_credential() {
        let dir = tempfile::tempdir().unwrap();
        let manager = AuthManager::new(AuthConfig::new(
            dir.path().join("credentials.json"),
            dir.path().join("token.json"),
        ));
        manager.revoke().unwrap();
        manager.revoke().unwrap();
        assert!(!manager.is_authenticated());
        assert!(manager.credential().is_none());
    }
}
