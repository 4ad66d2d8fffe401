//! OAuth2 authentication
//!
//! This module provides:
//! - Credential persistence (token file)
//! - Client-secret file parsing
//! - Authorization code transports (loopback listener, manual paste)
//! - The auth manager tying them together

mod credential;
mod manager;
mod secrets;
mod transport;

pub use credential::{Credential, CredentialStore};
pub use manager::AuthManager;
pub use secrets::ClientSecrets;
pub use transport::{
    AuthorizationTransport, LoopbackTransport, ManualTransport, extract_authorization_code,
};
