//! Google crate - thin synchronous clients for Drive, Docs, Gmail and Calendar
//!
//! This crate provides:
//! - OAuth2 installed-app authentication with a persisted token file
//! - Per-surface authenticated sessions (Drive v3, Docs v1, Gmail v1, Calendar v3)
//! - Service clients translating domain operations into single REST calls
//!
//! Uses synchronous HTTP (ureq) to be executor-agnostic.

pub mod auth;
pub mod calendar;
pub mod config;
pub mod docs;
pub mod drive;
mod error;
pub mod gmail;
pub mod session;

pub use auth::{
    AuthManager, AuthorizationTransport, ClientSecrets, Credential, CredentialStore,
    LoopbackTransport, ManualTransport, extract_authorization_code,
};
pub use calendar::CalendarClient;
pub use config::{AuthConfig, Endpoints, scopes};
pub use docs::DocsClient;
pub use drive::DriveClient;
pub use error::{ApiError, Error, Result};
pub use gmail::GmailClient;
pub use session::{ApiSurface, Session};
