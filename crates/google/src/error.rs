//! Error taxonomy shared by authentication and the service clients

use crate::session::ApiSurface;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required secret/config file is missing or unreadable
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Token exchange or refresh rejected by the provider
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Non-2xx response from a remote API surface
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Pasted text did not contain an authorization code
    #[error("no authorization code found in the pasted input")]
    InvalidAuthorizationInput,

    #[error("HTTP transport error: {0}")]
    Transport(#[from] ureq::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this is a remote "resource does not exist" failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Api(api) if api.is_not_found())
    }
}

/// A non-success HTTP status returned by one of the Google APIs
#[derive(Debug, Clone, thiserror::Error)]
#[error("{surface} API error {status}: {message}")]
pub struct ApiError {
    pub surface: ApiSurface,
    pub status: u16,
    pub message: String,
}

impl ApiError {
    /// 404, or 410 which Calendar returns for already deleted events
    pub fn is_not_found(&self) -> bool {
        matches!(self.status, 404 | 410)
    }
}
