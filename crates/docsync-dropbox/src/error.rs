use docsync_core::{ProviderId, SyncError};
use thiserror::Error;

/// Dropbox provider errors
#[derive(Error, Debug)]
pub enum DropboxError {
    /// The token was rejected or the user did not grant access
    #[error("Dropbox authorization failed: {0}")]
    Unauthorized(String),

    #[error("Dropbox API error (status {status_code}): {message}")]
    Api { status_code: u16, message: String },

    #[error("Failed to parse Dropbox response: {0}")]
    Parse(String),

    #[error("Invalid Dropbox URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, DropboxError>;

impl From<DropboxError> for SyncError {
    fn from(error: DropboxError) -> Self {
        match error {
            DropboxError::Unauthorized(msg) => SyncError::AuthorizationDenied(msg),
            other => SyncError::TransientNetworkFailure(other.to_string()),
        }
    }
}

impl DropboxError {
    /// Conversion for calls made with an account's access token, where a 401
    /// means the token itself is no longer valid.
    pub fn with_access_token(self) -> SyncError {
        match self {
            DropboxError::Unauthorized(reason) => SyncError::TokenRejected {
                provider: ProviderId::Storage,
                reason,
            },
            other => other.into(),
        }
    }
}
