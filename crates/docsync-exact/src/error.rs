use docsync_core::{ProviderId, SyncError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExactError {
    /// 401/403 from the REST API
    #[error("Exact Online rejected the access token: {0}")]
    Unauthorized(String),

    /// The token endpoint refused a code or refresh grant
    #[error("Exact Online token grant failed: {0}")]
    Grant(String),

    /// A POST was refused by validation
    #[error("Exact Online rejected the {entity} (status {status_code}): {message}")]
    Rejected {
        entity: &'static str,
        status_code: u16,
        message: String,
    },

    #[error("Exact Online API error (status {status_code}): {message}")]
    Api { status_code: u16, message: String },

    #[error("Failed to parse Exact Online response: {0}")]
    Parse(String),

    #[error("Invalid Exact Online URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ExactError>;

impl From<ExactError> for SyncError {
    fn from(error: ExactError) -> Self {
        match error {
            ExactError::Unauthorized(msg) | ExactError::Grant(msg) => {
                SyncError::AuthorizationDenied(msg)
            }
            ExactError::Rejected {
                entity, message, ..
            } => SyncError::InsertRejected {
                entity,
                reason: message,
            },
            other => SyncError::TransientNetworkFailure(other.to_string()),
        }
    }
}

impl ExactError {
    /// Conversion for REST calls made with an access token, where a 401
    /// means the token itself is no longer valid.
    pub fn with_access_token(self) -> SyncError {
        match self {
            ExactError::Unauthorized(reason) => SyncError::TokenRejected {
                provider: ProviderId::Business,
                reason,
            },
            other => other.into(),
        }
    }
}
