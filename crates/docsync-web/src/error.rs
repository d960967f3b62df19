//! Error responses for the HTTP front.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use docsync_core::SyncError;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("No session cookie; start at /dropbox/authorize")]
    NoSession,

    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl WebError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        let sync = match self {
            WebError::NoSession => return (StatusCode::UNAUTHORIZED, "NO_SESSION"),
            WebError::Sync(e) => e,
        };
        let status = match sync {
            SyncError::AuthorizationDenied(_) => StatusCode::FORBIDDEN,
            SyncError::NotAuthorized { .. } | SyncError::TokenRejected { .. } => {
                StatusCode::UNAUTHORIZED
            }
            SyncError::LedgerCorrupt { .. } => StatusCode::CONFLICT,
            SyncError::CategoryUnavailable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SyncError::TransientNetworkFailure(_) | SyncError::InsertRejected { .. } => {
                StatusCode::BAD_GATEWAY
            }
            SyncError::LedgerMissing | SyncError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, sync.code())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorBody {
            error: String,
            code: &'static str,
        }

        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::warn!("{}", self);
        }

        let body = ErrorBody {
            error: self.to_string(),
            code,
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, WebError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (WebError::NoSession, StatusCode::UNAUTHORIZED, "NO_SESSION"),
            (
                SyncError::AuthorizationDenied("x".into()).into(),
                StatusCode::FORBIDDEN,
                "AUTHORIZATION_DENIED",
            ),
            (
                SyncError::TokenRejected {
                    provider: docsync_core::ProviderId::Storage,
                    reason: "401".into(),
                }
                .into(),
                StatusCode::UNAUTHORIZED,
                "TOKEN_REJECTED",
            ),
            (
                SyncError::LedgerCorrupt {
                    line: 2,
                    reason: "bad id".into(),
                }
                .into(),
                StatusCode::CONFLICT,
                "LEDGER_CORRUPT",
            ),
            (
                SyncError::InsertRejected {
                    entity: "document",
                    reason: "nope".into(),
                }
                .into(),
                StatusCode::BAD_GATEWAY,
                "INSERT_REJECTED",
            ),
        ];
        for (error, status, code) in cases {
            assert_eq!(error.status_and_code(), (status, code));
        }
    }
}
