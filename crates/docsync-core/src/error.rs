use crate::credential::ProviderId;

/// Errors surfaced by the reconciliation engine and its collaborators.
///
/// Only `LedgerMissing` is recovered locally (the ledger is initialised
/// empty); everything else propagates to the caller unmodified.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The provider rejected an authorization step, or the flow state is stale.
    /// Recoverable by restarting the authorization flow.
    #[error("Authorization denied: {0}")]
    AuthorizationDenied(String),

    /// A provider refused the access token of an authorized credential, e.g.
    /// because the user revoked it. The credential is dead and must be dropped.
    #[error("{provider} rejected the access token: {reason}")]
    TokenRejected { provider: ProviderId, reason: String },

    /// A protected operation was called with a credential that is not authorized.
    #[error("{provider} credential is not authorized")]
    NotAuthorized { provider: ProviderId },

    #[error("Reference ledger does not exist")]
    LedgerMissing,

    #[error("Reference ledger is corrupt at line {line}: {reason}")]
    LedgerCorrupt { line: usize, reason: String },

    #[error("Document category unavailable: {0}")]
    CategoryUnavailable(String),

    #[error("Remote call failed: {0}")]
    TransientNetworkFailure(String),

    #[error("{entity} insert rejected: {reason}")]
    InsertRejected { entity: &'static str, reason: String },

    #[error("Session store error: {0}")]
    Session(String),
}

impl SyncError {
    /// Short machine-readable code, used by the HTTP front.
    pub fn code(&self) -> &'static str {
        match self {
            SyncError::AuthorizationDenied(_) => "AUTHORIZATION_DENIED",
            SyncError::TokenRejected { .. } => "TOKEN_REJECTED",
            SyncError::NotAuthorized { .. } => "NOT_AUTHORIZED",
            SyncError::LedgerMissing => "LEDGER_MISSING",
            SyncError::LedgerCorrupt { .. } => "LEDGER_CORRUPT",
            SyncError::CategoryUnavailable(_) => "CATEGORY_UNAVAILABLE",
            SyncError::TransientNetworkFailure(_) => "TRANSIENT_NETWORK_FAILURE",
            SyncError::InsertRejected { .. } => "INSERT_REJECTED",
            SyncError::Session(_) => "SESSION_ERROR",
        }
    }

    /// Whether restarting the authorization flow can fix this error.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            SyncError::AuthorizationDenied(_)
                | SyncError::TokenRejected { .. }
                | SyncError::NotAuthorized { .. }
        )
    }

    /// The provider whose stored credential this error invalidates.
    pub fn rejected_provider(&self) -> Option<ProviderId> {
        match self {
            SyncError::TokenRejected { provider, .. } => Some(*provider),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
