//! Core traits and types for docsync.
//!
//! This crate holds everything that does not talk HTTP itself:
//! - `StorageProvider` / `BusinessSystem`: the two remote collaborators
//! - `CredentialStore` / `SessionStore`: authorization state across redirects
//! - `AuthorizationBroker`: the two chained authorization handshakes
//! - `ReferenceLedger`: the persisted record-id to file-name mapping
//! - `RemoteDirectoryLister`: candidate discovery
//! - `SyncEngine`: the reconciliation run itself

mod auth;
mod business;
mod credential;
mod engine;
mod error;
mod ledger;
mod lister;
mod storage;

#[cfg(test)]
mod test_support;

pub use auth::{strip_query, AuthorizationBroker};
pub use business::{
    AccessGrant, BusinessSystem, DocumentCategory, InsertOutcome, SyncAttachment, SyncDocument,
    DOCUMENT_TYPE_MARKER,
};
pub use credential::{
    Credential, CredentialState, CredentialStore, InMemorySessionStore, ProviderId, SessionContext,
    SessionId, SessionStore, TokenPair,
};
pub use engine::{CategorySelector, SyncEngine, SyncPhase, SyncReport};
pub use error::SyncError;
pub use ledger::{
    LedgerGuard, LedgerIndex, LedgerLocks, RecordId, ReferenceEntry, ReferenceLedger,
    LEDGER_FILE_NAME,
};
pub use lister::RemoteDirectoryLister;
pub use storage::{RemoteFileEntry, StorageProvider, STORAGE_ROOT};
