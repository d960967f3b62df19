use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::credential::{Credential, TokenPair};
use crate::error::Result;

/// Path of the storage root the sync operates on.
pub const STORAGE_ROOT: &str = "/";

/// One entry of a storage directory listing. Never cached across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFileEntry {
    pub name: String,
    pub is_directory: bool,
    pub is_deleted: bool,
}

impl RemoteFileEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: false,
            is_deleted: false,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: true,
            is_deleted: false,
        }
    }

    pub fn deleted(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: false,
            is_deleted: true,
        }
    }
}

/// Personal file-storage provider (request-token / access-token protocol).
///
/// Protected operations take an authorized `Credential` and fail with
/// `SyncError::NotAuthorized` otherwise.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Obtain a request-phase token pair.
    async fn request_token(&self) -> Result<TokenPair>;

    /// URL the user visits to grant access to `request`.
    fn authorize_url(&self, request: &TokenPair, callback_url: &str) -> Result<String>;

    /// Exchange a granted request pair for an access pair.
    ///
    /// Returns the access pair and the provider's account id, if any.
    async fn exchange(&self, request: &TokenPair) -> Result<(TokenPair, Option<String>)>;

    /// List the entries of a directory (non-recursive).
    async fn list(&self, credential: &Credential, path: &str) -> Result<Vec<RemoteFileEntry>>;

    /// Raw content of a file, `None` if it does not exist.
    async fn get_bytes(&self, credential: &Credential, path: &str) -> Result<Option<Vec<u8>>>;

    /// Write a file, returning the provider's success flag.
    async fn put_file(
        &self,
        credential: &Credential,
        path: &str,
        data: &[u8],
        overwrite: bool,
    ) -> Result<bool>;
}

/// Join a root-level file name onto the storage root.
pub(crate) fn root_path(name: &str) -> String {
    format!("{}{}", STORAGE_ROOT, name)
}
