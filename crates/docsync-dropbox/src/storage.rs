use std::sync::Arc;

use async_trait::async_trait;
use docsync_core::{Credential, RemoteFileEntry, StorageProvider, SyncError, TokenPair};
use tracing::instrument;

use crate::client::DropboxClient;
use crate::config::DropboxConfig;
use crate::error::DropboxError;

type Result<T> = std::result::Result<T, SyncError>;

/// `StorageProvider` backed by the Dropbox API.
#[derive(Clone)]
pub struct DropboxStorage {
    client: Arc<DropboxClient>,
}

impl DropboxStorage {
    pub fn new(config: DropboxConfig) -> Self {
        Self {
            client: Arc::new(DropboxClient::new(config)),
        }
    }

    pub fn from_client(client: Arc<DropboxClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StorageProvider for DropboxStorage {
    async fn request_token(&self) -> Result<TokenPair> {
        Ok(self.client.request_token().await?)
    }

    fn authorize_url(&self, request: &TokenPair, callback_url: &str) -> Result<String> {
        Ok(self.client.authorize_url(request, callback_url)?)
    }

    async fn exchange(&self, request: &TokenPair) -> Result<(TokenPair, Option<String>)> {
        Ok(self.client.access_token(request).await?)
    }

    #[instrument(skip(self, credential), level = "debug")]
    async fn list(&self, credential: &Credential, path: &str) -> Result<Vec<RemoteFileEntry>> {
        let token = credential.access_pair()?;
        let entries = self
            .client
            .metadata(token, path)
            .await
            .map_err(DropboxError::with_access_token)?;
        Ok(entries
            .iter()
            .map(|entry| RemoteFileEntry {
                name: entry.name().to_string(),
                is_directory: entry.is_dir,
                is_deleted: entry.is_deleted,
            })
            .collect())
    }

    async fn get_bytes(&self, credential: &Credential, path: &str) -> Result<Option<Vec<u8>>> {
        let token = credential.access_pair()?;
        self.client
            .get_file(token, path)
            .await
            .map_err(DropboxError::with_access_token)
    }

    async fn put_file(
        &self,
        credential: &Credential,
        path: &str,
        data: &[u8],
        overwrite: bool,
    ) -> Result<bool> {
        let token = credential.access_pair()?;
        self.client
            .put_file(token, path, data, overwrite)
            .await
            .map_err(DropboxError::with_access_token)
    }
}
