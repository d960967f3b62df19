use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use docsync_core::{
    AccessGrant, BusinessSystem, Credential, DocumentCategory, InsertOutcome, RecordId,
    SyncAttachment, SyncDocument, SyncError,
};
use tracing::warn;

use crate::client::{ExactClient, TokenResponse};
use crate::config::ExactConfig;
use crate::error::ExactError;

type Result<T> = std::result::Result<T, SyncError>;

/// `BusinessSystem` backed by Exact Online.
#[derive(Clone)]
pub struct ExactBusiness {
    client: Arc<ExactClient>,
}

impl ExactBusiness {
    pub fn new(config: ExactConfig) -> Self {
        Self {
            client: Arc::new(ExactClient::new(config)),
        }
    }

    pub fn from_client(client: Arc<ExactClient>) -> Self {
        Self { client }
    }

    fn grant(token: TokenResponse) -> AccessGrant {
        AccessGrant {
            expires_at: token.expires_at(Utc::now()),
            access_token: token.access_token,
            refresh_token: token.refresh_token,
        }
    }

    fn outcome(id: Option<uuid::Uuid>) -> InsertOutcome {
        match id {
            Some(id) => InsertOutcome::created(RecordId::new(id)),
            None => InsertOutcome::rejected(),
        }
    }
}

#[async_trait]
impl BusinessSystem for ExactBusiness {
    fn authorize_url(&self, callback_url: &str, state: &str) -> Result<String> {
        Ok(self.client.authorize_url(callback_url, state)?)
    }

    async fn exchange_code(&self, code: &str, callback_url: &str) -> Result<AccessGrant> {
        let token = self.client.exchange_code(code, callback_url).await?;
        Ok(Self::grant(token))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AccessGrant> {
        let token = self.client.refresh(refresh_token).await?;
        Ok(Self::grant(token))
    }

    async fn query_categories(
        &self,
        credential: &Credential,
        fields: &[&str],
    ) -> Result<Vec<DocumentCategory>> {
        let token = credential.access_token()?;
        let records = self
            .client
            .document_categories(token, fields)
            .await
            .map_err(ExactError::with_access_token)?;
        Ok(records
            .into_iter()
            .map(|record| DocumentCategory {
                id: RecordId::new(record.id),
                description: record.description.unwrap_or_default(),
            })
            .collect())
    }

    async fn insert_document(
        &self,
        credential: &Credential,
        document: &SyncDocument,
    ) -> Result<InsertOutcome> {
        let token = credential.access_token()?;
        let id = self
            .client
            .create_document(token, document)
            .await
            .map_err(ExactError::with_access_token)?;
        if id.is_none() {
            warn!("Document '{}' created without an ID in the response", document.subject);
        }
        Ok(Self::outcome(id))
    }

    async fn insert_attachment(
        &self,
        credential: &Credential,
        attachment: &SyncAttachment,
    ) -> Result<InsertOutcome> {
        let token = credential.access_token()?;
        let id = self
            .client
            .create_attachment(token, attachment)
            .await
            .map_err(ExactError::with_access_token)?;
        Ok(Self::outcome(id))
    }
}
