use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::credential::Credential;
use crate::error::Result;
use crate::ledger::RecordId;

/// Document type assigned to every synced document.
pub const DOCUMENT_TYPE_MARKER: i32 = 55;

/// Business-system classification value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentCategory {
    pub id: RecordId,
    pub description: String,
}

/// Document record created per transferred file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncDocument {
    pub subject: String,
    pub body: String,
    pub document_type: i32,
    pub document_date: NaiveDate,
    pub category: RecordId,
}

/// Attachment record carrying the file content.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncAttachment {
    pub document: RecordId,
    pub file_name: String,
    pub file_size: u64,
    pub content: Vec<u8>,
}

impl std::fmt::Debug for SyncAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncAttachment")
            .field("document", &self.document)
            .field("file_name", &self.file_name)
            .field("file_size", &self.file_size)
            .finish_non_exhaustive()
    }
}

/// Result of a remote insert: the success flag and the assigned id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertOutcome {
    pub created: bool,
    pub id: Option<RecordId>,
}

impl InsertOutcome {
    pub fn created(id: RecordId) -> Self {
        Self {
            created: true,
            id: Some(id),
        }
    }

    pub fn rejected() -> Self {
        Self {
            created: false,
            id: None,
        }
    }
}

/// Tokens issued by the business system's token endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Business/ERP system (authorization-code protocol plus record access).
#[async_trait]
pub trait BusinessSystem: Send + Sync {
    /// URL the user visits to obtain an authorization code.
    fn authorize_url(&self, callback_url: &str, state: &str) -> Result<String>;

    /// Exchange an authorization code. `callback_url` must be the one the
    /// flow began with.
    async fn exchange_code(&self, code: &str, callback_url: &str) -> Result<AccessGrant>;

    async fn refresh(&self, refresh_token: &str) -> Result<AccessGrant>;

    /// Document categories in the order the remote system returns them.
    async fn query_categories(
        &self,
        credential: &Credential,
        fields: &[&str],
    ) -> Result<Vec<DocumentCategory>>;

    async fn insert_document(
        &self,
        credential: &Credential,
        document: &SyncDocument,
    ) -> Result<InsertOutcome>;

    async fn insert_attachment(
        &self,
        credential: &Credential,
        attachment: &SyncAttachment,
    ) -> Result<InsertOutcome>;
}
