//! In-memory fakes of both remote collaborators.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::business::{
    AccessGrant, BusinessSystem, DocumentCategory, InsertOutcome, SyncAttachment, SyncDocument,
};
use crate::credential::{Credential, ProviderId, TokenPair};
use crate::error::{Result, SyncError};
use crate::ledger::RecordId;
use crate::storage::{RemoteFileEntry, StorageProvider};

pub fn authorized_storage() -> Credential {
    Credential::pending_storage(TokenPair::new("request-token", "request-secret"))
        .authorize(TokenPair::new("access-token", "access-secret"))
}

pub fn authorized_business() -> Credential {
    Credential::new(ProviderId::Business).authorize(TokenPair::new("exact-access", "exact-refresh"))
}

/// Flat storage root: file name to content, plus extra listing entries.
#[derive(Default)]
pub struct FakeStorage {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    extra_entries: Mutex<Vec<RemoteFileEntry>>,
    pub deny_exchange: AtomicBool,
    pub refuse_writes: AtomicBool,
}

impl FakeStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files(names: &[&str]) -> Self {
        let storage = Self::new();
        for name in names {
            storage.put(name, format!("content of {}", name).into_bytes());
        }
        storage
    }

    pub fn put(&self, name: &str, content: Vec<u8>) {
        self.files
            .lock()
            .unwrap()
            .insert(name.to_string(), content);
    }

    pub fn add_entry(&self, entry: RemoteFileEntry) {
        self.extra_entries.lock().unwrap().push(entry);
    }

    pub fn file(&self, name: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(name).cloned()
    }

    pub fn ledger_text(&self) -> Option<String> {
        self.file(crate::LEDGER_FILE_NAME)
            .map(|bytes| String::from_utf8(bytes).unwrap())
    }

    fn name_of(path: &str) -> &str {
        path.trim_start_matches('/')
    }
}

#[async_trait]
impl StorageProvider for FakeStorage {
    async fn request_token(&self) -> Result<TokenPair> {
        Ok(TokenPair::new("request-token", "request-secret"))
    }

    fn authorize_url(&self, request: &TokenPair, callback_url: &str) -> Result<String> {
        Ok(format!(
            "https://storage.test/authorize?oauth_token={}&oauth_callback={}",
            request.token, callback_url
        ))
    }

    async fn exchange(&self, request: &TokenPair) -> Result<(TokenPair, Option<String>)> {
        if self.deny_exchange.load(Ordering::SeqCst) || request.token != "request-token" {
            return Err(SyncError::AuthorizationDenied(
                "request token not authorized".to_string(),
            ));
        }
        Ok((
            TokenPair::new("access-token", "access-secret"),
            Some("uid-1".to_string()),
        ))
    }

    async fn list(&self, credential: &Credential, _path: &str) -> Result<Vec<RemoteFileEntry>> {
        credential.access_pair()?;
        let mut entries: Vec<RemoteFileEntry> = self
            .files
            .lock()
            .unwrap()
            .keys()
            .map(|name| RemoteFileEntry::file(name.clone()))
            .collect();
        entries.extend(self.extra_entries.lock().unwrap().iter().cloned());
        Ok(entries)
    }

    async fn get_bytes(&self, credential: &Credential, path: &str) -> Result<Option<Vec<u8>>> {
        credential.access_pair()?;
        Ok(self.file(Self::name_of(path)))
    }

    async fn put_file(
        &self,
        credential: &Credential,
        path: &str,
        data: &[u8],
        overwrite: bool,
    ) -> Result<bool> {
        credential.access_pair()?;
        if self.refuse_writes.load(Ordering::SeqCst) {
            return Ok(false);
        }
        let name = Self::name_of(path);
        if !overwrite && self.file(name).is_some() {
            return Ok(false);
        }
        self.put(name, data.to_vec());
        Ok(true)
    }
}

/// Business system keeping created records in memory.
pub struct FakeBusiness {
    pub categories: Vec<DocumentCategory>,
    pub documents: Mutex<Vec<(RecordId, SyncDocument)>>,
    pub attachments: Mutex<Vec<SyncAttachment>>,
    /// Reject the document insert once this many documents exist.
    pub reject_documents_after: Option<usize>,
    pub reject_attachments: bool,
    pub exchanged_callbacks: Mutex<Vec<String>>,
    pub refreshes: AtomicUsize,
}

impl FakeBusiness {
    pub fn new() -> Self {
        Self {
            categories: vec![
                DocumentCategory {
                    id: RecordId::new(Uuid::from_u128(100)),
                    description: "General".to_string(),
                },
                DocumentCategory {
                    id: RecordId::new(Uuid::from_u128(101)),
                    description: "Invoices".to_string(),
                },
            ],
            documents: Mutex::new(Vec::new()),
            attachments: Mutex::new(Vec::new()),
            reject_documents_after: None,
            reject_attachments: false,
            exchanged_callbacks: Mutex::new(Vec::new()),
            refreshes: AtomicUsize::new(0),
        }
    }

    pub fn document_count(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    pub fn attachment_count(&self) -> usize {
        self.attachments.lock().unwrap().len()
    }

    fn grant(token: &str) -> AccessGrant {
        AccessGrant {
            access_token: token.to_string(),
            refresh_token: Some("exact-refresh".to_string()),
            expires_at: Some(Utc::now() + Duration::minutes(10)),
        }
    }
}

#[async_trait]
impl BusinessSystem for FakeBusiness {
    fn authorize_url(&self, callback_url: &str, state: &str) -> Result<String> {
        Ok(format!(
            "https://business.test/auth?redirect_uri={}&state={}",
            callback_url, state
        ))
    }

    async fn exchange_code(&self, code: &str, callback_url: &str) -> Result<AccessGrant> {
        self.exchanged_callbacks
            .lock()
            .unwrap()
            .push(callback_url.to_string());
        if code != "good-code" {
            return Err(SyncError::AuthorizationDenied("invalid_grant".to_string()));
        }
        Ok(Self::grant("exact-access"))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AccessGrant> {
        if refresh_token != "exact-refresh" {
            return Err(SyncError::AuthorizationDenied("invalid_grant".to_string()));
        }
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(Self::grant("exact-access-refreshed"))
    }

    async fn query_categories(
        &self,
        credential: &Credential,
        _fields: &[&str],
    ) -> Result<Vec<DocumentCategory>> {
        credential.access_pair()?;
        Ok(self.categories.clone())
    }

    async fn insert_document(
        &self,
        credential: &Credential,
        document: &SyncDocument,
    ) -> Result<InsertOutcome> {
        credential.access_pair()?;
        let mut documents = self.documents.lock().unwrap();
        if let Some(limit) = self.reject_documents_after {
            if documents.len() >= limit {
                return Ok(InsertOutcome::rejected());
            }
        }
        let id = RecordId::new(Uuid::new_v4());
        documents.push((id, document.clone()));
        Ok(InsertOutcome::created(id))
    }

    async fn insert_attachment(
        &self,
        credential: &Credential,
        attachment: &SyncAttachment,
    ) -> Result<InsertOutcome> {
        credential.access_pair()?;
        if self.reject_attachments {
            return Ok(InsertOutcome::rejected());
        }
        self.attachments.lock().unwrap().push(attachment.clone());
        Ok(InsertOutcome::created(RecordId::new(Uuid::new_v4())))
    }
}
