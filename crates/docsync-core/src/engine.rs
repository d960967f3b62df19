//! Reconciliation run: diff storage against the ledger, transfer every new
//! file into the business system, then persist the merged ledger once.
//!
//! A run is strictly sequential. If it aborts after creating remote records
//! but before the ledger is persisted, those records exist remotely without
//! a ledger entry and the next run creates them again (at-least-once).

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::business::{
    BusinessSystem, DocumentCategory, SyncAttachment, SyncDocument, DOCUMENT_TYPE_MARKER,
};
use crate::credential::Credential;
use crate::error::{Result, SyncError};
use crate::ledger::{LedgerIndex, LedgerLocks, RecordId, ReferenceEntry, ReferenceLedger};
use crate::lister::RemoteDirectoryLister;
use crate::storage::{root_path, StorageProvider};

/// Fields requested when querying document categories.
const CATEGORY_FIELDS: &[&str] = &["ID", "Description"];

/// Which document category new documents are filed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategorySelector {
    /// Match on the category id.
    Id(RecordId),
    /// Match on the description, ignoring ASCII case.
    Description(String),
}

impl CategorySelector {
    pub fn matches(&self, category: &DocumentCategory) -> bool {
        match self {
            CategorySelector::Id(id) => category.id == *id,
            CategorySelector::Description(name) => {
                category.description.trim().eq_ignore_ascii_case(name.trim())
            }
        }
    }
}

impl FromStr for CategorySelector {
    type Err = std::convert::Infallible;

    /// A UUID selects by id, anything else by description.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().parse::<RecordId>() {
            Ok(id) => CategorySelector::Id(id),
            Err(_) => CategorySelector::Description(s.trim().to_string()),
        })
    }
}

impl fmt::Display for CategorySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategorySelector::Id(id) => write!(f, "id {}", id),
            CategorySelector::Description(name) => write!(f, "'{}'", name),
        }
    }
}

/// Progress of a run, logged at debug level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    CategoriesFetched,
    Fetched,
    /// The document insert was sent and answered.
    Uploaded,
    /// The answer carried the id of a created document.
    RecordInserted,
    AttachmentInserted,
    ReferenceRecorded,
    LedgerPersisted,
    Done,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncPhase::Idle => "idle",
            SyncPhase::CategoriesFetched => "categories-fetched",
            SyncPhase::Fetched => "fetched",
            SyncPhase::Uploaded => "uploaded",
            SyncPhase::RecordInserted => "record-inserted",
            SyncPhase::AttachmentInserted => "attachment-inserted",
            SyncPhase::ReferenceRecorded => "reference-recorded",
            SyncPhase::LedgerPersisted => "ledger-persisted",
            SyncPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    /// Entries created by this run, in transfer order.
    pub transferred: Vec<ReferenceEntry>,
    /// Size of the ledger after persisting.
    pub ledger_entries: usize,
}

pub struct SyncEngine {
    storage: Arc<dyn StorageProvider>,
    business: Arc<dyn BusinessSystem>,
    ledger: ReferenceLedger,
    lister: RemoteDirectoryLister,
    locks: Arc<LedgerLocks>,
    category: CategorySelector,
}

impl SyncEngine {
    pub fn new(
        storage: Arc<dyn StorageProvider>,
        business: Arc<dyn BusinessSystem>,
        locks: Arc<LedgerLocks>,
        category: CategorySelector,
    ) -> Self {
        let ledger = ReferenceLedger::new(storage.clone());
        let lister = RemoteDirectoryLister::new(storage.clone(), ledger.clone());
        Self {
            storage,
            business,
            ledger,
            lister,
            locks,
            category,
        }
    }

    /// Subject and body of the document created for a file: its name
    /// without the final extension.
    pub fn subject_for(file_name: &str) -> String {
        Path::new(file_name)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.to_string())
    }

    fn enter(phase: SyncPhase, file: Option<&str>) {
        match file {
            Some(name) => debug!(phase = %phase, file = name, "sync phase"),
            None => debug!(phase = %phase, "sync phase"),
        }
    }

    /// Run a full reconciliation.
    #[instrument(skip_all, fields(category = %self.category))]
    pub async fn run(&self, storage: &Credential, business: &Credential) -> Result<SyncReport> {
        storage.access_pair()?;
        business.access_pair()?;
        Self::enter(SyncPhase::Idle, None);

        let _guard = self.locks.acquire(storage).await?;

        let category = self.select_category(business).await?;
        Self::enter(SyncPhase::CategoriesFetched, None);

        let index = LedgerIndex::from_entries(&self.ledger.load(storage).await?);
        let candidates = self.lister.list_candidates_with(storage, &index).await?;
        info!("{} new file(s) to transfer", candidates.len());

        let mut new_references = Vec::with_capacity(candidates.len());
        for file_name in &candidates {
            let entry = self
                .transfer(storage, business, file_name, category)
                .await
                .map_err(|e| {
                    warn!(
                        "Aborting run at '{}' after {} transfer(s): {}",
                        file_name,
                        new_references.len(),
                        e
                    );
                    e
                })?;
            new_references.push(entry);
        }

        let existing = self.ledger.load(storage).await?;
        let merged = ReferenceLedger::merge(existing, new_references.clone());
        self.ledger.persist(storage, &merged).await?;
        Self::enter(SyncPhase::LedgerPersisted, None);

        info!(
            "Sync complete: {} transferred, ledger holds {} entries",
            new_references.len(),
            merged.len()
        );
        Self::enter(SyncPhase::Done, None);

        Ok(SyncReport {
            transferred: new_references,
            ledger_entries: merged.len(),
        })
    }

    async fn select_category(&self, business: &Credential) -> Result<RecordId> {
        let categories = self
            .business
            .query_categories(business, CATEGORY_FIELDS)
            .await?;

        categories
            .iter()
            .find(|c| self.category.matches(c))
            .map(|c| c.id)
            .ok_or_else(|| {
                SyncError::CategoryUnavailable(format!(
                    "no category matching {} among {} returned",
                    self.category,
                    categories.len()
                ))
            })
    }

    /// Download one file and create its document and attachment.
    async fn transfer(
        &self,
        storage: &Credential,
        business: &Credential,
        file_name: &str,
        category: RecordId,
    ) -> Result<ReferenceEntry> {
        let content = self
            .storage
            .get_bytes(storage, &root_path(file_name))
            .await?
            .ok_or_else(|| {
                SyncError::TransientNetworkFailure(format!(
                    "'{}' disappeared from storage during the run",
                    file_name
                ))
            })?;
        Self::enter(SyncPhase::Fetched, Some(file_name));

        let subject = Self::subject_for(file_name);
        let document = SyncDocument {
            subject: subject.clone(),
            body: subject,
            document_type: DOCUMENT_TYPE_MARKER,
            document_date: Utc::now().date_naive(),
            category,
        };

        let outcome = self.business.insert_document(business, &document).await?;
        Self::enter(SyncPhase::Uploaded, Some(file_name));
        let document_id = match (outcome.created, outcome.id) {
            (true, Some(id)) => id,
            _ => {
                return Err(SyncError::InsertRejected {
                    entity: "document",
                    reason: format!("business system did not create a document for '{}'", file_name),
                })
            }
        };
        Self::enter(SyncPhase::RecordInserted, Some(file_name));

        let attachment = SyncAttachment {
            document: document_id,
            file_name: file_name.to_string(),
            file_size: content.len() as u64,
            content,
        };
        let outcome = self.business.insert_attachment(business, &attachment).await?;
        if !outcome.created {
            return Err(SyncError::InsertRejected {
                entity: "attachment",
                reason: format!(
                    "business system did not attach '{}' to document {}",
                    file_name, document_id
                ),
            });
        }
        Self::enter(SyncPhase::AttachmentInserted, Some(file_name));

        info!(
            "Transferred '{}' ({} bytes) as document {}",
            file_name, attachment.file_size, document_id
        );
        Self::enter(SyncPhase::ReferenceRecorded, Some(file_name));
        Ok(ReferenceEntry::new(document_id, file_name))
    }
}
