use std::sync::Arc;

use tracing::{debug, instrument, trace};

use crate::credential::Credential;
use crate::error::Result;
use crate::ledger::{LedgerIndex, ReferenceLedger, LEDGER_FILE_NAME};
use crate::storage::{RemoteFileEntry, StorageProvider, STORAGE_ROOT};

/// Enumerates the storage root and filters out non-candidates.
#[derive(Clone)]
pub struct RemoteDirectoryLister {
    storage: Arc<dyn StorageProvider>,
    ledger: ReferenceLedger,
}

impl RemoteDirectoryLister {
    pub fn new(storage: Arc<dyn StorageProvider>, ledger: ReferenceLedger) -> Self {
        Self { storage, ledger }
    }

    /// Plain files at the root: no directories, no deleted entries, not the ledger.
    fn is_listable(entry: &RemoteFileEntry) -> bool {
        !entry.is_directory && !entry.is_deleted && entry.name != LEDGER_FILE_NAME
    }

    /// Every file eligible for sync, synced or not. Diagnostic only.
    #[instrument(skip_all, level = "debug")]
    pub async fn list_all(&self, credential: &Credential) -> Result<Vec<String>> {
        let entries = self.storage.list(credential, STORAGE_ROOT).await?;
        Ok(entries
            .into_iter()
            .filter(Self::is_listable)
            .map(|entry| entry.name)
            .collect())
    }

    /// Files not yet referenced by name in the ledger.
    pub async fn list_candidates(&self, credential: &Credential) -> Result<Vec<String>> {
        let entries = self.ledger.load(credential).await?;
        let index = LedgerIndex::from_entries(&entries);
        self.list_candidates_with(credential, &index).await
    }

    /// Same as `list_candidates` against an index the caller already built.
    #[instrument(skip_all, level = "debug", fields(indexed = index.len()))]
    pub async fn list_candidates_with(
        &self,
        credential: &Credential,
        index: &LedgerIndex,
    ) -> Result<Vec<String>> {
        let all = self.list_all(credential).await?;
        let total = all.len();
        let candidates: Vec<String> = all
            .into_iter()
            .filter(|name| match index.record_for(name) {
                Some(id) => {
                    trace!("'{}' already recorded as {}", name, id);
                    false
                }
                None => true,
            })
            .collect();
        debug!("{} of {} files are candidates", candidates.len(), total);
        Ok(candidates)
    }

    pub async fn count_candidates(&self, credential: &Credential) -> Result<usize> {
        Ok(self.list_candidates(credential).await?.len())
    }
}
