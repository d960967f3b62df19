//! Persisted cross-reference ledger.
//!
//! One blob at the storage root maps business-record ids to the source file
//! names they were created from, one `<id>;<name>` line per entry. The blob is
//! always rewritten in full; `LedgerLocks` serializes load-modify-persist
//! cycles for the same storage account inside this process.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::credential::Credential;
use crate::error::{Result, SyncError};
use crate::storage::{root_path, StorageProvider};

/// Name of the ledger blob at the storage root.
pub const LEDGER_FILE_NAME: &str = ".ExactOnlineReferences";

/// Identifier assigned by the business system to a created record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl From<Uuid> for RecordId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub record_id: RecordId,
    pub file_name: String,
}

impl ReferenceEntry {
    pub fn new(record_id: RecordId, file_name: impl Into<String>) -> Self {
        Self {
            record_id,
            file_name: file_name.into(),
        }
    }
}

/// Name to record-id lookup built once per run.
///
/// With duplicate file names the first entry wins.
#[derive(Debug, Clone, Default)]
pub struct LedgerIndex {
    by_name: HashMap<String, RecordId>,
}

impl LedgerIndex {
    pub fn from_entries(entries: &[ReferenceEntry]) -> Self {
        let mut by_name = HashMap::with_capacity(entries.len());
        for entry in entries {
            by_name
                .entry(entry.file_name.clone())
                .or_insert(entry.record_id);
        }
        Self { by_name }
    }

    pub fn record_for(&self, file_name: &str) -> Option<RecordId> {
        self.by_name.get(file_name).copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Loads and rewrites the ledger blob through a `StorageProvider`.
#[derive(Clone)]
pub struct ReferenceLedger {
    storage: Arc<dyn StorageProvider>,
}

impl ReferenceLedger {
    pub fn new(storage: Arc<dyn StorageProvider>) -> Self {
        Self { storage }
    }

    /// Load all entries. A missing blob is initialised empty.
    #[instrument(skip_all, level = "debug")]
    pub async fn load(&self, credential: &Credential) -> Result<Vec<ReferenceEntry>> {
        match self.fetch(credential).await {
            Ok(entries) => {
                debug!("Loaded {} ledger entries", entries.len());
                Ok(entries)
            }
            Err(SyncError::LedgerMissing) => {
                info!("No reference ledger found, creating an empty one");
                self.persist(credential, &[]).await?;
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch(&self, credential: &Credential) -> Result<Vec<ReferenceEntry>> {
        let bytes = self
            .storage
            .get_bytes(credential, &root_path(LEDGER_FILE_NAME))
            .await?
            .ok_or(SyncError::LedgerMissing)?;

        let content = String::from_utf8(bytes).map_err(|e| SyncError::LedgerCorrupt {
            line: 0,
            reason: format!("not valid UTF-8: {}", e),
        })?;

        Self::parse(&content)
    }

    /// Overwrite the blob with exactly `entries`.
    #[instrument(skip_all, level = "debug", fields(entries = entries.len()))]
    pub async fn persist(&self, credential: &Credential, entries: &[ReferenceEntry]) -> Result<()> {
        let content = Self::serialize(entries)?;
        let written = self
            .storage
            .put_file(
                credential,
                &root_path(LEDGER_FILE_NAME),
                content.as_bytes(),
                true,
            )
            .await?;

        if !written {
            return Err(SyncError::TransientNetworkFailure(
                "storage provider refused the ledger write".to_string(),
            ));
        }

        debug!("Persisted {} ledger entries", entries.len());
        Ok(())
    }

    /// Parse ledger content. Blank lines are skipped, a trailing `\r` is
    /// tolerated, and the id ends at the first `;`.
    pub fn parse(content: &str) -> Result<Vec<ReferenceEntry>> {
        let mut entries: Vec<ReferenceEntry> = Vec::new();
        let mut seen: HashMap<RecordId, usize> = HashMap::new();

        for (index, raw) in content.split('\n').enumerate() {
            let line_no = index + 1;
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            if line.trim().is_empty() {
                continue;
            }

            let corrupt = |reason: String| SyncError::LedgerCorrupt {
                line: line_no,
                reason,
            };

            let (id, name) = line
                .split_once(';')
                .ok_or_else(|| corrupt("missing ';' separator".to_string()))?;

            let record_id: RecordId = id
                .trim()
                .parse()
                .map_err(|e| corrupt(format!("invalid record id '{}': {}", id, e)))?;

            if name.is_empty() {
                return Err(corrupt("empty file name".to_string()));
            }

            match seen.entry(record_id) {
                Entry::Occupied(first) => {
                    return Err(corrupt(format!(
                        "record id {} already used on line {}",
                        record_id,
                        first.get()
                    )));
                }
                Entry::Vacant(slot) => {
                    slot.insert(line_no);
                }
            }

            entries.push(ReferenceEntry::new(record_id, name));
        }

        Ok(entries)
    }

    /// Serialize entries as newline-joined `id;name` lines.
    pub fn serialize(entries: &[ReferenceEntry]) -> Result<String> {
        let mut lines = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            if entry.file_name.contains(['\n', '\r']) {
                return Err(SyncError::LedgerCorrupt {
                    line: index + 1,
                    reason: format!(
                        "file name of record {} contains a line break",
                        entry.record_id
                    ),
                });
            }
            lines.push(format!("{};{}", entry.record_id, entry.file_name));
        }
        Ok(lines.join("\n"))
    }

    /// Existing entries in order, then new ones. A new entry whose id is
    /// already present replaces the existing one in place.
    pub fn merge(existing: Vec<ReferenceEntry>, new: Vec<ReferenceEntry>) -> Vec<ReferenceEntry> {
        let mut merged = existing;
        let mut positions: HashMap<RecordId, usize> = merged
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.record_id, i))
            .collect();

        for entry in new {
            match positions.get(&entry.record_id) {
                Some(&i) => merged[i] = entry,
                None => {
                    positions.insert(entry.record_id, merged.len());
                    merged.push(entry);
                }
            }
        }
        merged
    }
}

type LockMap = DashMap<String, Arc<AsyncMutex<()>>>;

/// One async mutex per storage account, held across a sync run's
/// load-modify-persist cycle. Only guards writers inside this process.
///
/// An account's entry lives only while someone holds or waits for its lock.
#[derive(Default)]
pub struct LedgerLocks {
    inner: Arc<LockMap>,
}

/// Held lock for one storage account; releases on drop.
pub struct LedgerGuard {
    guard: Option<OwnedMutexGuard<()>>,
    key: String,
    locks: Arc<LockMap>,
}

impl Drop for LedgerGuard {
    fn drop(&mut self) {
        self.guard.take();
        // Waiters hold a clone of the mutex, so a count of one means the map
        // holds the last reference. The shard lock makes check-and-remove
        // atomic with respect to `acquire`.
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl LedgerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock key for a storage credential: the account id when known,
    /// otherwise a hash of the access token.
    pub fn key_for(credential: &Credential) -> Result<String> {
        let token = credential.access_token()?;
        if let Some(account) = credential.account_id.as_deref().filter(|a| !a.is_empty()) {
            return Ok(format!("account:{}", account));
        }
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        Ok(format!("token:{}", hex::encode(hasher.finalize())))
    }

    pub async fn acquire(&self, credential: &Credential) -> Result<LedgerGuard> {
        let key = Self::key_for(credential)?;
        let lock = self
            .inner
            .entry(key.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();
        let guard = lock.lock_owned().await;
        Ok(LedgerGuard {
            guard: Some(guard),
            key,
            locks: self.inner.clone(),
        })
    }
}
