//! Authorization state carried across the redirect round-trips.
//!
//! The broker is stateless between hops, so every in-flight `Credential`
//! lives in a `SessionContext` that the caller persists through a
//! `SessionStore` between the `begin_*` and `complete_*` calls.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, SyncError};

/// Access tokens expiring within this window are treated as expired.
const EXPIRY_SKEW_MINUTES: i64 = 5;

/// The two remote services a session authorizes against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    Storage,
    Business,
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderId::Storage => write!(f, "storage"),
            ProviderId::Business => write!(f, "business"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialState {
    #[default]
    Unauthenticated,
    PendingAuthorization,
    Authorized,
}

/// Token plus secret. For OAuth 2.0 grants the secret slot holds the
/// refresh token (empty when the provider issued none).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub token: String,
    pub secret: String,
}

impl TokenPair {
    pub fn new(token: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.token.chars().take(6).collect();
        f.debug_struct("TokenPair")
            .field("token", &format!("{}...", prefix))
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Authorization state for one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub provider: ProviderId,
    pub state: CredentialState,
    /// Request-phase pair (storage flow only).
    #[serde(default)]
    pub request: Option<TokenPair>,
    /// Access-phase pair, present once authorized.
    #[serde(default)]
    pub access: Option<TokenPair>,
    /// Callback the business flow began with, query already stripped.
    #[serde(default)]
    pub callback_url: Option<String>,
    /// Opaque `state` parameter sent with the business code request.
    #[serde(default)]
    pub csrf_state: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Storage account id returned by the access exchange.
    #[serde(default)]
    pub account_id: Option<String>,
}

impl Credential {
    pub fn new(provider: ProviderId) -> Self {
        Self {
            provider,
            state: CredentialState::Unauthenticated,
            request: None,
            access: None,
            callback_url: None,
            csrf_state: None,
            expires_at: None,
            account_id: None,
        }
    }

    pub fn pending_storage(request: TokenPair) -> Self {
        Self {
            state: CredentialState::PendingAuthorization,
            request: Some(request),
            ..Self::new(ProviderId::Storage)
        }
    }

    pub fn pending_business(callback_url: String, csrf_state: String) -> Self {
        Self {
            state: CredentialState::PendingAuthorization,
            callback_url: Some(callback_url),
            csrf_state: Some(csrf_state),
            ..Self::new(ProviderId::Business)
        }
    }

    /// Promote to `Authorized`, discarding the request-phase pair.
    pub fn authorize(mut self, access: TokenPair) -> Self {
        self.state = CredentialState::Authorized;
        self.request = None;
        self.access = Some(access);
        self
    }

    pub fn is_authorized(&self) -> bool {
        self.state == CredentialState::Authorized && self.access.is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.state == CredentialState::PendingAuthorization
    }

    /// Access pair of an authorized credential.
    pub fn access_pair(&self) -> Result<&TokenPair> {
        match (&self.state, &self.access) {
            (CredentialState::Authorized, Some(pair)) => Ok(pair),
            _ => Err(SyncError::NotAuthorized {
                provider: self.provider,
            }),
        }
    }

    pub fn access_token(&self) -> Result<&str> {
        self.access_pair().map(|pair| pair.token.as_str())
    }

    /// True when the access token expires within the skew window.
    /// Credentials without expiry information never expire.
    pub fn is_expiring(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(exp) => now >= exp - Duration::minutes(EXPIRY_SKEW_MINUTES),
            None => false,
        }
    }
}

/// Identifier of one browser session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Everything a session carries between requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub id: SessionId,
    #[serde(default)]
    pub storage: Option<Credential>,
    #[serde(default)]
    pub business: Option<Credential>,
}

impl SessionContext {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            storage: None,
            business: None,
        }
    }

    fn slot(&mut self, provider: ProviderId) -> &mut Option<Credential> {
        match provider {
            ProviderId::Storage => &mut self.storage,
            ProviderId::Business => &mut self.business,
        }
    }

    pub fn credential(&self, provider: ProviderId) -> Option<&Credential> {
        match provider {
            ProviderId::Storage => self.storage.as_ref(),
            ProviderId::Business => self.business.as_ref(),
        }
    }
}

/// Durable storage for session contexts, supplied by the host application.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &SessionId) -> Result<Option<SessionContext>>;

    async fn save(&self, context: SessionContext) -> Result<()>;

    async fn remove(&self, id: &SessionId) -> Result<()>;
}

/// Process-local session store without eviction.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<SessionId, SessionContext>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, id: &SessionId) -> Result<Option<SessionContext>> {
        Ok(self.sessions.get(id).map(|entry| entry.value().clone()))
    }

    async fn save(&self, context: SessionContext) -> Result<()> {
        self.sessions.insert(context.id, context);
        Ok(())
    }

    async fn remove(&self, id: &SessionId) -> Result<()> {
        self.sessions.remove(id);
        Ok(())
    }
}

/// Per-provider credential access on top of a `SessionStore`.
#[derive(Clone)]
pub struct CredentialStore {
    sessions: Arc<dyn SessionStore>,
}

impl CredentialStore {
    pub fn new(sessions: Arc<dyn SessionStore>) -> Self {
        Self { sessions }
    }

    async fn context(&self, session: &SessionId) -> Result<SessionContext> {
        Ok(self
            .sessions
            .load(session)
            .await?
            .unwrap_or_else(|| SessionContext::new(*session)))
    }

    /// Store or replace the credential for its provider.
    pub async fn stash(&self, session: &SessionId, credential: Credential) -> Result<()> {
        let mut context = self.context(session).await?;
        debug!(
            "Storing {} credential ({:?}) for session {}",
            credential.provider, credential.state, session
        );
        let provider = credential.provider;
        *context.slot(provider) = Some(credential);
        self.sessions.save(context).await
    }

    pub async fn get(&self, session: &SessionId, provider: ProviderId) -> Result<Option<Credential>> {
        Ok(self
            .sessions
            .load(session)
            .await?
            .and_then(|context| context.credential(provider).cloned()))
    }

    /// Remove and return the credential for a provider.
    pub async fn take(
        &self,
        session: &SessionId,
        provider: ProviderId,
    ) -> Result<Option<Credential>> {
        let Some(mut context) = self.sessions.load(session).await? else {
            return Ok(None);
        };
        let taken = context.slot(provider).take();
        if taken.is_some() {
            self.sessions.save(context).await?;
        }
        Ok(taken)
    }

    /// The authorized credential for a provider, or `AuthorizationDenied`.
    pub async fn require_authorized(
        &self,
        session: &SessionId,
        provider: ProviderId,
    ) -> Result<Credential> {
        match self.get(session, provider).await? {
            Some(credential) if credential.is_authorized() => Ok(credential),
            Some(_) => Err(SyncError::AuthorizationDenied(format!(
                "{} authorization was not completed",
                provider
            ))),
            None => Err(SyncError::AuthorizationDenied(format!(
                "no {} authorization in session",
                provider
            ))),
        }
    }

    pub async fn forget(&self, session: &SessionId) -> Result<()> {
        self.sessions.remove(session).await
    }
}
