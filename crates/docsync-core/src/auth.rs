//! The two chained authorization handshakes.
//!
//! Storage uses request-token / access-token exchange, the business system
//! uses an authorization-code grant. The broker keeps no state between hops:
//! every `begin_*` returns a pending `Credential` that the caller must hand
//! back to the matching `complete_*`.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::business::{AccessGrant, BusinessSystem};
use crate::credential::{Credential, ProviderId, TokenPair};
use crate::error::{Result, SyncError};
use crate::storage::StorageProvider;

/// Remove the query string (and fragment) from a URL.
pub fn strip_query(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

pub struct AuthorizationBroker {
    storage: Arc<dyn StorageProvider>,
    business: Arc<dyn BusinessSystem>,
}

impl AuthorizationBroker {
    pub fn new(storage: Arc<dyn StorageProvider>, business: Arc<dyn BusinessSystem>) -> Self {
        Self { storage, business }
    }

    /// Obtain a request token and the URL the user must visit.
    #[instrument(skip(self), level = "debug")]
    pub async fn begin_storage_authorization(
        &self,
        callback_url: &str,
    ) -> Result<(Credential, String)> {
        let request = self.storage.request_token().await?;
        let url = self.storage.authorize_url(&request, callback_url)?;
        debug!("Storage authorization pending, redirecting to provider");
        Ok((Credential::pending_storage(request), url))
    }

    /// Exchange the granted request token for an access token.
    #[instrument(skip_all, level = "debug")]
    pub async fn complete_storage_authorization(&self, pending: Credential) -> Result<Credential> {
        if pending.provider != ProviderId::Storage || !pending.is_pending() {
            return Err(SyncError::AuthorizationDenied(
                "no pending storage authorization".to_string(),
            ));
        }
        let request = pending.request.clone().ok_or_else(|| {
            SyncError::AuthorizationDenied("pending storage credential has no request token".into())
        })?;

        let (access, account_id) = self.storage.exchange(&request).await.map_err(|e| {
            warn!("Storage token exchange failed: {}", e);
            e
        })?;

        let mut authorized = pending.authorize(access);
        authorized.account_id = account_id;
        info!("Storage authorization completed");
        Ok(authorized)
    }

    /// Build the authorization-code request. The callback is recorded with
    /// its query stripped, together with a fresh `state` value.
    pub fn begin_business_authorization(&self, callback_url: &str) -> Result<(Credential, String)> {
        let callback = strip_query(callback_url).to_string();
        let state = Uuid::new_v4().simple().to_string();
        let url = self.business.authorize_url(&callback, &state)?;
        debug!("Business authorization pending, callback {}", callback);
        Ok((Credential::pending_business(callback, state), url))
    }

    /// Exchange the returned code. `request_url` is the URL the provider
    /// redirected to; without its query it must equal the recorded callback.
    #[instrument(skip_all, level = "debug")]
    pub async fn complete_business_authorization(
        &self,
        pending: Credential,
        code: &str,
        returned_state: Option<&str>,
        request_url: &str,
    ) -> Result<Credential> {
        if pending.provider != ProviderId::Business || !pending.is_pending() {
            return Err(SyncError::AuthorizationDenied(
                "no pending business authorization".to_string(),
            ));
        }

        let callback = pending.callback_url.clone().unwrap_or_default();
        let returned_callback = strip_query(request_url);
        if callback.is_empty() || callback != returned_callback {
            warn!(
                "Callback mismatch: began with '{}', returned to '{}'",
                callback, returned_callback
            );
            return Err(SyncError::AuthorizationDenied(
                "callback URL does not match the one the flow began with".to_string(),
            ));
        }

        if pending.csrf_state.as_deref() != returned_state {
            return Err(SyncError::AuthorizationDenied(
                "state parameter mismatch".to_string(),
            ));
        }

        if code.is_empty() {
            return Err(SyncError::AuthorizationDenied(
                "empty authorization code".to_string(),
            ));
        }

        let grant = self.business.exchange_code(code, &callback).await?;
        info!("Business authorization completed");
        Ok(Self::apply_grant(pending, grant))
    }

    /// Refresh a business credential that expires within the skew window.
    /// Credentials that are still fresh, or carry no refresh token, are
    /// returned unchanged.
    #[instrument(skip_all, level = "debug")]
    pub async fn refresh_business_authorization(&self, credential: Credential) -> Result<Credential> {
        let refresh_token = credential.access_pair()?.secret.clone();
        if !credential.is_expiring(Utc::now()) {
            return Ok(credential);
        }
        if refresh_token.is_empty() {
            debug!("Business token expiring but no refresh token available");
            return Ok(credential);
        }

        let grant = self.business.refresh(&refresh_token).await?;
        info!(
            "Refreshed business access token, expires at {:?}",
            grant.expires_at
        );
        Ok(Self::apply_grant(credential, grant))
    }

    fn apply_grant(credential: Credential, grant: AccessGrant) -> Credential {
        // Providers may omit the refresh token on refresh; keep the old one.
        let refresh = grant
            .refresh_token
            .or_else(|| credential.access.as_ref().map(|p| p.secret.clone()))
            .unwrap_or_default();
        let mut authorized = credential.authorize(TokenPair::new(grant.access_token, refresh));
        authorized.expires_at = grant.expires_at;
        authorized
    }
}
