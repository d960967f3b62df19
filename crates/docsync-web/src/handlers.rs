//! HTTP handlers.
//!
//! - GET /dropbox/authorize - start the Dropbox authorization
//! - GET /dropbox - Dropbox callback, reports how many files are pending
//! - GET /exact - start the Exact Online authorization, or finish it and sync
//! - GET /health - liveness

use std::sync::Arc;

use axum::extract::{OriginalUri, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use docsync_core::{
    AuthorizationBroker, BusinessSystem, CategorySelector, Credential, CredentialStore,
    LedgerLocks, ProviderId, ReferenceLedger, RemoteDirectoryLister, SessionId, StorageProvider,
    SyncEngine, SyncError,
};
use docsync_dropbox::{DropboxClient, DropboxStorage};
use docsync_exact::{ExactBusiness, ExactClient};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, WebError};
use crate::session::{session_cookie, session_from_headers};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub credentials: CredentialStore,
    pub dropbox: Arc<DropboxClient>,
    pub exact: Arc<ExactClient>,
    pub locks: Arc<LedgerLocks>,
    pub category: CategorySelector,
    pub public_url: Option<String>,
}

impl AppState {
    fn storage(&self) -> Arc<dyn StorageProvider> {
        Arc::new(DropboxStorage::from_client(self.dropbox.clone()))
    }

    fn business(&self) -> Arc<dyn BusinessSystem> {
        Arc::new(ExactBusiness::from_client(self.exact.clone()))
    }

    fn broker(&self) -> AuthorizationBroker {
        AuthorizationBroker::new(self.storage(), self.business())
    }

    fn engine(&self) -> SyncEngine {
        SyncEngine::new(
            self.storage(),
            self.business(),
            self.locks.clone(),
            self.category.clone(),
        )
    }

    /// Absolute URL for `path_and_query` as the browser sees it.
    fn absolute_url(&self, headers: &HeaderMap, path_and_query: &str) -> String {
        let base = match &self.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                let host = headers
                    .get(header::HOST)
                    .and_then(|h| h.to_str().ok())
                    .unwrap_or("localhost");
                format!("http://{}", host)
            }
        };
        format!("{}{}", base, path_and_query)
    }
}

/// Session from the cookie, or a fresh one.
fn session_or_new(headers: &HeaderMap) -> SessionId {
    session_from_headers(headers).unwrap_or_default()
}

fn redirect(session: &SessionId, url: &str) -> Response {
    (
        [(header::SET_COOKIE, session_cookie(session))],
        Redirect::to(url),
    )
        .into_response()
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
}

/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /dropbox/authorize
///
/// Obtains a request token, parks it in the session and redirects the
/// browser to Dropbox with `/dropbox` as the callback.
pub async fn dropbox_authorize_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response> {
    let session = session_or_new(&headers);
    let callback = state.absolute_url(&headers, "/dropbox");

    let (pending, url) = state
        .broker()
        .begin_storage_authorization(&callback)
        .await?;
    state.credentials.stash(&session, pending).await?;

    info!("Session {} redirected to Dropbox", session);
    Ok(redirect(&session, &url))
}

#[derive(Debug, Default, Deserialize)]
pub struct DropboxCallback {
    pub oauth_token: Option<String>,
    pub not_approved: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LandingResponse {
    pub new_files_count: usize,
    pub total_files: usize,
}

/// GET /dropbox
///
/// Completes a pending Dropbox authorization (or reuses an authorized one)
/// and reports how many root files are not in the ledger yet.
pub async fn dropbox_landing_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(callback): Query<DropboxCallback>,
) -> Result<Json<LandingResponse>> {
    let session = session_from_headers(&headers).ok_or(WebError::NoSession)?;

    if callback.not_approved.as_deref() == Some("true") {
        state.credentials.take(&session, ProviderId::Storage).await?;
        return Err(SyncError::AuthorizationDenied("Dropbox access was not approved".into()).into());
    }

    let credential = storage_credential(&state, &session, callback.oauth_token.as_deref()).await?;

    let storage = state.storage();
    let lister = RemoteDirectoryLister::new(storage.clone(), ReferenceLedger::new(storage));
    let _guard = state.locks.acquire(&credential).await?;
    let counts = async {
        let total_files = lister.list_all(&credential).await?.len();
        let new_files_count = lister.count_candidates(&credential).await?;
        Ok::<_, SyncError>((total_files, new_files_count))
    }
    .await;
    let (total_files, new_files_count) = match counts {
        Ok(counts) => counts,
        Err(e) => return Err(discard_rejected(&state, &session, e).await),
    };

    debug!(
        "Session {}: {} of {} files pending",
        session, new_files_count, total_files
    );
    Ok(Json(LandingResponse {
        new_files_count,
        total_files,
    }))
}

async fn storage_credential(
    state: &AppState,
    session: &SessionId,
    returned_token: Option<&str>,
) -> Result<Credential> {
    let current = state.credentials.get(session, ProviderId::Storage).await?;
    match current {
        Some(credential) if credential.is_authorized() => Ok(credential),
        Some(credential) if credential.is_pending() => {
            // The pending request token is single-use either way.
            state.credentials.take(session, ProviderId::Storage).await?;
            let expected = credential.request.as_ref().map(|r| r.token.as_str());
            if let (Some(returned), Some(expected)) = (returned_token, expected) {
                if returned != expected {
                    return Err(SyncError::AuthorizationDenied(
                        "callback token does not match the pending request".into(),
                    )
                    .into());
                }
            }
            let authorized = state
                .broker()
                .complete_storage_authorization(credential)
                .await?;
            state
                .credentials
                .stash(session, authorized.clone())
                .await?;
            Ok(authorized)
        }
        _ => Err(SyncError::AuthorizationDenied(
            "no Dropbox authorization in progress".into(),
        )
        .into()),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ExactCallback {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// GET /exact
///
/// Without `code`: redirect to Exact Online for a code, or sync right away
/// when the session already holds an Exact credential. With `code`: finish
/// the authorization and sync.
pub async fn exact_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    OriginalUri(uri): OriginalUri,
    Query(callback): Query<ExactCallback>,
) -> Result<Response> {
    let session = session_from_headers(&headers).ok_or(WebError::NoSession)?;

    if let Some(error) = callback.error {
        state.credentials.take(&session, ProviderId::Business).await?;
        let reason = match callback.error_description {
            Some(description) => format!("{}: {}", error, description),
            None => error,
        };
        return Err(SyncError::AuthorizationDenied(reason).into());
    }

    let storage = state
        .credentials
        .require_authorized(&session, ProviderId::Storage)
        .await?;

    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/exact");
    let request_url = state.absolute_url(&headers, path_and_query);
    let broker = state.broker();

    let business = match callback.code {
        Some(code) => {
            let pending = state
                .credentials
                .take(&session, ProviderId::Business)
                .await?
                .filter(|c| c.is_pending())
                .ok_or_else(|| {
                    SyncError::AuthorizationDenied(
                        "no Exact Online authorization in progress".into(),
                    )
                })?;
            broker
                .complete_business_authorization(
                    pending,
                    &code,
                    callback.state.as_deref(),
                    &request_url,
                )
                .await?
        }
        None => match state.credentials.get(&session, ProviderId::Business).await? {
            Some(existing) if existing.is_authorized() => {
                match broker.refresh_business_authorization(existing).await {
                    Ok(refreshed) => refreshed,
                    Err(e) => {
                        if e.is_auth_error() {
                            state.credentials.take(&session, ProviderId::Business).await?;
                            info!(
                                "Session {}: Exact Online refresh refused, credential dropped",
                                session
                            );
                        }
                        return Err(e.into());
                    }
                }
            }
            _ => {
                let (pending, url) = broker.begin_business_authorization(&request_url)?;
                state.credentials.stash(&session, pending).await?;
                info!("Session {} redirected to Exact Online", session);
                return Ok(redirect(&session, &url));
            }
        },
    };
    state
        .credentials
        .stash(&session, business.clone())
        .await?;

    let report = match state.engine().run(&storage, &business).await {
        Ok(report) => report,
        Err(e) => return Err(discard_rejected(&state, &session, e).await),
    };
    info!(
        "Session {}: synced {} files, ledger has {} entries",
        session,
        report.transferred.len(),
        report.ledger_entries
    );
    Ok(Json(report).into_response())
}

/// Drop the credential `error` shows to be dead, so the next visit restarts
/// that provider's authorization instead of reusing the token.
async fn discard_rejected(state: &AppState, session: &SessionId, error: SyncError) -> WebError {
    if let Some(provider) = error.rejected_provider() {
        match state.credentials.take(session, provider).await {
            Ok(_) => info!("Session {}: dropped rejected {} credential", session, provider),
            Err(e) => warn!(
                "Session {}: could not drop rejected {} credential: {}",
                session, provider, e
            ),
        }
    }
    error.into()
}

/// Routes of the HTTP front, without the CORS and trace layers.
pub fn router(state: AppState) -> axum::Router {
    use axum::routing::get;

    axum::Router::new()
        .route("/health", get(health_handler))
        .route("/dropbox/authorize", get(dropbox_authorize_handler))
        .route("/dropbox", get(dropbox_landing_handler))
        .route("/exact", get(exact_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MokaSessionStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use docsync_dropbox::DropboxConfig;
    use docsync_exact::ExactConfig;
    use std::time::Duration;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PUBLIC_URL: &str = "https://docsync.test";
    const GENERAL: &str = "0b7e9c1a-3f44-4c2e-9a55-6d7e8f901234";
    const DOC_ID: &str = "6f1c2a52-1e0e-4a0c-9d7e-1f2a3b4c5d6e";

    fn app(server: &MockServer) -> axum::Router {
        let sessions = Arc::new(MokaSessionStore::new(Duration::from_secs(60), 100));
        router(AppState {
            credentials: CredentialStore::new(sessions),
            dropbox: Arc::new(DropboxClient::new(DropboxConfig::with_base_url(
                "key",
                "secret",
                &server.uri(),
            ))),
            exact: Arc::new(ExactClient::new(ExactConfig::new(
                &server.uri(),
                "cid",
                "csecret",
            ))),
            locks: Arc::new(LedgerLocks::new()),
            category: CategorySelector::Description("General".to_string()),
            public_url: Some(PUBLIC_URL.to_string()),
        })
    }

    async fn get(app: &axum::Router, uri: &str, cookie: Option<&str>) -> Response {
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        app.clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn location(response: &Response) -> String {
        response.headers()[header::LOCATION]
            .to_str()
            .unwrap()
            .to_string()
    }

    /// `name=value` part of the session cookie set by a response.
    fn cookie(response: &Response) -> String {
        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn mount_dropbox(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/1/oauth/request_token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("oauth_token=rt&oauth_token_secret=rs"),
            )
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/1/oauth/access_token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("oauth_token=at&oauth_token_secret=as&uid=7"),
            )
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/1/metadata/sandbox/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "contents": [
                    {"path": "/Invoice 1.pdf", "is_dir": false},
                    {"path": "/Scans", "is_dir": true}
                ]
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/1/files/sandbox/.ExactOnlineReferences"))
            .respond_with(ResponseTemplate::new(404))
            .mount(server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/1/files_put/sandbox/.ExactOnlineReferences"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/1/files/sandbox/Invoice%201.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF".to_vec()))
            .mount(server)
            .await;
    }

    async fn mount_exact(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/api/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "exact-token",
                "expires_in": "600",
                "refresh_token": "exact-refresh"
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/current/Me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "d": {"results": [{"CurrentDivision": 42}]}
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/42/documents/DocumentCategories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "d": {"results": [{"ID": GENERAL, "Description": "General"}]}
            })))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/42/documents/Documents"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "d": {"ID": DOC_ID}
            })))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/42/documents/DocumentAttachments"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "d": {"ID": GENERAL}
            })))
            .mount(server)
            .await;
    }

    /// Runs the Dropbox leg and returns the session cookie.
    async fn authorize_dropbox(app: &axum::Router) -> String {
        let response = get(app, "/dropbox/authorize", None).await;
        let cookie = cookie(&response);
        let landing = get(app, "/dropbox?uid=7&oauth_token=rt", Some(&cookie)).await;
        assert_eq!(landing.status(), StatusCode::OK);
        cookie
    }

    #[tokio::test]
    async fn test_health() {
        let server = MockServer::start().await;
        let response = get(&app(&server), "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["healthy"], true);
    }

    #[tokio::test]
    async fn test_dropbox_authorize_redirects_with_cookie() {
        let server = MockServer::start().await;
        mount_dropbox(&server).await;

        let response = get(&app(&server), "/dropbox/authorize", None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(cookie(&response).starts_with("docsync_session="));
        assert_eq!(
            location(&response),
            format!(
                "{}/1/oauth/authorize?oauth_token=rt&oauth_callback=https%3A%2F%2Fdocsync.test%2Fdropbox",
                server.uri()
            )
        );
    }

    #[tokio::test]
    async fn test_landing_reports_counts() {
        let server = MockServer::start().await;
        mount_dropbox(&server).await;
        let app = app(&server);

        let response = get(&app, "/dropbox/authorize", None).await;
        let cookie = cookie(&response);
        let landing = get(&app, "/dropbox?uid=7&oauth_token=rt", Some(&cookie)).await;
        assert_eq!(landing.status(), StatusCode::OK);
        assert_eq!(
            json(landing).await,
            serde_json::json!({"new_files_count": 1, "total_files": 1})
        );

        // The authorized credential is reused on a second visit.
        let again = get(&app, "/dropbox", Some(&cookie)).await;
        assert_eq!(again.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_landing_without_session() {
        let server = MockServer::start().await;
        let response = get(&app(&server), "/dropbox", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json(response).await["code"], "NO_SESSION");
    }

    #[tokio::test]
    async fn test_landing_with_mismatched_token() {
        let server = MockServer::start().await;
        mount_dropbox(&server).await;
        let app = app(&server);

        let response = get(&app, "/dropbox/authorize", None).await;
        let cookie = cookie(&response);
        let landing = get(&app, "/dropbox?oauth_token=other", Some(&cookie)).await;
        assert_eq!(landing.status(), StatusCode::FORBIDDEN);

        // The pending request token was discarded.
        let retry = get(&app, "/dropbox?oauth_token=rt", Some(&cookie)).await;
        assert_eq!(retry.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_landing_not_approved() {
        let server = MockServer::start().await;
        mount_dropbox(&server).await;
        let app = app(&server);

        let response = get(&app, "/dropbox/authorize", None).await;
        let cookie = cookie(&response);
        let landing = get(&app, "/dropbox?not_approved=true", Some(&cookie)).await;
        assert_eq!(landing.status(), StatusCode::FORBIDDEN);
        assert_eq!(json(landing).await["code"], "AUTHORIZATION_DENIED");
    }

    #[tokio::test]
    async fn test_exact_requires_dropbox_first() {
        let server = MockServer::start().await;
        let cookie = format!("docsync_session={}", SessionId::new());
        let response = get(&app(&server), "/exact", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_exact_error_parameter() {
        let server = MockServer::start().await;
        mount_dropbox(&server).await;
        let app = app(&server);
        let cookie = authorize_dropbox(&app).await;

        let response = get(
            &app,
            "/exact?error=access_denied&error_description=User%20declined",
            Some(&cookie),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = json(response).await;
        assert_eq!(body["code"], "AUTHORIZATION_DENIED");
        assert!(body["error"].as_str().unwrap().contains("User declined"));
    }

    #[tokio::test]
    async fn test_exact_state_mismatch() {
        let server = MockServer::start().await;
        mount_dropbox(&server).await;
        mount_exact(&server).await;
        let app = app(&server);
        let cookie = authorize_dropbox(&app).await;

        let begin = get(&app, "/exact", Some(&cookie)).await;
        assert_eq!(begin.status(), StatusCode::SEE_OTHER);

        let response = get(&app, "/exact?code=c&state=forged", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_full_flow_syncs_new_files() {
        let server = MockServer::start().await;
        mount_dropbox(&server).await;
        mount_exact(&server).await;
        let app = app(&server);
        let cookie = authorize_dropbox(&app).await;

        let begin = get(&app, "/exact", Some(&cookie)).await;
        assert_eq!(begin.status(), StatusCode::SEE_OTHER);
        let redirect = url::Url::parse(&location(&begin)).unwrap();
        assert_eq!(redirect.path(), "/api/oauth2/auth");
        let params: std::collections::HashMap<_, _> = redirect.query_pairs().into_owned().collect();
        assert_eq!(params["redirect_uri"], "https://docsync.test/exact");
        let csrf = params["state"].clone();

        let done = get(
            &app,
            &format!("/exact?code=c&state={}", csrf),
            Some(&cookie),
        )
        .await;
        assert_eq!(done.status(), StatusCode::OK);
        let report = json(done).await;
        assert_eq!(report["ledger_entries"], 1);
        assert_eq!(report["transferred"][0]["file_name"], "Invoice 1.pdf");
        assert_eq!(report["transferred"][0]["record_id"], DOC_ID);

        // A later visit reuses the Exact credential instead of redirecting.
        let again = get(&app, "/exact", Some(&cookie)).await;
        assert_eq!(again.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_rejected_exact_token_restarts_authorization() {
        let server = MockServer::start().await;
        mount_dropbox(&server).await;
        Mock::given(method("POST"))
            .and(path("/api/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "revoked-token",
                "refresh_token": "exact-refresh"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/current/Me"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        let app = app(&server);
        let cookie = authorize_dropbox(&app).await;

        let begin = get(&app, "/exact", Some(&cookie)).await;
        let redirect = url::Url::parse(&location(&begin)).unwrap();
        let csrf = redirect
            .query_pairs()
            .find(|(name, _)| name == "state")
            .map(|(_, value)| value.into_owned())
            .unwrap();

        let done = get(&app, &format!("/exact?code=c&state={}", csrf), Some(&cookie)).await;
        assert_eq!(done.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json(done).await["code"], "TOKEN_REJECTED");

        // The dead credential is gone, so the next visit asks Exact again.
        let retry = get(&app, "/exact", Some(&cookie)).await;
        assert_eq!(retry.status(), StatusCode::SEE_OTHER);
        let redirect = url::Url::parse(&location(&retry)).unwrap();
        assert_eq!(redirect.path(), "/api/oauth2/auth");
    }

    #[tokio::test]
    async fn test_rejected_dropbox_token_is_dropped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1/oauth/request_token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("oauth_token=rt&oauth_token_secret=rs"),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/1/oauth/access_token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("oauth_token=at&oauth_token_secret=as&uid=7"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/1/metadata/sandbox/"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        let app = app(&server);

        let response = get(&app, "/dropbox/authorize", None).await;
        let cookie = cookie(&response);
        let landing = get(&app, "/dropbox?oauth_token=rt", Some(&cookie)).await;
        assert_eq!(landing.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json(landing).await["code"], "TOKEN_REJECTED");

        // Neither route keeps using the revoked Dropbox token.
        let exact = get(&app, "/exact", Some(&cookie)).await;
        assert_eq!(exact.status(), StatusCode::FORBIDDEN);
        let again = get(&app, "/dropbox", Some(&cookie)).await;
        assert_eq!(again.status(), StatusCode::FORBIDDEN);
    }
}
