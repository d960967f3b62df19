//! Exact Online REST client.
//!
//! Covers the OAuth 2.0 code and refresh grants plus the handful of OData
//! resources the sync touches. Every REST call is scoped to the user's
//! current division, resolved once per access token.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use docsync_core::{SyncAttachment, SyncDocument};
use moka::future::Cache;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use url::Url;
use uuid::Uuid;

use crate::config::ExactConfig;
use crate::error::{ExactError, Result};

/// Exact access tokens live for ten minutes; a cached division never
/// outlives the token it was resolved for.
const DIVISION_TTL: std::time::Duration = std::time::Duration::from_secs(600);
const DIVISION_CAPACITY: u64 = 10_000;

/// Token endpoint answer. Exact sends `expires_in` as a string.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<Seconds>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Seconds {
    Number(i64),
    Text(String),
}

impl TokenResponse {
    pub fn expires_in_secs(&self) -> Option<i64> {
        match self.expires_in.as_ref()? {
            Seconds::Number(n) => Some(*n),
            Seconds::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.expires_in_secs().map(|secs| now + Duration::seconds(secs))
    }
}

/// `DocumentCategories` row.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRecord {
    #[serde(rename = "ID")]
    pub id: Uuid,
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    d: T,
}

#[derive(Debug, Deserialize)]
struct ResultSet<T> {
    results: Vec<T>,
    #[serde(rename = "__next", default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Me {
    #[serde(rename = "CurrentDivision")]
    current_division: i64,
}

#[derive(Debug, Deserialize)]
struct Created {
    #[serde(rename = "ID", default)]
    id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DocumentPayload<'a> {
    subject: &'a str,
    body: &'a str,
    #[serde(rename = "Type")]
    document_type: i32,
    document_date: String,
    category: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct AttachmentPayload<'a> {
    document: Uuid,
    file_name: &'a str,
    file_size: u64,
    attachment: String,
}

/// Human-readable message out of an OData or OAuth error body.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.to_string();
    };
    value
        .pointer("/error/message/value")
        .or_else(|| value.pointer("/error_description"))
        .or_else(|| value.pointer("/error"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string())
}

pub struct ExactClient {
    http: Client,
    config: ExactConfig,
    divisions: Cache<String, i64>,
}

impl ExactClient {
    pub fn new(config: ExactConfig) -> Self {
        Self::with_http_client(config, Client::new())
    }

    pub fn with_http_client(config: ExactConfig, http: Client) -> Self {
        Self::with_division_ttl(config, http, DIVISION_TTL)
    }

    pub fn with_division_ttl(
        config: ExactConfig,
        http: Client,
        ttl: std::time::Duration,
    ) -> Self {
        let divisions = Cache::builder()
            .max_capacity(DIVISION_CAPACITY)
            .time_to_live(ttl)
            .build();
        Self {
            http,
            config,
            divisions,
        }
    }

    /// Authorization-code request URL.
    pub fn authorize_url(&self, callback_url: &str, state: &str) -> Result<String> {
        let url = Url::parse_with_params(
            &self.config.auth_endpoint(),
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", callback_url),
                ("response_type", "code"),
                ("state", state),
            ],
        )
        .map_err(|e| ExactError::InvalidUrl(e.to_string()))?;
        Ok(url.into())
    }

    #[instrument(skip_all, level = "debug")]
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenResponse> {
        let token = self
            .token_request(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ])
            .await?;
        info!("Exchanged Exact Online authorization code");
        Ok(token)
    }

    #[instrument(skip_all, level = "debug")]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        let token = self
            .token_request(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .await?;
        info!("Refreshed Exact Online access token");
        Ok(token)
    }

    async fn token_request(&self, grant: &[(&str, &str)]) -> Result<TokenResponse> {
        let mut form: Vec<(&str, &str)> = grant.to_vec();
        form.push(("client_id", self.config.client_id.as_str()));
        form.push(("client_secret", self.config.client_secret.as_str()));

        let response = self
            .http
            .post(self.config.token_endpoint())
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.is_client_error() {
                return Err(ExactError::Grant(error_message(&body)));
            }
            return Err(ExactError::Api {
                status_code: status.as_u16(),
                message: body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ExactError::Parse(format!("token response: {}", e)))
    }

    /// Map an error status, passing successes through. `entity` marks a POST
    /// whose 4xx answers are validation rejections.
    async fn check(response: Response, entity: Option<&'static str>) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        match (status, entity) {
            (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => {
                Err(ExactError::Unauthorized(error_message(&body)))
            }
            (s, Some(entity)) if s.is_client_error() => Err(ExactError::Rejected {
                entity,
                status_code: s.as_u16(),
                message: error_message(&body),
            }),
            (s, _) => Err(ExactError::Api {
                status_code: s.as_u16(),
                message: error_message(&body),
            }),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, token: &str, url: &str) -> Result<T> {
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        Self::check(response, None)
            .await?
            .json()
            .await
            .map_err(|e| ExactError::Parse(e.to_string()))
    }

    async fn post_json<B: Serialize>(
        &self,
        token: &str,
        url: &str,
        entity: &'static str,
        body: &B,
    ) -> Result<Option<Uuid>> {
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;
        let created: Envelope<Created> = Self::check(response, Some(entity))
            .await?
            .json()
            .await
            .map_err(|e| ExactError::Parse(e.to_string()))?;
        Ok(created.d.id)
    }

    /// Division the access token's user is currently logged into.
    #[instrument(skip_all, level = "debug")]
    pub async fn current_division(&self, token: &str) -> Result<i64> {
        if let Some(division) = self.divisions.get(token).await {
            return Ok(division);
        }

        let url = Url::parse_with_params(
            &format!("{}/current/Me", self.config.api_root()),
            &[("$select", "CurrentDivision")],
        )
        .map_err(|e| ExactError::InvalidUrl(e.to_string()))?;

        let me: Envelope<ResultSet<Me>> = self.get_json(token, url.as_str()).await?;
        let division = me
            .d
            .results
            .first()
            .map(|m| m.current_division)
            .ok_or_else(|| ExactError::Parse("Me returned no rows".to_string()))?;

        debug!("Current division is {}", division);
        self.divisions.insert(token.to_string(), division).await;
        Ok(division)
    }

    fn resource(&self, division: i64, resource: &str) -> String {
        format!("{}/{}/documents/{}", self.config.api_root(), division, resource)
    }

    /// All document categories, following `__next` links.
    #[instrument(skip(self, token), level = "debug")]
    pub async fn document_categories(
        &self,
        token: &str,
        fields: &[&str],
    ) -> Result<Vec<CategoryRecord>> {
        let division = self.current_division(token).await?;
        let url = Url::parse_with_params(
            &self.resource(division, "DocumentCategories"),
            &[("$select", fields.join(","))],
        )
        .map_err(|e| ExactError::InvalidUrl(e.to_string()))?;

        let mut categories = Vec::new();
        let mut next = Some(url.to_string());
        while let Some(url) = next {
            let page: Envelope<ResultSet<CategoryRecord>> = self.get_json(token, &url).await?;
            categories.extend(page.d.results);
            next = page.d.next;
        }

        debug!("Fetched {} document categories", categories.len());
        Ok(categories)
    }

    #[instrument(skip(self, token, document), level = "debug", fields(subject = %document.subject))]
    pub async fn create_document(&self, token: &str, document: &SyncDocument) -> Result<Option<Uuid>> {
        let division = self.current_division(token).await?;
        let payload = DocumentPayload {
            subject: &document.subject,
            body: &document.body,
            document_type: document.document_type,
            document_date: document.document_date.format("%Y-%m-%d").to_string(),
            category: *document.category.as_uuid(),
        };
        self.post_json(token, &self.resource(division, "Documents"), "document", &payload)
            .await
    }

    #[instrument(
        skip(self, token, attachment),
        level = "debug",
        fields(file_name = %attachment.file_name, file_size = attachment.file_size)
    )]
    pub async fn create_attachment(
        &self,
        token: &str,
        attachment: &SyncAttachment,
    ) -> Result<Option<Uuid>> {
        let division = self.current_division(token).await?;
        let payload = AttachmentPayload {
            document: *attachment.document.as_uuid(),
            file_name: &attachment.file_name,
            file_size: attachment.file_size,
            attachment: STANDARD.encode(&attachment.content),
        };
        self.post_json(
            token,
            &self.resource(division, "DocumentAttachments"),
            "attachment",
            &payload,
        )
        .await
    }
}
