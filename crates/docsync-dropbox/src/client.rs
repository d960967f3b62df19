//! Dropbox REST API v1 client wrapper.
//!
//! Stateless: the token pair is passed per call. Requests are signed with
//! OAuth 1.0 PLAINTEXT in the `Authorization` header.

use std::collections::HashMap;

use docsync_core::TokenPair;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::form_urlencoded::byte_serialize;
use url::Url;

use crate::config::DropboxConfig;
use crate::error::{DropboxError, Result};

/// One item of a directory listing.
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataEntry {
    pub path: String,
    #[serde(default)]
    pub is_dir: bool,
    #[serde(default)]
    pub is_deleted: bool,
}

impl MetadataEntry {
    /// Last path component.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

#[derive(Debug, Deserialize)]
struct Metadata {
    #[serde(default)]
    contents: Vec<MetadataEntry>,
}

/// RFC 3986 percent-encoding of one OAuth parameter value.
fn oauth_encode(value: &str) -> String {
    byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Dropbox API client.
pub struct DropboxClient {
    http: Client,
    config: DropboxConfig,
}

impl DropboxClient {
    pub fn new(config: DropboxConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    pub fn with_http_client(config: DropboxConfig, http: Client) -> Self {
        Self { http, config }
    }

    /// `Authorization` header value for a request signed with `token`.
    fn oauth_header(&self, token: Option<&TokenPair>) -> String {
        let token_secret = token.map(|t| t.secret.as_str()).unwrap_or("");
        let mut header = format!(
            "OAuth oauth_version=\"1.0\", oauth_signature_method=\"PLAINTEXT\", oauth_consumer_key=\"{}\"",
            oauth_encode(&self.config.app_key)
        );
        if let Some(token) = token {
            header.push_str(&format!(", oauth_token=\"{}\"", oauth_encode(&token.token)));
        }
        header.push_str(&format!(
            ", oauth_signature=\"{}&{}\"",
            oauth_encode(&self.config.app_secret),
            oauth_encode(token_secret)
        ));
        header
    }

    fn signed(&self, request: RequestBuilder, token: Option<&TokenPair>) -> RequestBuilder {
        request.header(reqwest::header::AUTHORIZATION, self.oauth_header(token))
    }

    /// Build `{base}/{operation}/{root}/{path...}`. The root directory keeps
    /// its trailing slash.
    fn endpoint(&self, base: &str, operation: &str, path: &str) -> Result<Url> {
        let mut url = Url::parse(base).map_err(|e| DropboxError::InvalidUrl(e.to_string()))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| DropboxError::InvalidUrl(base.to_string()))?;
            segments.pop_if_empty();
            segments.extend(operation.split('/'));
            segments.push(&self.config.root);
            let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
            if parts.is_empty() {
                segments.push("");
            } else {
                segments.extend(parts);
            }
        }
        Ok(url)
    }

    /// Map an error status to a `DropboxError`, passing successes through.
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(DropboxError::Unauthorized(format!("{} {}", status, body)))
            }
            _ => Err(DropboxError::Api {
                status_code: status.as_u16(),
                message: body,
            }),
        }
    }

    async fn token_pair(response: Response) -> Result<(TokenPair, HashMap<String, String>)> {
        let body = response.text().await?;
        let mut fields: HashMap<String, String> = serde_urlencoded::from_str(&body)
            .map_err(|e| DropboxError::Parse(format!("token response: {}", e)))?;
        let token = fields
            .remove("oauth_token")
            .ok_or_else(|| DropboxError::Parse("missing oauth_token".to_string()))?;
        let secret = fields
            .remove("oauth_token_secret")
            .ok_or_else(|| DropboxError::Parse("missing oauth_token_secret".to_string()))?;
        Ok((TokenPair::new(token, secret), fields))
    }

    /// Obtain an unauthorized request token.
    #[instrument(skip(self), level = "debug")]
    pub async fn request_token(&self) -> Result<TokenPair> {
        let url = format!("{}/oauth/request_token", self.config.api_url);
        let response = self.signed(self.http.post(&url), None).send().await?;
        let (pair, _) = Self::token_pair(Self::check(response).await?).await?;
        debug!("Obtained Dropbox request token");
        Ok(pair)
    }

    /// Page where the user grants access to `request`.
    pub fn authorize_url(&self, request: &TokenPair, callback_url: &str) -> Result<String> {
        let url = Url::parse_with_params(
            &format!("{}/oauth/authorize", self.config.www_url),
            &[
                ("oauth_token", request.token.as_str()),
                ("oauth_callback", callback_url),
            ],
        )
        .map_err(|e| DropboxError::InvalidUrl(e.to_string()))?;
        Ok(url.into())
    }

    /// Exchange an authorized request token for an access token and the
    /// account uid.
    #[instrument(skip_all, level = "debug")]
    pub async fn access_token(&self, request: &TokenPair) -> Result<(TokenPair, Option<String>)> {
        let url = format!("{}/oauth/access_token", self.config.api_url);
        let response = self
            .signed(self.http.post(&url), Some(request))
            .send()
            .await?;
        let (pair, mut extra) = Self::token_pair(Self::check(response).await?).await?;
        let uid = extra.remove("uid");
        debug!("Obtained Dropbox access token for uid {:?}", uid);
        Ok((pair, uid))
    }

    /// List a directory.
    #[instrument(skip(self, token), level = "debug")]
    pub async fn metadata(&self, token: &TokenPair, path: &str) -> Result<Vec<MetadataEntry>> {
        let url = self.endpoint(&self.config.api_url, "metadata", path)?;
        let response = self
            .signed(self.http.get(url), Some(token))
            .query(&[("list", "true"), ("include_deleted", "true")])
            .send()
            .await?;
        let metadata: Metadata = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| DropboxError::Parse(e.to_string()))?;
        debug!("Listed {} entries under {}", metadata.contents.len(), path);
        Ok(metadata.contents)
    }

    /// Download a file, `None` if it does not exist.
    #[instrument(skip(self, token), level = "debug")]
    pub async fn get_file(&self, token: &TokenPair, path: &str) -> Result<Option<Vec<u8>>> {
        let url = self.endpoint(&self.config.content_url, "files", path)?;
        let response = self.signed(self.http.get(url), Some(token)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let bytes = Self::check(response).await?.bytes().await?;
        debug!("Downloaded {} bytes from {}", bytes.len(), path);
        Ok(Some(bytes.to_vec()))
    }

    /// Upload a file. Returns `false` when the file exists and `overwrite`
    /// is off (Dropbox answers 409).
    #[instrument(skip(self, token, data), level = "debug", fields(data_len = data.len()))]
    pub async fn put_file(
        &self,
        token: &TokenPair,
        path: &str,
        data: &[u8],
        overwrite: bool,
    ) -> Result<bool> {
        let url = self.endpoint(&self.config.content_url, "files_put", path)?;
        let response = self
            .signed(self.http.put(url), Some(token))
            .query(&[("overwrite", if overwrite { "true" } else { "false" })])
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(data.to_vec())
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            return Ok(false);
        }

        Self::check(response).await?;
        debug!("Uploaded {} bytes to {}", data.len(), path);
        Ok(true)
    }
}
