use clap::Args;

/// Exact Online application registration.
#[derive(Args, Debug, Clone)]
pub struct ExactConfig {
    /// Exact Online site, e.g. https://start.exactonline.nl
    #[arg(
        long = "exact-base-url",
        default_value = "https://start.exactonline.nl",
        env = "EXACT_BASE_URL"
    )]
    pub base_url: String,

    /// OAuth client id from the Exact App Center
    #[arg(long = "exact-client-id", env = "EXACT_CLIENT_ID")]
    pub client_id: String,

    /// OAuth client secret from the Exact App Center
    #[arg(long = "exact-client-secret", env = "EXACT_CLIENT_SECRET")]
    pub client_secret: String,
}

impl ExactConfig {
    pub fn new(base_url: &str, client_id: &str, client_secret: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        }
    }

    pub fn auth_endpoint(&self) -> String {
        format!("{}/api/oauth2/auth", self.base_url.trim_end_matches('/'))
    }

    pub fn token_endpoint(&self) -> String {
        format!("{}/api/oauth2/token", self.base_url.trim_end_matches('/'))
    }

    /// REST root, `{base}/api/v1`.
    pub fn api_root(&self) -> String {
        format!("{}/api/v1", self.base_url.trim_end_matches('/'))
    }
}
