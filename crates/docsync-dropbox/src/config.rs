use clap::Args;

/// Dropbox application credentials and endpoints.
#[derive(Args, Debug, Clone)]
pub struct DropboxConfig {
    /// Dropbox application key
    #[arg(long = "dropbox-app-key", env = "DROPBOX_APP_KEY")]
    pub app_key: String,

    /// Dropbox application secret
    #[arg(long = "dropbox-app-secret", env = "DROPBOX_APP_SECRET")]
    pub app_secret: String,

    /// Root the app operates on ("sandbox" for an app folder, "dropbox" for full access)
    #[arg(long = "dropbox-root", default_value = "sandbox", env = "DROPBOX_ROOT")]
    pub root: String,

    /// Base URL of the Dropbox API
    #[arg(
        long = "dropbox-api-url",
        default_value = "https://api.dropbox.com/1",
        env = "DROPBOX_API_URL"
    )]
    pub api_url: String,

    /// Base URL of the Dropbox content API (file downloads and uploads)
    #[arg(
        long = "dropbox-content-url",
        default_value = "https://api-content.dropbox.com/1",
        env = "DROPBOX_CONTENT_URL"
    )]
    pub content_url: String,

    /// Base URL of the Dropbox web site (user authorization page)
    #[arg(
        long = "dropbox-www-url",
        default_value = "https://www.dropbox.com/1",
        env = "DROPBOX_WWW_URL"
    )]
    pub www_url: String,
}

impl DropboxConfig {
    /// Configuration pointing every endpoint at `base` (used by tests).
    pub fn with_base_url(app_key: &str, app_secret: &str, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            app_key: app_key.to_string(),
            app_secret: app_secret.to_string(),
            root: "sandbox".to_string(),
            api_url: format!("{}/1", base),
            content_url: format!("{}/1", base),
            www_url: format!("{}/1", base),
        }
    }
}
