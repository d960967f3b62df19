use clap::Parser;
use docsync_dropbox::DropboxConfig;
use docsync_exact::ExactConfig;

/// Configuration for the docsync HTTP front.
#[derive(Parser, Debug, Clone)]
#[command(name = "docsync")]
#[command(about = "Copies new Dropbox files into Exact Online documents")]
pub struct Config {
    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0", env = "DOCSYNC_HOST")]
    pub host: String,

    /// Port to bind to
    #[arg(long, default_value = "8080", env = "DOCSYNC_PORT")]
    pub port: u16,

    /// Externally visible base URL, used to build OAuth callbacks.
    /// Derived from the Host header when unset.
    #[arg(long, env = "DOCSYNC_PUBLIC_URL")]
    pub public_url: Option<String>,

    /// Idle time after which a session and its credentials are dropped
    #[arg(long, default_value = "1800", env = "DOCSYNC_SESSION_TTL_SECS")]
    pub session_ttl_secs: u64,

    /// Maximum number of live sessions
    #[arg(long, default_value = "10000", env = "DOCSYNC_SESSION_CAPACITY")]
    pub session_capacity: u64,

    /// Document category for synced files: a description or an ID
    #[arg(long, default_value = "General", env = "DOCSYNC_EXACT_CATEGORY")]
    pub exact_category: String,

    /// Per-request timeout for calls to Dropbox and Exact Online
    #[arg(long, default_value = "120", env = "DOCSYNC_HTTP_TIMEOUT_SECS")]
    pub http_timeout_secs: u64,

    #[command(flatten)]
    pub dropbox: DropboxConfig,

    #[command(flatten)]
    pub exact: ExactConfig,
}
