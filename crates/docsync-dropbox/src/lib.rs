//! Dropbox storage provider.
//!
//! Talks to the Dropbox REST API v1 with OAuth 1.0 PLAINTEXT signatures and
//! operates on the application's sandbox folder by default.

mod client;
mod config;
mod error;
mod storage;

pub use client::{DropboxClient, MetadataEntry};
pub use config::DropboxConfig;
pub use error::DropboxError;
pub use storage::DropboxStorage;
