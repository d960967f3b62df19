//! Exact Online business-system provider.
//!
//! OAuth 2.0 authorization-code grant against `{base}/api/oauth2/*` and
//! OData JSON calls against `{base}/api/v1/{division}/documents/*`.

mod business;
mod client;
mod config;
mod error;

pub use business::ExactBusiness;
pub use client::{CategoryRecord, ExactClient, TokenResponse};
pub use config::ExactConfig;
pub use error::ExactError;
