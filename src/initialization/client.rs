//! HTTP client initialization.
//!
//! This module provides the HTTP clients used for the GeoIP download and for
//! forwarding records to the store.

use reqwest::ClientBuilder;

use crate::error_handling::InitializationError;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Initializes the HTTP client used for the one-off GeoIP archive download.
///
/// No overall timeout is set: the archive is tens of megabytes and the download
/// runs once at startup.
pub fn init_download_client() -> Result<reqwest::Client, InitializationError> {
    let client = ClientBuilder::new().user_agent(USER_AGENT).build()?;
    Ok(client)
}

/// Initializes the HTTP client used to forward records to the store.
///
/// Automatic redirects are disabled so redirects are followed by
/// `redirect::resolve_redirect`, which keeps the method and body of a POST
/// where the default policy would not.
pub fn init_store_client() -> Result<reqwest::Client, InitializationError> {
    let client = ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}
