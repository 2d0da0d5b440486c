//! HTTP redirect resolution.
//!
//! Redirects from the store are followed by hand instead of by the HTTP
//! client's default policy, which downgrades a redirected POST to GET on
//! 301/302. [`resolve_redirect`] is a pure function from the original request
//! and the redirect response to the next request descriptor; it does no I/O.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_LENGTH};
use reqwest::{Method, StatusCode, Url};

use crate::error_handling::RedirectError;

/// The request that produced a redirect response.
#[derive(Debug, Clone, Copy)]
pub struct OriginalRequest<'a> {
    pub method: &'a Method,
    /// Absolute URL the request was sent to
    pub url: &'a Url,
    pub headers: &'a HeaderMap,
}

/// Everything needed to issue the next hop of a redirect.
#[derive(Debug, Clone, PartialEq)]
pub struct RedirectDecision {
    pub method: Method,
    pub host: String,
    pub port: u16,
    /// True when the next hop is TLS
    pub ssl: bool,
    /// Path plus `?query` when present; never empty
    pub uri: String,
    /// Original request headers without `Content-Length`
    pub headers: HeaderMap,
}

impl RedirectDecision {
    /// Absolute URL of the next hop.
    pub fn url(&self) -> Result<Url, RedirectError> {
        let scheme = if self.ssl { "https" } else { "http" };
        let target = format!("{}://{}:{}{}", scheme, self.host, self.port, self.uri);
        Url::parse(&target).map_err(|source| RedirectError::InvalidLocation {
            location: target,
            source,
        })
    }

    /// `host[:port]` as it should appear in a `Host` header.
    pub fn authority(&self) -> String {
        let default_port = if self.ssl { 443 } else { 80 };
        if self.port == default_port {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Returns true for the statuses that carry a followable `Location`.
pub fn is_redirect_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308)
}

/// Computes the next request for a redirect response.
///
/// Returns `Ok(None)` when there is nothing to follow: the status is not a
/// redirect, `Location` is missing, or the resolved scheme is neither an
/// `...p` (plain, default port 80) nor an `...s` (TLS, default port 443) scheme.
///
/// - 303 always becomes GET; every other redirect keeps the original method.
/// - `Location` may be relative; it is resolved against the original URL.
/// - An empty path becomes `/`, and a query is appended after `?`.
/// - All original headers are kept except `Content-Length`.
///
/// # Errors
///
/// Returns `RedirectError` if the location cannot be read or resolved to a URL
/// with a host.
pub fn resolve_redirect(
    original: &OriginalRequest<'_>,
    status: StatusCode,
    location: Option<&HeaderValue>,
) -> Result<Option<RedirectDecision>, RedirectError> {
    if !is_redirect_status(status) {
        return Ok(None);
    }
    let Some(location) = location else {
        log::warn!(
            "Redirect status {} for {} but no Location header",
            status,
            original.url
        );
        return Ok(None);
    };
    let location = location
        .to_str()
        .map_err(|_| RedirectError::UnreadableLocation)?;

    let method = if status == StatusCode::SEE_OTHER {
        Method::GET
    } else {
        original.method.clone()
    };

    // Url::join accepts both absolute and relative references
    let resolved =
        original
            .url
            .join(location)
            .map_err(|source| RedirectError::InvalidLocation {
                location: location.to_string(),
                source,
            })?;

    let (ssl, default_port) = match resolved.scheme().chars().last() {
        Some('p') => (false, 80),
        Some('s') => (true, 443),
        _ => {
            log::debug!("Not following redirect to unsupported scheme {}", resolved);
            return Ok(None);
        }
    };
    let port = resolved.port().unwrap_or(default_port);
    let host = resolved
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| RedirectError::MissingHost(resolved.to_string()))?
        .to_string();

    let mut uri = resolved.path().to_string();
    if uri.is_empty() {
        uri.push('/');
    }
    if let Some(query) = resolved.query() {
        uri.push('?');
        uri.push_str(query);
    }

    let mut headers = original.headers.clone();
    headers.remove(CONTENT_LENGTH);

    Ok(Some(RedirectDecision {
        method,
        host,
        port,
        ssl,
        uri,
        headers,
    }))
}
