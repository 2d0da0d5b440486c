//! Remote run store client.
//!
//! Every request to the store is an authenticated JSON POST. Redirects are
//! followed by hand through [`resolve_redirect`] for up to `MAX_REDIRECT_HOPS`
//! hops; past that the last response is returned as final.

use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, HOST, LOCATION,
};
use reqwest::{Method, Response, StatusCode, Url};
use serde::Serialize;

use crate::config::{StoreConfig, MAX_REDIRECT_HOPS, STORE_INSERT_PATH};
use crate::error_handling::ForwardError;
use crate::redirect::{resolve_redirect, OriginalRequest};

/// Authenticated client for the run store.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct StoreClient {
    client: reqwest::Client,
    base: Url,
    headers: HeaderMap,
}

impl StoreClient {
    /// Builds a store client from connection settings.
    ///
    /// `client` must have automatic redirects disabled (see
    /// `initialization::init_store_client`).
    ///
    /// # Errors
    ///
    /// Returns `ForwardError` if the base URL does not parse or the API key is
    /// not a valid header value.
    pub fn new(client: reqwest::Client, config: &StoreConfig) -> Result<Self, ForwardError> {
        let base_url = config.base_url();
        let base = Url::parse(&base_url).map_err(|source| ForwardError::InvalidUrl {
            url: base_url.clone(),
            source,
        })?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        // The store routes on the virtual host, so it is always sent explicitly
        if let Ok(host) = HeaderValue::from_str(&authority(&base)) {
            headers.insert(HOST, host);
        }

        Ok(StoreClient {
            client,
            base,
            headers,
        })
    }

    /// Base URL every store path is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Inserts one record into the runs collection.
    ///
    /// # Returns
    ///
    /// The status of the final response. Only `201 Created` means the record
    /// was stored; interpreting anything else is up to the caller.
    pub async fn insert<T: Serialize>(&self, record: &T) -> Result<StatusCode, ForwardError> {
        let response = self.post_json(STORE_INSERT_PATH, record).await?;
        let status = response.status();
        if status != StatusCode::CREATED {
            log::warn!("Store answered {} for insert into {}", status, STORE_INSERT_PATH);
        }
        Ok(status)
    }

    /// POSTs `body` as JSON to `path` on the store, following redirects.
    pub async fn post_json<T: Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Response, ForwardError> {
        let body = serde_json::to_vec(body)?;
        let url = self
            .base
            .join(path)
            .map_err(|source| ForwardError::InvalidUrl {
                url: format!("{}{}", self.base, path),
                source,
            })?;
        self.send_following_redirects(Method::POST, url, self.headers.clone(), body)
            .await
    }

    async fn send_following_redirects(
        &self,
        mut method: Method,
        mut url: Url,
        mut headers: HeaderMap,
        body: Vec<u8>,
    ) -> Result<Response, ForwardError> {
        let mut body = Some(body);
        let mut hops = 0;

        loop {
            let mut request = self
                .client
                .request(method.clone(), url.clone())
                .headers(headers.clone());
            if let Some(bytes) = &body {
                request = request.body(bytes.clone());
            }
            let response = request.send().await?;

            if hops >= MAX_REDIRECT_HOPS {
                log::warn!(
                    "Stopped following store redirects after {} hops at {}",
                    hops,
                    url
                );
                return Ok(response);
            }

            let original = OriginalRequest {
                method: &method,
                url: &url,
                headers: &headers,
            };
            let Some(decision) =
                resolve_redirect(&original, response.status(), response.headers().get(LOCATION))?
            else {
                return Ok(response);
            };

            let next = decision.url()?;
            log::info!(
                "Store redirected {} {} ({}) to {} {}",
                method,
                url,
                response.status(),
                decision.method,
                next
            );

            let next_authority = decision.authority();
            headers = decision.headers;
            if headers.contains_key(HOST) {
                if let Ok(host) = HeaderValue::from_str(&next_authority) {
                    headers.insert(HOST, host);
                }
            }
            if decision.method == Method::GET {
                body = None;
            }
            method = decision.method;
            url = next;
            hops += 1;
        }
    }
}

/// `host[:port]` of `url`, omitting the scheme's default port.
fn authority(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initialization::init_store_client;
    use httptest::{matchers::*, responders::*, Expectation, Server};
    use serde_json::json;

    fn store_config(url: &str) -> StoreConfig {
        StoreConfig {
            api_key: "secret".to_string(),
            workspace: "ws".to_string(),
            region: "eu-west-1".to_string(),
            store_url: Some(url.to_string()),
        }
    }

    fn store_for(server: &Server) -> StoreClient {
        let client = init_store_client().expect("store client");
        StoreClient::new(client, &store_config(&server.url_str(""))).expect("store")
    }

    #[test]
    fn test_new_rejects_bad_base_url() {
        let client = init_store_client().expect("store client");
        let result = StoreClient::new(client, &store_config("not a url"));
        assert!(matches!(result, Err(ForwardError::InvalidUrl { .. })));
    }

    #[test]
    fn test_new_rejects_unsendable_api_key() {
        let client = init_store_client().expect("store client");
        let mut config = store_config("http://127.0.0.1:1");
        config.api_key = "bad\nkey".to_string();
        let result = StoreClient::new(client, &config);
        assert!(matches!(result, Err(ForwardError::InvalidApiKey(_))));
    }

    #[test]
    fn test_new_uses_workspace_host_without_override() {
        let client = init_store_client().expect("store client");
        let mut config = store_config("unused");
        config.store_url = None;
        let store = StoreClient::new(client, &config).unwrap();
        assert_eq!(store.base_url().as_str(), "https://ws.eu-west-1.xata.sh/");
        assert_eq!(store.headers.get(HOST).unwrap(), "ws.eu-west-1.xata.sh");
    }

    #[tokio::test]
    async fn test_insert_sends_authenticated_json() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", STORE_INSERT_PATH),
                request::headers(contains(("authorization", "Bearer secret"))),
                request::headers(contains(("content-type", "application/json"))),
                request::body(json_decoded(eq(json!({"IP": "203.0.113.5"})))),
            ])
            .respond_with(status_code(201)),
        );

        let status = store_for(&server)
            .insert(&json!({"IP": "203.0.113.5"}))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_insert_returns_rejection_status() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", STORE_INSERT_PATH))
                .respond_with(status_code(400).body(r#"{"message":"bad column"}"#)),
        );

        let status = store_for(&server).insert(&json!({})).await.unwrap();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_insert_unreachable_store_is_transport_error() {
        let client = init_store_client().expect("store client");
        let store = StoreClient::new(client, &store_config("http://127.0.0.1:1")).unwrap();
        let result = store.insert(&json!({})).await;
        assert!(matches!(result, Err(ForwardError::Transport(_))));
    }

    #[tokio::test]
    async fn test_temporary_redirect_replays_post_with_body() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", STORE_INSERT_PATH))
                .respond_with(status_code(307).insert_header("Location", "/moved/data")),
        );
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/moved/data"),
                request::headers(contains(("authorization", "Bearer secret"))),
                request::body(json_decoded(eq(json!({"uuid": "abc"})))),
            ])
            .respond_with(status_code(201)),
        );

        let status = store_for(&server)
            .insert(&json!({"uuid": "abc"}))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_cross_host_redirect_rewrites_host_header() {
        let origin = Server::run();
        let mirror = Server::run();
        // Matchers must be 'static
        let mirror_authority: &'static str = Box::leak(mirror.addr().to_string().into_boxed_str());
        origin.expect(
            Expectation::matching(request::method_path("POST", STORE_INSERT_PATH))
                .respond_with(
                    status_code(308).insert_header("Location", mirror.url_str("/ingest").as_str()),
                ),
        );
        mirror.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/ingest"),
                request::headers(contains(("host", mirror_authority))),
                request::headers(contains(("authorization", "Bearer secret"))),
                request::body(json_decoded(eq(json!({"uuid": "moved"})))),
            ])
            .respond_with(status_code(201)),
        );

        let status = store_for(&origin)
            .insert(&json!({"uuid": "moved"}))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_see_other_switches_to_get_without_body() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", STORE_INSERT_PATH))
                .respond_with(status_code(303).insert_header("Location", "/receipt?id=7")),
        );
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/receipt"),
                request::query(url_decoded(contains(("id", "7")))),
                request::body(""),
            ])
            .respond_with(status_code(200)),
        );

        let status = store_for(&server).insert(&json!({"a": 1})).await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_redirect_loop_stops_after_max_hops() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", STORE_INSERT_PATH))
                .times(MAX_REDIRECT_HOPS + 1)
                .respond_with(status_code(308).insert_header("Location", STORE_INSERT_PATH)),
        );

        let status = store_for(&server).insert(&json!({})).await.unwrap();
        assert_eq!(status, StatusCode::PERMANENT_REDIRECT);
    }

    #[tokio::test]
    async fn test_malformed_redirect_location_is_an_error() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", STORE_INSERT_PATH))
                .respond_with(status_code(302).insert_header("Location", "http://[broken/x")),
        );

        let result = store_for(&server).insert(&json!({})).await;
        assert!(matches!(result, Err(ForwardError::Redirect(_))));
    }

    #[test]
    fn test_authority_omits_default_port() {
        let url = Url::parse("https://ws.eu-west-1.xata.sh/db").unwrap();
        assert_eq!(authority(&url), "ws.eu-west-1.xata.sh");
        let url = Url::parse("http://127.0.0.1:9000/db").unwrap();
        assert_eq!(authority(&url), "127.0.0.1:9000");
    }
}
