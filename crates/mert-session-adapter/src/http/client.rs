/*
[INPUT]:  HTTP configuration (base URL, timeouts) and the session store
[OUTPUT]: Configured reqwest client with bearer auth and 401 invalidation
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::http::{ExchangeError, Result};
use crate::notify::Notifier;
use crate::session::SessionStore;
use crate::types::ApiErrorBody;

/// Default backend base URL (local development server)
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api/";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Events the client publishes to whoever owns the session.
#[derive(Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A bearer call carrying `token` was rejected with 401.
    Unauthorized { token: String },
}

impl fmt::Debug for ClientEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientEvent::Unauthorized { .. } => f
                .debug_struct("Unauthorized")
                .field("token", &"<redacted>")
                .finish(),
        }
    }
}

/// Main HTTP client for the exchange backend.
///
/// Bearer calls read the token from the session store at request time. A 401
/// clears the store only if it still holds the token that was sent, then
/// publishes [`ClientEvent::Unauthorized`].
pub struct ExchangeClient {
    http_client: Client,
    base_url: Url,
    timeout: Duration,
    store: Arc<dyn SessionStore>,
    events: Notifier<ClientEvent>,
}

impl fmt::Debug for ExchangeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("store", &self.store)
            .finish()
    }
}

impl ExchangeClient {
    /// Create a new client with default configuration
    pub fn new(store: Arc<dyn SessionStore>) -> Result<Self> {
        Self::with_config(ClientConfig::default(), store)
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig, store: Arc<dyn SessionStore>) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url: parse_base_url(&config.base_url)?,
            timeout: config.timeout,
            store,
            events: Notifier::new(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Session store the client reads bearer tokens from
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn events(&self) -> &Notifier<ClientEvent> {
        &self.events
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// Build full URL for an endpoint relative to the base URL
    fn url(&self, endpoint: &str) -> Result<Url> {
        Ok(self.base_url.join(endpoint.trim_start_matches('/'))?)
    }

    /// Build request builder for unauthenticated endpoints
    pub(crate) fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.url(endpoint)?;
        Ok(self.http_client.request(method, url))
    }

    /// Build request builder carrying an explicit bearer token
    pub(crate) fn request_with_token(
        &self,
        method: Method,
        endpoint: &str,
        token: &str,
    ) -> Result<RequestBuilder> {
        Ok(self.request(method, endpoint)?.bearer_auth(token))
    }

    /// Build request builder with the stored bearer token.
    ///
    /// Fails with [`ExchangeError::Unauthorized`] without touching the network
    /// when no token is stored.
    pub(crate) fn authed_request(
        &self,
        method: Method,
        endpoint: &str,
    ) -> Result<(RequestBuilder, String)> {
        let token = self.store.token().ok_or(ExchangeError::Unauthorized)?;
        let builder = self.request_with_token(method, endpoint, &token)?;
        Ok((builder, token))
    }

    /// Send a request and decode a JSON body, mapping non-2xx to errors
    pub(crate) async fn send_json<T>(&self, builder: RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = builder.send().await.map_err(|err| {
            if err.is_timeout() {
                ExchangeError::Timeout {
                    duration: self.timeout.as_secs(),
                }
            } else {
                ExchangeError::Http(err)
            }
        })?;

        let status = response.status();
        let body = response.bytes().await?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(ExchangeError::Unauthorized);
        }

        if !status.is_success() {
            let message = serde_json::from_slice::<ApiErrorBody>(&body)
                .ok()
                .and_then(ApiErrorBody::into_message)
                .unwrap_or_else(|| {
                    let text = String::from_utf8_lossy(&body).trim().to_string();
                    if text.is_empty() {
                        status.canonical_reason().unwrap_or("unknown error").to_string()
                    } else {
                        text
                    }
                });
            debug!(status = status.as_u16(), %message, "backend returned error status");
            return Err(ExchangeError::api_error(status, message));
        }

        let body: &[u8] = if body.is_empty() { b"{}" } else { &body };
        Ok(serde_json::from_slice(body)?)
    }

    /// Send a bearer request; a 401 invalidates `token`
    pub(crate) async fn send_authed_json<T>(&self, builder: RequestBuilder, token: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        match self.send_json(builder).await {
            Err(ExchangeError::Unauthorized) => {
                self.invalidate(token);
                Err(ExchangeError::Unauthorized)
            }
            other => other,
        }
    }

    /// Convenience for bearer endpoints using the stored token
    pub(crate) async fn authed_json<T>(&self, method: Method, endpoint: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let (builder, token) = self.authed_request(method, endpoint)?;
        self.send_authed_json(builder, &token).await
    }

    /// Bearer endpoint with a JSON body
    pub(crate) async fn authed_json_body<B, T>(
        &self,
        method: Method,
        endpoint: &str,
        body: &B,
    ) -> Result<T>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let (builder, token) = self.authed_request(method, endpoint)?;
        self.send_authed_json(builder.json(body), &token).await
    }

    fn invalidate(&self, token: &str) {
        match self.store.clear_if_token(token) {
            Ok(true) => info!("session token rejected by backend, stored session cleared"),
            Ok(false) => debug!("stale token rejected by backend, stored session untouched"),
            Err(err) => warn!(error = %err, "failed to clear rejected session token"),
        }
        self.events.publish(ClientEvent::Unauthorized {
            token: token.to_string(),
        });
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ExchangeError::Config("base URL must not be empty".to_string()));
    }
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
