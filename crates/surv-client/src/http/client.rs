/*
[INPUT]:  HTTP configuration (base URL, timeouts), auth store, navigator
[OUTPUT]: Configured reqwest client with bearer injection and 401 handling
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing response handling
*/

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::error::{Result, SurvError, extract_detail};
use crate::app::{LOGIN_ROUTE, Navigator};
use crate::store::AuthStore;

/// Backend served from the same origin in development
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Main HTTP client for the Surv REST backend.
///
/// Every request carries `Authorization: Bearer <access_token>` when a token
/// is stored. Any 401 clears the stored session and moves the navigator to
/// `/login` before the error reaches the caller.
#[derive(Debug, Clone)]
pub struct SurvClient {
    http_client: Client,
    base_url: Url,
    auth: AuthStore,
    navigator: Navigator,
}

impl SurvClient {
    /// Create a new client with default configuration
    pub fn new(base_url: &str, auth: AuthStore, navigator: Navigator) -> Result<Self> {
        Self::with_config(ClientConfig::default(), base_url, auth, navigator)
    }

    /// Create a new client with custom configuration
    pub fn with_config(
        config: ClientConfig,
        base_url: &str,
        auth: AuthStore,
        navigator: Navigator,
    ) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url: Url::parse(base_url)?,
            auth,
            navigator,
        })
    }

    pub fn auth_store(&self) -> &AuthStore {
        &self.auth
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Underlying reqwest client, shared with the credential issuer
    pub fn http(&self) -> &Client {
        &self.http_client
    }

    fn url(&self, endpoint: &str) -> Result<Url> {
        Ok(self.base_url.join(endpoint)?)
    }

    /// Build a request for a backend endpoint with the bearer token attached
    pub(crate) fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.url(endpoint)?;
        debug!(%method, %url, "backend request");
        let builder = self.http_client.request(method, url);
        Ok(match self.auth.stored_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    /// Send and decode a JSON body
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.send(builder).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|err| {
            SurvError::InvalidResponse(format!("unexpected response body: {err}"))
        })
    }

    /// Send and ignore the body (204 endpoints)
    pub(crate) async fn send_empty(&self, builder: RequestBuilder) -> Result<()> {
        self.send(builder).await?;
        Ok(())
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized();
            return Err(SurvError::Unauthorized);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = extract_detail(&body);
        debug!(status = status.as_u16(), %detail, "backend error");
        Err(SurvError::api_error(status, detail))
    }

    fn handle_unauthorized(&self) {
        warn!("backend returned 401, clearing session");
        if let Err(err) = self.auth.clear_session() {
            warn!(error = %err, "failed to clear stored session");
        }
        self.navigator.navigate(LOGIN_ROUTE);
    }
}
