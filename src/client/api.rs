use std::sync::Arc;

use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{endpoints, report};
use crate::config::ClientConfig;
use crate::error::Error;
use crate::navigation::Navigator;
use crate::session::{SessionEpoch, SessionStore};

/// HTTP client for the dashboard API with the session concerns applied to every
/// request.
///
/// - The live credential is attached as a bearer token, except on the public auth
///   endpoints.
/// - A 401 on any other endpoint clears the session and navigates to login, once per
///   session even when several requests fail together. The error still reaches the
///   caller.
/// - Every failure is described and logged, then returned unchanged.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
    store: SessionStore,
    navigator: Arc<dyn Navigator>,
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl ApiClient {
    #[must_use]
    pub fn new(
        config: Arc<ClientConfig>,
        store: SessionStore,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            store,
            navigator,
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// GET `path` and decode the JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure or an undecodable body, and
    /// [`Error::Api`] on a non-success status.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, Error> {
        let response = self
            .execute(operation, Method::GET, path, |req| {
                if query.is_empty() { req } else { req.query(query) }
            })
            .await?;
        self.decode(operation, path, response).await
    }

    /// POST a JSON body to `path` and decode the JSON answer.
    ///
    /// # Errors
    ///
    /// Same as [`get_json`](Self::get_json).
    pub async fn post_json<B, T>(
        &self,
        operation: &'static str,
        path: &str,
        body: &B,
    ) -> Result<T, Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .execute(operation, Method::POST, path, |req| req.json(body))
            .await?;
        self.decode(operation, path, response).await
    }

    /// Fire a POST with an empty JSON body and forget about it.
    ///
    /// The credential is captured now, so the request still carries it if the
    /// session is cleared before it is sent. Failures are logged at debug level only.
    pub(crate) fn notify(&self, path: &'static str) {
        let Some(token) = self.store.stored_token() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(path, "No async runtime, notification skipped");
            return;
        };

        let request = self
            .http
            .post(self.config.endpoint(path))
            .bearer_auth(token)
            .json(&serde_json::json!({}));

        runtime.spawn(async move {
            match request.send().await {
                Ok(response) if !response.status().is_success() => {
                    tracing::debug!(path, status = response.status().as_u16(), "Notification rejected");
                }
                Ok(_) => {}
                Err(e) => tracing::debug!(path, error = %e, "Notification failed"),
            }
        });
    }

    async fn execute(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> Result<reqwest::Response, Error> {
        let epoch = self.store.epoch();

        let mut request = build(self.http.request(method, self.config.endpoint(path)));
        if let Some(token) = self.credential_for(path) {
            request = request.bearer_auth(token);
        }

        let result = match request.send().await {
            Ok(response) => Self::ensure_success(response, operation).await,
            Err(e) => Err(Error::from(e)),
        };

        result.inspect_err(|err| {
            report::report(operation, path, err);
            if err.is_unauthorized() && !endpoints::is_public(path) {
                self.on_unauthorized(epoch, path);
            }
        })
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, Error> {
        response.json::<T>().await.map_err(|e| {
            let err = Error::from(e);
            report::report(operation, path, &err);
            err
        })
    }

    fn credential_for(&self, path: &str) -> Option<String> {
        if endpoints::is_public(path) {
            return None;
        }
        self.store.current_token()
    }

    fn on_unauthorized(&self, epoch: SessionEpoch, path: &str) {
        if self.store.invalidate(epoch) {
            tracing::warn!(path, "Unauthorized request detected, logging out");
            self.navigator.navigate(self.config.login_path());
        }
    }

    /// Checks HTTP response status; returns the response on success or an error with
    /// the server's `message` (or the status reason when there is none).
    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response, Error> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .or_else(|| status.canonical_reason().map(str::to_owned))
            .unwrap_or_default();
        Err(Error::Api {
            operation,
            status: status.as_u16(),
            message,
        })
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("api_url", &self.config.api_url().as_str())
            .finish_non_exhaustive()
    }
}
