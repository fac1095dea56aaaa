//! Shared HTTP client for the storage REST API

use crate::bucket::BucketAdmin;
use crate::error::{Error, Result, StorageApiError};
use crate::file::FileHandle;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Path of the storage API below the base URL
pub const DEFAULT_STORAGE_ENDPOINT: &str = "storage/v1";

/// Immutable connection settings shared by every handle
#[derive(Clone)]
pub struct ClientConfig {
    /// Project URL, e.g. `https://xyz.example.co`
    pub base_url: String,
    /// Sent as `Authorization: Bearer {api_key}`
    pub api_key: String,
    /// Defaults to [`DEFAULT_STORAGE_ENDPOINT`]
    pub storage_endpoint: String,
    /// Client-wide request timeout
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            storage_endpoint: DEFAULT_STORAGE_ENDPOINT.to_string(),
            timeout: None,
        }
    }

    pub fn with_storage_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.storage_endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("storage_endpoint", &self.storage_endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

struct Inner {
    base_url: String,
    api_key: String,
    storage_endpoint: String,
    http: Client,
}

/// Storage API client
///
/// Cloning is cheap: the configuration and the pooled `reqwest::Client` are
/// shared. Per-clone settings (cancellation token, request timeout) only
/// apply to requests issued through that clone and the handles derived from it.
#[derive(Clone)]
pub struct StorageClient {
    inner: Arc<Inner>,
    cancel: Option<CancellationToken>,
    request_timeout: Option<Duration>,
}

impl StorageClient {
    /// Create a new storage client with its own connection pool
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Self::with_http_client(config, http)
    }

    /// Create a storage client on top of an existing `reqwest::Client`
    pub fn with_http_client(config: ClientConfig, http: Client) -> Result<Self> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::InvalidInput("Base URL cannot be empty".to_string()));
        }
        if config.api_key.is_empty() {
            return Err(Error::InvalidInput("API key cannot be empty".to_string()));
        }

        Ok(Self {
            inner: Arc::new(Inner {
                base_url,
                api_key: config.api_key,
                storage_endpoint: config.storage_endpoint.trim_matches('/').to_string(),
                http,
            }),
            cancel: None,
            request_timeout: None,
        })
    }

    /// Clone of this client whose requests abort when `token` is cancelled
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            cancel: Some(token),
            ..self.clone()
        }
    }

    /// Clone of this client applying `timeout` to every request it issues
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            request_timeout: Some(timeout),
            ..self.clone()
        }
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn storage_endpoint(&self) -> &str {
        &self.inner.storage_endpoint
    }

    /// `{base_url}/{storage_endpoint}`
    pub fn storage_root(&self) -> String {
        format!("{}/{}", self.inner.base_url, self.inner.storage_endpoint)
    }

    /// `{base_url}/{storage_endpoint}/{path}`
    pub fn storage_url(&self, path: &str) -> String {
        format!("{}/{}", self.storage_root(), path)
    }

    /// Bucket-level operations
    pub fn buckets(&self) -> BucketAdmin {
        BucketAdmin::new(self.clone())
    }

    /// Object-level operations scoped to one bucket
    pub fn from(&self, bucket_id: impl Into<String>) -> FileHandle {
        FileHandle::new(self.clone(), bucket_id)
    }

    /// Start an authenticated request against `{storage_root}/{path}`
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.storage_url(path);
        debug!(%method, %url, "storage request");

        let builder = self
            .inner
            .http
            .request(method, url)
            .bearer_auth(&self.inner.api_key);

        match self.request_timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }

    /// Same as [`request`](Self::request) with `Content-Type: application/json` set
    pub(crate) fn json_request(&self, method: Method, path: &str) -> RequestBuilder {
        self.request(method, path)
            .header(CONTENT_TYPE, "application/json")
    }

    /// Send a request and return the raw response, whatever its status
    pub(crate) async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        self.guard(request.send()).await
    }

    /// Read a response body, honoring cancellation
    pub(crate) async fn read_body(&self, response: Response) -> Result<Bytes> {
        self.guard(response.bytes()).await
    }

    /// Send a request and decode a successful JSON body into `T`
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = self.execute(request).await?;
        if !response.status().is_success() {
            return Err(self.service_error(response).await);
        }

        let body = self.read_body(response).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Send a request and discard a successful body
    pub(crate) async fn send_empty(&self, request: RequestBuilder) -> Result<()> {
        let response = self.execute(request).await?;
        if !response.status().is_success() {
            return Err(self.service_error(response).await);
        }

        Ok(())
    }

    /// Turn a failed response into an error, tolerating bodies that are not JSON
    pub(crate) async fn service_error(&self, response: Response) -> Error {
        let status = response.status();
        let body = match self.read_body(response).await {
            Ok(body) => body,
            Err(e) => return e,
        };

        let api = serde_json::from_slice::<StorageApiError>(&body).unwrap_or_else(|_| {
            StorageApiError {
                status_code: status.as_u16().to_string(),
                error: status.canonical_reason().unwrap_or("error").to_string(),
                message: String::from_utf8_lossy(&body).into_owned(),
            }
        });

        classify(status, api)
    }

    /// Turn a failed response into an error; the body must be a JSON error object
    pub(crate) async fn strict_service_error(&self, response: Response) -> Error {
        let status = response.status();
        let body = match self.read_body(response).await {
            Ok(body) => body,
            Err(e) => return e,
        };

        match serde_json::from_slice::<StorageApiError>(&body) {
            Ok(api) => classify(status, api),
            Err(e) => Error::Json(e),
        }
    }

    async fn guard<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = reqwest::Result<T>>,
    {
        match &self.cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(Error::Cancelled),
                res = fut => res.map_err(Error::from),
            },
            None => fut.await.map_err(Error::from),
        }
    }
}

impl fmt::Debug for StorageClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageClient")
            .field("base_url", &self.inner.base_url)
            .field("storage_endpoint", &self.inner.storage_endpoint)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// The embedded `statusCode` wins over the HTTP status; the service reports
/// missing objects as HTTP 400 with `statusCode: "404"`.
fn classify(status: StatusCode, mut api: StorageApiError) -> Error {
    if api.status_code.is_empty() {
        api.status_code = status.as_u16().to_string();
    }

    warn!(
        http_status = status.as_u16(),
        status_code = %api.status_code,
        error = %api.error,
        "storage service error"
    );

    if api.is_not_found() {
        Error::NotFound(api.message)
    } else {
        Error::Api(api)
    }
}
