//! The API client: decorator, transport and classifier wired together.
//!
//! ```ignore
//! use courier_net::http::ApiClient;
//! use courier_net::PipelineConfig;
//!
//! let client = ApiClient::builder(PipelineConfig::from_env()?)
//!     .session(session.clone())
//!     .progress(indicator.clone())
//!     .presenter(presenter.clone())
//!     .build()?;
//!
//! // GET /users, unwrapped from the business envelope
//! let users: Vec<User> = client.get("/users").send_json().await?;
//!
//! // Save an export as report.zip
//! client.post("/export").json(&filter).download_as("report.zip").send().await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use courier_core::logging::targets;
use courier_core::{
    ActivityIndicator, AnonymousSession, NotificationPresenter, ProgressIndicator, SessionStore,
    TracingPresenter,
};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::classifier::ResponseClassifier;
use super::decorator::{RequestDecorator, RequestInterceptor};
use super::download::{DirectorySaver, FileSaver};
use super::request::{
    DownloadOptions, HttpMethod, RequestBody, RequestDescriptor, ResponseKind,
};
use super::response::{Payload, ResponseBody, TransportResponse};
use crate::config::{PipelineConfig, StatusRange};
use crate::error::{PipelineError, Result};

/// Builder for an [`ApiClient`].
pub struct ApiClientBuilder {
    config: PipelineConfig,
    session: Arc<dyn SessionStore>,
    progress: Arc<dyn ProgressIndicator>,
    presenter: Arc<dyn NotificationPresenter>,
    file_saver: Option<Arc<dyn FileSaver>>,
    interceptors: Vec<RequestInterceptor>,
}

impl ApiClientBuilder {
    /// Start from `config`. Collaborators default to an anonymous session, a
    /// private activity indicator and a tracing presenter.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            session: Arc::new(AnonymousSession),
            progress: Arc::new(ActivityIndicator::new()),
            presenter: Arc::new(TracingPresenter),
            file_saver: None,
            interceptors: Vec::new(),
        }
    }

    /// Read tokens from `session`.
    pub fn session(mut self, session: impl SessionStore + 'static) -> Self {
        self.session = Arc::new(session);
        self
    }

    /// Report request activity to `progress`.
    pub fn progress(mut self, progress: impl ProgressIndicator + 'static) -> Self {
        self.progress = Arc::new(progress);
        self
    }

    /// Show failures through `presenter`.
    pub fn presenter(mut self, presenter: impl NotificationPresenter + 'static) -> Self {
        self.presenter = Arc::new(presenter);
        self
    }

    /// Save downloads through `saver`.
    ///
    /// Defaults to a [`DirectorySaver`] on the configured download directory.
    pub fn file_saver(mut self, saver: impl FileSaver + 'static) -> Self {
        self.file_saver = Some(Arc::new(saver));
        self
    }

    /// Add a request interceptor.
    ///
    /// Request interceptors are called in order before the token and timestamp
    /// headers are set.
    ///
    /// # Example
    ///
    /// ```ignore
    /// client.add_request_interceptor(|request| {
    ///     request.headers.insert("x-client", "desktop".parse()?);
    ///     Ok(())
    /// })
    /// ```
    pub fn add_request_interceptor<F>(mut self, interceptor: F) -> Self
    where
        F: Fn(&mut RequestDescriptor) -> Result<()> + Send + Sync + 'static,
    {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Override the overall per-call timeout. Saturates at `u64::MAX` milliseconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_ms = saturating_millis(timeout);
        self
    }

    /// Override the connect timeout. Saturates like [`Self::timeout`].
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout_ms = saturating_millis(timeout);
        self
    }

    /// Override the statuses handed to the classifier.
    pub fn accepted_status(mut self, range: StatusRange) -> Self {
        self.config.accepted_status = range;
        self
    }

    /// Add a header sent with every request.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(name.into(), value.into());
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<ApiClient> {
        self.config.validate()?;

        let mut default_headers = http::HeaderMap::new();
        for (name, value) in &self.config.default_headers {
            let name = http::HeaderName::from_bytes(name.as_bytes())?;
            let value = http::HeaderValue::from_str(value)?;
            default_headers.insert(name, value);
        }

        let mut builder = reqwest::Client::builder()
            .timeout(self.config.timeout())
            .connect_timeout(self.config.connect_timeout())
            .default_headers(default_headers);

        if self.config.with_credentials {
            builder = builder.cookie_store(true);
        }
        if let Some(ref ua) = self.config.user_agent {
            builder = builder.user_agent(ua);
        }

        let http = builder
            .build()
            .map_err(|e| PipelineError::Config(format!("failed to build HTTP client: {e}")))?;

        let file_saver = self.file_saver.unwrap_or_else(|| {
            Arc::new(match self.config.download_dir {
                Some(ref dir) => DirectorySaver::new(dir),
                None => DirectorySaver::user_downloads(),
            })
        });

        let decorator = self
            .interceptors
            .into_iter()
            .fold(
                RequestDecorator::new(self.session, Arc::clone(&self.progress)),
                RequestDecorator::with_interceptor,
            );
        let classifier =
            ResponseClassifier::new(&self.config, self.progress, self.presenter, file_saver);

        tracing::debug!(
            target: targets::TRANSPORT,
            base_url = %self.config.base_url,
            timeout_ms = self.config.timeout_ms,
            "client built"
        );

        Ok(ApiClient {
            inner: Arc::new(ApiClientInner {
                http,
                config: self.config,
                decorator,
                classifier,
            }),
        })
    }
}

struct ApiClientInner {
    http: reqwest::Client,
    config: PipelineConfig,
    decorator: RequestDecorator,
    classifier: ResponseClassifier,
}

/// Client for the backend API.
///
/// Every call is decorated with the session token and a timestamp, brackets
/// the activity indicator, and resolves through the response classifier:
/// business envelopes are unwrapped, binary responses are routed by content
/// type, and failures are shown to the user before they are returned.
///
/// Cloning is cheap; clones share the connection pool and collaborators.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

static_assertions::assert_impl_all!(ApiClient: Send, Sync, Clone);

impl ApiClient {
    /// Create a new builder for configuring a client.
    pub fn builder(config: PipelineConfig) -> ApiClientBuilder {
        ApiClientBuilder::new(config)
    }

    /// The client's configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.inner.config
    }

    /// The classifier responses are routed through.
    pub fn classifier(&self) -> &ResponseClassifier {
        &self.inner.classifier
    }

    /// Create a GET request builder.
    pub fn get(&self, path: &str) -> ApiRequestBuilder {
        self.request(HttpMethod::Get, path)
    }

    /// Create a POST request builder.
    pub fn post(&self, path: &str) -> ApiRequestBuilder {
        self.request(HttpMethod::Post, path)
    }

    /// Create a PUT request builder.
    pub fn put(&self, path: &str) -> ApiRequestBuilder {
        self.request(HttpMethod::Put, path)
    }

    /// Create a DELETE request builder.
    pub fn delete(&self, path: &str) -> ApiRequestBuilder {
        self.request(HttpMethod::Delete, path)
    }

    /// Create a PATCH request builder.
    pub fn patch(&self, path: &str) -> ApiRequestBuilder {
        self.request(HttpMethod::Patch, path)
    }

    /// Create a request builder for any method.
    pub fn request(&self, method: HttpMethod, path: &str) -> ApiRequestBuilder {
        ApiRequestBuilder::new(self.clone(), method, self.url_for(path))
    }

    /// Resolve `path` against the base address. Absolute URLs pass through.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.inner.config.normalized_base_url();
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{path}")
        }
    }

    /// Run a request through the whole pipeline.
    pub async fn execute(&self, mut request: RequestDescriptor) -> Result<Payload> {
        let inner = &self.inner;

        // Local usage errors surface before the indicator starts.
        let url = request_url(&request)?;
        inner.decorator.decorate(&mut request)?;

        let request = Arc::new(request);
        match self.transmit(url, &request).await {
            Ok(response) => inner.classifier.classify(Some(&response)).await,
            Err(err) => Err(inner.classifier.transport_failure(err)),
        }
    }

    /// Send one request and read its body according to the declared kind.
    async fn transmit(
        &self,
        url: url::Url,
        request: &Arc<RequestDescriptor>,
    ) -> Result<TransportResponse> {
        let inner = &self.inner;

        let mut req_builder = inner
            .http
            .request(request.method.to_reqwest(), url)
            .headers(request.headers.clone());

        if let Some(timeout) = request.timeout {
            req_builder = req_builder.timeout(timeout);
        }

        match &request.body {
            RequestBody::None => {}
            RequestBody::Text(text) => {
                req_builder = req_builder.body(text.clone());
            }
            RequestBody::Json(value) => {
                req_builder = req_builder.json(value);
            }
            RequestBody::Form(data) => {
                req_builder = req_builder.form(data);
            }
            RequestBody::Bytes(bytes) => {
                req_builder = req_builder.body(bytes.clone());
            }
        }

        tracing::debug!(
            target: targets::TRANSPORT,
            method = %request.method,
            url = %request.url,
            "sending request"
        );

        let response = req_builder.send().await.map_err(PipelineError::Transport)?;

        let status = response.status().as_u16();
        if !inner.config.accepted_status.contains(status) {
            tracing::debug!(target: targets::TRANSPORT, status, "status outside accepted range");
            return Err(PipelineError::UnacceptedStatus { status });
        }

        let headers = response.headers().clone();
        let body = match response.bytes().await {
            Ok(bytes) => match request.response_kind {
                ResponseKind::Binary => ResponseBody::Binary(bytes),
                ResponseKind::Json => match serde_json::from_slice(&bytes) {
                    Ok(value) => ResponseBody::Json(value),
                    Err(_) => ResponseBody::Text(String::from_utf8_lossy(&bytes).into_owned()),
                },
            },
            Err(e) if e.is_timeout() => return Err(PipelineError::Transport(e)),
            Err(e) => ResponseBody::Unreadable(e.to_string()),
        };

        tracing::debug!(
            target: targets::TRANSPORT,
            status,
            body = body.kind_name(),
            "response received"
        );

        Ok(TransportResponse::new(status, headers, body, Arc::clone(request)))
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.config.base_url)
            .field("decorator", &self.inner.decorator)
            .field("classifier", &self.inner.classifier)
            .finish()
    }
}

/// Parse the request URL and append its query parameters.
fn request_url(request: &RequestDescriptor) -> Result<url::Url> {
    let mut url = url::Url::parse(&request.url)?;
    if !request.query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in &request.query {
            pairs.append_pair(key, value);
        }
    }
    Ok(url)
}

/// Builder for a single API request.
pub struct ApiRequestBuilder {
    client: ApiClient,
    request: RequestDescriptor,
    headers: Vec<(String, String)>,
    error: Option<PipelineError>,
}

impl ApiRequestBuilder {
    fn new(client: ApiClient, method: HttpMethod, url: String) -> Self {
        Self {
            client,
            request: RequestDescriptor::new(method, url),
            headers: Vec::new(),
            error: None,
        }
    }

    /// Add a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.query.push((key.into(), value.into()));
        self
    }

    /// Set a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => self.request.body = RequestBody::Json(value),
            Err(e) => self.error = Some(e.into()),
        }
        self
    }

    /// Set a URL-encoded form body.
    pub fn form(mut self, data: HashMap<String, String>) -> Self {
        self.request.body = RequestBody::Form(data);
        self
    }

    /// Set a plain text body.
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.request.body = RequestBody::Text(body.into());
        self
    }

    /// Set a raw binary body.
    pub fn bytes(mut self, body: impl Into<bytes::Bytes>) -> Self {
        self.request.body = RequestBody::Bytes(body.into());
        self
    }

    /// Override the timeout for this request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request.timeout = Some(timeout);
        self
    }

    /// Expect a binary response.
    pub fn binary(mut self) -> Self {
        self.request.response_kind = ResponseKind::Binary;
        self
    }

    /// Save an archive response under the default filename.
    pub fn download(mut self) -> Self {
        self.request = self.request.with_download(DownloadOptions::save());
        self
    }

    /// Save an archive response as `filename`.
    pub fn download_as(mut self, filename: impl Into<String>) -> Self {
        self.request = self.request.with_download(DownloadOptions::save_as(filename));
        self
    }

    /// Build the request descriptor without sending it.
    pub fn build(self) -> Result<RequestDescriptor> {
        self.into_parts().map(|(_, request)| request)
    }

    fn into_parts(self) -> Result<(ApiClient, RequestDescriptor)> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let mut request = self.request;
        for (name, value) in &self.headers {
            let name = http::HeaderName::from_bytes(name.as_bytes())?;
            let value = http::HeaderValue::from_str(value)?;
            request.headers.insert(name, value);
        }
        Ok((self.client, request))
    }

    /// Send the request through the pipeline.
    pub async fn send(self) -> Result<Payload> {
        let (client, request) = self.into_parts()?;
        client.execute(request).await
    }

    /// Send the request and deserialize the unwrapped data.
    pub async fn send_json<T: DeserializeOwned>(self) -> Result<T> {
        self.send().await?.into_json()
    }

    /// Send the request and return the binary payload.
    pub async fn send_bytes(self) -> Result<bytes::Bytes> {
        self.send().await?.into_bytes()
    }
}

impl std::fmt::Debug for ApiRequestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiRequestBuilder")
            .field("method", &self.request.method)
            .field("url", &self.request.url)
            .finish_non_exhaustive()
    }
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
