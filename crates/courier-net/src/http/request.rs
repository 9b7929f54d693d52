//! Request descriptor types.

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;

/// HTTP request methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// HTTP GET method.
    Get,
    /// HTTP POST method.
    Post,
    /// HTTP PUT method.
    Put,
    /// HTTP DELETE method.
    Delete,
    /// HTTP PATCH method.
    Patch,
}

impl HttpMethod {
    /// Convert to reqwest method.
    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
            Self::Patch => reqwest::Method::PATCH,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
            Self::Delete => write!(f, "DELETE"),
            Self::Patch => write!(f, "PATCH"),
        }
    }
}

/// The body of an outgoing request.
#[derive(Clone, Debug, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    None,
    /// Plain text body.
    Text(String),
    /// JSON body.
    Json(serde_json::Value),
    /// URL-encoded form data.
    Form(HashMap<String, String>),
    /// Raw binary body.
    Bytes(Bytes),
}

/// What the caller expects the response body to be.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResponseKind {
    /// A JSON business envelope (or other JSON/text).
    #[default]
    Json,
    /// A binary payload; the content type picks the resolution strategy.
    Binary,
}

/// Caller-supplied instructions for archive downloads.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DownloadOptions {
    /// Save the archive as a file instead of returning it.
    pub is_download: bool,
    /// Name to save the file under.
    pub suggested_filename: Option<String>,
}

impl DownloadOptions {
    /// Save the response under the default filename.
    pub fn save() -> Self {
        Self {
            is_download: true,
            suggested_filename: None,
        }
    }

    /// Save the response under `filename`.
    pub fn save_as(filename: impl Into<String>) -> Self {
        Self {
            is_download: true,
            suggested_filename: Some(filename.into()),
        }
    }
}

/// A request as it travels through the pipeline.
///
/// Decoration mutates the headers in place; the classifier later reads the
/// URL, response kind and download options back through the response's
/// back-reference.
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
    /// The HTTP method.
    pub method: HttpMethod,
    /// Absolute request URL (base address plus path).
    pub url: String,
    /// Request headers.
    pub headers: http::HeaderMap,
    /// Query parameters.
    pub query: Vec<(String, String)>,
    /// Request body.
    pub body: RequestBody,
    /// Declared response kind.
    pub response_kind: ResponseKind,
    /// Download handling for archive responses.
    pub download: Option<DownloadOptions>,
    /// Timeout override for this request.
    pub timeout: Option<Duration>,
}

impl RequestDescriptor {
    /// A bare GET-style descriptor for `url`.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: http::HeaderMap::new(),
            query: Vec::new(),
            body: RequestBody::None,
            response_kind: ResponseKind::Json,
            download: None,
            timeout: None,
        }
    }

    /// Declare the response kind.
    pub fn with_response_kind(mut self, kind: ResponseKind) -> Self {
        self.response_kind = kind;
        self
    }

    /// Attach download options. Implies a binary response.
    pub fn with_download(mut self, download: DownloadOptions) -> Self {
        self.response_kind = ResponseKind::Binary;
        self.download = Some(download);
        self
    }

    /// Whether the caller asked for the response to be saved as a file.
    pub fn is_download(&self) -> bool {
        self.download.as_ref().is_some_and(|d| d.is_download)
    }

    /// Suggested filename for a download, if one was given.
    pub fn suggested_filename(&self) -> Option<&str> {
        self.download
            .as_ref()
            .and_then(|d| d.suggested_filename.as_deref())
            .filter(|name| !name.trim().is_empty())
    }

    /// Header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
