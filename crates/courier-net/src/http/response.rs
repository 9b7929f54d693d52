//! Response types: the transport response handed to the classifier and the
//! payload a call resolves with.

use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use super::request::RequestDescriptor;
use crate::error::{PipelineError, Result};

/// Binary subtype derived from a `content-type` header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContentClass {
    /// `image/*`
    Image,
    /// `video/*`
    Video,
    /// `application/octet-stream*`
    OctetStream,
    /// `application/zip`, `application/x-zip-compressed`
    Archive,
    /// Anything else, including a missing header.
    UnknownBinary,
}

impl ContentClass {
    /// Classify a content-type header value.
    ///
    /// Image, video and archive types match anywhere in the value; the octet
    /// stream type must be a prefix. Matching is case-insensitive.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let Some(content_type) = content_type else {
            return Self::UnknownBinary;
        };
        let content_type = content_type.trim().to_ascii_lowercase();

        if content_type.contains("image/") {
            Self::Image
        } else if content_type.contains("video/") {
            Self::Video
        } else if content_type.starts_with("application/octet-stream") {
            Self::OctetStream
        } else if content_type.contains("application/zip")
            || content_type.contains("application/x-zip-compressed")
        {
            Self::Archive
        } else {
            Self::UnknownBinary
        }
    }

    /// Whether the payload is passed through without inspection.
    pub fn is_passthrough(self) -> bool {
        matches!(self, Self::Image | Self::Video | Self::OctetStream)
    }
}

/// Raw response body as read off the wire.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseBody {
    /// Body of a JSON-kind request that parsed as JSON.
    Json(serde_json::Value),
    /// Body of a JSON-kind request that was not valid JSON.
    Text(String),
    /// Body of a binary-kind request.
    Binary(Bytes),
    /// Headers arrived but reading the body failed.
    Unreadable(String),
}

impl ResponseBody {
    /// Short name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Json(_) => "json",
            Self::Text(_) => "text",
            Self::Binary(_) => "binary",
            Self::Unreadable(_) => "unreadable",
        }
    }
}

/// A binary payload tagged with its content type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    /// The declared content type.
    pub content_type: String,
    /// The payload.
    pub bytes: Bytes,
}

impl Blob {
    /// Wrap `bytes` as a blob of `content_type`.
    pub fn new(content_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A completed transmission, consumed by the classifier.
#[derive(Clone, Debug)]
pub struct TransportResponse {
    status: u16,
    headers: http::HeaderMap,
    body: ResponseBody,
    request: Arc<RequestDescriptor>,
}

impl TransportResponse {
    /// Assemble a response. Used by the transport and by tests.
    pub fn new(
        status: u16,
        headers: http::HeaderMap,
        body: ResponseBody,
        request: Arc<RequestDescriptor>,
    ) -> Self {
        Self {
            status,
            headers,
            body,
            request,
        }
    }

    /// The HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// The response headers.
    pub fn headers(&self) -> &http::HeaderMap {
        &self.headers
    }

    /// Get a specific header value.
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers
            .get(name.as_ref())
            .and_then(|v| v.to_str().ok())
    }

    /// Get the Content-Type header value.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// The raw body.
    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// The request that produced this response.
    pub fn request(&self) -> &RequestDescriptor {
        &self.request
    }
}

/// What a successful call resolves with.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    /// Unwrapped envelope data, or a non-envelope JSON body.
    Data(serde_json::Value),
    /// A JSON-kind body that was not JSON.
    Text(String),
    /// Raw binary body.
    Binary(Bytes),
    /// Typed archive blob.
    Blob(Blob),
    /// Nothing to return; the side effect (a saved download) is the result.
    Empty,
}

impl Payload {
    /// Short name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Data(_) => "data",
            Self::Text(_) => "text",
            Self::Binary(_) => "binary",
            Self::Blob(_) => "blob",
            Self::Empty => "empty",
        }
    }

    /// The raw body resolved unchanged.
    pub(crate) fn from_raw(body: &ResponseBody) -> Result<Self> {
        match body {
            ResponseBody::Json(value) => Ok(Self::Data(value.clone())),
            ResponseBody::Text(text) => Ok(Self::Text(text.clone())),
            ResponseBody::Binary(bytes) => Ok(Self::Binary(bytes.clone())),
            ResponseBody::Unreadable(reason) => Err(PipelineError::BlobDecode(reason.clone())),
        }
    }

    /// Deserialize `Data` into `T`.
    ///
    /// `Empty` deserializes from `null`, so `T = ()` or `Option<_>` accept it.
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T> {
        match self {
            Self::Data(value) => Ok(serde_json::from_value(value)?),
            Self::Empty => Ok(serde_json::from_value(serde_json::Value::Null)?),
            other => Err(PipelineError::UnexpectedPayload {
                expected: "data",
                actual: other.kind_name(),
            }),
        }
    }

    /// The binary content of `Binary` or `Blob`.
    pub fn into_bytes(self) -> Result<Bytes> {
        match self {
            Self::Binary(bytes) => Ok(bytes),
            Self::Blob(blob) => Ok(blob.bytes),
            other => Err(PipelineError::UnexpectedPayload {
                expected: "binary",
                actual: other.kind_name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_class() {
        use ContentClass::*;

        assert_eq!(ContentClass::from_content_type(Some("image/png")), Image);
        assert_eq!(ContentClass::from_content_type(Some("video/mp4")), Video);
        assert_eq!(
            ContentClass::from_content_type(Some("application/octet-stream;charset=UTF-8")),
            OctetStream
        );
        assert_eq!(ContentClass::from_content_type(Some("application/zip")), Archive);
        assert_eq!(
            ContentClass::from_content_type(Some("application/x-zip-compressed")),
            Archive
        );
        assert_eq!(ContentClass::from_content_type(Some("Image/JPEG")), Image);
        assert_eq!(ContentClass::from_content_type(Some("text/plain")), UnknownBinary);
        assert_eq!(
            ContentClass::from_content_type(Some("application/json")),
            UnknownBinary
        );
        assert_eq!(ContentClass::from_content_type(None), UnknownBinary);

        assert!(OctetStream.is_passthrough());
        assert!(!Archive.is_passthrough());
        assert!(!UnknownBinary.is_passthrough());
    }

    #[test]
    fn test_octet_stream_must_be_prefix() {
        assert_eq!(
            ContentClass::from_content_type(Some("text/x-application/octet-stream")),
            ContentClass::UnknownBinary
        );
    }

    #[test]
    fn test_payload_into_json() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct User {
            id: u32,
        }

        let user: User = Payload::Data(json!({"id": 1})).into_json().unwrap();
        assert_eq!(user, User { id: 1 });

        let nothing: Option<User> = Payload::Empty.into_json().unwrap();
        assert!(nothing.is_none());

        let err = Payload::Binary(Bytes::from_static(b"x"))
            .into_json::<User>()
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::UnexpectedPayload { expected: "data", actual: "binary" }
        ));
    }

    #[test]
    fn test_payload_into_bytes() {
        let blob = Blob::new("application/zip", Bytes::from_static(b"PK"));
        assert_eq!(blob.len(), 2);
        assert_eq!(Payload::Blob(blob).into_bytes().unwrap(), Bytes::from_static(b"PK"));
        assert!(Payload::Text("hi".into()).into_bytes().is_err());
    }
}
