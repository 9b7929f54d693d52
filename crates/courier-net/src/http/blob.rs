//! Resolution strategies for declared-binary responses.
//!
//! A binary response with status 200 is routed on its content type:
//!
//! | Content type                                   | Resolution |
//! |------------------------------------------------|------------|
//! | `image/*`, `video/*`, `application/octet-stream` | raw bytes |
//! | `application/zip`, `application/x-zip-compressed` | typed [`Blob`], or saved when a download was requested |
//! | anything else                                  | decoded and sniffed for a JSON error body |
//!
//! Servers report failures on binary endpoints as a JSON body served with
//! some non-binary content type, which is why unknown types are sniffed.

use std::sync::Arc;

use bytes::Bytes;
use courier_core::NoticeTitle;
use courier_core::logging::targets;
use serde_json::Value;

use super::download::FileSaver;
use super::envelope::BusinessEnvelope;
use super::notifier::Notifier;
use super::response::{Blob, ContentClass, Payload, ResponseBody, TransportResponse};
use crate::error::{PipelineError, Result};

/// Default message for a sniffed error body without a message.
pub const DEFAULT_SNIFF_MESSAGE: &str = "request exception";

/// Bodies larger than this are decoded on the blocking pool.
const INLINE_DECODE_LIMIT: usize = 64 * 1024;

/// Content-type driven handling of binary payloads.
#[derive(Clone)]
pub(crate) struct BlobResolver {
    notifier: Notifier,
    saver: Arc<dyn FileSaver>,
    default_download_name: String,
}

impl BlobResolver {
    pub(crate) fn new(
        notifier: Notifier,
        saver: Arc<dyn FileSaver>,
        default_download_name: impl Into<String>,
    ) -> Self {
        Self {
            notifier,
            saver,
            default_download_name: default_download_name.into(),
        }
    }

    /// Resolve a declared-binary response.
    pub(crate) async fn resolve(&self, response: &TransportResponse) -> Result<Payload> {
        let content_type = response.content_type();
        let class = ContentClass::from_content_type(content_type);
        tracing::debug!(
            target: targets::BLOB,
            ?class,
            content_type = content_type.unwrap_or(""),
            body = response.body().kind_name(),
            "resolving binary response"
        );

        let bytes = self.body_bytes(response.body())?;

        match class {
            class if class.is_passthrough() => Ok(Payload::Binary(bytes)),
            ContentClass::Archive => {
                let blob = Blob::new(content_type.unwrap_or_default(), bytes);
                let request = response.request();
                if request.is_download() {
                    let filename = request
                        .suggested_filename()
                        .unwrap_or(self.default_download_name.as_str())
                        .to_string();
                    self.save(blob, filename).await?;
                    Ok(Payload::Empty)
                } else {
                    Ok(Payload::Blob(blob))
                }
            }
            _ => self.sniff(bytes).await,
        }
    }

    fn body_bytes(&self, body: &ResponseBody) -> Result<Bytes> {
        match body {
            ResponseBody::Binary(bytes) => Ok(bytes.clone()),
            ResponseBody::Text(text) => Ok(Bytes::from(text.clone())),
            ResponseBody::Json(value) => Ok(Bytes::from(serde_json::to_vec(value)?)),
            ResponseBody::Unreadable(reason) => Err(self.decode_failure(reason.clone())),
        }
    }

    /// Look inside an unknown-type body for a JSON error report.
    async fn sniff(&self, bytes: Bytes) -> Result<Payload> {
        let text = match decode_text(bytes.clone()).await {
            Ok(text) => text,
            Err(reason) => return Err(self.decode_failure(reason)),
        };

        let value = match serde_json::from_str::<Value>(&text) {
            Ok(value) if is_falsy(&value) => return Ok(Payload::Binary(bytes)),
            Ok(value) => value,
            Err(_) => {
                tracing::trace!(target: targets::BLOB, len = bytes.len(), "not JSON, passing through");
                return Ok(Payload::Binary(bytes));
            }
        };

        let envelope = BusinessEnvelope::from_sniffed(&value);
        if envelope.is_success() {
            return Ok(Payload::Binary(bytes));
        }

        let message = envelope
            .message
            .unwrap_or_else(|| DEFAULT_SNIFF_MESSAGE.to_string());
        tracing::debug!(
            target: targets::BLOB,
            code = ?envelope.code,
            %message,
            "error body behind binary content type"
        );
        self.notifier.notify(NoticeTitle::NOTICE, &message);
        Err(PipelineError::Business {
            code: envelope.code,
            message,
        })
    }

    async fn save(&self, blob: Blob, filename: String) -> Result<()> {
        let saver = Arc::clone(&self.saver);
        let name = filename.clone();
        let result = tokio::task::spawn_blocking(move || saver.save(&blob, &name))
            .await
            .map_err(|e| PipelineError::Io(std::io::Error::other(e.to_string())))
            .and_then(|saved| saved);

        match result {
            Ok(path) => {
                tracing::debug!(target: targets::BLOB, path = %path.display(), "archive saved");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(target: targets::BLOB, %filename, error = %err, "saving archive failed");
                self.notifier
                    .notify(NoticeTitle::NOTICE, &format!("failed to save {filename}: {err}"));
                Err(err)
            }
        }
    }

    fn decode_failure(&self, reason: String) -> PipelineError {
        let err = PipelineError::BlobDecode(reason);
        tracing::warn!(target: targets::BLOB, error = %err, "binary body unreadable");
        self.notifier.notify(NoticeTitle::NOTICE, &err.to_string());
        err
    }
}

impl std::fmt::Debug for BlobResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobResolver")
            .field("default_download_name", &self.default_download_name)
            .finish_non_exhaustive()
    }
}

/// `null`, `false`, zero and `""` carry no error information.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Decode bytes as UTF-8 text, replacing invalid sequences and dropping a BOM.
async fn decode_text(bytes: Bytes) -> std::result::Result<String, String> {
    if bytes.len() <= INLINE_DECODE_LIMIT {
        return Ok(lossy_text(&bytes));
    }
    tokio::task::spawn_blocking(move || lossy_text(&bytes))
        .await
        .map_err(|e| e.to_string())
}

fn lossy_text(bytes: &[u8]) -> String {
    let decoded = String::from_utf8_lossy(bytes);
    let text: &str = &decoded;
    text.strip_prefix('\u{feff}').unwrap_or(text).to_string()
}
