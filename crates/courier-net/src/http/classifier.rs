//! Response classification.
//!
//! The classifier turns a completed transmission into the caller's outcome.
//! It always stops the activity indicator first, then picks exactly one path,
//! in this order:
//!
//! 1. no response: fail with [`PipelineError::NoResponse`]
//! 2. verification-code endpoint with status 200: raw body
//! 3. declared binary with status 200: blob strategies
//! 4. any other status than 200: "system notice", fail with [`PipelineError::HttpStatus`]
//! 5. JSON object or array body: business envelope
//! 6. anything else: raw body
//!
//! Failures that never produced a response go through
//! [`ResponseClassifier::transport_failure`] instead.

use std::sync::Arc;

use courier_core::logging::targets;
use courier_core::{NoticeTitle, NotificationPresenter, ProgressIndicator};

use super::blob::BlobResolver;
use super::download::FileSaver;
use super::envelope::{BusinessEnvelope, unwrap_envelope};
use super::notifier::Notifier;
use super::request::ResponseKind;
use super::response::{Payload, ResponseBody, TransportResponse};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};

/// Notice text when a transport error has no message of its own.
pub const DEFAULT_NETWORK_MESSAGE: &str = "network request failed";

/// Routes completed responses to a resolution strategy.
#[derive(Clone)]
pub struct ResponseClassifier {
    progress: Arc<dyn ProgressIndicator>,
    notifier: Notifier,
    blob: BlobResolver,
    verify_code_path: String,
}

impl ResponseClassifier {
    /// Create a classifier using the paths and names from `config`.
    pub fn new(
        config: &PipelineConfig,
        progress: Arc<dyn ProgressIndicator>,
        presenter: Arc<dyn NotificationPresenter>,
        saver: Arc<dyn FileSaver>,
    ) -> Self {
        let notifier = Notifier::new(presenter, config.notice_duration());
        Self {
            progress,
            blob: BlobResolver::new(notifier.clone(), saver, &config.default_download_name),
            notifier,
            verify_code_path: config.verify_code_path.clone(),
        }
    }

    /// Classify a response. `None` means the transport produced nothing.
    ///
    /// Classification reads the response only; calling this twice on the same
    /// response yields the same outcome.
    pub async fn classify(&self, response: Option<&TransportResponse>) -> Result<Payload> {
        self.progress.done();

        let Some(response) = response else {
            tracing::debug!(target: targets::CLASSIFIER, "no response");
            return Err(PipelineError::NoResponse);
        };

        let status = response.status();
        let request = response.request();
        tracing::debug!(
            target: targets::CLASSIFIER,
            status,
            url = %request.url,
            kind = ?request.response_kind,
            body = response.body().kind_name(),
            "classifying response"
        );

        if status == 200 && request.url.contains(&self.verify_code_path) {
            return self.raw(response.body());
        }

        if status == 200 && request.response_kind == ResponseKind::Binary {
            return self.blob.resolve(response).await;
        }

        if status != 200 {
            self.notifier.notify(
                NoticeTitle::SYSTEM,
                &format!("server request [{status}] failed, please contact the administrator"),
            );
            return Err(PipelineError::HttpStatus { status });
        }

        match response.body() {
            ResponseBody::Json(value) => match BusinessEnvelope::from_value(value) {
                Some(envelope) => unwrap_envelope(envelope, &self.notifier),
                None => Ok(Payload::Data(value.clone())),
            },
            body => self.raw(body),
        }
    }

    /// Report a failure that produced no classifiable response.
    ///
    /// Stops the indicator, presents "network exception" and hands the error
    /// back for the caller to return.
    pub fn transport_failure(&self, err: PipelineError) -> PipelineError {
        self.progress.done();

        let message = err.to_string();
        let message = if message.trim().is_empty() {
            DEFAULT_NETWORK_MESSAGE.to_string()
        } else {
            message
        };
        tracing::warn!(
            target: targets::CLASSIFIER,
            timeout = err.is_timeout(),
            connect = err.is_connect(),
            status = ?err.status(),
            %message,
            "transport failure"
        );
        self.notifier.notify(NoticeTitle::NETWORK, &message);
        err
    }

    fn raw(&self, body: &ResponseBody) -> Result<Payload> {
        Payload::from_raw(body).inspect_err(|err| {
            self.notifier.notify(NoticeTitle::NOTICE, &err.to_string());
        })
    }
}

impl std::fmt::Debug for ResponseClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseClassifier")
            .field("verify_code_path", &self.verify_code_path)
            .field("blob", &self.blob)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SESSION_EXPIRED_MESSAGE;
    use crate::http::download::NullSaver;
    use crate::http::request::{HttpMethod, RequestDescriptor};
    use bytes::Bytes;
    use courier_core::{ActivityIndicator, Notice, SignalPresenter};
    use parking_lot::Mutex;
    use serde_json::{Value, json};

    struct Fixture {
        classifier: ResponseClassifier,
        indicator: ActivityIndicator,
        notices: Arc<Mutex<Vec<Notice>>>,
    }

    fn fixture() -> Fixture {
        let indicator = ActivityIndicator::new();
        let presenter = SignalPresenter::new();
        let notices = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&notices);
        presenter
            .on_presented()
            .connect(move |notice: &Notice| sink.lock().push(notice.clone()));

        let classifier = ResponseClassifier::new(
            &PipelineConfig::new("http://localhost"),
            Arc::new(indicator.clone()),
            Arc::new(presenter),
            Arc::new(NullSaver),
        );
        Fixture {
            classifier,
            indicator,
            notices,
        }
    }

    fn json_response(status: u16, body: Value) -> TransportResponse {
        let request = RequestDescriptor::new(HttpMethod::Get, "http://localhost/users");
        TransportResponse::new(
            status,
            http::HeaderMap::new(),
            ResponseBody::Json(body),
            Arc::new(request),
        )
    }

    #[tokio::test]
    async fn test_envelope_success_returns_data_exactly() {
        let f = fixture();
        let data = json!({"users": [{"id": 1}], "total": 1});
        let payload = f
            .classifier
            .classify(Some(&json_response(200, json!({"retCode": 200, "retData": data.clone()}))))
            .await
            .unwrap();

        assert_eq!(payload, Payload::Data(data));
        assert!(f.notices.lock().is_empty());
    }

    #[tokio::test]
    async fn test_session_expiry_ignores_server_message() {
        let f = fixture();
        let err = f
            .classifier
            .classify(Some(&json_response(
                200,
                json!({"retCode": 401, "retMsg": "token invalid"}),
            )))
            .await
            .unwrap_err();

        assert!(err.is_session_expired());
        assert_eq!(err.to_string(), SESSION_EXPIRED_MESSAGE);
        let notices = f.notices.lock();
        assert_eq!(notices[0].title, NoticeTitle::LOGIN);
    }

    #[tokio::test]
    async fn test_business_failure_default_message() {
        let f = fixture();
        let err = f
            .classifier
            .classify(Some(&json_response(200, json!({"retCode": "200"}))))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "system exception");
        assert_eq!(f.notices.lock()[0].title, NoticeTitle::NOTICE);
    }

    #[tokio::test]
    async fn test_non_200_status_embeds_status() {
        let f = fixture();
        let err = f
            .classifier
            .classify(Some(&json_response(404, json!({"retCode": 200}))))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(404));
        let notices = f.notices.lock();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].title, NoticeTitle::SYSTEM);
        assert!(notices[0].description.contains("404"));
    }

    #[tokio::test]
    async fn test_missing_response() {
        let f = fixture();
        let err = f.classifier.classify(None).await.unwrap_err();
        assert!(matches!(err, PipelineError::NoResponse));
        assert!(f.notices.lock().is_empty());
    }

    #[tokio::test]
    async fn test_array_body_is_rejected_as_envelope() {
        let f = fixture();
        let err = f
            .classifier
            .classify(Some(&json_response(200, json!([1, 2, 3]))))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "system exception");
        let notices = f.notices.lock();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].title, NoticeTitle::NOTICE);
        assert_eq!(notices[0].description, "system exception");
    }

    #[tokio::test]
    async fn test_scalar_and_text_bodies_resolve_raw() {
        let f = fixture();
        let payload = f
            .classifier
            .classify(Some(&json_response(200, json!(42))))
            .await
            .unwrap();
        assert_eq!(payload, Payload::Data(json!(42)));

        let request = RequestDescriptor::new(HttpMethod::Get, "http://localhost/ping");
        let response = TransportResponse::new(
            200,
            http::HeaderMap::new(),
            ResponseBody::Text("pong".into()),
            Arc::new(request),
        );
        let payload = f.classifier.classify(Some(&response)).await.unwrap();
        assert_eq!(payload, Payload::Text("pong".into()));
    }

    #[tokio::test]
    async fn test_verify_code_endpoint_returns_raw_body() {
        let f = fixture();
        let request = RequestDescriptor::new(HttpMethod::Get, "http://localhost/auth/getVerifyCode?t=1");
        let bytes = Bytes::from_static(b"\x89PNG");
        let response = TransportResponse::new(
            200,
            http::HeaderMap::new(),
            ResponseBody::Binary(bytes.clone()),
            Arc::new(request),
        );

        let payload = f.classifier.classify(Some(&response)).await.unwrap();
        assert_eq!(payload, Payload::Binary(bytes));
    }

    #[tokio::test]
    async fn test_classification_is_idempotent() {
        let f = fixture();
        let response = json_response(200, json!({"retCode": 500, "retMsg": "boom"}));

        let first = f.classifier.classify(Some(&response)).await.unwrap_err();
        let second = f.classifier.classify(Some(&response)).await.unwrap_err();

        assert_eq!(first.to_string(), second.to_string());
        assert!(matches!(first, PipelineError::Business { .. }));
        assert!(matches!(second, PipelineError::Business { .. }));
    }

    #[tokio::test]
    async fn test_done_is_signalled_before_notice() {
        let f = fixture();
        let indicator = f.indicator.clone();
        let busy_at_notice = Arc::new(Mutex::new(None));
        let record = Arc::clone(&busy_at_notice);

        // rebuild the classifier with a presenter that inspects the indicator
        let presenter = SignalPresenter::new();
        presenter.on_presented().connect(move |_: &Notice| {
            *record.lock() = Some(indicator.is_active());
        });
        let classifier = ResponseClassifier::new(
            &PipelineConfig::new("http://localhost"),
            Arc::new(f.indicator.clone()),
            Arc::new(presenter),
            Arc::new(NullSaver),
        );

        f.indicator.start();
        let _ = classifier
            .classify(Some(&json_response(500, Value::Null)))
            .await;

        assert_eq!(*busy_at_notice.lock(), Some(false));
    }

    #[test]
    fn test_transport_failure_notifies() {
        let f = fixture();
        f.indicator.start();

        let err = f
            .classifier
            .transport_failure(PipelineError::UnacceptedStatus { status: 503 });

        assert_eq!(err.status(), Some(503));
        assert!(!f.indicator.is_active());
        let notices = f.notices.lock();
        assert_eq!(notices[0].title, NoticeTitle::NETWORK);
        assert_eq!(notices[0].description, "Request failed with status code 503");
    }
}
