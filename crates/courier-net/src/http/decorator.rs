//! Outgoing request decoration.
//!
//! Every request passes through a [`RequestDecorator`] immediately before
//! transmission. The decorator runs any registered interceptors, stamps the
//! session token and the current time onto the headers, and starts the
//! activity indicator.

use std::sync::Arc;

use courier_core::logging::targets;
use courier_core::{ProgressIndicator, SessionStore};
use http::HeaderValue;

use super::request::RequestDescriptor;
use crate::error::Result;

/// Header carrying the session token.
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// Header carrying the send time in milliseconds since the Unix epoch.
pub const TIMESTAMP_HEADER: &str = "timestamp";

/// Type alias for request interceptors.
///
/// Request interceptors are called in registration order before the standard
/// decoration and can modify the request. Returning an error aborts the call
/// before anything is transmitted.
pub type RequestInterceptor = Arc<dyn Fn(&mut RequestDescriptor) -> Result<()> + Send + Sync>;

/// Stamps auth and timing headers onto outgoing requests.
#[derive(Clone)]
pub struct RequestDecorator {
    session: Arc<dyn SessionStore>,
    progress: Arc<dyn ProgressIndicator>,
    interceptors: Vec<RequestInterceptor>,
}

impl RequestDecorator {
    /// Create a decorator reading tokens from `session` and reporting to `progress`.
    pub fn new(session: Arc<dyn SessionStore>, progress: Arc<dyn ProgressIndicator>) -> Self {
        Self {
            session,
            progress,
            interceptors: Vec::new(),
        }
    }

    /// Append a request interceptor.
    pub fn with_interceptor(mut self, interceptor: RequestInterceptor) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Number of registered interceptors.
    pub fn interceptor_count(&self) -> usize {
        self.interceptors.len()
    }

    /// Decorate `request` in place.
    ///
    /// On success the `timestamp` header is set, `x-access-token` is set iff
    /// the session holds a non-empty token, and the indicator has been started
    /// exactly once. On failure the indicator is left untouched.
    pub fn decorate(&self, request: &mut RequestDescriptor) -> Result<()> {
        for interceptor in &self.interceptors {
            interceptor(request)?;
        }

        // Read once; the store may change concurrently.
        match self.session.token().filter(|token| !token.is_empty()) {
            Some(token) => {
                let value = HeaderValue::from_str(&token)?;
                request.headers.insert(ACCESS_TOKEN_HEADER, value);
            }
            None => {
                request.headers.remove(ACCESS_TOKEN_HEADER);
            }
        }

        let now = chrono::Utc::now().timestamp_millis();
        request
            .headers
            .insert(TIMESTAMP_HEADER, HeaderValue::from(now));

        tracing::trace!(
            target: targets::DECORATOR,
            method = %request.method,
            url = %request.url,
            authenticated = request.headers.contains_key(ACCESS_TOKEN_HEADER),
            timestamp = now,
            "request decorated"
        );

        self.progress.start();
        Ok(())
    }
}

impl std::fmt::Debug for RequestDecorator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDecorator")
            .field("interceptors", &self.interceptors.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::http::HttpMethod;
    use courier_core::{ActivityIndicator, AnonymousSession, MemorySessionStore};

    fn request() -> RequestDescriptor {
        RequestDescriptor::new(HttpMethod::Get, "http://localhost/users")
    }

    #[test]
    fn test_sets_token_and_timestamp() {
        let indicator = ActivityIndicator::new();
        let decorator = RequestDecorator::new(
            Arc::new(MemorySessionStore::with_token("abc")),
            Arc::new(indicator.clone()),
        );

        let before = chrono::Utc::now().timestamp_millis();
        let mut request = request();
        decorator.decorate(&mut request).unwrap();
        let after = chrono::Utc::now().timestamp_millis();

        assert_eq!(request.header(ACCESS_TOKEN_HEADER), Some("abc"));
        let stamp: i64 = request.header(TIMESTAMP_HEADER).unwrap().parse().unwrap();
        assert!(before <= stamp && stamp <= after);
        assert_eq!(indicator.in_flight(), 1);
    }

    #[test]
    fn test_anonymous_request_has_no_token() {
        let decorator =
            RequestDecorator::new(Arc::new(AnonymousSession), Arc::new(ActivityIndicator::new()));
        let mut request = request();
        decorator.decorate(&mut request).unwrap();

        assert!(request.header(ACCESS_TOKEN_HEADER).is_none());
        assert!(request.header(TIMESTAMP_HEADER).is_some());
    }

    #[test]
    fn test_empty_token_is_treated_as_absent() {
        let decorator = RequestDecorator::new(
            Arc::new(MemorySessionStore::with_token("")),
            Arc::new(ActivityIndicator::new()),
        );
        let mut request = request();
        decorator.decorate(&mut request).unwrap();
        assert!(request.header(ACCESS_TOKEN_HEADER).is_none());
    }

    #[test]
    fn test_bad_token_fails_without_starting_indicator() {
        let indicator = ActivityIndicator::new();
        let decorator = RequestDecorator::new(
            Arc::new(MemorySessionStore::with_token("bad\ntoken")),
            Arc::new(indicator.clone()),
        );

        let err = decorator.decorate(&mut request()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidHeader(_)));
        assert_eq!(indicator.in_flight(), 0);
    }

    #[test]
    fn test_interceptors_run_in_order_before_decoration() {
        let decorator =
            RequestDecorator::new(Arc::new(AnonymousSession), Arc::new(ActivityIndicator::new()))
                .with_interceptor(Arc::new(|request: &mut RequestDescriptor| {
                    request
                        .headers
                        .insert("x-trace", HeaderValue::from_static("first"));
                    Ok(())
                }))
                .with_interceptor(Arc::new(|request: &mut RequestDescriptor| {
                    assert_eq!(request.header("x-trace"), Some("first"));
                    assert!(request.header(TIMESTAMP_HEADER).is_none());
                    request
                        .headers
                        .insert("x-trace", HeaderValue::from_static("second"));
                    Ok(())
                }));

        let mut request = request();
        decorator.decorate(&mut request).unwrap();
        assert_eq!(request.header("x-trace"), Some("second"));
        assert_eq!(decorator.interceptor_count(), 2);
    }

    #[test]
    fn test_interceptor_error_aborts() {
        let indicator = ActivityIndicator::new();
        let decorator =
            RequestDecorator::new(Arc::new(AnonymousSession), Arc::new(indicator.clone()))
                .with_interceptor(Arc::new(|_: &mut RequestDescriptor| {
                    Err(PipelineError::Config("blocked".into()))
                }));

        assert!(decorator.decorate(&mut request()).is_err());
        assert!(!indicator.is_active());
    }
}
