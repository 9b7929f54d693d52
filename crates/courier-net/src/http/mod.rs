//! The request pipeline.
//!
//! A call flows through four stages:
//!
//! 1. [`RequestDecorator`]: interceptors, `x-access-token`, `timestamp`, indicator start
//! 2. transport: `reqwest`, with statuses outside the accepted range treated as failures
//! 3. [`ResponseClassifier`]: indicator stop, then one resolution path
//! 4. envelope unwrapping or a blob strategy, yielding a [`Payload`]
//!
//! Failures are presented to the user through the configured
//! [`NotificationPresenter`](courier_core::NotificationPresenter) before they
//! reach the caller.
//!
//! # Example
//!
//! ```ignore
//! use courier_net::http::{ApiClient, Payload};
//!
//! let client = ApiClient::builder(config).session(session).build()?;
//!
//! match client.get("/auth/getVerifyCode").binary().send().await? {
//!     Payload::Binary(png) => show_captcha(&png),
//!     other => unreachable!("{other:?}"),
//! }
//! ```

mod blob;
mod classifier;
mod client;
mod decorator;
mod download;
mod envelope;
mod notifier;
mod request;
mod response;

pub use blob::DEFAULT_SNIFF_MESSAGE;
pub use classifier::{DEFAULT_NETWORK_MESSAGE, ResponseClassifier};
pub use client::{ApiClient, ApiClientBuilder, ApiRequestBuilder};
pub use decorator::{ACCESS_TOKEN_HEADER, RequestDecorator, RequestInterceptor, TIMESTAMP_HEADER};
pub use download::{DirectorySaver, FileSaver, NullSaver, sanitize_filename};
pub use envelope::{BusinessEnvelope, DEFAULT_BUSINESS_MESSAGE, RetCode};
pub use request::{DownloadOptions, HttpMethod, RequestBody, RequestDescriptor, ResponseKind};
pub use response::{Blob, ContentClass, Payload, ResponseBody, TransportResponse};
