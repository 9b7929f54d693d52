//! Client-side request pipeline for Courier.
//!
//! `courier-net` sits between application code and a single backend that
//! wraps its JSON responses in a business envelope (`retCode`, `retMsg`,
//! `retData`). It provides:
//!
//! - **Request decoration**: session token and timestamp headers on every call
//! - **Response classification**: one resolution path per response, chosen by
//!   status, declared response kind, content type and body shape
//! - **Envelope unwrapping**: success codes resolve with `retData`; expired
//!   sessions and business failures are shown to the user and rejected
//! - **Binary handling**: images and streams pass through, archives can be
//!   saved as files, and JSON error bodies behind binary types are detected
//!
//! # Example
//!
//! ```ignore
//! use courier_core::{ActivityIndicator, MemorySessionStore, SignalPresenter};
//! use courier_net::{ApiClient, PipelineConfig};
//!
//! let session = MemorySessionStore::new();
//! let indicator = ActivityIndicator::new();
//! let presenter = SignalPresenter::new();
//!
//! let client = ApiClient::builder(PipelineConfig::from_env()?)
//!     .session(session.clone())
//!     .progress(indicator.clone())
//!     .presenter(presenter.clone())
//!     .build()?;
//!
//! let profile: Profile = client.get("/user/profile").send_json().await?;
//! ```
//!
//! ## Errors
//!
//! Every call resolves to [`Result<Payload>`](http::Payload). Apart from local
//! usage errors, a [`PipelineError`] has already been presented to the user
//! when the caller sees it; [`PipelineError::is_session_expired`] tells the
//! caller to send the user back to authentication.

pub mod config;
mod error;
pub mod http;

pub use config::{BASE_URL_ENV, PipelineConfig, StatusRange};
pub use error::{
    NO_RESPONSE_MESSAGE, PipelineError, Result, SESSION_EXPIRED_MESSAGE, STATUS_ERROR_MESSAGE,
};

// Re-export commonly used types at the crate root
pub use crate::http::{
    ApiClient, ApiClientBuilder, ApiRequestBuilder, Blob, DownloadOptions, HttpMethod, Payload,
    RequestDescriptor, ResponseKind, RetCode,
};
