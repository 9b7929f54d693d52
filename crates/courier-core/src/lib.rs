//! Shared collaborators for the Courier request pipeline.
//!
//! The pipeline in `courier-net` talks to the rest of the application through
//! three narrow seams, all defined here:
//!
//! - **Activity indicator** ([`ProgressIndicator`]): bracketed by `start` / `done`
//!   for every request. [`ActivityIndicator`] counts in-flight requests.
//! - **Notifications** ([`NotificationPresenter`]): fire-and-forget user-facing
//!   failure messages.
//! - **Session** ([`SessionStore`]): read-only access to the auth token.
//!
//! [`Signal`] is the observer primitive the stock implementations use to
//! surface state changes to a UI.
//!
//! # Example
//!
//! ```
//! use courier_core::{ActivityIndicator, Notice, NotificationPresenter, SignalPresenter};
//!
//! let indicator = ActivityIndicator::new();
//! indicator.on_activity_changed().connect(|busy| println!("busy = {busy}"));
//!
//! let presenter = SignalPresenter::new();
//! presenter.on_presented().connect(|notice: &Notice| {
//!     eprintln!("[{}] {}", notice.title, notice.description);
//! });
//! presenter.present(Notice::new("notice", "hello"));
//! ```

pub mod logging;
pub mod notification;
pub mod progress;
pub mod session;
pub mod signal;

#[cfg(feature = "desktop-notifications")]
pub use notification::DesktopPresenter;
pub use notification::{
    DEFAULT_NOTICE_DURATION, Notice, NoticeTitle, NotificationPresenter, SignalPresenter,
    TracingPresenter,
};
pub use progress::{ActivityIndicator, NoopIndicator, ProgressIndicator};
pub use session::{AnonymousSession, MemorySessionStore, SessionStore};
pub use signal::{ConnectionId, Signal};
