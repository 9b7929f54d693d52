//! User-facing failure notifications.
//!
//! The pipeline reports every user-visible failure as a [`Notice`] handed to a
//! [`NotificationPresenter`]. Presenting is fire-and-forget: a presenter must
//! not block and cannot fail the request that produced the notice.
//!
//! Presenters shipped here:
//!
//! - [`SignalPresenter`]: re-emits notices on a [`Signal`] for a UI to render
//! - [`TracingPresenter`]: logs notices as `tracing` warnings
//! - `DesktopPresenter` (feature `desktop-notifications`): native system notifications

use std::sync::Arc;
use std::time::Duration;

use crate::logging::targets;
use crate::signal::Signal;

/// How long a notice stays on screen unless configured otherwise.
pub const DEFAULT_NOTICE_DURATION: Duration = Duration::from_secs(3);

/// Titles used by the pipeline.
pub struct NoticeTitle;

impl NoticeTitle {
    /// Non-200 HTTP status.
    pub const SYSTEM: &'static str = "system notice";
    /// Expired session (business code 401/403).
    pub const LOGIN: &'static str = "login notice";
    /// Generic business failure.
    pub const NOTICE: &'static str = "notice";
    /// No response obtained.
    pub const NETWORK: &'static str = "network exception";
}

/// A titled, timed message for the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    /// Short heading.
    pub title: String,
    /// Message body.
    pub description: String,
    /// Display duration.
    pub duration: Duration,
}

impl Notice {
    /// Create a notice with the default duration.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            duration: DEFAULT_NOTICE_DURATION,
        }
    }

    /// Override the display duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Displays notices to the user.
pub trait NotificationPresenter: Send + Sync {
    /// Show a notice. Must not block.
    fn present(&self, notice: Notice);
}

impl<P: NotificationPresenter + ?Sized> NotificationPresenter for Arc<P> {
    fn present(&self, notice: Notice) {
        (**self).present(notice);
    }
}

/// Presenter that re-emits every notice on a signal.
#[derive(Clone, Default)]
pub struct SignalPresenter {
    presented: Arc<Signal<Notice>>,
}

impl SignalPresenter {
    /// Create a presenter with no connected slots.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal emitted for every presented notice.
    pub fn on_presented(&self) -> &Signal<Notice> {
        &self.presented
    }
}

impl NotificationPresenter for SignalPresenter {
    fn present(&self, notice: Notice) {
        self.presented.emit(notice);
    }
}

impl std::fmt::Debug for SignalPresenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalPresenter")
            .field("connections", &self.presented.connection_count())
            .finish()
    }
}

/// Presenter that logs notices. The default when no UI is attached.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingPresenter;

impl NotificationPresenter for TracingPresenter {
    fn present(&self, notice: Notice) {
        tracing::warn!(
            target: targets::NOTIFICATION,
            title = %notice.title,
            duration_ms = notice.duration.as_millis() as u64,
            "{}",
            notice.description
        );
    }
}

#[cfg(feature = "desktop-notifications")]
pub use desktop::DesktopPresenter;

#[cfg(feature = "desktop-notifications")]
mod desktop {
    use super::{Notice, NotificationPresenter};
    use crate::logging::targets;

    /// Presenter backed by the platform notification service.
    #[derive(Clone, Debug, Default)]
    pub struct DesktopPresenter {
        app_name: Option<String>,
    }

    impl DesktopPresenter {
        /// Create a presenter using the default application name.
        pub fn new() -> Self {
            Self::default()
        }

        /// Set the application name shown with each notification.
        pub fn app_name(mut self, name: impl Into<String>) -> Self {
            self.app_name = Some(name.into());
            self
        }
    }

    impl NotificationPresenter for DesktopPresenter {
        fn present(&self, notice: Notice) {
            let millis = u32::try_from(notice.duration.as_millis()).unwrap_or(u32::MAX);

            let mut notification = notify_rust::Notification::new();
            notification
                .summary(&notice.title)
                .body(&notice.description)
                .timeout(notify_rust::Timeout::Milliseconds(millis));
            if let Some(name) = &self.app_name {
                notification.appname(name);
            }

            if let Err(e) = notification.show() {
                tracing::warn!(target: targets::NOTIFICATION, "failed to show desktop notification: {}", e);
            }
        }
    }
}

static_assertions::assert_impl_all!(SignalPresenter: Send, Sync);
