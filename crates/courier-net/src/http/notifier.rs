use std::sync::Arc;
use std::time::Duration;

use courier_core::{Notice, NotificationPresenter};

/// A presenter paired with the configured display duration.
#[derive(Clone)]
pub(crate) struct Notifier {
    presenter: Arc<dyn NotificationPresenter>,
    duration: Duration,
}

impl Notifier {
    pub(crate) fn new(presenter: Arc<dyn NotificationPresenter>, duration: Duration) -> Self {
        Self {
            presenter,
            duration,
        }
    }

    pub(crate) fn notify(&self, title: &str, description: &str) {
        self.presenter
            .present(Notice::new(title, description).with_duration(self.duration));
    }
}
