use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    Info,
    Warning,
    Error,
}

impl NoticeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NoticeKind::Info => "info",
            NoticeKind::Warning => "warning",
            NoticeKind::Error => "error",
        }
    }
}

/// User-visible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

/// Notification facility collaborator.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Forwards notices into the host loop, which shows them in the status line.
#[derive(Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notice>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: Notice) {
        // The host may already be shutting down.
        let _ = self.tx.send(notice);
    }
}

/// Keeps every notice; used by tests and the `tree` subcommand.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        if let Ok(mut guard) = self.notices.lock() {
            guard.push(notice);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_notifier_delivers_in_order() {
        let (notifier, mut rx) = ChannelNotifier::new();
        notifier.notify(Notice::info("one"));
        notifier.notify(Notice::error("two"));
        assert_eq!(rx.recv().await, Some(Notice::info("one")));
        let second = rx.recv().await.expect("second notice");
        assert_eq!(second.kind, NoticeKind::Error);
    }

    #[test]
    fn channel_notifier_survives_closed_receiver() {
        let (notifier, rx) = ChannelNotifier::new();
        drop(rx);
        notifier.notify(Notice::warning("ignored"));
    }
}
