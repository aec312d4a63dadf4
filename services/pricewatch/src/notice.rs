//! Transient user-facing notices

use std::fmt;

use tokio::time::Instant;

/// Whether a notice reports a success or a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoticeKind::Success => write!(f, "OK"),
            NoticeKind::Error => write!(f, "Error"),
        }
    }
}

/// A notice raised by a dashboard action
#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub raised_at: Instant,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Error, message)
    }

    fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            raised_at: Instant::now(),
        }
    }

    /// Whether the notice is still on screen at `now`
    pub fn is_visible(&self, now: Instant, ttl: std::time::Duration) -> bool {
        now.saturating_duration_since(self.raised_at) < ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn notice_expires_after_ttl() {
        let notice = Notice::success("Watcher started successfully!");
        let ttl = Duration::from_secs(3);

        assert!(notice.is_visible(Instant::now(), ttl));

        tokio::time::advance(Duration::from_millis(2999)).await;
        assert!(notice.is_visible(Instant::now(), ttl));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(!notice.is_visible(Instant::now(), ttl));
    }

    #[test]
    fn kinds_display() {
        assert_eq!(NoticeKind::Success.to_string(), "OK");
        assert_eq!(NoticeKind::Error.to_string(), "Error");
    }
}
