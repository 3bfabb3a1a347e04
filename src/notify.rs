//! Fire-and-forget, self-expiring user notifications.
//!
//! Expiry is evaluated lazily against the tokio clock: a notification is
//! visible from `publish` until its ttl has elapsed or it is dismissed.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

impl NotificationKind {
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Success => "✅",
            Self::Error => "❌",
            Self::Warning => "⚠️",
            Self::Info => "ℹ️",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub kind: NotificationKind,
    pub ttl: Duration,
    pub published_at: Instant,
}

impl Notification {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.published_at) >= self.ttl
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.icon(), self.message)
    }
}

pub struct Notifier {
    queue: Mutex<Vec<Notification>>,
    next_id: AtomicU64,
    success_ttl: Duration,
    default_ttl: Duration,
}

impl Notifier {
    pub fn new(success_ttl: Duration, default_ttl: Duration) -> Self {
        Self {
            queue: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            success_ttl,
            default_ttl,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.success_ttl(), config.default_ttl())
    }

    fn queue(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a notification. `ttl` falls back to the per-kind default.
    pub fn publish(&self, message: impl Into<String>, kind: NotificationKind, ttl: Option<Duration>) -> u64 {
        let ttl = ttl.unwrap_or(match kind {
            NotificationKind::Success => self.success_ttl,
            _ => self.default_ttl,
        });
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let notification = Notification {
            id,
            message: message.into(),
            kind,
            ttl,
            published_at: Instant::now(),
        };
        tracing::debug!(id, kind = ?kind, message = %notification.message, "notification");
        self.queue().push(notification);
        id
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.publish(message, NotificationKind::Success, None)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.publish(message, NotificationKind::Error, None)
    }

    pub fn warning(&self, message: impl Into<String>) -> u64 {
        self.publish(message, NotificationKind::Warning, None)
    }

    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.publish(message, NotificationKind::Info, None)
    }

    /// Live notifications in publish order. Expired ones are dropped.
    pub fn active(&self) -> Vec<Notification> {
        let now = Instant::now();
        let mut queue = self.queue();
        queue.retain(|n| !n.is_expired(now));
        queue.clone()
    }

    pub fn dismiss(&self, id: u64) -> bool {
        let mut queue = self.queue();
        let before = queue.len();
        queue.retain(|n| n.id != id);
        queue.len() != before
    }

    /// Take every live notification, leaving the channel empty.
    pub fn drain(&self) -> Vec<Notification> {
        let now = Instant::now();
        let mut queue = self.queue();
        queue.drain(..).filter(|n| !n.is_expired(now)).collect()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
