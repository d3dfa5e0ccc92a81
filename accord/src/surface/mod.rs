//! The modal and notification layer.

use crate::view::Node;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;

/// How long a notification stays up.
pub const NOTIFICATION_TTL_SECS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Info,
    Warning,
    Error,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NotificationKind::Success => "success",
            NotificationKind::Info => "info",
            NotificationKind::Warning => "warning",
            NotificationKind::Error => "error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub kind: NotificationKind,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Modal {
    pub title: String,
    pub body: Node,
}

/// One modal slot plus a list of live notifications.
#[derive(Debug, Clone)]
pub struct Surface {
    modal: Option<Modal>,
    notifications: Vec<Notification>,
    next_id: u64,
    ttl: Duration,
}

impl Default for Surface {
    fn default() -> Self {
        Surface {
            modal: None,
            notifications: Vec::new(),
            next_id: 1,
            ttl: Duration::seconds(NOTIFICATION_TTL_SECS),
        }
    }
}

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a modal, replacing any that is already showing.
    pub fn show_modal(&mut self, title: impl Into<String>, body: Node) {
        self.modal = Some(Modal {
            title: title.into(),
            body,
        });
    }

    pub fn hide_modal(&mut self) -> Option<Modal> {
        self.modal.take()
    }

    pub fn modal(&self) -> Option<&Modal> {
        self.modal.as_ref()
    }

    pub fn notify(
        &mut self,
        message: impl Into<String>,
        kind: NotificationKind,
        now: DateTime<Utc>,
    ) -> u64 {
        let message = message.into();
        match kind {
            NotificationKind::Error => log::warn!("{message}"),
            _ => log::info!("{message}"),
        }
        let id = self.next_id;
        self.next_id += 1;
        self.notifications.push(Notification {
            id,
            message,
            kind,
            expires_at: now + self.ttl,
        });
        id
    }

    /// Live notifications, oldest first.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Drop notifications whose lifetime has passed and return them.
    pub fn expire(&mut self, now: DateTime<Utc>) -> Vec<Notification> {
        let (expired, live): (Vec<_>, Vec<_>) = std::mem::take(&mut self.notifications)
            .into_iter()
            .partition(|n| n.expires_at <= now);
        self.notifications = live;
        expired
    }

    /// Remove one notification before it expires.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.notifications.len();
        self.notifications.retain(|n| n.id != id);
        self.notifications.len() != before
    }

    /// Take every pending notification.
    pub fn drain(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }
}

/// Asks the user to approve a destructive action.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Approves everything, for non-interactive callers that already asked.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, _prompt: &str) -> bool {
        true
    }
}
