//! In-app notifications.

use serde::{Deserialize, Serialize};

use crate::types::NotificationId;

/// A notification shown in the bell screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "_id", alias = "id")]
    pub id: NotificationId,
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "isRead", alias = "read")]
    pub is_read: bool,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    pub created_at: String,
}

/// Number of notifications not yet read.
#[must_use]
pub fn unread_count(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| !n.is_read).count()
}
