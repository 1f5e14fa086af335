//! Notification fan-out.
//!
//! Per-user newest-first list in the ephemeral store. Every append
//! refreshes the whole-list TTL (30 min default), so an old entry's
//! visible lifetime shrinks each time a new one arrives. The list is
//! additionally capped (50 default) with oldest-first eviction, since TTL
//! alone permits unbounded growth inside the window.
//!
//! Failure of the ephemeral store must never surface as a failure of the
//! caller's primary operation: `notify` swallows and logs everything.

use std::sync::Arc;
use tracing::warn;

use vigil_common::config::NotifyConfig;
use vigil_common::error::Result;
use vigil_common::{Notification, NotificationPayload};

use crate::ephemeral::EphemeralStore;

fn list_key(user_id: &str) -> String {
    format!("notifications:{user_id}")
}

pub struct Notifier {
    store: Arc<dyn EphemeralStore>,
    config: NotifyConfig,
}

impl Notifier {
    pub fn new(store: Arc<dyn EphemeralStore>, config: NotifyConfig) -> Self {
        Self { store, config }
    }

    /// Append a notification to the front of the user's list. Best-effort:
    /// errors are logged, never returned.
    pub fn notify(&self, user_id: &str, payload: NotificationPayload) {
        if let Err(e) = self.try_notify(user_id, payload) {
            warn!("notification delivery to {user_id} failed: {e}");
        }
    }

    fn try_notify(&self, user_id: &str, payload: NotificationPayload) -> Result<()> {
        let notification = Notification::new(payload);
        let json = serde_json::to_string(&notification)
            .map_err(|e| vigil_common::EngineError::Store(e.to_string()))?;
        let key = list_key(user_id);
        self.store.push_front(&key, json)?;
        self.store.trim(&key, self.config.list_cap)?;
        self.store.expire(&key, self.config.list_ttl())?;
        Ok(())
    }

    /// Current list, newest first. Entries that fail to parse are skipped.
    pub fn recent(&self, user_id: &str) -> Vec<Notification> {
        let raw = match self.store.range(&list_key(user_id)) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("reading notifications for {user_id} failed: {e}");
                return Vec::new();
            }
        };
        raw.iter()
            .filter_map(|s| serde_json::from_str(s).ok())
            .collect()
    }

    /// Flag the entry at `index` (newest first) as read.
    pub fn mark_read(&self, user_id: &str, index: usize) -> Result<()> {
        let key = list_key(user_id);
        let raw = self.store.range(&key)?;
        let entry = raw
            .get(index)
            .ok_or_else(|| vigil_common::EngineError::Store(format!("index {index} out of range")))?;
        let mut notification: Notification = serde_json::from_str(entry)
            .map_err(|e| vigil_common::EngineError::Store(e.to_string()))?;
        notification.read = true;
        let json = serde_json::to_string(&notification)
            .map_err(|e| vigil_common::EngineError::Store(e.to_string()))?;
        self.store.set_at(&key, index, json)
    }

    /// Delete the entry at `index` (newest first).
    pub fn remove(&self, user_id: &str, index: usize) -> Result<()> {
        self.store.remove_at(&list_key(user_id), index)
    }
}
