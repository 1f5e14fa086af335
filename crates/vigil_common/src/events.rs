//! Notification payloads and broadcast event names.
//!
//! Notifications land in a per-user ephemeral list (newest first, TTL
//! bounded); broadcasts go out on the realtime channel so officers' live
//! views update. Both are best-effort side channels - delivery failure
//! never rolls back the state transition that produced the event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::complaint::Severity;

/// Realtime channel event names.
pub mod channel {
    /// New complaint entered the dispatch pool
    pub const COMPLAINT_NEW: &str = "complaint:new";
    /// Complaint escalated a level and returned to the pool
    pub const COMPLAINT_ESCALATED: &str = "complaint:escalated";
    /// Complaint claimed by an officer
    pub const COMPLAINT_ASSIGNED: &str = "complaint:assigned";
    /// Complaint left the pool terminally
    pub const COMPLAINT_CLOSED: &str = "complaint:closed";
}

/// What a notification is about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationPayload {
    /// Complaint went unattended and moved up the ladder
    Escalation {
        complaint_id: Uuid,
        severity: Severity,
        from_level: u32,
        to_level: u32,
    },
    /// An officer accepted the complaint
    OfficerAssigned {
        complaint_id: Uuid,
        officer_id: String,
    },
    /// Closed by the distinct-rejecter threshold
    ComplaintRejected {
        complaint_id: Uuid,
        rejecters: usize,
    },
    /// Closed successfully by the assigned officer
    ComplaintResolved {
        complaint_id: Uuid,
        officer_id: String,
    },
    /// Closed because the escalation ladder was exhausted
    ComplaintClosed {
        complaint_id: Uuid,
        final_level: u32,
    },
}

/// One entry in a user's notification list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub payload: NotificationPayload,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(payload: NotificationPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            payload,
            read: false,
            created_at: Utc::now(),
        }
    }
}
