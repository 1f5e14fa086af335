//! Escalation record and the delayed-task payload.
//!
//! One record per complaint, holding the transition history and a pointer
//! to the single outstanding timer job. The single-timer invariant is not
//! enforced atomically by the queue (cancel-then-enqueue is two calls), so
//! the job payload carries enough state for a stale timer to detect itself
//! when it fires.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::complaint::Severity;

/// Opaque handle to a job in the delayed-task queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobHandle(pub Uuid);

impl JobHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// One rung traversal in a complaint's escalation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationStep {
    pub from_level: u32,
    /// `None` marks the terminal CLOSE entry at the end of the ladder
    pub to_level: Option<u32>,
    pub reason: String,
    /// Officer or operator that forced the transition, `None` for the timer
    pub escalated_by: Option<String>,
    pub escalated_at: DateTime<Utc>,
}

/// Per-complaint escalation state (1:1 with Complaint, created lazily on
/// first schedule).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationRecord {
    pub id: Uuid,
    pub complaint_id: Uuid,
    pub history: Vec<EscalationStep>,
    /// At most one non-null handle at any time (single-timer invariant)
    pub outstanding_job_id: Option<JobHandle>,
    pub current_level_started_at: DateTime<Utc>,
}

impl EscalationRecord {
    pub fn new(complaint_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            complaint_id,
            history: Vec::new(),
            outstanding_job_id: None,
            current_level_started_at: Utc::now(),
        }
    }
}

/// Payload carried by the delayed escalation task.
///
/// `level` and `level_started_at` are snapshots taken at schedule time; the
/// executor compares them against the refetched record and treats any
/// mismatch as a stale timer that lost a cancel race. That turns the
/// non-atomic cancel-then-enqueue window into a harmless redundant fire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationJob {
    pub complaint_id: Uuid,
    pub escalation_id: Uuid,
    pub severity: Severity,
    pub level: u32,
    pub level_started_at: DateTime<Utc>,
}
