//! Escalation scheduler.
//!
//! Arms the single outstanding timer for a complaint: looks up the policy
//! delay for (severity, level), best-effort cancels the stale timer,
//! stamps `current_level_started_at`, enqueues the new delayed task and
//! persists its handle. Called by intake, dispatch acceptance, and the
//! executor when it advances a level.
//!
//! Cancel-then-enqueue is deliberately not atomic (the queue offers no
//! replace primitive). A stray surviving timer is tolerated because the
//! job payload snapshots `current_level_started_at` and the executor
//! no-ops on mismatch.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use vigil_common::error::Result;
use vigil_common::{Complaint, EngineError, EscalationJob, EscalationPolicy, EscalationRecord};

use crate::queue::DelayedTaskQueue;
use crate::store::{ComplaintStore, EscalationStore};

/// Task name carried on the delayed queue.
pub const ESCALATION_TASK: &str = "escalation:advance";

pub struct Scheduler {
    complaints: Arc<dyn ComplaintStore>,
    escalations: Arc<dyn EscalationStore>,
    queue: Arc<dyn DelayedTaskQueue>,
    policy: Arc<EscalationPolicy>,
}

impl Scheduler {
    pub fn new(
        complaints: Arc<dyn ComplaintStore>,
        escalations: Arc<dyn EscalationStore>,
        queue: Arc<dyn DelayedTaskQueue>,
        policy: Arc<EscalationPolicy>,
    ) -> Self {
        Self {
            complaints,
            escalations,
            queue,
            policy,
        }
    }

    /// Arm the escalation timer for this complaint's current level.
    ///
    /// A missing policy entry is a no-op, not a failure: the complaint
    /// simply stops climbing and an operator sees the log line.
    pub fn schedule(&self, complaint: &Complaint) -> Result<()> {
        let Some(step) = self.policy.step(complaint.severity, complaint.level) else {
            warn!(
                "complaint {} not scheduled: {}",
                complaint.id,
                EngineError::PolicyGap {
                    severity: complaint.severity,
                    level: complaint.level,
                }
            );
            return Ok(());
        };

        // Lazily create the record and back-link it from the complaint
        let mut record = self
            .escalations
            .find_by_complaint(complaint.id)
            .unwrap_or_else(|| EscalationRecord::new(complaint.id));
        if complaint.escalation_id != Some(record.id) {
            let mut linked = complaint.clone();
            linked.escalation_id = Some(record.id);
            self.complaints.save(&linked);
        }

        // Best-effort cancel of the previous timer; failure here means the
        // old job already fired or the queue misplaced it - either way the
        // staleness check in the executor keeps it harmless.
        if let Some(stale) = record.outstanding_job_id.take() {
            if let Err(e) = self.queue.cancel(stale) {
                warn!(
                    "could not cancel stale escalation timer for complaint {}: {e}",
                    complaint.id
                );
            }
        }

        record.current_level_started_at = Utc::now();
        let job = EscalationJob {
            complaint_id: complaint.id,
            escalation_id: record.id,
            severity: complaint.severity,
            level: complaint.level,
            level_started_at: record.current_level_started_at,
        };
        let handle = self.queue.enqueue(ESCALATION_TASK, job, step.delay)?;
        record.outstanding_job_id = Some(handle);
        self.escalations.save(&record);

        info!(
            "escalation timer armed for complaint {} ({}, level {}) in {:?}",
            complaint.id, complaint.severity, complaint.level, step.delay
        );
        Ok(())
    }
}
