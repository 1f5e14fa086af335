//! Escalation executor - the timer-fired handler.
//!
//! Runs when a delayed escalation task becomes due. Re-fetches the
//! complaint, re-validates that escalation still applies, then either
//! advances the level and returns the complaint to the dispatch pool, or
//! closes it when the ladder says CLOSE.
//!
//! A fired task may race an officer acceptance, a threshold rejection, or
//! a manual status change for the same complaint. The re-fetch plus the
//! staleness check on handle/level/started-at is the sole safeguard: any
//! mismatch means this timer lost a race and must no-op.
//!
//! Notification and broadcast happen after the transition is committed and
//! are best-effort: an enrichment or delivery failure never rolls the
//! transition back.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use vigil_common::events::{channel, NotificationPayload};
use vigil_common::policy::NextStep;
use vigil_common::{
    ComplaintStatus, EngineError, EscalationJob, EscalationPolicy, EscalationStep, JobHandle,
};

use crate::broadcast::Broadcaster;
use crate::enrichment::{enriched_payload, CategoryLookup};
use crate::notify::Notifier;
use crate::scheduler::Scheduler;
use crate::store::{ComplaintStore, EscalationStore};

pub struct Executor {
    complaints: Arc<dyn ComplaintStore>,
    escalations: Arc<dyn EscalationStore>,
    policy: Arc<EscalationPolicy>,
    scheduler: Arc<Scheduler>,
    notifier: Arc<Notifier>,
    broadcaster: Arc<dyn Broadcaster>,
    lookup: Arc<dyn CategoryLookup>,
}

impl Executor {
    pub fn new(
        complaints: Arc<dyn ComplaintStore>,
        escalations: Arc<dyn EscalationStore>,
        policy: Arc<EscalationPolicy>,
        scheduler: Arc<Scheduler>,
        notifier: Arc<Notifier>,
        broadcaster: Arc<dyn Broadcaster>,
        lookup: Arc<dyn CategoryLookup>,
    ) -> Self {
        Self {
            complaints,
            escalations,
            policy,
            scheduler,
            notifier,
            broadcaster,
            lookup,
        }
    }

    /// Handle one fired escalation task. Infallible by design: every
    /// failure mode is logged and the task discarded, never retried.
    pub fn execute(&self, handle: JobHandle, job: &EscalationJob) {
        let Some(mut complaint) = self.complaints.find(job.complaint_id) else {
            warn!(
                "discarding escalation task: {}",
                EngineError::ComplaintNotFound(job.complaint_id)
            );
            return;
        };
        let Some(mut record) = self.escalations.find(job.escalation_id) else {
            warn!(
                "discarding escalation task: {}",
                EngineError::EscalationNotFound(job.escalation_id)
            );
            return;
        };

        // Fired after manual resolution or closure: clear the stale handle
        // and stop. Terminal complaints are never escalatable.
        if complaint.status.is_terminal() {
            debug!(
                "complaint {} already {}, dropping stale timer",
                complaint.id, complaint.status
            );
            if record.outstanding_job_id == Some(handle) {
                record.outstanding_job_id = None;
                self.escalations.save(&record);
            }
            return;
        }

        // Staleness check: a timer that lost a cancel race carries an old
        // handle, level, or started-at snapshot. It must not fire twice.
        if record.outstanding_job_id != Some(handle)
            || complaint.level != job.level
            || record.current_level_started_at != job.level_started_at
        {
            debug!(
                "stale escalation timer for complaint {} (level {} vs {}); ignoring",
                complaint.id, job.level, complaint.level
            );
            return;
        }

        let Some(step) = self.policy.step(complaint.severity, complaint.level) else {
            // Policy/complaint desync: the pair was valid at schedule time
            error!(
                "policy desync on complaint {}: {}",
                complaint.id,
                EngineError::PolicyGap {
                    severity: complaint.severity,
                    level: complaint.level,
                }
            );
            return;
        };

        let from_level = complaint.level;
        match step.next {
            NextStep::Close => {
                record.history.push(EscalationStep {
                    from_level,
                    to_level: None,
                    reason: "escalation path exhausted".to_string(),
                    escalated_by: None,
                    escalated_at: Utc::now(),
                });
                record.outstanding_job_id = None;
                self.escalations.save(&record);

                complaint.status = ComplaintStatus::Rejected;
                complaint.active = false;
                self.complaints.save(&complaint);
                info!(
                    "complaint {} auto-closed after exhausting the {} ladder at level {}",
                    complaint.id, complaint.severity, from_level
                );

                self.notifier.notify(
                    &complaint.reporter_id,
                    NotificationPayload::ComplaintClosed {
                        complaint_id: complaint.id,
                        final_level: from_level,
                    },
                );
                self.broadcaster.broadcast(
                    channel::COMPLAINT_CLOSED,
                    enriched_payload(&complaint, &*self.lookup),
                );
            }
            NextStep::Escalate(next) => {
                record.history.push(EscalationStep {
                    from_level,
                    to_level: Some(next),
                    reason: "unattended past policy delay".to_string(),
                    escalated_by: None,
                    escalated_at: Utc::now(),
                });
                record.outstanding_job_id = None;
                self.escalations.save(&record);

                // Back into the dispatch pool for any officer, not just
                // whoever let it lapse
                complaint.level = next;
                complaint.status = ComplaintStatus::Pending;
                complaint.active = true;
                complaint.assigned_officer = None;
                self.complaints.save(&complaint);
                info!(
                    "complaint {} escalated {} -> {} ({})",
                    complaint.id, from_level, next, complaint.severity
                );

                if let Err(e) = self.scheduler.schedule(&complaint) {
                    error!(
                        "failed to arm next escalation timer for complaint {}: {e}",
                        complaint.id
                    );
                }

                self.notifier.notify(
                    &complaint.reporter_id,
                    NotificationPayload::Escalation {
                        complaint_id: complaint.id,
                        severity: complaint.severity,
                        from_level,
                        to_level: next,
                    },
                );
                self.broadcaster.broadcast(
                    channel::COMPLAINT_ESCALATED,
                    enriched_payload(&complaint, &*self.lookup),
                );
            }
        }
    }
}
