//! Intake and officer-facing complaint operations.
//!
//! Filing arms the first escalation timer; acceptance claims a complaint
//! for an officer but keeps the clock running (an accepted-but-unworked
//! complaint still escalates); resolution is the happy terminal path and
//! disarms the timer.

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use vigil_common::error::Result;
use vigil_common::events::{channel, NotificationPayload};
use vigil_common::{Complaint, ComplaintStatus, EngineError, NewComplaint};

use crate::broadcast::Broadcaster;
use crate::enrichment::{enriched_payload, CategoryLookup};
use crate::notify::Notifier;
use crate::queue::DelayedTaskQueue;
use crate::scheduler::Scheduler;
use crate::store::{ComplaintStore, EscalationStore};

pub struct ComplaintService {
    complaints: Arc<dyn ComplaintStore>,
    escalations: Arc<dyn EscalationStore>,
    queue: Arc<dyn DelayedTaskQueue>,
    scheduler: Arc<Scheduler>,
    notifier: Arc<Notifier>,
    broadcaster: Arc<dyn Broadcaster>,
    lookup: Arc<dyn CategoryLookup>,
}

impl ComplaintService {
    pub fn new(
        complaints: Arc<dyn ComplaintStore>,
        escalations: Arc<dyn EscalationStore>,
        queue: Arc<dyn DelayedTaskQueue>,
        scheduler: Arc<Scheduler>,
        notifier: Arc<Notifier>,
        broadcaster: Arc<dyn Broadcaster>,
        lookup: Arc<dyn CategoryLookup>,
    ) -> Self {
        Self {
            complaints,
            escalations,
            queue,
            scheduler,
            notifier,
            broadcaster,
            lookup,
        }
    }

    /// File a new complaint: persist it pending/active at level 1, arm the
    /// first escalation timer, announce it to the dispatch pool.
    pub fn file_complaint(&self, new: NewComplaint) -> Result<Complaint> {
        let complaint = Complaint::from_intake(new);
        self.complaints.save(&complaint);
        self.scheduler.schedule(&complaint)?;

        // Re-read to pick up the escalation back-link the scheduler wrote
        let complaint = self.complaints.find(complaint.id).unwrap_or(complaint);
        info!(
            "complaint {} filed ({}, category {})",
            complaint.id, complaint.severity, complaint.category
        );
        self.broadcaster.broadcast(
            channel::COMPLAINT_NEW,
            enriched_payload(&complaint, &*self.lookup),
        );
        Ok(complaint)
    }

    /// Officer claims a pending complaint. The escalation timer is
    /// re-armed at the current level: acceptance pauses dispatch, not the
    /// ladder.
    pub fn accept(&self, complaint_id: Uuid, officer_id: &str) -> Result<Complaint> {
        let mut complaint = self
            .complaints
            .find(complaint_id)
            .ok_or(EngineError::ComplaintNotFound(complaint_id))?;

        if !complaint.active || complaint.status != ComplaintStatus::Pending {
            return Err(EngineError::InvalidTransition(format!(
                "complaint {complaint_id} is not open for acceptance (status {})",
                complaint.status
            )));
        }

        complaint.assigned_officer = Some(officer_id.to_string());
        complaint.active = false;
        complaint.status = ComplaintStatus::InProgress;
        self.complaints.save(&complaint);
        self.scheduler.schedule(&complaint)?;
        info!("complaint {complaint_id} accepted by officer {officer_id}");

        self.notifier.notify(
            &complaint.reporter_id,
            NotificationPayload::OfficerAssigned {
                complaint_id,
                officer_id: officer_id.to_string(),
            },
        );
        self.broadcaster.broadcast(
            channel::COMPLAINT_ASSIGNED,
            enriched_payload(&complaint, &*self.lookup),
        );
        Ok(complaint)
    }

    /// Assigned officer resolves their complaint. Terminal: the
    /// outstanding timer is cancelled best-effort (a miss is caught by the
    /// executor's terminal check).
    pub fn resolve(&self, complaint_id: Uuid, officer_id: &str) -> Result<Complaint> {
        let mut complaint = self
            .complaints
            .find(complaint_id)
            .ok_or(EngineError::ComplaintNotFound(complaint_id))?;

        if complaint.status != ComplaintStatus::InProgress {
            return Err(EngineError::InvalidTransition(format!(
                "complaint {complaint_id} is not in progress (status {})",
                complaint.status
            )));
        }
        if complaint.assigned_officer.as_deref() != Some(officer_id) {
            return Err(EngineError::InvalidTransition(format!(
                "officer {officer_id} is not assigned to complaint {complaint_id}"
            )));
        }

        complaint.status = ComplaintStatus::Resolved;
        complaint.active = false;
        self.complaints.save(&complaint);

        if let Some(mut record) = self.escalations.find_by_complaint(complaint_id) {
            if let Some(handle) = record.outstanding_job_id.take() {
                if let Err(e) = self.queue.cancel(handle) {
                    warn!(
                        "could not cancel escalation timer for resolved complaint {complaint_id}: {e}"
                    );
                }
            }
            self.escalations.save(&record);
        }
        info!("complaint {complaint_id} resolved by officer {officer_id}");

        self.notifier.notify(
            &complaint.reporter_id,
            NotificationPayload::ComplaintResolved {
                complaint_id,
                officer_id: officer_id.to_string(),
            },
        );
        self.broadcaster.broadcast(
            channel::COMPLAINT_CLOSED,
            enriched_payload(&complaint, &*self.lookup),
        );
        Ok(complaint)
    }
}
