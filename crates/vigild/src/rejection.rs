//! Rejection tracking.
//!
//! Two layers with different lifetimes: the durable rejection list on the
//! complaint (permanent audit data, authoritative for "already rejected")
//! and the per-officer ephemeral exclusion set (TTL-bounded dispatch
//! filter). Once enough distinct officers have declined a still-pending
//! complaint it is force-closed - the only closure path that bypasses the
//! executor.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use vigil_common::config::RejectionConfig;
use vigil_common::error::Result;
use vigil_common::events::{channel, NotificationPayload};
use vigil_common::{ComplaintStatus, EngineError, Rejection};
use uuid::Uuid;

use crate::broadcast::Broadcaster;
use crate::enrichment::{enriched_payload, CategoryLookup};
use crate::ephemeral::EphemeralStore;
use crate::notify::Notifier;
use crate::queue::DelayedTaskQueue;
use crate::store::{ComplaintStore, EscalationStore};

/// Ephemeral key of an officer's exclusion set.
pub fn rejection_key(officer_id: &str) -> String {
    format!("rejections:{officer_id}")
}

/// What a rejection did to the complaint.
#[derive(Debug, Clone, Copy)]
pub struct RejectOutcome {
    /// True when this rejection tripped the threshold and closed the
    /// complaint
    pub status_changed: bool,
    pub distinct_rejecters: usize,
}

pub struct RejectionTracker {
    complaints: Arc<dyn ComplaintStore>,
    escalations: Arc<dyn EscalationStore>,
    queue: Arc<dyn DelayedTaskQueue>,
    ephemeral: Arc<dyn EphemeralStore>,
    notifier: Arc<Notifier>,
    broadcaster: Arc<dyn Broadcaster>,
    lookup: Arc<dyn CategoryLookup>,
    config: RejectionConfig,
}

impl RejectionTracker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        complaints: Arc<dyn ComplaintStore>,
        escalations: Arc<dyn EscalationStore>,
        queue: Arc<dyn DelayedTaskQueue>,
        ephemeral: Arc<dyn EphemeralStore>,
        notifier: Arc<Notifier>,
        broadcaster: Arc<dyn Broadcaster>,
        lookup: Arc<dyn CategoryLookup>,
        config: RejectionConfig,
    ) -> Self {
        Self {
            complaints,
            escalations,
            queue,
            ephemeral,
            notifier,
            broadcaster,
            lookup,
            config,
        }
    }

    /// Record an officer's rejection of a complaint.
    ///
    /// Re-rejection by the same officer is a surfaced error, checked
    /// against the durable list (never the ephemeral cache).
    pub fn reject(
        &self,
        complaint_id: Uuid,
        officer_id: &str,
        reason: &str,
    ) -> Result<RejectOutcome> {
        let mut complaint = self
            .complaints
            .find(complaint_id)
            .ok_or(EngineError::ComplaintNotFound(complaint_id))?;

        if complaint.rejected_by(officer_id) {
            return Err(EngineError::AlreadyRejected {
                complaint_id,
                officer_id: officer_id.to_string(),
            });
        }

        complaint.rejections.push(Rejection {
            officer_id: officer_id.to_string(),
            reason: reason.to_string(),
            rejected_at: Utc::now(),
        });
        let distinct = complaint.distinct_rejecters();

        let mut status_changed = false;
        if distinct >= self.config.close_threshold
            && complaint.status == ComplaintStatus::Pending
        {
            complaint.status = ComplaintStatus::Rejected;
            complaint.active = false;
            status_changed = true;

            // Terminal now, so the armed timer must go. Best-effort: a
            // cancel miss is caught by the executor's terminal check.
            if let Some(mut record) = self.escalations.find_by_complaint(complaint_id) {
                if let Some(handle) = record.outstanding_job_id.take() {
                    if let Err(e) = self.queue.cancel(handle) {
                        warn!(
                            "could not cancel escalation timer for rejected complaint {complaint_id}: {e}"
                        );
                    }
                }
                self.escalations.save(&record);
            }
            info!(
                "complaint {complaint_id} closed after {distinct} distinct officer rejections"
            );
        }

        self.complaints.save(&complaint);

        // Dispatch-filter cache; losing it only means the officer may see
        // the complaint again within the window
        let key = rejection_key(officer_id);
        if let Err(e) = self
            .ephemeral
            .sadd(&key, &complaint_id.to_string())
            .and_then(|()| self.ephemeral.expire(&key, self.config.index_ttl()))
        {
            warn!("could not update rejection index for {officer_id}: {e}");
        }

        if status_changed {
            self.notifier.notify(
                &complaint.reporter_id,
                NotificationPayload::ComplaintRejected {
                    complaint_id,
                    rejecters: distinct,
                },
            );
            self.broadcaster.broadcast(
                channel::COMPLAINT_CLOSED,
                enriched_payload(&complaint, &*self.lookup),
            );
        }

        Ok(RejectOutcome {
            status_changed,
            distinct_rejecters: distinct,
        })
    }
}
