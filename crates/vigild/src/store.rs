//! Document store seams for complaints and escalation records.
//!
//! The real store is an external collaborator with `find`/`save` and
//! last-write-wins semantics - no optimistic locking, no transactions.
//! Whichever actor saves last wins; the engine's re-fetch-and-check
//! discipline is the only coordination.

use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use vigil_common::{Complaint, EscalationRecord};

/// Complaint persistence seam.
pub trait ComplaintStore: Send + Sync {
    fn find(&self, id: Uuid) -> Option<Complaint>;
    /// Last-write-wins upsert.
    fn save(&self, complaint: &Complaint);
    /// Full scan; the dispatch matcher filters from here.
    fn all(&self) -> Vec<Complaint>;
}

/// Escalation record persistence seam (1:1 with complaints).
pub trait EscalationStore: Send + Sync {
    fn find(&self, id: Uuid) -> Option<EscalationRecord>;
    fn find_by_complaint(&self, complaint_id: Uuid) -> Option<EscalationRecord>;
    fn save(&self, record: &EscalationRecord);
}

/// In-memory store backing the daemon and tests.
#[derive(Default)]
pub struct MemoryStore {
    complaints: RwLock<HashMap<Uuid, Complaint>>,
    escalations: RwLock<HashMap<Uuid, EscalationRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ComplaintStore for MemoryStore {
    fn find(&self, id: Uuid) -> Option<Complaint> {
        self.complaints.read().ok()?.get(&id).cloned()
    }

    fn save(&self, complaint: &Complaint) {
        if let Ok(mut map) = self.complaints.write() {
            map.insert(complaint.id, complaint.clone());
        }
    }

    fn all(&self) -> Vec<Complaint> {
        self.complaints
            .read()
            .map(|map| map.values().cloned().collect())
            .unwrap_or_default()
    }
}

impl EscalationStore for MemoryStore {
    fn find(&self, id: Uuid) -> Option<EscalationRecord> {
        self.escalations.read().ok()?.get(&id).cloned()
    }

    fn find_by_complaint(&self, complaint_id: Uuid) -> Option<EscalationRecord> {
        self.escalations
            .read()
            .ok()?
            .values()
            .find(|r| r.complaint_id == complaint_id)
            .cloned()
    }

    fn save(&self, record: &EscalationRecord) {
        if let Ok(mut map) = self.escalations.write() {
            map.insert(record.id, record.clone());
        }
    }
}
