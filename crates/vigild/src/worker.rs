//! Worker loop draining due escalation tasks into the executor.
//!
//! Each task runs independently; a bad job is logged and dropped, never
//! retried, and never takes the loop down. Concurrent actors (acceptance,
//! rejection, manual updates) race freely against firing tasks - the
//! executor's re-validation absorbs the races.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::executor::Executor;
use crate::queue::MemoryQueue;

/// Drain everything currently due. Returns the number of jobs handled.
pub fn drain_once(queue: &MemoryQueue, executor: &Executor) -> usize {
    let due = queue.take_due(Utc::now());
    let count = due.len();
    for job in due {
        debug!(
            "escalation task due for complaint {} (level {})",
            job.payload.complaint_id, job.payload.level
        );
        executor.execute(job.handle, &job.payload);
    }
    count
}

/// Poll the queue forever at `tick` intervals.
pub async fn run_worker(queue: Arc<MemoryQueue>, executor: Arc<Executor>, tick: Duration) {
    info!("escalation worker started (tick {:?})", tick);
    let mut interval = tokio::time::interval(tick);
    loop {
        interval.tick().await;
        let handled = drain_once(&queue, &executor);
        if handled > 0 {
            debug!("escalation worker handled {handled} due task(s)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::store::ComplaintStore;
    use vigil_common::{
        ComplaintStatus, EngineConfig, EscalationPolicy, GeoPoint, NewComplaint, Severity,
    };

    #[test]
    fn test_drain_once_advances_due_complaints() {
        // Zero delays so every armed timer is immediately due
        let policy = EscalationPolicy::from_json(
            r#"[
                { "severity": "low", "level": 1, "next": 2, "delaySeconds": 0 },
                { "severity": "low", "level": 2, "next": "CLOSE", "delaySeconds": 3600 }
            ]"#,
        )
        .unwrap();
        let engine = Engine::in_memory(EngineConfig::default(), policy);
        let filed = engine
            .complaints
            .file_complaint(NewComplaint {
                reporter_id: "citizen-1".to_string(),
                category: "litter".to_string(),
                category_data_id: None,
                description: "overflowing bin".to_string(),
                severity: Severity::Low,
                location: GeoPoint::new(59.9, 10.7),
            })
            .unwrap();

        assert_eq!(drain_once(&engine.queue, &engine.executor), 1);
        let after = ComplaintStore::find(&*engine.store, filed.id).unwrap();
        assert_eq!(after.level, 2);
        assert_eq!(after.status, ComplaintStatus::Pending);
        // Next rung has an hour delay; nothing due now
        assert_eq!(drain_once(&engine.queue, &engine.executor), 0);
    }
}
