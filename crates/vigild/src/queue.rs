//! Delayed-task queue seam.
//!
//! The real queue is an external at-least-once job scheduler with delayed
//! execution and best-effort cancellation. Cancel-then-enqueue during
//! re-scheduling is two separate calls - a crash between them can leave
//! zero or two live timers, which is why the job payload carries its own
//! staleness token (see `EscalationJob`).

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use vigil_common::error::Result;
use vigil_common::{EngineError, EscalationJob, JobHandle};

/// A job whose delay has elapsed, ready for the executor.
#[derive(Debug, Clone)]
pub struct DueJob {
    pub handle: JobHandle,
    pub name: String,
    pub payload: EscalationJob,
}

/// Queue seam: enqueue with delay, best-effort cancel.
pub trait DelayedTaskQueue: Send + Sync {
    fn enqueue(&self, name: &str, payload: EscalationJob, delay: Duration) -> Result<JobHandle>;
    /// Errors when the handle is unknown (already fired or never existed).
    /// Callers treat failure as best-effort and log it.
    fn cancel(&self, handle: JobHandle) -> Result<()>;
}

struct QueuedJob {
    name: String,
    payload: EscalationJob,
    due_at: DateTime<Utc>,
}

/// In-memory queue. The worker loop drains it via [`MemoryQueue::take_due`];
/// tests drive it deterministically by passing an arbitrary `now`.
#[derive(Default)]
pub struct MemoryQueue {
    jobs: Mutex<HashMap<JobHandle, QueuedJob>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return every job due at or before `now`.
    pub fn take_due(&self, now: DateTime<Utc>) -> Vec<DueJob> {
        let mut jobs = match self.jobs.lock() {
            Ok(guard) => guard,
            Err(_) => return Vec::new(),
        };
        let due: Vec<JobHandle> = jobs
            .iter()
            .filter(|(_, job)| job.due_at <= now)
            .map(|(handle, _)| *handle)
            .collect();
        let mut out = Vec::with_capacity(due.len());
        for handle in due {
            if let Some(job) = jobs.remove(&handle) {
                out.push(DueJob {
                    handle,
                    name: job.name,
                    payload: job.payload,
                });
            }
        }
        // Oldest due first
        out.sort_by_key(|j| j.payload.level_started_at);
        out
    }

    /// Number of timers currently armed. Used by the single-timer tests.
    pub fn live_jobs(&self) -> usize {
        self.jobs.lock().map(|j| j.len()).unwrap_or(0)
    }

    /// When a specific job will fire, if it is still armed.
    pub fn due_at(&self, handle: JobHandle) -> Option<DateTime<Utc>> {
        self.jobs.lock().ok()?.get(&handle).map(|j| j.due_at)
    }
}

impl DelayedTaskQueue for MemoryQueue {
    fn enqueue(&self, name: &str, payload: EscalationJob, delay: Duration) -> Result<JobHandle> {
        let delay = ChronoDuration::from_std(delay)
            .map_err(|e| EngineError::Queue(format!("delay out of range: {e}")))?;
        let handle = JobHandle::new();
        let mut jobs = self
            .jobs
            .lock()
            .map_err(|_| EngineError::Queue("queue lock poisoned".to_string()))?;
        jobs.insert(
            handle,
            QueuedJob {
                name: name.to_string(),
                payload,
                due_at: Utc::now() + delay,
            },
        );
        Ok(handle)
    }

    fn cancel(&self, handle: JobHandle) -> Result<()> {
        let mut jobs = self
            .jobs
            .lock()
            .map_err(|_| EngineError::Queue("queue lock poisoned".to_string()))?;
        if jobs.remove(&handle).is_none() {
            return Err(EngineError::Queue(format!(
                "no live job for handle {:?}",
                handle
            )));
        }
        Ok(())
    }
}
