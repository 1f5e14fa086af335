//! Vigil Daemon - escalation & dispatch engine
//!
//! Timer-driven state machine advancing unattended complaints up a
//! severity-dependent ladder, officer matching within severity-tiered
//! radii, and threshold auto-closure on distinct-officer rejections.
//!
//! External collaborators (document store, delayed-task queue, ephemeral
//! KV, realtime channel, category enrichment) are injected traits; the
//! in-memory implementations here back the daemon and the test suites.

pub mod broadcast;
pub mod dispatch;
pub mod engine;
pub mod enrichment;
pub mod ephemeral;
pub mod executor;
pub mod intake;
pub mod notify;
pub mod queue;
pub mod rejection;
pub mod scheduler;
pub mod store;
pub mod worker;
