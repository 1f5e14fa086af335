//! Shared types for the Vigil escalation & dispatch engine.
//!
//! Pure data model and configuration - no I/O, no runtime. The daemon
//! (`vigild`) owns every side effect.

pub mod complaint;
pub mod config;
pub mod error;
pub mod escalation;
pub mod events;
pub mod policy;

pub use complaint::{Complaint, ComplaintStatus, GeoPoint, NewComplaint, Rejection, Severity};
pub use config::EngineConfig;
pub use error::EngineError;
pub use escalation::{EscalationJob, EscalationRecord, EscalationStep, JobHandle};
pub use events::{Notification, NotificationPayload};
pub use policy::{EscalationPolicy, NextStep, PolicyStep};
