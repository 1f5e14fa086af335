//! Engine error taxonomy.
//!
//! Four categories with distinct handling:
//! - configuration gaps: logged, operation aborted, state untouched
//! - missing referenced entities: logged, task discarded, no retry
//! - best-effort side channels (cancel, notify, enrich): caught locally,
//!   never propagated through these variants
//! - precondition violations: surfaced to the caller as a rejected
//!   operation, not retried

use thiserror::Error;
use uuid::Uuid;

use crate::complaint::Severity;

#[derive(Debug, Error)]
pub enum EngineError {
    /// No policy entry for this (severity, level) pair. Operator attention
    /// required; the complaint stays in its current state.
    #[error("no escalation policy entry for ({severity}, level {level})")]
    PolicyGap { severity: Severity, level: u32 },

    #[error("complaint {0} not found")]
    ComplaintNotFound(Uuid),

    #[error("escalation record {0} not found")]
    EscalationNotFound(Uuid),

    /// Officer re-rejecting the same complaint. Surfaced, not silently
    /// ignored.
    #[error("officer {officer_id} already rejected complaint {complaint_id}")]
    AlreadyRejected { complaint_id: Uuid, officer_id: String },

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("queue error: {0}")]
    Queue(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::PolicyGap {
            severity: Severity::High,
            level: 7,
        };
        assert_eq!(
            err.to_string(),
            "no escalation policy entry for (high, level 7)"
        );

        let id = Uuid::new_v4();
        assert_eq!(
            EngineError::EscalationNotFound(id).to_string(),
            format!("escalation record {id} not found")
        );
    }
}
