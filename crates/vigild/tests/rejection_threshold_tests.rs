//! Distinct-rejecter threshold and rejection-index behavior.

use chrono::{Duration as ChronoDuration, Utc};
use uuid::Uuid;

use vigil_common::{
    ComplaintStatus, EngineConfig, EngineError, EscalationPolicy, GeoPoint, NewComplaint, Severity,
};
use vigild::engine::Engine;
use vigild::store::ComplaintStore;

fn make_engine() -> Engine {
    Engine::in_memory(EngineConfig::default(), EscalationPolicy::default())
}

fn file_high_complaint(engine: &Engine) -> Uuid {
    engine
        .complaints
        .file_complaint(NewComplaint {
            reporter_id: "citizen-1".to_string(),
            category: "vandalism".to_string(),
            category_data_id: None,
            description: "broken bus shelter".to_string(),
            severity: Severity::High,
            location: GeoPoint::new(59.9139, 10.7522),
        })
        .unwrap()
        .id
}

#[test]
fn test_two_rejections_keep_complaint_pending() {
    let engine = make_engine();
    let id = file_high_complaint(&engine);

    for officer in ["off-1", "off-2"] {
        let outcome = engine.rejections.reject(id, officer, "outside my area").unwrap();
        assert!(!outcome.status_changed);
    }

    let c = ComplaintStore::find(&*engine.store, id).unwrap();
    assert_eq!(c.status, ComplaintStatus::Pending);
    assert!(c.active);
    assert_eq!(c.rejections.len(), 2);
    // Timer still armed
    assert_eq!(engine.queue.live_jobs(), 1);
}

#[test]
fn test_third_distinct_rejection_closes_complaint() {
    let engine = make_engine();
    let id = file_high_complaint(&engine);

    engine.rejections.reject(id, "off-1", "busy").unwrap();
    engine.rejections.reject(id, "off-2", "busy").unwrap();
    let outcome = engine.rejections.reject(id, "off-3", "busy").unwrap();
    assert!(outcome.status_changed);
    assert_eq!(outcome.distinct_rejecters, 3);

    let c = ComplaintStore::find(&*engine.store, id).unwrap();
    assert_eq!(c.status, ComplaintStatus::Rejected);
    assert!(!c.active);
    // The armed escalation timer was cancelled; nothing fires later
    assert_eq!(engine.queue.live_jobs(), 0);
    assert!(engine
        .queue
        .take_due(Utc::now() + ChronoDuration::days(30))
        .is_empty());

    // Reporter heard about it
    let inbox = engine.notifier.recent("citizen-1");
    assert!(matches!(
        inbox[0].payload,
        vigil_common::NotificationPayload::ComplaintRejected { rejecters: 3, .. }
    ));
}

#[test]
fn test_same_officer_cannot_reject_twice() {
    let engine = make_engine();
    let id = file_high_complaint(&engine);

    engine.rejections.reject(id, "off-1", "busy").unwrap();
    let err = engine.rejections.reject(id, "off-1", "still busy").unwrap_err();
    assert!(matches!(err, EngineError::AlreadyRejected { .. }));

    // The repeat attempt counted for nothing
    let c = ComplaintStore::find(&*engine.store, id).unwrap();
    assert_eq!(c.rejections.len(), 1);
    assert_eq!(c.distinct_rejecters(), 1);
}

#[test]
fn test_threshold_does_not_close_in_progress_complaint() {
    let engine = make_engine();
    let id = file_high_complaint(&engine);
    engine.rejections.reject(id, "off-1", "busy").unwrap();
    engine.rejections.reject(id, "off-2", "busy").unwrap();

    // Claimed before the third rejection lands
    engine.complaints.accept(id, "off-9").unwrap();

    let outcome = engine.rejections.reject(id, "off-3", "busy").unwrap();
    assert!(!outcome.status_changed);
    assert_eq!(outcome.distinct_rejecters, 3);
    let c = ComplaintStore::find(&*engine.store, id).unwrap();
    assert_eq!(c.status, ComplaintStatus::InProgress);
}

#[test]
fn test_rejection_hides_complaint_from_officer_only() {
    let engine = make_engine();
    let id = file_high_complaint(&engine);
    engine.rejections.reject(id, "off-1", "busy").unwrap();

    let for_rejecter = engine.dispatch.find_nearby("off-1", 59.9139, 10.7522);
    assert!(for_rejecter.high.iter().all(|d| d.complaint.id != id));

    let for_other = engine.dispatch.find_nearby("off-2", 59.9139, 10.7522);
    assert!(for_other.high.iter().any(|d| d.complaint.id == id));
}

#[test]
fn test_rejecting_unknown_complaint_fails() {
    let engine = make_engine();
    let err = engine
        .rejections
        .reject(Uuid::new_v4(), "off-1", "busy")
        .unwrap_err();
    assert!(matches!(err, EngineError::ComplaintNotFound(_)));
}
