//! Golden tests for the timer-driven escalation flow.
//!
//! Jobs are driven deterministically: the in-memory queue hands back due
//! tasks for any probe time, so nothing here sleeps.

use chrono::{Duration as ChronoDuration, Utc};

use vigil_common::{
    ComplaintStatus, EngineConfig, EscalationPolicy, GeoPoint, NewComplaint, Severity,
};
use vigild::engine::Engine;
use vigild::queue::DueJob;
use vigild::store::{ComplaintStore, EscalationStore};

fn make_engine() -> Engine {
    Engine::in_memory(EngineConfig::default(), EscalationPolicy::default())
}

fn make_intake(severity: Severity) -> NewComplaint {
    NewComplaint {
        reporter_id: "citizen-1".to_string(),
        category: "noise".to_string(),
        category_data_id: None,
        description: "ongoing disturbance".to_string(),
        severity,
        location: GeoPoint::new(59.91, 10.75),
    }
}

/// Pull the single due job once every armed delay has elapsed.
fn take_only_job(engine: &Engine) -> DueJob {
    let far_future = Utc::now() + ChronoDuration::days(30);
    let mut due = engine.queue.take_due(far_future);
    assert_eq!(due.len(), 1, "expected exactly one armed timer");
    due.remove(0)
}

#[test]
fn test_unattended_high_complaint_advances_to_level_2() {
    let engine = make_engine();
    let complaint = engine
        .complaints
        .file_complaint(make_intake(Severity::High))
        .unwrap();
    assert_eq!(complaint.level, 1);

    let job = take_only_job(&engine);
    engine.executor.execute(job.handle, &job.payload);

    let after = ComplaintStore::find(&*engine.store, complaint.id).unwrap();
    assert_eq!(after.level, 2);
    assert_eq!(after.status, ComplaintStatus::Pending);
    assert!(after.active);
    assert!(after.assigned_officer.is_none());

    // Exactly one new timer armed for (high, 2)
    assert_eq!(engine.queue.live_jobs(), 1);
    let record = engine.store.find_by_complaint(complaint.id).unwrap();
    assert_eq!(record.history.len(), 1);
    assert_eq!(record.history[0].from_level, 1);
    assert_eq!(record.history[0].to_level, Some(2));
    let handle = record.outstanding_job_id.expect("new timer handle");
    let due_at = engine.queue.due_at(handle).expect("armed job");
    // (high, 2) delay is one hour in the built-in ladder
    assert!(due_at > Utc::now() + ChronoDuration::minutes(55));
}

#[test]
fn test_exhausted_ladder_closes_complaint() {
    let engine = make_engine();
    let filed = engine
        .complaints
        .file_complaint(make_intake(Severity::High))
        .unwrap();

    // Put the complaint on the terminal rung and re-arm
    let mut complaint = ComplaintStore::find(&*engine.store, filed.id).unwrap();
    complaint.level = 5;
    ComplaintStore::save(&*engine.store, &complaint);
    engine.queue.take_due(Utc::now() + ChronoDuration::days(30));
    engine.scheduler.schedule(&complaint).unwrap();

    let job = take_only_job(&engine);
    engine.executor.execute(job.handle, &job.payload);

    let after = ComplaintStore::find(&*engine.store, filed.id).unwrap();
    assert_eq!(after.status, ComplaintStatus::Rejected);
    assert!(!after.active);
    // Terminal history entry, no new timer
    let record = engine.store.find_by_complaint(filed.id).unwrap();
    let last = record.history.last().unwrap();
    assert_eq!(last.from_level, 5);
    assert_eq!(last.to_level, None);
    assert!(record.outstanding_job_id.is_none());
    assert_eq!(engine.queue.live_jobs(), 0);
}

#[test]
fn test_fire_after_manual_resolution_is_noop() {
    let engine = make_engine();
    let filed = engine
        .complaints
        .file_complaint(make_intake(Severity::Medium))
        .unwrap();

    // Manual status update races the armed timer
    let mut complaint = ComplaintStore::find(&*engine.store, filed.id).unwrap();
    complaint.status = ComplaintStatus::Resolved;
    complaint.active = false;
    ComplaintStore::save(&*engine.store, &complaint);

    let job = take_only_job(&engine);
    engine.executor.execute(job.handle, &job.payload);

    let after = ComplaintStore::find(&*engine.store, filed.id).unwrap();
    assert_eq!(after.status, ComplaintStatus::Resolved);
    assert_eq!(after.level, 1);
    // Stale handle cleared, no history written
    let record = engine.store.find_by_complaint(filed.id).unwrap();
    assert!(record.outstanding_job_id.is_none());
    assert!(record.history.is_empty());
}

#[test]
fn test_stale_timer_detects_itself_and_noops() {
    let engine = make_engine();
    let filed = engine
        .complaints
        .file_complaint(make_intake(Severity::Low))
        .unwrap();

    // The first timer "fires" but its execution is delayed...
    let old_job = take_only_job(&engine);

    // ...while a re-schedule arms a fresh timer with a newer started-at
    let complaint = ComplaintStore::find(&*engine.store, filed.id).unwrap();
    engine.scheduler.schedule(&complaint).unwrap();
    assert_eq!(engine.queue.live_jobs(), 1);

    engine.executor.execute(old_job.handle, &old_job.payload);

    // The stale fire changed nothing
    let after = ComplaintStore::find(&*engine.store, filed.id).unwrap();
    assert_eq!(after.level, 1);
    let record = engine.store.find_by_complaint(filed.id).unwrap();
    assert!(record.history.is_empty());
    assert!(record.outstanding_job_id.is_some());
    assert_eq!(engine.queue.live_jobs(), 1);
}

#[test]
fn test_rescheduling_never_leaves_two_timers() {
    let engine = make_engine();
    let filed = engine
        .complaints
        .file_complaint(make_intake(Severity::Medium))
        .unwrap();
    let complaint = ComplaintStore::find(&*engine.store, filed.id).unwrap();

    engine.scheduler.schedule(&complaint).unwrap();
    engine.scheduler.schedule(&complaint).unwrap();

    assert_eq!(engine.queue.live_jobs(), 1);
    let record = engine.store.find_by_complaint(filed.id).unwrap();
    let handle = record.outstanding_job_id.unwrap();
    assert!(engine.queue.due_at(handle).is_some());
}

#[test]
fn test_escalation_notifies_reporter_and_broadcasts() {
    let engine = make_engine();
    let mut rx = engine.broadcaster.subscribe();
    let filed = engine
        .complaints
        .file_complaint(make_intake(Severity::High))
        .unwrap();
    // Intake announcement
    let announced = rx.try_recv().unwrap();
    assert_eq!(announced.event, "complaint:new");

    let job = take_only_job(&engine);
    engine.executor.execute(job.handle, &job.payload);

    let escalated = rx.try_recv().unwrap();
    assert_eq!(escalated.event, "complaint:escalated");
    assert_eq!(escalated.payload["id"], filed.id.to_string());
    assert_eq!(escalated.payload["level"], 2);

    let inbox = engine.notifier.recent("citizen-1");
    assert_eq!(inbox.len(), 1);
    match &inbox[0].payload {
        vigil_common::NotificationPayload::Escalation {
            from_level,
            to_level,
            ..
        } => {
            assert_eq!(*from_level, 1);
            assert_eq!(*to_level, 2);
        }
        other => panic!("unexpected payload {other:?}"),
    }
}

#[test]
fn test_undefined_rung_stops_the_ladder() {
    // A ladder whose next rung has no policy entry: the complaint
    // escalates onto it but no further timer is armed
    let policy = EscalationPolicy::from_json(
        r#"[{ "severity": "low", "level": 1, "next": 2, "delaySeconds": 0 }]"#,
    )
    .unwrap();
    let engine = Engine::in_memory(EngineConfig::default(), policy);
    let filed = engine
        .complaints
        .file_complaint(make_intake(Severity::Low))
        .unwrap();
    assert_eq!(engine.queue.live_jobs(), 1);

    let job = take_only_job(&engine);
    engine.executor.execute(job.handle, &job.payload);

    let after = ComplaintStore::find(&*engine.store, filed.id).unwrap();
    assert_eq!(after.level, 2);
    assert_eq!(after.status, ComplaintStatus::Pending);
    // Configuration gap: left in place for an operator, nothing armed
    assert_eq!(engine.queue.live_jobs(), 0);
    let record = engine.store.find_by_complaint(filed.id).unwrap();
    assert!(record.outstanding_job_id.is_none());
}

#[test]
fn test_full_ladder_walk_ends_closed() {
    let engine = make_engine();
    let filed = engine
        .complaints
        .file_complaint(make_intake(Severity::High))
        .unwrap();

    // high ladder: 1 -> 2 -> 3 -> 4 -> 5 -> CLOSE
    for expected_level in [2, 3, 4, 5] {
        let job = take_only_job(&engine);
        engine.executor.execute(job.handle, &job.payload);
        let c = ComplaintStore::find(&*engine.store, filed.id).unwrap();
        assert_eq!(c.level, expected_level);
        assert_eq!(c.status, ComplaintStatus::Pending);
    }
    let job = take_only_job(&engine);
    engine.executor.execute(job.handle, &job.payload);

    let after = ComplaintStore::find(&*engine.store, filed.id).unwrap();
    assert_eq!(after.status, ComplaintStatus::Rejected);
    assert_eq!(engine.queue.live_jobs(), 0);
    let record = engine.store.find_by_complaint(filed.id).unwrap();
    assert_eq!(record.history.len(), 5);
}
