mod common;

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use common::{FakeIssuer, FakeStore};
use remedy_engine::{
    EngineConfig, EngineEvent, EngineHandle, FailureKind, JobId, PollSettings, TimelineSettings,
    TimelineStage, TransferAction,
};
use tempfile::TempDir;

fn fast_config(max_attempts: u32) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.poll = PollSettings {
        interval: Duration::from_millis(5),
        max_attempts,
    };
    config.timeline = TimelineSettings {
        steps: vec![
            (Duration::from_millis(1), TimelineStage::Analyst),
            (Duration::from_millis(2), TimelineStage::Strategist),
            (Duration::from_millis(3), TimelineStage::Generator),
        ],
    };
    config
}

fn write_report(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, br#"{"analisis_tipo":"Deep Dive"}"#).unwrap();
    path
}

/// Collects events until `stop` matches or the deadline passes.
fn collect_until(
    engine: &EngineHandle,
    deadline: Duration,
    stop: impl Fn(&EngineEvent) -> bool,
) -> Vec<EngineEvent> {
    let until = Instant::now() + deadline;
    let mut events = Vec::new();
    while Instant::now() < until {
        if let Some(event) = engine.recv_timeout(Duration::from_millis(10)) {
            let done = stop(&event);
            events.push(event);
            if done {
                break;
            }
        }
    }
    events
}

fn is_upload_done(job: JobId) -> impl Fn(&EngineEvent) -> bool {
    move |event| matches!(event, EngineEvent::UploadCompleted { job_id, .. } if *job_id == job)
}

#[test]
fn upload_poll_and_save_round() {
    remedy_logging::initialize_for_tests();
    let dir = TempDir::new().unwrap();
    let report = write_report(&dir, "incident.json");
    let out = dir.path().join("output");
    let issuer = FakeIssuer::new();
    let store = FakeStore::ready_after(2, "echo 'fixed'\n");
    let engine = EngineHandle::with_backends(issuer.clone(), store.clone(), fast_config(30), out);

    engine.upload(1, report, "incident.json");
    let events = collect_until(&engine, Duration::from_secs(5), is_upload_done(1));
    assert_eq!(
        events.last(),
        Some(&EngineEvent::UploadCompleted {
            job_id: 1,
            result: Ok(())
        })
    );
    let uploads = store.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].0, "incident.json");
    assert_eq!(uploads[0].2, "application/json");

    engine.poll(1, "incident.py");
    engine.start_timeline(1);
    let events = collect_until(&engine, Duration::from_secs(5), |event| {
        matches!(event, EngineEvent::ResultFetched { .. })
    });
    let attempts: Vec<u32> = events
        .iter()
        .filter_map(|event| match event {
            EngineEvent::PollAttempted { attempt, .. } => Some(*attempt),
            _ => None,
        })
        .collect();
    assert_eq!(attempts, vec![1, 2, 3]);
    let payload = events.iter().find_map(|event| match event {
        EngineEvent::ResultFetched { job_id: 1, payload } => Some(payload.clone()),
        _ => None,
    });
    assert_eq!(payload.as_deref(), Some("echo 'fixed'\n"));

    engine.save(1, "incident.py", "echo 'fixed'\n".to_string());
    let events = collect_until(&engine, Duration::from_secs(5), |event| {
        matches!(event, EngineEvent::ResultSaved { .. })
    });
    let saved = events.iter().find_map(|event| match event {
        EngineEvent::ResultSaved { result, .. } => Some(result.clone()),
        _ => None,
    });
    let path = saved.unwrap().unwrap();
    assert_eq!(fs::read_to_string(path).unwrap(), "echo 'fixed'\n");
}

#[test]
fn signing_failure_on_upload_reports_error() {
    let dir = TempDir::new().unwrap();
    let report = write_report(&dir, "incident.json");
    let store = FakeStore::new();
    let engine = EngineHandle::with_backends(
        FakeIssuer::refusing_uploads(),
        store.clone(),
        fast_config(30),
        dir.path().to_path_buf(),
    );

    engine.upload(4, report, "incident.json");
    let events = collect_until(&engine, Duration::from_secs(5), is_upload_done(4));
    match events.last() {
        Some(EngineEvent::UploadCompleted { result: Err(err), .. }) => {
            assert_eq!(err.kind, FailureKind::Signing);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(store.uploads().is_empty());
}

#[test]
fn missing_source_file_fails_upload() {
    let dir = TempDir::new().unwrap();
    let engine = EngineHandle::with_backends(
        FakeIssuer::new(),
        FakeStore::new(),
        fast_config(30),
        dir.path().to_path_buf(),
    );

    engine.upload(2, dir.path().join("absent.json"), "absent.json");
    let events = collect_until(&engine, Duration::from_secs(5), is_upload_done(2));
    match events.last() {
        Some(EngineEvent::UploadCompleted { result: Err(err), .. }) => {
            assert_eq!(err.kind, FailureKind::ReadSource);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn no_request_after_success_on_last_attempt() {
    let dir = TempDir::new().unwrap();
    let store = FakeStore::ready_after(29, "ok");
    let engine = EngineHandle::with_backends(
        FakeIssuer::new(),
        store.clone(),
        fast_config(30),
        dir.path().to_path_buf(),
    );

    engine.poll(1, "incident.py");
    let events = collect_until(&engine, Duration::from_secs(10), |event| {
        matches!(event, EngineEvent::ResultFetched { .. })
    });
    assert!(matches!(
        events.last(),
        Some(EngineEvent::ResultFetched { job_id: 1, .. })
    ));

    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(store.get_count(), 30);
}

#[test]
fn exhausted_attempts_report_poll_timeout() {
    let dir = TempDir::new().unwrap();
    let store = FakeStore::new();
    let engine = EngineHandle::with_backends(
        FakeIssuer::new(),
        store.clone(),
        fast_config(30),
        dir.path().to_path_buf(),
    );

    engine.poll(1, "incident.py");
    let events = collect_until(&engine, Duration::from_secs(10), |event| {
        matches!(event, EngineEvent::PollFailed { .. })
    });
    match events.last() {
        Some(EngineEvent::PollFailed { error, .. }) => {
            assert_eq!(error.kind, FailureKind::PollTimeout { attempts: 30 });
        }
        other => panic!("unexpected {other:?}"),
    }

    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(store.get_count(), 30);
}

#[test]
fn new_job_supersedes_active_poller() {
    let dir = TempDir::new().unwrap();
    let second = write_report(&dir, "second.json");
    let issuer = FakeIssuer::new();
    let store = FakeStore::new();
    let engine = EngineHandle::with_backends(
        issuer.clone(),
        store.clone(),
        fast_config(10_000),
        dir.path().to_path_buf(),
    );

    engine.poll(1, "first.py");
    engine.start_timeline(1);
    let _ = collect_until(&engine, Duration::from_secs(5), |event| {
        matches!(event, EngineEvent::PollAttempted { attempt: 3, .. })
    });

    engine.upload(2, second, "second.json");
    let _ = collect_until(&engine, Duration::from_secs(5), is_upload_done(2));
    let requests_at_switch = issuer.count_for("first.py");

    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(issuer.count_for("first.py"), requests_at_switch);
    assert!(issuer
        .requests()
        .contains(&(TransferAction::Upload, "second.json".to_string())));
    // The superseded poller reports nothing, not even a failure.
    let late = collect_until(&engine, Duration::from_millis(50), |_| false);
    assert!(late
        .iter()
        .all(|event| !matches!(event, EngineEvent::PollFailed { job_id: 1, .. })));
}

#[test]
fn explicit_cancel_stops_poller_and_timeline() {
    let dir = TempDir::new().unwrap();
    let store = FakeStore::new();
    let engine = EngineHandle::with_backends(
        FakeIssuer::new(),
        store.clone(),
        fast_config(10_000),
        dir.path().to_path_buf(),
    );

    engine.poll(3, "incident.py");
    let _ = collect_until(&engine, Duration::from_secs(5), |event| {
        matches!(event, EngineEvent::PollAttempted { attempt: 2, .. })
    });
    engine.cancel(3);
    std::thread::sleep(Duration::from_millis(50));
    let settled = store.get_count();

    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(store.get_count(), settled);
}

#[test]
fn timeline_emits_stages_in_order() {
    let dir = TempDir::new().unwrap();
    let engine = EngineHandle::with_backends(
        FakeIssuer::new(),
        FakeStore::new(),
        fast_config(30),
        dir.path().to_path_buf(),
    );

    engine.start_timeline(9);
    let events = collect_until(&engine, Duration::from_secs(5), |event| {
        matches!(
            event,
            EngineEvent::StageReached {
                stage: TimelineStage::Generator,
                ..
            }
        )
    });
    let stages: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            EngineEvent::StageReached { job_id: 9, stage } => Some(*stage),
            _ => None,
        })
        .collect();
    assert_eq!(
        stages,
        vec![
            TimelineStage::Analyst,
            TimelineStage::Strategist,
            TimelineStage::Generator
        ]
    );
}
