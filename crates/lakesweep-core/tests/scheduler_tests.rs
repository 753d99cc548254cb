use lakesweep_core::{Engine, Error, Granularity};
use std::fs;
use std::time::{Duration, Instant};
use tempfile::tempdir;

#[test]
fn test_start_stop_restart() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("lake");
    fs::create_dir_all(&root).unwrap();

    let engine = Engine::open(tmp.path().join("test.db")).unwrap();
    assert!(!engine.is_scheduled());

    engine
        .schedule_interval(&root, Granularity::Entity, 1000.0, 60)
        .unwrap();
    assert!(engine.is_scheduled());

    // A second start while running reports busy.
    assert!(matches!(
        engine.schedule_interval(&root, Granularity::Entity, 1000.0, 60),
        Err(Error::SchedulerBusy)
    ));
    assert!(matches!(
        engine.schedule_daily(&root, Granularity::Entity, 1000.0, 3, 0),
        Err(Error::SchedulerBusy)
    ));

    // stop() joins the worker; the worker polls once per second, so this
    // must return promptly even though the interval is an hour.
    let started = Instant::now();
    engine.schedule_stop().unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(!engine.is_scheduled());

    // After a stop, a fresh start succeeds.
    engine
        .schedule_interval(&root, Granularity::Entity, 1000.0, 60)
        .unwrap();
    assert!(engine.is_scheduled());
    engine.schedule_stop().unwrap();
    assert!(!engine.is_scheduled());
}

#[test]
fn test_next_run_present_only_while_running() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("lake");
    fs::create_dir_all(&root).unwrap();

    let engine = Engine::open(tmp.path().join("test.db")).unwrap();
    assert_eq!(engine.status().unwrap().next_run, "");

    engine
        .schedule_daily(&root, Granularity::Entity, 1000.0, 3, 30)
        .unwrap();
    let next = engine.status().unwrap().next_run;
    assert!(!next.is_empty());
    // "YYYY-MM-DD HH:MM" at the configured minute.
    assert!(next.ends_with(":30"), "unexpected next_run format: {}", next);

    engine.schedule_stop().unwrap();
    assert_eq!(engine.status().unwrap().next_run, "");
}

#[test]
fn test_schedule_persists_settings() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("lake");
    fs::create_dir_all(&root).unwrap();
    let db_path = tmp.path().join("test.db");

    let engine = Engine::open(&db_path).unwrap();
    engine
        .schedule_daily(&root, Granularity::Entity, 1000.0, 4, 45)
        .unwrap();

    let db = lakesweep_core::storage::Database::open(&db_path).unwrap();
    let settings = db.get_scheduler_settings().unwrap();
    assert_eq!(settings.hour, 4);
    assert_eq!(settings.minute, 45);
    assert!(settings.is_enabled);

    engine.schedule_stop().unwrap();
    assert!(!db.get_scheduler_settings().unwrap().is_enabled);
}

#[test]
fn test_invalid_schedule_inputs_rejected() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("lake");
    fs::create_dir_all(&root).unwrap();

    let engine = Engine::open(tmp.path().join("test.db")).unwrap();
    assert!(matches!(
        engine.schedule_daily(&root, Granularity::Entity, 1000.0, 24, 0),
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        engine.schedule_daily(&root, Granularity::Entity, 1000.0, 3, 60),
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        engine.schedule_interval(&root, Granularity::Entity, 1000.0, 0),
        Err(Error::InvalidInput(_))
    ));
    assert!(!engine.is_scheduled());
}

#[test]
fn test_shutdown_stops_worker() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("lake");
    fs::create_dir_all(&root).unwrap();

    let engine = Engine::open(tmp.path().join("test.db")).unwrap();
    engine
        .schedule_interval(&root, Granularity::Entity, 1000.0, 60)
        .unwrap();

    engine.shutdown();
    assert!(!engine.is_scheduled());
}
