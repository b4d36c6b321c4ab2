#![forbid(unsafe_code)]

mod support;

use support::{SHORT_WAIT, config_for, open_engine};
use ws_reports::{Engine, EngineConfig, ReportError, ReportOptions, VIEWS_SQL_ENV};
use ws_storage::fixtures::{MonitorFixture, temp_dir, two_run_workflow};
use ws_storage::{REQUIRED_VIEWS, StoreError, ViewSource, ViewSync};

#[test]
fn open_fails_fast_on_a_missing_store() {
    let config = EngineConfig::new(temp_dir("open_fails_fast_on_a_missing_store").join("none.db"))
        .with_busy_timeout(SHORT_WAIT);
    let err = Engine::open(&config).expect_err("missing store");
    assert!(matches!(err, ReportError::Store(StoreError::Unavailable { .. })), "{err:?}");
    assert!(err.is_fatal());
    assert_eq!(err.code(), "STORE_UNAVAILABLE");
}

#[test]
fn open_reports_lock_contention_as_busy() {
    let fx = two_run_workflow("open_reports_lock_contention_as_busy").expect("fixture");
    fx.connection()
        .execute_batch("BEGIN EXCLUSIVE")
        .expect("take exclusive lock");

    let err = Engine::open(&config_for(&fx)).expect_err("locked store");
    assert!(matches!(err, ReportError::Store(StoreError::Busy)), "{err:?}");
    assert!(err.is_fatal());
    fx.connection().execute_batch("COMMIT").expect("release lock");
}

#[test]
fn open_creates_views_and_loads_the_run_catalog() {
    let (_fx, engine) = open_engine("open_creates_views_and_loads_the_run_catalog");
    let views = engine.store().views().expect("views");
    for required in REQUIRED_VIEWS {
        assert!(views.iter().any(|name| name == required), "{required}");
    }
    assert_eq!(engine.runs().range(), Some((1, 2)));
    assert_eq!(engine.runs().current().map(|run| run.run_id.as_str()), Some("run-b"));
    engine.close().expect("close engine");
}

#[test]
fn reopening_leaves_existing_views_untouched() {
    let fx = two_run_workflow("reopening_leaves_existing_views_untouched").expect("fixture");
    let first = Engine::open(&config_for(&fx)).expect("first open");
    let before = first
        .store()
        .schema(ws_storage::SchemaKind::View, None)
        .expect("schema");
    first.close().expect("close");

    let second = Engine::open(&config_for(&fx)).expect("second open");
    let after = second
        .store()
        .schema(ws_storage::SchemaKind::View, None)
        .expect("schema");
    assert_eq!(before, after);
}

#[test]
fn rebuild_views_recreates_the_full_set() {
    let (_fx, mut engine) = open_engine("rebuild_views_recreates_the_full_set");
    match engine.rebuild_views().expect("rebuild") {
        ViewSync::Rebuilt { dropped, created } => {
            assert_eq!(dropped.len(), REQUIRED_VIEWS.len());
            assert_eq!(created, REQUIRED_VIEWS.len());
        }
        ViewSync::Present => panic!("rebuild must recreate views"),
    }
    assert_eq!(engine.runs().runs().len(), 2);
}

#[test]
fn a_broken_external_view_script_fails_startup_with_its_index() {
    let fx = MonitorFixture::create("a_broken_external_view_script_fails_startup_with_its_index")
        .expect("fixture");
    let dir = temp_dir("broken_views_script");
    std::fs::create_dir_all(&dir).expect("create temp dir");
    let script = dir.join("views.sql");
    std::fs::write(&script, "-- views\nCREATE VIEW runview AS SELEKT 1;\n").expect("write");

    let db = fx.path().display().to_string();
    let views = script.display().to_string();
    let config = EngineConfig::from_lookup(|key| match key {
        "WSTAT_DB" => Some(db.clone()),
        "WSTAT_BUSY_TIMEOUT_MS" => Some("50".to_string()),
        key if key == VIEWS_SQL_ENV => Some(views.clone()),
        _ => None,
    })
    .expect("config");
    assert_eq!(config.views, ViewSource::File(script.clone()));

    let err = Engine::open(&config).expect_err("broken views");
    assert!(
        matches!(err, ReportError::Store(StoreError::ViewDefinition { index: 0, .. })),
        "{err:?}"
    );
    assert!(err.is_fatal());
}

#[test]
fn selector_errors_leave_the_engine_usable() {
    let (_fx, engine) = open_engine("selector_errors_leave_the_engine_usable");

    let err = engine
        .short_summary(&ReportOptions::default().run(9))
        .expect_err("unknown run");
    assert!(matches!(err, ReportError::RunNotFound { requested: 9, range: Some((1, 2)) }));
    assert!(!err.is_fatal());

    let err = engine
        .task_history(&ReportOptions::default())
        .expect_err("ambiguous selector");
    assert!(matches!(err, ReportError::AmbiguousSelector));
    assert!(!err.is_fatal());

    engine
        .short_summary(&ReportOptions::default())
        .expect("engine still serves reports");
}
