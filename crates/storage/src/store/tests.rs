#![forbid(unsafe_code)]

use super::*;
use super::queries::QueryBuilder;
use crate::fixtures::{MonitorFixture, TryTimes, two_run_workflow};
use std::time::Duration;
use ws_core::{StatusLabel, StatusPreset, TaskStatus};

const SHORT_WAIT: Duration = Duration::from_millis(50);

fn open_with_views(test_name: &str) -> (MonitorFixture, MonitorStore) {
    let fx = two_run_workflow(test_name).expect("fixture");
    let mut store = MonitorStore::open(fx.path(), SHORT_WAIT).expect("open store");
    ViewCatalog::default().ensure(&mut store).expect("ensure views");
    (fx, store)
}

fn approx(value: Option<f64>, expected: f64) -> bool {
    value.is_some_and(|v| (v - expected).abs() < 1e-3)
}

#[test]
fn open_rejects_a_missing_store() {
    let dir = crate::fixtures::temp_dir("open_rejects_a_missing_store");
    let err = MonitorStore::open(dir.join("absent.db"), SHORT_WAIT).expect_err("missing store");
    assert!(matches!(err, StoreError::Unavailable { .. }), "{err:?}");
    assert_eq!(err.code(), "STORE_UNAVAILABLE");
}

#[test]
fn open_rejects_a_file_that_is_not_a_database() {
    let dir = crate::fixtures::temp_dir("open_rejects_a_file_that_is_not_a_database");
    std::fs::create_dir_all(&dir).expect("create temp dir");
    let path = dir.join("notes.db");
    std::fs::write(&path, "not a database\n".repeat(100)).expect("write file");

    let err = MonitorStore::open(&path, SHORT_WAIT).expect_err("not a database");
    assert!(matches!(err, StoreError::Unavailable { .. }), "{err:?}");
}

#[test]
fn open_reports_busy_when_the_lock_is_held() {
    let fx = MonitorFixture::create("open_reports_busy_when_the_lock_is_held").expect("fixture");
    fx.connection()
        .execute_batch("BEGIN EXCLUSIVE")
        .expect("take exclusive lock");

    let err = MonitorStore::open(fx.path(), SHORT_WAIT).expect_err("locked store");
    assert!(matches!(err, StoreError::Busy), "{err:?}");

    fx.connection().execute_batch("COMMIT").expect("release lock");
    MonitorStore::open(fx.path(), SHORT_WAIT).expect("open after release");
}

#[test]
fn introspection_lists_tables_views_and_schema() {
    let (_fx, store) = open_with_views("introspection_lists_tables_views_and_schema");
    assert!(store.missing_tables().expect("missing tables").is_empty());
    let views = store.views().expect("views");
    for required in REQUIRED_VIEWS {
        assert!(views.iter().any(|name| name == required), "{required}");
    }

    let schema = store
        .schema(SchemaKind::Table, Some("status"))
        .expect("status schema");
    assert_eq!(schema.len(), 1);
    assert!(schema[0].sql.as_deref().is_some_and(|sql| sql.contains("task_status_name")));

    let raw = store
        .query_raw("SELECT count(*) AS n FROM task WHERE run_id = ?1", &[Value::Text("run-b".into())])
        .expect("raw query");
    assert_eq!(raw.titles, vec!["n".to_string()]);
    assert_eq!(raw.rows, vec![vec![Value::Integer(5)]]);
    store.close().expect("close");
}

#[test]
fn ensure_views_is_idempotent() {
    let fx = two_run_workflow("ensure_views_is_idempotent").expect("fixture");
    let mut store = MonitorStore::open(fx.path(), SHORT_WAIT).expect("open store");
    let catalog = ViewCatalog::default();

    let first = catalog.ensure(&mut store).expect("first ensure");
    assert_eq!(
        first,
        ViewSync::Rebuilt {
            dropped: Vec::new(),
            created: REQUIRED_VIEWS.len(),
        }
    );
    let before = store.schema(SchemaKind::View, None).expect("schema");

    assert_eq!(catalog.ensure(&mut store).expect("second ensure"), ViewSync::Present);
    assert_eq!(store.schema(SchemaKind::View, None).expect("schema"), before);
}

#[test]
fn rebuild_drops_present_views_before_recreating() {
    let (_fx, mut store) = open_with_views("rebuild_drops_present_views_before_recreating");
    let sync = ViewCatalog::default().rebuild(&mut store).expect("rebuild");
    match sync {
        ViewSync::Rebuilt { dropped, created } => {
            assert_eq!(dropped.len(), REQUIRED_VIEWS.len());
            assert_eq!(created, REQUIRED_VIEWS.len());
        }
        ViewSync::Present => panic!("rebuild must not report Present"),
    }
}

#[test]
fn failing_definition_is_reported_with_its_index_and_rolled_back() {
    let (_fx, mut store) =
        open_with_views("failing_definition_is_reported_with_its_index_and_rolled_back");
    let broken = ViewCatalog::new(ViewSource::Statements(vec![
        "CREATE VIEW runview AS SELECT 1 AS runnum".to_string(),
        "CREATE VIEW oops AS SELEC 1".to_string(),
    ]));

    let err = broken.rebuild(&mut store).expect_err("broken definition");
    assert!(matches!(err, StoreError::ViewDefinition { index: 1, .. }), "{err:?}");
    assert!(ViewCatalog::default().missing(&store).expect("missing").is_empty());
    assert_eq!(store.load_runs().expect("runs").len(), 2);
}

#[test]
fn incomplete_definitions_leave_required_views_missing() {
    let fx = two_run_workflow("incomplete_definitions_leave_required_views_missing")
        .expect("fixture");
    let mut store = MonitorStore::open(fx.path(), SHORT_WAIT).expect("open store");
    let partial = ViewCatalog::new(ViewSource::Statements(vec![
        "CREATE VIEW runview AS SELECT 1 AS runnum, 'x' AS run_id".to_string(),
    ]));

    match partial.ensure(&mut store).expect_err("partial catalog") {
        StoreError::ViewsMissing { missing } => {
            assert_eq!(missing.len(), REQUIRED_VIEWS.len() - 1);
            assert!(!missing.contains(&"runview".to_string()));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn view_definitions_load_from_a_script_file() {
    let dir = crate::fixtures::temp_dir("view_definitions_load_from_a_script_file");
    std::fs::create_dir_all(&dir).expect("create temp dir");
    let script = dir.join("views.sql");
    std::fs::write(
        &script,
        "/* header\n spanning lines */\nCREATE VIEW a AS SELECT 1; -- trailing\n\n;\nCREATE VIEW b AS SELECT 2;\n",
    )
    .expect("write script");

    let statements = ViewSource::File(script).statements().expect("statements");
    assert_eq!(
        statements,
        vec![
            "CREATE VIEW a AS SELECT 1".to_string(),
            "CREATE VIEW b AS SELECT 2".to_string(),
        ]
    );

    let err = ViewSource::File(dir.join("absent.sql"))
        .statements()
        .expect_err("missing script");
    assert!(matches!(err, StoreError::ViewSource { .. }), "{err:?}");
}

#[test]
fn line_comments_inside_literals_are_kept() {
    let statements = split_sql_script(
        "CREATE VIEW v AS SELECT 'a--b' AS x, 'it''s -- here' AS y -- gone\n;\n",
    );
    assert_eq!(
        statements,
        vec!["CREATE VIEW v AS SELECT 'a--b' AS x, 'it''s -- here' AS y".to_string()]
    );
}

#[test]
fn run_numbers_follow_start_time() {
    let (_fx, store) = open_with_views("run_numbers_follow_start_time");
    let runs = store.load_runs().expect("runs");
    let ids: Vec<(i64, &str)> = runs.iter().map(|run| (run.runnum, run.run_id.as_str())).collect();
    assert_eq!(ids, vec![(1, "run-a"), (2, "run-b")]);

    assert_eq!(runs[0].elapsed.as_deref(), Some("00:30:00"));
    assert!(!runs[0].is_open());
    assert!(runs[1].is_open());
    assert_eq!(runs[1].elapsed, None);
    assert_eq!(runs[1].failed_count, 1);
}

#[test]
fn durations_past_a_day_keep_counting_hours() {
    let fx = MonitorFixture::create("durations_past_a_day_keep_counting_hours").expect("fixture");
    fx.add_run("long", "2024-01-01 00:00:00", Some("2024-01-02 01:00:00"))
        .expect("run")
        .add_task("long", 1, "simulate", Some("hash-long"))
        .expect("task")
        .add_try(
            "long",
            1,
            0,
            TryTimes::complete(
                "2024-01-01 00:00:00",
                "2024-01-02 00:30:00",
                "2024-01-04 00:30:05",
            ),
        )
        .expect("try")
        .add_status("long", 1, 0, "exec_done", "2024-01-04 00:30:05")
        .expect("status");
    let mut store = MonitorStore::open(fx.path(), SHORT_WAIT).expect("open store");
    ViewCatalog::default().ensure(&mut store).expect("ensure views");

    let runs = store.load_runs().expect("runs");
    assert_eq!(runs[0].elapsed.as_deref(), Some("25:00:00"));

    let rows = store
        .task_summaries(&TaskFilter::default(), false)
        .expect("summaries");
    assert_eq!(rows[0].wait_time.as_deref(), Some("24:30:00"));
    assert_eq!(rows[0].run_time.as_deref(), Some("48:00:05"));

    let events = store
        .task_history(&TaskFilter::for_run(Some(1)), None)
        .expect("history");
    assert_eq!(events[0].run_time.as_deref(), Some("48:00:05"));
}

#[test]
fn task_population_surfaces_unclassified_tasks() {
    let (_fx, store) = open_with_views("task_population_surfaces_unclassified_tasks");
    let run_b = store.task_population(Some(2)).expect("population");
    assert_eq!(
        run_b,
        TaskPopulation {
            cached: 2,
            non_dispatched: 1,
            non_cached: 1,
            total: 5,
        }
    );
    assert_eq!(run_b.unclassified(), 1);

    let all = store.task_population(None).expect("population");
    assert_eq!(all.cached, 3);
    assert_eq!(all.total, 6);
}

#[test]
fn task_summaries_use_the_latest_status_and_attempt() {
    let (_fx, store) = open_with_views("task_summaries_use_the_latest_status_and_attempt");
    let rows = store
        .task_summaries(&TaskFilter::for_run(Some(2)), true)
        .expect("summaries");
    assert_eq!(rows.iter().map(|row| row.tasknum).collect::<Vec<_>>(), vec![1, 2]);

    let fetch = &rows[0];
    assert_eq!(fetch.status, StatusLabel::Known(TaskStatus::ExecDone));
    assert_eq!(fetch.try_id, Some(1));
    assert_eq!(fetch.fails, Some(1));
    assert_eq!(fetch.wait_time.as_deref(), Some("00:01:00"));
    assert_eq!(fetch.run_time.as_deref(), Some("00:02:00"));
    assert!(fetch.extended.is_some());

    let reduce = &rows[1];
    assert_eq!(reduce.status, StatusLabel::Known(TaskStatus::Launched));
    assert_eq!(reduce.start, None);
    assert_eq!(reduce.wait_time, None);
}

#[test]
fn status_filters_bind_labels_and_presets() {
    let (_fx, store) = open_with_views("status_filters_bind_labels_and_presets");
    let mut filter = TaskFilter::for_run(Some(2));

    filter.status = Some(StatusFilter::Preset(StatusPreset::Dead));
    let dead = store.task_summaries(&filter, false).expect("dead");
    assert_eq!(dead.iter().map(|row| row.tasknum).collect::<Vec<_>>(), vec![1]);

    filter.status = Some(StatusFilter::parse("notdone"));
    let notdone = store.task_summaries(&filter, false).expect("notdone");
    assert_eq!(notdone.iter().map(|row| row.tasknum).collect::<Vec<_>>(), vec![2]);

    filter.status = Some(StatusFilter::parse("launched"));
    assert_eq!(store.task_summaries(&filter, false).expect("launched").len(), 1);
}

#[test]
fn filter_values_are_bound_not_spliced() {
    let (_fx, store) = open_with_views("filter_values_are_bound_not_spliced");
    let filter = TaskFilter {
        app_name: Some("fetch' OR '1'='1".to_string()),
        ..TaskFilter::default()
    };
    assert!(store.task_summaries(&filter, false).expect("summaries").is_empty());
    assert!(store.task_history(&filter, None).expect("history").is_empty());
}

#[test]
fn filtering_on_an_unexposed_column_is_rejected() {
    let (_fx, store) = open_with_views("filtering_on_an_unexposed_column_is_rejected");
    let filter = TaskFilter {
        task_number: Some(1),
        ..TaskFilter::default()
    };
    let err = store.non_cached_tasks(&filter).expect_err("no task number column");
    assert!(matches!(err, StoreError::InvalidInput(_)), "{err:?}");
}

#[test]
fn non_cached_and_non_dispatched_listings_are_disjoint() {
    let (_fx, store) = open_with_views("non_cached_and_non_dispatched_listings_are_disjoint");
    let scope = TaskFilter::for_run(Some(2));
    let nc = store.non_cached_tasks(&scope).expect("non-cached");
    let nd = store.non_dispatched_tasks(&scope).expect("non-dispatched");

    assert_eq!(nc.len(), 1);
    assert_eq!(nc[0].appname, "notify");
    assert_eq!(nc[0].status, Some(StatusLabel::Known(TaskStatus::Pending)));
    assert_eq!(nd.len(), 1);
    assert_eq!(nd[0].task_hashsum, "hash-b4");
}

#[test]
fn history_is_ordered_by_run_task_and_time() {
    let (_fx, store) = open_with_views("history_is_ordered_by_run_task_and_time");
    let filter = TaskFilter {
        task_number: Some(1),
        ..TaskFilter::for_run(Some(2))
    };
    let events = store.task_history(&filter, None).expect("history");
    let labels: Vec<&str> = events.iter().map(|event| event.status.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "pending",
            "launched",
            "running",
            "fail_retryable",
            "launched",
            "running",
            "exec_done",
        ]
    );
    let stamps: Vec<_> = events.iter().map(|event| event.timestamp.clone()).collect();
    let mut sorted = stamps.clone();
    sorted.sort();
    assert_eq!(stamps, sorted);

    let limited = store.task_history(&filter, Some(2)).expect("limited history");
    assert_eq!(limited.len(), 2);

    // Without a run, task 1 of every run is selected, run by run.
    let first_tasks = TaskFilter {
        task_number: Some(1),
        ..TaskFilter::default()
    };
    let runs: Vec<i64> = store
        .task_history(&first_tasks, None)
        .expect("history")
        .iter()
        .map(|event| event.runnum)
        .collect();
    assert_eq!(runs, [vec![1; 4], vec![2; 7]].concat());
}

#[test]
fn task_numbers_restart_in_every_run() {
    let (_fx, store) = open_with_views("task_numbers_restart_in_every_run");
    let rows = store
        .task_summaries(&TaskFilter::default(), false)
        .expect("summaries");
    let numbered: Vec<(i64, i64, &str)> = rows
        .iter()
        .map(|row| (row.runnum, row.tasknum, row.appname.as_str()))
        .collect();
    assert_eq!(
        numbered,
        vec![(1, 1, "fetch"), (2, 1, "fetch"), (2, 2, "reduce")]
    );
}

#[test]
fn recent_status_is_newest_first_and_bounded() {
    let (_fx, store) = open_with_views("recent_status_is_newest_first_and_bounded");
    let events = store.recent_status(3).expect("recent");
    let seen: Vec<(i64, &str)> = events
        .iter()
        .map(|event| (event.tasknum, event.status.as_str()))
        .collect();
    assert_eq!(seen, vec![(1, "exec_done"), (2, "launched"), (2, "pending")]);
}

#[test]
fn attempt_stats_exclude_missing_endpoints() {
    let (_fx, store) = open_with_views("attempt_stats_exclude_missing_endpoints");
    let rows = store
        .attempt_stats(GroupBy::Task, &TaskFilter::for_run(Some(2)))
        .expect("stats");
    assert_eq!(rows.len(), 2);

    let fetch = &rows[0];
    assert_eq!((fetch.runnum, fetch.tasknum, fetch.tries), (2, 1, 2));
    assert!(approx(fetch.wait.minutes, 2.0), "{fetch:?}");
    assert!(approx(fetch.run.minutes, 3.0), "{fetch:?}");
    assert!(approx(fetch.elapsed.minutes, 5.0), "{fetch:?}");
    assert_eq!(fetch.wait.samples, 2);

    // Launched but never running: no wait, run or elapsed sample at all.
    let reduce = &rows[1];
    assert_eq!((reduce.runnum, reduce.tasknum, reduce.tries), (2, 2, 1));
    assert_eq!(reduce.wait, DurationSum::default());
    assert_eq!(reduce.run, DurationSum::default());
    assert_eq!(reduce.elapsed, DurationSum::default());
}

#[test]
fn attempt_stats_keep_equal_task_numbers_of_different_runs_apart() {
    let (_fx, store) =
        open_with_views("attempt_stats_keep_equal_task_numbers_of_different_runs_apart");
    let rows = store
        .attempt_stats(GroupBy::Task, &TaskFilter::default())
        .expect("stats");
    let keys: Vec<(i64, i64, i64)> = rows
        .iter()
        .map(|row| (row.runnum, row.tasknum, row.tries))
        .collect();
    assert_eq!(keys, vec![(1, 1, 1), (2, 1, 2), (2, 2, 1)]);
}

#[test]
fn attempt_stats_group_by_app_name_across_runs() {
    let (_fx, store) = open_with_views("attempt_stats_group_by_app_name_across_runs");
    let rows = store
        .attempt_stats(GroupBy::AppName, &TaskFilter::default())
        .expect("stats");
    let apps: Vec<&str> = rows.iter().map(|row| row.appname.as_str()).collect();
    assert_eq!(apps, vec!["fetch", "reduce"]);

    let fetch = &rows[0];
    assert_eq!(fetch.tries, 3);
    assert!(approx(fetch.wait.minutes, 3.0), "{fetch:?}");
    assert!(approx(fetch.run.minutes, 6.0), "{fetch:?}");
    assert!(approx(fetch.elapsed.minutes, 9.0), "{fetch:?}");
}

#[test]
fn status_transitions_are_sorted_by_attempt_key() {
    let (_fx, store) = open_with_views("status_transitions_are_sorted_by_attempt_key");
    let events = store
        .status_transitions(&TaskFilter::for_run(Some(2)))
        .expect("transitions");
    assert_eq!(events.len(), 11);
    let keys: Vec<_> = events.iter().map(|event| event.key).collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);

    let sequences = ws_core::reconstruct(events).expect("ordered stream");
    assert_eq!(sequences.distinct_keys, 5);
}

#[test]
fn blocks_and_nodes_are_scoped_by_run() {
    let (_fx, store) = open_with_views("blocks_and_nodes_are_scoped_by_run");
    let blocks = store.blocks(Some(2), None).expect("blocks");
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].status.as_deref(), Some("RUNNING"));
    assert_eq!(blocks[0].job_id.as_deref(), Some("job.0"));
    assert_eq!(blocks[0].nodes, 2);
    assert!(store.blocks(Some(1), None).expect("blocks").is_empty());

    let nodes = store.nodes(Some(2)).expect("nodes");
    let hosts: Vec<&str> = nodes.iter().map(|node| node.hostname.as_str()).collect();
    assert_eq!(hosts, vec!["node01", "node02"]);
    assert_eq!(nodes[0].last_heartbeat.as_deref(), Some("2024-01-02 00:06:00"));
    assert!(nodes.iter().all(|node| node.active));
    assert!(store.nodes(Some(1)).expect("nodes").is_empty());
}

#[test]
fn group_by_is_required_by_the_statistics_template() {
    let err = QueryBuilder::new("SELECT 1 GROUP BY #groupby#")
        .build()
        .expect_err("missing grouping");
    assert!(matches!(err, StoreError::InvalidInput(_)));

    let query = QueryBuilder::new("SELECT x FROM t #filter# #limit#")
        .predicate("a", Value::Integer(7))
        .predicate("b", Value::Text("z".into()))
        .limit(Some(3))
        .expect("limit")
        .build()
        .expect("build");
    assert_eq!(query.sql(), "SELECT x FROM t WHERE a = ?1 AND b = ?2 LIMIT ?3");
    assert_eq!(query.params().len(), 3);
}
