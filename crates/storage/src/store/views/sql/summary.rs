#![forbid(unsafe_code)]

pub(super) const LASTTRYVIEW: &str = concat!(
    r#"
        CREATE VIEW lasttryview AS
        SELECT
          y.run_id AS run_id,
          y.task_id AS task_id,
          y.try_id AS try_id,
          y.hostname AS hostname,
          y.block_id AS block_id,
          strftime('%Y-%m-%d %H:%M:%S', y.task_try_time_launched) AS launched,
          strftime('%Y-%m-%d %H:%M:%S', y.task_try_time_running) AS start,
          "#,
    hms_between!("y.task_try_time_launched", "y.task_try_time_running"),
    r#" AS waitTime,
          strftime('%Y-%m-%d %H:%M:%S', y.task_try_time_returned) AS ended,
          "#,
    hms_between!("y.task_try_time_running", "y.task_try_time_returned"),
    r#" AS runTime,
          y.task_fail_history AS failReason
        FROM try y
        WHERE y.try_id = (
          SELECT max(y2.try_id) FROM try y2
          WHERE y2.run_id = y.run_id AND y2.task_id = y.task_id
        )
"#
);

pub(super) const SUMMARY: &str = r#"
        CREATE VIEW summary AS
        SELECT
          tv.runnum AS runnum,
          tv.tasknum AS tasknum,
          tv.task_id AS task_id,
          tv.appname AS appname,
          tv.status AS status,
          tv.lastUpdate AS lastUpdate,
          tv.fails AS fails,
          tv.failcost AS failcost,
          lt.try_id AS try_id,
          lt.hostname AS hostname,
          lt.launched AS launched,
          lt.start AS start,
          lt.waitTime AS waitTime,
          lt.ended AS ended,
          lt.runTime AS runTime,
          tv.depends AS depends,
          lt.failReason AS failReason,
          tv.stdout AS stdout
        FROM taskview tv
        LEFT JOIN lasttryview lt ON lt.run_id = tv.run_id AND lt.task_id = tv.task_id
"#;
