#![forbid(unsafe_code)]

// Run numbers follow start order; the elapsed time stays NULL while a run is open.
pub(super) const RUNVIEW: &str = concat!(
    r#"
        CREATE VIEW runview AS
        SELECT
          row_number() OVER (ORDER BY w.time_began, w.run_id) AS runnum,
          w.run_id AS run_id,
          strftime('%Y-%m-%d %H:%M:%S', w.time_began) AS began,
          strftime('%Y-%m-%d %H:%M:%S', w.time_completed) AS completed,
          "#,
    hms_between!("w.time_began", "w.time_completed"),
    r#" AS runElapsedTime
        FROM workflow w
"#
);
