#![forbid(unsafe_code)]

mod blocks;
mod runs;
mod summary;
mod tasks;

/// Built-in view definitions, one statement per entry, in dependency order.
pub(in crate::store) fn builtin_definitions() -> Vec<String> {
    [
        runs::RUNVIEW,
        tasks::TASKVIEW,
        tasks::NCTASKVIEW,
        tasks::NDTASKVIEW,
        summary::LASTTRYVIEW,
        summary::SUMMARY,
        blocks::BLOCKVIEW,
    ]
    .into_iter()
    .map(|sql| sql.trim().to_string())
    .collect()
}
