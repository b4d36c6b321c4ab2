#![forbid(unsafe_code)]
#![allow(dead_code)]

use std::time::Duration;
use ws_reports::{Engine, EngineConfig};
use ws_storage::fixtures::{MonitorFixture, two_run_workflow};

pub(crate) const SHORT_WAIT: Duration = Duration::from_millis(50);

pub(crate) fn config_for(fx: &MonitorFixture) -> EngineConfig {
    EngineConfig::new(fx.path()).with_busy_timeout(SHORT_WAIT)
}

/// The two-run workflow fixture with an engine open on it.
pub(crate) fn open_engine(test_name: &str) -> (MonitorFixture, Engine) {
    let fx = two_run_workflow(test_name).expect("fixture");
    let engine = Engine::open(&config_for(&fx)).expect("open engine");
    (fx, engine)
}
