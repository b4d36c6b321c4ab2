#![forbid(unsafe_code)]

use serde::{Serialize, Serializer};

/// Task states the workflow framework records in the status log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Launched,
    Running,
    Joining,
    RunningEnded,
    Unsched,
    Unknown,
    ExecDone,
    MemoDone,
    Failed,
    DepFail,
    FailRetryable,
}

impl TaskStatus {
    /// Every known status, in matrix column order.
    pub const ALL: [TaskStatus; 12] = [
        TaskStatus::Pending,
        TaskStatus::Launched,
        TaskStatus::Running,
        TaskStatus::Joining,
        TaskStatus::RunningEnded,
        TaskStatus::Unsched,
        TaskStatus::Unknown,
        TaskStatus::ExecDone,
        TaskStatus::MemoDone,
        TaskStatus::Failed,
        TaskStatus::DepFail,
        TaskStatus::FailRetryable,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Launched => "launched",
            TaskStatus::Running => "running",
            TaskStatus::Joining => "joining",
            TaskStatus::RunningEnded => "running_ended",
            TaskStatus::Unsched => "unsched",
            TaskStatus::Unknown => "unknown",
            TaskStatus::ExecDone => "exec_done",
            TaskStatus::MemoDone => "memo_done",
            TaskStatus::Failed => "failed",
            TaskStatus::DepFail => "dep_fail",
            TaskStatus::FailRetryable => "fail_retryable",
        }
    }

    pub fn parse(value: &str) -> Result<Self, UnknownStatus> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| UnknownStatus(value.to_string()))
    }

    /// An attempt in this state will not record further transitions.
    pub fn is_terminal(self) -> bool {
        StatusPreset::Dead.members().contains(&self)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown task status label: {0:?}")]
pub struct UnknownStatus(pub String);

/// A status label as read from the store.
///
/// Labels outside [`TaskStatus`] are kept verbatim so they can be tallied and
/// flagged instead of silently folded into a known state.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatusLabel {
    Known(TaskStatus),
    Anomalous(String),
}

impl StatusLabel {
    pub fn from_raw(value: &str) -> Self {
        match TaskStatus::parse(value) {
            Ok(status) => StatusLabel::Known(status),
            Err(_) => StatusLabel::Anomalous(value.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            StatusLabel::Known(status) => status.as_str(),
            StatusLabel::Anomalous(raw) => raw,
        }
    }

    pub fn known(&self) -> Option<TaskStatus> {
        match self {
            StatusLabel::Known(status) => Some(*status),
            StatusLabel::Anomalous(_) => None,
        }
    }

    pub fn is_anomalous(&self) -> bool {
        matches!(self, StatusLabel::Anomalous(_))
    }

    pub fn is_terminal(&self) -> bool {
        self.known().is_some_and(TaskStatus::is_terminal)
    }
}

impl From<TaskStatus> for StatusLabel {
    fn from(value: TaskStatus) -> Self {
        StatusLabel::Known(value)
    }
}

impl std::fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StatusLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Named groups of states usable as a single status filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusPreset {
    /// Not yet running.
    NotDone,
    /// Reached a running state at some point.
    Runz,
    /// Finished, successfully or not.
    Dead,
    Oddball,
}

impl StatusPreset {
    pub const ALL: [StatusPreset; 4] = [
        StatusPreset::NotDone,
        StatusPreset::Runz,
        StatusPreset::Dead,
        StatusPreset::Oddball,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StatusPreset::NotDone => "notdone",
            StatusPreset::Runz => "runz",
            StatusPreset::Dead => "dead",
            StatusPreset::Oddball => "oddball",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        StatusPreset::ALL
            .into_iter()
            .find(|preset| preset.as_str() == value)
    }

    pub fn members(self) -> &'static [TaskStatus] {
        use TaskStatus::*;
        match self {
            StatusPreset::NotDone => &[Pending, Launched, Running],
            StatusPreset::Runz => &[
                Running,
                Joining,
                RunningEnded,
                ExecDone,
                MemoDone,
                Failed,
                DepFail,
                FailRetryable,
            ],
            StatusPreset::Dead => &[ExecDone, MemoDone, Failed, DepFail, FailRetryable],
            StatusPreset::Oddball => &[Unsched, Unknown],
        }
    }
}
