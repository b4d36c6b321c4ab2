#![forbid(unsafe_code)]

//! Regroups a flat, sorted status stream into per-attempt state sequences.
//!
//! Input rows must arrive ordered by attempt key and then by timestamp. The
//! reconstructor checks that ordering as it goes and refuses to continue on the
//! first violation, because a misordered stream would otherwise split one
//! attempt into several groups without any visible error.

use crate::ids::AttemptKey;
use crate::status::StatusLabel;
use serde::Serialize;


#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequenceEvent {
    pub key: AttemptKey,
    pub status: StatusLabel,
    pub timestamp: String,
}

impl SequenceEvent {
    pub fn new(key: AttemptKey, status: StatusLabel, timestamp: impl Into<String>) -> Self {
        Self {
            key,
            status,
            timestamp: timestamp.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AttemptSequence {
    pub key: AttemptKey,
    pub statuses: Vec<StatusLabel>,
}

impl AttemptSequence {
    pub fn last(&self) -> Option<&StatusLabel> {
        self.statuses.last()
    }

    /// True while the attempt has not reported a terminal state.
    pub fn is_in_flight(&self) -> bool {
        !self.last().is_some_and(StatusLabel::is_terminal)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StateSequences {
    pub groups: Vec<AttemptSequence>,
    pub distinct_keys: usize,
}

impl StateSequences {
    pub fn in_flight(&self) -> impl Iterator<Item = &AttemptSequence> {
        self.groups.iter().filter(|group| group.is_in_flight())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    #[error("status rows out of key order at row {index}: {current} follows {previous}")]
    KeyOrder {
        index: usize,
        previous: AttemptKey,
        current: AttemptKey,
    },
    #[error("status rows out of time order at row {index} for {key}: {current} follows {previous}")]
    TimestampOrder {
        index: usize,
        key: AttemptKey,
        previous: String,
        current: String,
    },
}

/// Streaming grouper. Feed rows with [`push`](Self::push); each call returns the
/// group completed by a key change, and [`finish`](Self::finish) flushes the
/// group still open when the stream ends.
#[derive(Debug, Default)]
pub struct SequenceReconstructor {
    current: Option<AttemptKey>,
    last_timestamp: Option<String>,
    statuses: Vec<StatusLabel>,
    rows_seen: usize,
    distinct_keys: usize,
}

impl SequenceReconstructor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn distinct_keys(&self) -> usize {
        self.distinct_keys
    }

    pub fn push(&mut self, event: SequenceEvent) -> Result<Option<AttemptSequence>, SequenceError> {
        let index = self.rows_seen;
        let mut completed = None;

        match self.current {
            Some(previous) if previous == event.key => {
                let previous_ts = self.last_timestamp.as_deref().unwrap_or_default();
                if event.timestamp.as_str() < previous_ts {
                    return Err(SequenceError::TimestampOrder {
                        index,
                        key: event.key,
                        previous: previous_ts.to_string(),
                        current: event.timestamp,
                    });
                }
            }
            Some(previous) => {
                if event.key < previous {
                    return Err(SequenceError::KeyOrder {
                        index,
                        previous,
                        current: event.key,
                    });
                }
                completed = Some(AttemptSequence {
                    key: previous,
                    statuses: std::mem::take(&mut self.statuses),
                });
                self.start_group(event.key);
            }
            None => self.start_group(event.key),
        }

        self.statuses.push(event.status);
        self.last_timestamp = Some(event.timestamp);
        self.rows_seen += 1;
        Ok(completed)
    }

    pub fn finish(self) -> Option<AttemptSequence> {
        self.current.map(|key| AttemptSequence {
            key,
            statuses: self.statuses,
        })
    }

    fn start_group(&mut self, key: AttemptKey) {
        self.current = Some(key);
        self.distinct_keys += 1;
    }
}

pub fn reconstruct<I>(events: I) -> Result<StateSequences, SequenceError>
where
    I: IntoIterator<Item = SequenceEvent>,
{
    let mut reconstructor = SequenceReconstructor::new();
    let mut groups = Vec::new();
    for event in events {
        if let Some(group) = reconstructor.push(event)? {
            groups.push(group);
        }
    }
    let distinct_keys = reconstructor.distinct_keys();
    groups.extend(reconstructor.finish());
    Ok(StateSequences {
        groups,
        distinct_keys,
    })
}
