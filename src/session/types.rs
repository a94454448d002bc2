//! Session records, status and the derived elapsed-time view

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Paused,
    /// Terminal
    Stopped,
}

/// A single tracked session.
///
/// Values handed out by the engine are copies; mutating one never touches
/// engine-owned state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub task_name: String,
    pub status: SessionStatus,
    /// Start of the interval currently being measured (reset on resume)
    pub start_time: DateTime<Utc>,
    /// Set only while `Paused`
    pub pause_time: Option<DateTime<Utc>>,
    /// Set once, when `Stopped`
    pub end_time: Option<DateTime<Utc>>,
    /// Milliseconds banked from finished active intervals
    pub accumulated_duration_ms: u64,
}

impl SessionRecord {
    /// Total active milliseconds as of `now`, including the running interval
    pub fn elapsed_ms_at(&self, now: DateTime<Utc>) -> u64 {
        match self.status {
            SessionStatus::Active => self
                .accumulated_duration_ms
                .saturating_add(elapsed_ms(self.start_time, now)),
            // Pausing banks start..pause, so nothing is still running
            SessionStatus::Paused | SessionStatus::Stopped => self.accumulated_duration_ms,
        }
    }

    /// Whole elapsed seconds as of `now`
    pub fn elapsed_seconds_at(&self, now: DateTime<Utc>) -> u64 {
        self.elapsed_ms_at(now) / 1000
    }

    pub fn is_stopped(&self) -> bool {
        self.status == SessionStatus::Stopped
    }
}

/// Milliseconds from `from` to `to`, floored at zero so a clock stepping
/// backwards never shrinks banked time.
pub fn elapsed_ms(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    (to - from).num_milliseconds().max(0) as u64
}

/// Externally rendered view of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub record: SessionRecord,
    pub elapsed_seconds: u64,
}

impl SessionView {
    pub fn at(record: SessionRecord, now: DateTime<Utc>) -> Self {
        let elapsed_seconds = record.elapsed_seconds_at(now);
        SessionView {
            record,
            elapsed_seconds,
        }
    }
}

/// Transition notifications published by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Started {
        session_id: String,
        task_name: String,
    },
    Paused {
        session_id: String,
        accumulated_duration_ms: u64,
    },
    Resumed {
        session_id: String,
    },
    Stopped {
        session_id: String,
        task_name: String,
        accumulated_duration_ms: u64,
    },
}

impl SessionEvent {
    /// Get the SSE event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::Started { .. } => "session:started",
            SessionEvent::Paused { .. } => "session:paused",
            SessionEvent::Resumed { .. } => "session:resumed",
            SessionEvent::Stopped { .. } => "session:stopped",
        }
    }

    pub fn session_id(&self) -> &str {
        match self {
            SessionEvent::Started { session_id, .. }
            | SessionEvent::Paused { session_id, .. }
            | SessionEvent::Resumed { session_id }
            | SessionEvent::Stopped { session_id, .. } => session_id,
        }
    }
}
