//! Session state machine
//!
//! `SessionEngine` is a single-writer structure: every mutating operation
//! takes `&mut self`, and callers that share it across tasks serialize
//! access (the HTTP layer wraps it in a mutex).

use super::clock::{Clock, SystemClock};
use super::types::{elapsed_ms, SessionEvent, SessionRecord, SessionStatus, SessionView};
use crate::categorize::TaskItem;
use crate::error::{SessionError, SessionResult};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Owns all session records and the active-session pointer
pub struct SessionEngine {
    sessions: HashMap<String, SessionRecord>,
    /// Identifier of the only `Active` record, if any
    active_id: Option<String>,
    /// Stopped session ids, in the order they were stopped
    finalized: Vec<String>,
    clock: Arc<dyn Clock>,
    event_tx: Option<broadcast::Sender<SessionEvent>>,
}

impl SessionEngine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        SessionEngine {
            sessions: HashMap::new(),
            active_id: None,
            finalized: Vec::new(),
            clock,
            event_tx: None,
        }
    }

    /// Publish transition events on `event_tx` (sends never block; a channel
    /// without subscribers simply drops them)
    pub fn with_event_sender(mut self, event_tx: broadcast::Sender<SessionEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    /// Current time according to the engine's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Start a new session, stopping whichever session is currently active.
    pub fn start(&mut self, task_name: &str) -> SessionResult<SessionRecord> {
        let task_name = task_name.trim();
        if task_name.is_empty() {
            return Err(SessionError::InvalidInput(
                "Task name cannot be empty or whitespace only".to_string(),
            ));
        }

        let now = self.clock.now();
        self.close_active(now)?;

        let record = SessionRecord {
            id: uuid::Uuid::new_v4().to_string(),
            task_name: task_name.to_string(),
            status: SessionStatus::Active,
            start_time: now,
            pause_time: None,
            end_time: None,
            accumulated_duration_ms: 0,
        };

        self.sessions.insert(record.id.clone(), record.clone());
        self.active_id = Some(record.id.clone());

        tracing::info!("Started session {} ({})", record.id, record.task_name);
        self.emit(SessionEvent::Started {
            session_id: record.id.clone(),
            task_name: record.task_name.clone(),
        });

        Ok(record)
    }

    /// Pause an active session, or resume it if it is already paused.
    pub fn pause_or_resume(&mut self, id: &str) -> SessionResult<SessionRecord> {
        let now = self.clock.now();
        let status = self.lookup(id)?.status;
        match status {
            SessionStatus::Active => self.pause_at(id, now),
            SessionStatus::Paused => self.resume_at(id, now),
            SessionStatus::Stopped => Err(SessionError::InvalidTransition(
                "Cannot pause a stopped session".to_string(),
            )),
        }
    }

    /// Pause only. Pausing a paused session returns it unchanged.
    pub fn pause(&mut self, id: &str) -> SessionResult<SessionRecord> {
        let now = self.clock.now();
        let status = self.lookup(id)?.status;
        match status {
            SessionStatus::Active => self.pause_at(id, now),
            SessionStatus::Paused => self.get(id),
            SessionStatus::Stopped => Err(SessionError::InvalidTransition(
                "Cannot pause a stopped session".to_string(),
            )),
        }
    }

    /// Resume only. Resuming an active session returns it unchanged.
    pub fn resume(&mut self, id: &str) -> SessionResult<SessionRecord> {
        let now = self.clock.now();
        let status = self.lookup(id)?.status;
        match status {
            SessionStatus::Paused => self.resume_at(id, now),
            SessionStatus::Active => self.get(id),
            SessionStatus::Stopped => Err(SessionError::InvalidTransition(
                "Cannot resume a stopped session".to_string(),
            )),
        }
    }

    /// Stop a session. Stopping an already stopped session is a no-op.
    pub fn stop(&mut self, id: &str) -> SessionResult<SessionRecord> {
        let now = self.clock.now();
        self.stop_at(id, now)
    }

    pub fn get(&self, id: &str) -> SessionResult<SessionRecord> {
        self.lookup(id).cloned()
    }

    pub fn get_active(&self) -> Option<SessionRecord> {
        self.active_id
            .as_deref()
            .and_then(|id| self.sessions.get(id))
            .cloned()
    }

    /// Whole elapsed seconds of `record` as of now. Does not mutate anything.
    pub fn snapshot(&self, record: &SessionRecord) -> u64 {
        record.elapsed_seconds_at(self.clock.now())
    }

    /// Render `record` with its elapsed seconds as of now
    pub fn view(&self, record: SessionRecord) -> SessionView {
        SessionView::at(record, self.clock.now())
    }

    /// Task name and banked duration of every stopped session, in stop order
    pub fn finalized_tasks(&self) -> Vec<TaskItem> {
        self.finalized
            .iter()
            .filter_map(|id| self.sessions.get(id))
            .map(|record| TaskItem {
                task_name: record.task_name.clone(),
                duration_ms: record.accumulated_duration_ms,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn lookup(&self, id: &str) -> SessionResult<&SessionRecord> {
        self.sessions
            .get(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    fn lookup_mut(&mut self, id: &str) -> SessionResult<&mut SessionRecord> {
        self.sessions
            .get_mut(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    /// Stop the active session (if any) as part of another transition
    fn close_active(&mut self, now: DateTime<Utc>) -> SessionResult<()> {
        if let Some(active_id) = self.active_id.clone() {
            tracing::debug!("Implicitly stopping active session {}", active_id);
            self.stop_at(&active_id, now)?;
        }
        Ok(())
    }

    fn pause_at(&mut self, id: &str, now: DateTime<Utc>) -> SessionResult<SessionRecord> {
        let record = self.lookup_mut(id)?;
        let interval = elapsed_ms(record.start_time, now);
        record.accumulated_duration_ms = record.accumulated_duration_ms.saturating_add(interval);
        record.pause_time = Some(now);
        record.status = SessionStatus::Paused;
        let paused = record.clone();

        if self.active_id.as_deref() == Some(id) {
            self.active_id = None;
        }

        tracing::debug!(
            "Paused session {} after {}ms interval ({}ms banked)",
            id,
            interval,
            paused.accumulated_duration_ms
        );
        self.emit(SessionEvent::Paused {
            session_id: paused.id.clone(),
            accumulated_duration_ms: paused.accumulated_duration_ms,
        });

        Ok(paused)
    }

    fn resume_at(&mut self, id: &str, now: DateTime<Utc>) -> SessionResult<SessionRecord> {
        if self.active_id.as_deref() != Some(id) {
            self.close_active(now)?;
        }

        let record = self.lookup_mut(id)?;
        record.start_time = now;
        record.pause_time = None;
        record.status = SessionStatus::Active;
        let resumed = record.clone();

        self.active_id = Some(id.to_string());

        tracing::debug!("Resumed session {}", id);
        self.emit(SessionEvent::Resumed {
            session_id: resumed.id.clone(),
        });

        Ok(resumed)
    }

    fn stop_at(&mut self, id: &str, now: DateTime<Utc>) -> SessionResult<SessionRecord> {
        let record = self.lookup_mut(id)?;
        match record.status {
            SessionStatus::Stopped => return Ok(record.clone()),
            SessionStatus::Active => {
                let interval = elapsed_ms(record.start_time, now);
                record.accumulated_duration_ms =
                    record.accumulated_duration_ms.saturating_add(interval);
            }
            // Already banked up to the pause instant
            SessionStatus::Paused => {}
        }
        record.status = SessionStatus::Stopped;
        record.pause_time = None;
        record.end_time = Some(now);
        let stopped = record.clone();

        if self.active_id.as_deref() == Some(id) {
            self.active_id = None;
        }
        self.finalized.push(stopped.id.clone());

        tracing::info!(
            "Stopped session {} ({}) with {}ms tracked",
            stopped.id,
            stopped.task_name,
            stopped.accumulated_duration_ms
        );
        self.emit(SessionEvent::Stopped {
            session_id: stopped.id.clone(),
            task_name: stopped.task_name.clone(),
            accumulated_duration_ms: stopped.accumulated_duration_ms,
        });

        Ok(stopped)
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event);
        }
    }
}

impl Default for SessionEngine {
    fn default() -> Self {
        SessionEngine::new(Arc::new(SystemClock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::clock::ManualClock;
    use std::time::Duration;

    fn engine() -> (SessionEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        (SessionEngine::new(clock.clone()), clock)
    }

    fn active_count(engine: &SessionEngine) -> usize {
        engine
            .sessions
            .values()
            .filter(|s| s.status == SessionStatus::Active)
            .count()
    }

    #[test]
    fn test_start_creates_active_session() {
        let (mut engine, clock) = engine();
        let record = engine.start("  Design  ").unwrap();

        assert_eq!(record.task_name, "Design");
        assert_eq!(record.status, SessionStatus::Active);
        assert_eq!(record.start_time, clock.now());
        assert_eq!(record.accumulated_duration_ms, 0);
        assert!(record.pause_time.is_none());
        assert!(record.end_time.is_none());
        assert_eq!(engine.get_active().unwrap().id, record.id);
    }

    #[test]
    fn test_start_rejects_blank_task_name() {
        let (mut engine, _) = engine();
        assert!(matches!(
            engine.start(""),
            Err(SessionError::InvalidInput(_))
        ));
        assert!(matches!(
            engine.start(" \t\n "),
            Err(SessionError::InvalidInput(_))
        ));
        assert!(engine.is_empty());
        assert!(engine.get_active().is_none());
    }

    #[test]
    fn test_start_stops_previous_active_session() {
        let (mut engine, clock) = engine();
        let design = engine.start("Design").unwrap();
        clock.advance_ms(1_200);
        let code = engine.start("Code").unwrap();

        assert_eq!(engine.get_active().unwrap().task_name, "Code");

        let design = engine.get(&design.id).unwrap();
        assert_eq!(design.status, SessionStatus::Stopped);
        assert_eq!(design.end_time, Some(code.start_time));
        assert_eq!(design.accumulated_duration_ms, 1_200);
        assert_eq!(active_count(&engine), 1);
    }

    #[test]
    fn test_pause_banks_elapsed_time() {
        let (mut engine, clock) = engine();
        let record = engine.start("Review").unwrap();
        clock.advance_ms(750);

        let paused = engine.pause_or_resume(&record.id).unwrap();
        assert_eq!(paused.status, SessionStatus::Paused);
        assert_eq!(paused.accumulated_duration_ms, 750);
        assert_eq!(paused.pause_time, Some(clock.now()));
        assert!(engine.get_active().is_none());
    }

    #[test]
    fn test_pause_then_resume_round_trip() {
        let (mut engine, clock) = engine();
        let record = engine.start("T").unwrap();
        clock.advance_ms(400);
        engine.pause_or_resume(&record.id).unwrap();
        clock.advance_ms(10_000);

        let resumed = engine.pause_or_resume(&record.id).unwrap();
        assert_eq!(resumed.status, SessionStatus::Active);
        assert!(resumed.pause_time.is_none());
        assert_eq!(resumed.accumulated_duration_ms, 400);
        assert_eq!(resumed.start_time, clock.now());
        assert_eq!(engine.get_active().unwrap().id, record.id);
    }

    #[test]
    fn test_banked_time_is_additive_across_cycles() {
        let (mut engine, clock) = engine();
        let id = engine.start("A").unwrap().id;

        clock.advance_ms(300);
        engine.pause_or_resume(&id).unwrap();
        clock.advance_ms(5_000);
        engine.pause_or_resume(&id).unwrap();
        clock.advance_ms(200);
        engine.pause_or_resume(&id).unwrap();
        clock.advance_ms(5_000);
        engine.pause_or_resume(&id).unwrap();
        clock.advance_ms(100);

        let stopped = engine.stop(&id).unwrap();
        assert_eq!(stopped.accumulated_duration_ms, 600);
        assert_eq!(stopped.status, SessionStatus::Stopped);
    }

    #[test]
    fn test_resume_stops_other_active_session() {
        let (mut engine, clock) = engine();
        let first = engine.start("First").unwrap();
        clock.advance_ms(100);
        engine.pause_or_resume(&first.id).unwrap();

        let second = engine.start("Second").unwrap();
        clock.advance_ms(250);
        engine.pause_or_resume(&first.id).unwrap();

        let second = engine.get(&second.id).unwrap();
        assert_eq!(second.status, SessionStatus::Stopped);
        assert_eq!(second.accumulated_duration_ms, 250);
        assert_eq!(engine.get_active().unwrap().id, first.id);
        assert_eq!(active_count(&engine), 1);
    }

    #[test]
    fn test_pause_unknown_session_is_not_found() {
        let (mut engine, _) = engine();
        assert_eq!(
            engine.pause_or_resume("unknown-id"),
            Err(SessionError::NotFound("unknown-id".to_string()))
        );
        assert!(matches!(
            engine.stop("unknown-id"),
            Err(SessionError::NotFound(_))
        ));
        assert!(matches!(
            engine.get("unknown-id"),
            Err(SessionError::NotFound(_))
        ));
    }

    #[test]
    fn test_pause_stopped_session_is_invalid_transition() {
        let (mut engine, _) = engine();
        let id = engine.start("X").unwrap().id;
        engine.stop(&id).unwrap();

        let err = engine.pause_or_resume(&id).unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransition(_)));
        assert_eq!(err.to_string(), "Cannot pause a stopped session");
        assert!(matches!(
            engine.resume(&id),
            Err(SessionError::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (mut engine, clock) = engine();
        let id = engine.start("X").unwrap().id;
        clock.advance_ms(900);
        let first = engine.stop(&id).unwrap();
        clock.advance_ms(60_000);
        let second = engine.stop(&id).unwrap();

        assert_eq!(first, second);
        assert_eq!(second.accumulated_duration_ms, 900);
        assert_eq!(engine.finalized_tasks().len(), 1);
    }

    #[test]
    fn test_stop_paused_session_does_not_bank_pause_time() {
        let (mut engine, clock) = engine();
        let id = engine.start("X").unwrap().id;
        clock.advance_ms(500);
        engine.pause_or_resume(&id).unwrap();
        clock.advance_ms(30_000);

        let stopped = engine.stop(&id).unwrap();
        assert_eq!(stopped.accumulated_duration_ms, 500);
        assert!(stopped.pause_time.is_none());
        assert_eq!(stopped.end_time, Some(clock.now()));
    }

    #[test]
    fn test_get_active_with_no_sessions() {
        let (engine, _) = engine();
        assert!(engine.get_active().is_none());
    }

    #[test]
    fn test_separate_pause_and_resume() {
        let (mut engine, clock) = engine();
        let id = engine.start("X").unwrap().id;
        clock.advance_ms(100);

        let paused = engine.pause(&id).unwrap();
        clock.advance_ms(100);
        assert_eq!(engine.pause(&id).unwrap(), paused);

        let resumed = engine.resume(&id).unwrap();
        assert_eq!(resumed.status, SessionStatus::Active);
        assert_eq!(engine.resume(&id).unwrap(), resumed);
    }

    #[test]
    fn test_snapshot_reports_elapsed_seconds() {
        let (mut engine, clock) = engine();
        let record = engine.start("X").unwrap();
        clock.advance_ms(2_999);
        let active = engine.get(&record.id).unwrap();
        assert_eq!(engine.snapshot(&active), 2);

        clock.advance_ms(1);
        let paused = engine.pause_or_resume(&record.id).unwrap();
        clock.advance_ms(60_000);
        assert_eq!(engine.snapshot(&paused), 3);
        assert_eq!(engine.view(paused).elapsed_seconds, 3);
    }

    #[test]
    fn test_clock_stepping_backwards_never_shrinks_duration() {
        let (mut engine, clock) = engine();
        let id = engine.start("X").unwrap().id;
        clock.advance_ms(-5_000);

        let stopped = engine.stop(&id).unwrap();
        assert_eq!(stopped.accumulated_duration_ms, 0);
    }

    #[test]
    fn test_returned_records_are_copies() {
        let (mut engine, _) = engine();
        let mut record = engine.start("X").unwrap();
        record.task_name = "mutated".to_string();
        record.status = SessionStatus::Stopped;

        let stored = engine.get(&record.id).unwrap();
        assert_eq!(stored.task_name, "X");
        assert_eq!(stored.status, SessionStatus::Active);
    }

    #[test]
    fn test_finalized_tasks_in_stop_order() {
        let (mut engine, clock) = engine();
        let a = engine.start("A").unwrap().id;
        clock.advance_ms(1_000);
        let b = engine.start("B").unwrap().id;
        clock.advance_ms(2_000);
        engine.pause_or_resume(&b).unwrap();
        engine.start("C").unwrap();
        engine.stop(&b).unwrap();

        let tasks = engine.finalized_tasks();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].task_name, "A");
        assert_eq!(tasks[0].duration_ms, 1_000);
        assert_eq!(tasks[1].task_name, "B");
        assert_eq!(tasks[1].duration_ms, 2_000);
        assert!(engine.get(&a).unwrap().is_stopped());
    }

    #[test]
    fn test_at_most_one_active_across_operation_mix() {
        let (mut engine, clock) = engine();
        let mut ids = Vec::new();
        for i in 0..20 {
            clock.advance_ms(37);
            match i % 4 {
                0 | 1 => ids.push(engine.start(&format!("task {}", i)).unwrap().id),
                2 => {
                    let _ = engine.pause_or_resume(&ids[i % ids.len()]);
                }
                _ => {
                    let _ = engine.stop(&ids[(i * 7) % ids.len()]);
                }
            }
            assert!(active_count(&engine) <= 1);
            match engine.get_active() {
                Some(active) => assert_eq!(active.status, SessionStatus::Active),
                None => assert_eq!(active_count(&engine), 0),
            }
        }
    }

    #[test]
    fn test_events_are_published() {
        let (tx, mut rx) = broadcast::channel(16);
        let clock = Arc::new(ManualClock::default());
        let mut engine = SessionEngine::new(clock.clone()).with_event_sender(tx);

        let first = engine.start("First").unwrap().id;
        clock.advance_ms(10);
        engine.start("Second").unwrap();

        assert_eq!(rx.try_recv().unwrap().event_type(), "session:started");
        match rx.try_recv().unwrap() {
            SessionEvent::Stopped {
                session_id,
                accumulated_duration_ms,
                ..
            } => {
                assert_eq!(session_id, first);
                assert_eq!(accumulated_duration_ms, 10);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(rx.try_recv().unwrap().event_type(), "session:started");
    }

    #[test]
    fn test_wall_clock_stop_after_sleep() {
        let mut engine = SessionEngine::default();
        let id = engine.start("X").unwrap().id;
        std::thread::sleep(Duration::from_millis(50));

        let stopped = engine.stop(&id).unwrap();
        assert!(
            (40..=100).contains(&stopped.accumulated_duration_ms),
            "accumulated {}ms",
            stopped.accumulated_duration_ms
        );
        assert_eq!(stopped.status, SessionStatus::Stopped);
        assert!(stopped.end_time.is_some());
    }
}
