//! Session lifecycle and elapsed-time accounting
//!
//! A session is one tracked interval of work under a single task name. The
//! engine owns every record and a pointer to the (at most one) active session:
//!
//! ```text
//! start ──► Active ──pause──► Paused
//!              ▲                │
//!              └─────resume─────┘
//!   Active ──stop──► Stopped ◄──stop── Paused
//! ```
//!
//! Time is banked in milliseconds whenever an active interval ends, so the
//! accumulated duration of a record only ever grows.

pub mod clock;
pub mod engine;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::SessionEngine;
pub use types::{elapsed_ms, SessionEvent, SessionRecord, SessionStatus, SessionView};
