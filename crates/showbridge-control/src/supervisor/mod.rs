//! Supervision of the measurement process
//!
//! The child prints one JSON object per line on stdout. It is restarted when
//! it exits or fails to start, with a windowed backoff against crash loops.

mod lines;
mod process;
mod restart;

pub use lines::{parse_line, LineBuffer};
pub use process::{ProcessSupervisor, SupervisorEvent, TERMINATE_GRACE};
pub use restart::{RestartDecision, RestartPolicy, RestartTracker};
