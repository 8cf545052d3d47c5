//! errwatch-scheduler — the poll-and-notify loop.
//!
//! One independently ticking loop task per check kind drives check
//! invocations:
//!
//! ```text
//! Scheduler
//!   ├── tick loop (tableList) ──┐
//!   ├── tick loop (getImt) ─────┤  spawn, one in flight per kind
//!   │                           ▼
//!   │                    CheckRunner::run_check
//!   │                      ├── Prober (per host, sequential)
//!   │                      └── Notifier (on failure classification)
//!   └── shutdown: stop tickers, drain in-flight, then return
//! ```
//!
//! Each invocation gets its own fixed deadline, independent of the tick
//! interval. Shutdown never abandons in-flight work: the scheduler only
//! returns once every spawned invocation has completed.

pub mod error;
pub mod routine;
pub mod scheduler;

pub use error::CheckError;
pub use routine::CheckRunner;
pub use scheduler::{Scheduler, SchedulerState};
