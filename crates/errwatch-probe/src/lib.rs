//! errwatch-probe — executes one HTTP check against one host.
//!
//! The [`Prober`] issues exactly one request per call, attaches the shared
//! header set, and reads the response body up to a configured byte cap.
//! Transport failures (DNS, connect, timeout) are reported as
//! [`ProbeError`], distinct from HTTP error statuses, which come back in
//! the [`ProbeOutcome`] for the caller to classify.

pub mod prober;

pub use prober::{ProbeError, ProbeOutcome, Prober};
