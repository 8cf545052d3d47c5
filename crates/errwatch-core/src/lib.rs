//! errwatch-core — configuration and check definitions.
//!
//! The static description of what the sidecar polls: the cluster target,
//! the set of check definitions (endpoint path + request body + status
//! classification rule), and the shared header set attached to every
//! probe. Everything here is immutable after startup and shared read-only
//! across the concurrent check tasks.

pub mod check;
pub mod config;
pub mod headers;

pub use check::{builtin_checks, CheckDefinition, Classification, HttpMethod, StatusRule};
pub use check::{GET_IMT, TABLE_LIST};
pub use config::{Config, ConfigError, HttpConfig, TargetConfig, WebhookConfig};
pub use headers::HeaderSet;
