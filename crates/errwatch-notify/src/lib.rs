//! errwatch-notify — the outbound alerting surface.
//!
//! Failure classifications become a [`NotificationMessage`] which the
//! [`Notifier`] posts to a messaging webhook. Delivery is fire-and-forget:
//! the webhook's own response status is never inspected, only
//! transport failures are reported. Implementations must tolerate
//! concurrent callers — multiple check invocations notify independently.

pub mod message;
pub mod webhook;

use async_trait::async_trait;
use thiserror::Error;

pub use message::{NotificationMessage, OutboundMessage, TextLine};
pub use webhook::WebhookNotifier;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("webhook delivery failed: {0}")]
    Delivery(String),
}

/// Sends a structured message to the alerting channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message. No retry; a transport failure is the only
    /// error condition.
    async fn notify(&self, message: &OutboundMessage) -> Result<(), NotifyError>;
}
